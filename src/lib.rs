//! # Quizcast Game Library
//!
//! This library provides the core game logic for a live, bilingual trivia
//! system. A moderator drives rounds of multiple choice questions through a
//! shared round record; participants answer under a countdown on their own
//! devices; a shared display shows the question, a live response count,
//! revealed results, and a leaderboard. All state synchronization is modeled
//! sans-IO: hosts wire the delivery and read seams to whatever transport and
//! storage they embed the library in.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::ignored_unit_patterns)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
use derive_where::derive_where;
use itertools::Itertools;
use serde::Serialize;

pub mod constants;

pub mod catalog;
pub mod client;
pub mod game;
pub mod leaderboard;
pub mod ledger;
pub mod observer;
pub mod round;
pub mod session;
pub mod shuffle;
pub mod timing;

/// Messages that synchronize an observer with the current state
///
/// A sync message carries the complete picture rather than a delta. It is
/// sent when an observer connects or reconnects, replacing whatever local
/// state the observer held before.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum SyncMessage {
    /// The complete current round record
    Round(round::RoundState),
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Messages that notify observers about a change
///
/// Update messages are pushed as state changes happen: round mutations go to
/// every observer, answer insertions go to observers watching that question,
/// and submission or control outcomes go back to the requester alone.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum UpdateMessage {
    /// The round record changed; the payload is the complete new record
    Round(round::RoundState),
    /// A response was recorded against the question this observer watches
    Answer(ledger::Response),
    /// The outcome of this participant's own submission
    Submission(game::SubmitFeedback),
    /// The outcome of this moderator's own control request
    Control(game::ControlFeedback),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// A truncated list that keeps the exact count while limiting the items
///
/// The leaderboard shows a top slice of the standings while still knowing
/// how many participants there are in total; this wrapper carries both.
#[derive(Debug, Clone, Serialize)]
#[derive_where(Default)]
pub struct TopList<T> {
    /// The exact total count of items
    exact_count: usize,
    /// The truncated list of items (up to the limit)
    items: Vec<T>,
}

impl<T: Clone> TopList<T> {
    /// Creates a new truncated list from an iterator
    ///
    /// # Arguments
    ///
    /// * `list` - An iterator over items to include
    /// * `limit` - Maximum number of items to keep
    /// * `exact_count` - The exact total count of items (may be larger than limit)
    ///
    /// # Returns
    ///
    /// A new `TopList` containing up to `limit` items from the iterator
    pub fn new<I: Iterator<Item = T>>(list: I, limit: usize, exact_count: usize) -> Self {
        let items = list.take(limit).collect_vec();
        Self { exact_count, items }
    }

    /// Maps a function over the items in the list
    ///
    /// # Arguments
    ///
    /// * `f` - Function to apply to each item
    ///
    /// # Returns
    ///
    /// A new `TopList` with the function applied to each item
    pub fn map<F, U>(self, f: F) -> TopList<U>
    where
        F: Fn(T) -> U,
    {
        TopList {
            exact_count: self.exact_count,
            items: self.items.into_iter().map(f).collect_vec(),
        }
    }

    /// Returns the exact count of items
    pub fn exact_count(&self) -> usize {
        self.exact_count
    }

    /// Returns the kept items
    pub fn items(&self) -> &[T] {
        &self.items
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_top_list_new() {
        let data = vec![1, 2, 3, 4, 5];
        let top = TopList::new(data.into_iter(), 3, 5);

        assert_eq!(top.exact_count(), 5);
        assert_eq!(top.items(), &[1, 2, 3]);
    }

    #[test]
    fn test_top_list_limit_larger_than_items() {
        let data = vec![1, 2, 3];
        let top = TopList::new(data.into_iter(), 5, 3);

        assert_eq!(top.exact_count(), 3);
        assert_eq!(top.items(), &[1, 2, 3]);
    }

    #[test]
    fn test_top_list_empty() {
        let data: Vec<i32> = vec![];
        let top = TopList::new(data.into_iter(), 5, 0);

        assert_eq!(top.exact_count(), 0);
        let empty: &[i32] = &[];
        assert_eq!(top.items(), empty);
    }

    #[test]
    fn test_top_list_map() {
        let data = vec![1, 2, 3];
        let top = TopList::new(data.into_iter(), 3, 5);
        let mapped = top.map(|x| x * 2);

        assert_eq!(mapped.exact_count(), 5);
        assert_eq!(mapped.items(), &[2, 4, 6]);
    }

    #[test]
    fn test_sync_message_to_message() {
        let sync_msg = SyncMessage::Round(round::RoundState::default());
        let json_str = sync_msg.to_message();

        assert!(json_str.contains("Round"));
        assert!(json_str.contains("idle"));
    }

    #[test]
    fn test_update_message_to_message() {
        let update_msg = UpdateMessage::Round(round::RoundState::default());
        let json_str = update_msg.to_message();

        assert!(json_str.contains("Round"));
        assert!(json_str.contains("timer_seconds"));
    }
}
