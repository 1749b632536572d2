//! Scoring and on-demand standings
//!
//! Scores exist only as arithmetic over the answer ledger: nothing here is
//! ever stored. A correct answer is worth a base amount plus a speed bonus
//! that decays with elapsed time; standings group the ledger by participant
//! name and are recomputed on every request. The same module carries the
//! revealed question's per-option distribution and its fastest-correct
//! winner, since both are aggregations over the same rows.

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    TopList,
    catalog::Question,
    constants,
    ledger::Response,
};

/// The speed bonus left after a given elapsed time
///
/// One point of bonus is lost per [`constants::scoring::BONUS_DECAY_MILLIS`]
/// of elapsed time, never going below zero.
fn speed_bonus(elapsed_ms: u64) -> u64 {
    constants::scoring::MAX_SPEED_BONUS
        .saturating_sub(elapsed_ms / constants::scoring::BONUS_DECAY_MILLIS)
}

/// Points a correct answer earns for its speed
///
/// Used directly by the standings, where every recorded response already
/// passed its round's deadline at the time of the write.
fn correct_points(elapsed_ms: u64) -> u64 {
    constants::scoring::BASE_POINTS + speed_bonus(elapsed_ms)
}

/// Scores a single answer
///
/// Incorrect answers and answers past the countdown score zero; a correct
/// answer in time earns the base points plus the remaining speed bonus. The
/// result is always within `0..=1500`.
///
/// # Arguments
///
/// * `is_correct` - Whether the chosen option was the correct one
/// * `elapsed_ms` - Milliseconds between the round's start and the answer
/// * `timer_ms` - The round's countdown length in milliseconds
pub fn score(is_correct: bool, elapsed_ms: u64, timer_ms: u64) -> u64 {
    if !is_correct || elapsed_ms > timer_ms {
        return 0;
    }
    correct_points(elapsed_ms)
}

/// One participant's row in the standings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// The participant's display name
    pub player_name: String,
    /// Sum of scores over their correct answers
    pub total_score: u64,
    /// How many of their answers were correct
    pub correct_count: u64,
    /// Average elapsed milliseconds over all their answers, correct or not
    pub avg_time_ms: u64,
}

/// Running totals for one participant while ranking
#[derive(Default)]
struct Tally {
    total_score: u64,
    correct_count: u64,
    elapsed_sum: u64,
    response_count: u64,
}

/// Ranks a quiz's responses into descending standings
///
/// Responses are grouped by participant name in first-seen order; only
/// correct answers contribute points, while the elapsed-time average covers
/// every answer. The sort is stable, so participants on equal points keep
/// the order in which they first appear in the ledger.
///
/// # Arguments
///
/// * `responses` - Every response recorded against the quiz's questions, in
///   ledger order
/// * `limit` - How many rows to keep
///
/// # Returns
///
/// The top `limit` rows together with the exact participant count
pub fn rank<'a, I>(responses: I, limit: usize) -> TopList<LeaderboardEntry>
where
    I: IntoIterator<Item = &'a Response>,
{
    let mut order: Vec<(String, Tally)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for response in responses {
        let slot = match slots.get(response.player_name.as_str()) {
            Some(&slot) => slot,
            None => {
                order.push((response.player_name.clone(), Tally::default()));
                slots.insert(response.player_name.clone(), order.len() - 1);
                order.len() - 1
            }
        };
        let tally = &mut order[slot].1;
        tally.response_count += 1;
        tally.elapsed_sum += response.elapsed_ms;
        if response.is_correct {
            tally.correct_count += 1;
            tally.total_score += correct_points(response.elapsed_ms);
        }
    }

    let exact_count = order.len();
    let standings = order
        .into_iter()
        .map(|(player_name, tally)| LeaderboardEntry {
            player_name,
            total_score: tally.total_score,
            correct_count: tally.correct_count,
            avg_time_ms: tally.elapsed_sum / tally.response_count,
        })
        .sorted_by_key(|entry| std::cmp::Reverse(entry.total_score));
    TopList::new(standings, limit, exact_count)
}

/// The tally of one option of a revealed question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionTally {
    /// The option's index in the question's stored order
    pub option_index: usize,
    /// How many responses picked this option
    pub count: usize,
    /// This option's share of all responses, in percent
    pub percent: f64,
    /// Whether this is the correct option
    pub is_correct: bool,
}

/// Tallies a revealed question's responses per stored option
///
/// Responses whose selected index does not address an option are skipped in
/// the per-option counts but still part of the percentage denominator, the
/// same way the share of each option is measured against everyone who
/// answered.
///
/// # Arguments
///
/// * `question` - The revealed question
/// * `responses` - Its recorded responses
pub fn distribution(question: &Question, responses: &[&Response]) -> Vec<OptionTally> {
    let total = responses.len();
    let mut counts = vec![0usize; question.options.len()];
    for response in responses {
        if let Some(slot) = counts.get_mut(response.selected_index) {
            *slot += 1;
        }
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(option_index, count)| OptionTally {
            option_index,
            count,
            percent: if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            is_correct: option_index == question.correct_index,
        })
        .collect_vec()
}

/// The fastest correct response, if anyone got it right
///
/// Ties on elapsed time go to the earlier ledger row.
///
/// # Arguments
///
/// * `responses` - A question's recorded responses in ledger order
pub fn fastest_correct<'a>(responses: &[&'a Response]) -> Option<&'a Response> {
    responses
        .iter()
        .filter(|response| response.is_correct)
        .min_by_key(|response| response.elapsed_ms)
        .copied()
}
