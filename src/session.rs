//! Communication seams between the game engine and connected clients
//!
//! This module defines the two traits that connect the engine to the
//! outside world. [`Tunnel`] is the push half: the engine uses it to
//! deliver update and synchronization messages to connected clients.
//! [`Fetch`] is the pull half: client state machines use it to read
//! game data on demand, typically when they connect, reconnect, or
//! react to an update that references data they do not hold yet.
//! Implementations might use WebSockets, Server-Sent Events, or plain
//! HTTP, or call the engine directly when everything runs in one
//! process.

use serde::Serialize;
use thiserror::Error;

use super::{
    SyncMessage, TopList, UpdateMessage,
    catalog::{Question, QuestionId, Quiz, QuizId},
    leaderboard::LeaderboardEntry,
    ledger::Response,
    round::RoundState,
};

/// Trait for sending messages through a communication tunnel
///
/// This trait abstracts the communication mechanism used to send messages
/// to connected clients.
pub trait Tunnel {
    /// Sends an update message to the client
    ///
    /// Update messages notify clients about changes that affect their
    /// current view or state.
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    fn send_message(&self, message: &UpdateMessage);

    /// Sends a state synchronization message to the client
    ///
    /// Sync messages are used to synchronize the client's state with
    /// the current game state, typically when they connect or reconnect.
    ///
    /// # Arguments
    ///
    /// * `state` - The synchronization message to send
    fn send_state(&self, state: &SyncMessage);

    /// Closes the communication tunnel
    ///
    /// This method should be called when the client disconnects or
    /// when the communication is no longer needed.
    fn close(self);
}

/// The connection to the game engine was lost or refused
///
/// Every [`Fetch`] method returns this error when the underlying
/// transport cannot complete the read. Client state machines treat it
/// as a signal to keep their last known state and retry later.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[error("connection to the game is lost")]
pub struct Disconnected;

/// Trait for reading game data on demand
///
/// While [`Tunnel`] pushes changes outward, `Fetch` lets clients pull
/// the data those changes refer to: the current round, question
/// content, recorded responses, and standings. Every method returns
/// [`Disconnected`] when the transport fails, so callers can
/// distinguish "the value does not exist" (`Ok(None)`) from "the read
/// itself failed".
pub trait Fetch {
    /// Reads the current shared round state
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if the transport fails.
    fn fetch_round(&self) -> Result<RoundState, Disconnected>;

    /// Reads a single question by id, `Ok(None)` if it does not exist
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if the transport fails.
    fn fetch_question(&self, question_id: QuestionId) -> Result<Option<Question>, Disconnected>;

    /// Reads all quizzes, ordered by creation time
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if the transport fails.
    fn fetch_quizzes(&self) -> Result<Vec<Quiz>, Disconnected>;

    /// Reads the questions of one quiz in their display order
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if the transport fails.
    fn fetch_questions(&self, quiz_id: QuizId) -> Result<Vec<Question>, Disconnected>;

    /// Reads every recorded response for one question
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if the transport fails.
    fn fetch_responses(&self, question_id: QuestionId) -> Result<Vec<Response>, Disconnected>;

    /// Reads how many responses one question has received
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if the transport fails.
    fn fetch_response_count(&self, question_id: QuestionId) -> Result<usize, Disconnected>;

    /// Reads the response a given participant recorded for a question
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if the transport fails.
    fn fetch_own_response(
        &self,
        question_id: QuestionId,
        player_name: &str,
    ) -> Result<Option<Response>, Disconnected>;

    /// Reads one quiz's ranked standings
    ///
    /// # Arguments
    ///
    /// * `quiz_id` - The quiz to rank
    /// * `limit` - Maximum number of entries to include
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if the transport fails.
    fn fetch_leaderboard(
        &self,
        quiz_id: QuizId,
        limit: usize,
    ) -> Result<TopList<LeaderboardEntry>, Disconnected>;
}
