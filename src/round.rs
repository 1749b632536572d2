//! The authoritative round record and its lifecycle
//!
//! A game instance has exactly one round record. The moderator drives it
//! through `idle -> active -> revealed -> leaderboard -> idle`, can stop it
//! back to idle from anywhere, and can re-activate a new question from any
//! status. Every mutation is broadcast whole to all observers; clients keep
//! no authority of their own and rebuild their view from each broadcast.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;
use web_time::SystemTime;

use crate::{
    catalog::{QuestionId, QuizId},
    constants, timing,
};

/// Lifecycle status of the round
///
/// Serialized as the lowercase status strings clients match on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// No question is running; clients show their waiting screens
    #[default]
    Idle,
    /// A question is live and accepting answers under the countdown
    Active,
    /// The question is frozen and its results are shown
    Revealed,
    /// The quiz standings are shown
    Leaderboard,
}

/// Errors that can occur when transitioning the round status
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// The active status carries a question, start time, and seed, so it can
    /// only be entered by activating a question
    #[error("the active status requires activating a question")]
    ActiveRequiresQuestion,
}

/// The singleton round record broadcast to every observer
///
/// While active, `question_id`, `quiz_id`, and `started_at` are always
/// populated; stopping back to idle clears the question reference and start
/// time but keeps the quiz reference so standings can still be pulled up.
#[serde_with::serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    /// Where the round is in its lifecycle
    pub status: Status,
    /// The question currently in play, if any
    pub question_id: Option<QuestionId>,
    /// The quiz the round is drawing questions from, if any
    pub quiz_id: Option<QuizId>,
    /// When the round entered the active status
    pub started_at: Option<SystemTime>,
    /// Length of the answer countdown
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(rename = "timer_seconds")]
    pub timer: Duration,
    /// Seed every client shuffles the active question's options with
    pub shuffle_seed: u32,
}

impl Default for RoundState {
    /// The idle record a fresh game instance starts with
    fn default() -> Self {
        Self {
            status: Status::Idle,
            question_id: None,
            quiz_id: None,
            started_at: None,
            timer: Duration::from_secs(constants::round::DEFAULT_TIMER_SECONDS),
            shuffle_seed: 0,
        }
    }
}

impl RoundState {
    /// Puts a question in play, entering the active status from any status
    ///
    /// Assigns the question and quiz references, the countdown length, a
    /// fresh shuffle seed, and the authoritative start timestamp in one step,
    /// which is why this is the only way into the active status.
    ///
    /// # Arguments
    ///
    /// * `question_id` - The question to run
    /// * `quiz_id` - The quiz it belongs to
    /// * `timer` - Length of the answer countdown
    /// * `shuffle_seed` - Seed clients will shuffle the options with
    /// * `now` - The authoritative start timestamp
    pub fn activate(
        &mut self,
        question_id: QuestionId,
        quiz_id: QuizId,
        timer: Duration,
        shuffle_seed: u32,
        now: SystemTime,
    ) {
        self.status = Status::Active;
        self.question_id = Some(question_id);
        self.quiz_id = Some(quiz_id);
        self.started_at = Some(now);
        self.timer = timer;
        self.shuffle_seed = shuffle_seed;
    }

    /// Moves the round to a non-active status
    ///
    /// Revealing and showing the leaderboard change the status and nothing
    /// else, freezing the question in place. Stopping to idle clears the
    /// question reference and start time; the quiz reference stays. The
    /// status graph is otherwise not enforced here: which transitions are
    /// offered is the moderator console's concern.
    ///
    /// # Arguments
    ///
    /// * `to` - The status to enter
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::ActiveRequiresQuestion`] when asked to
    /// enter the active status, which only [`RoundState::activate`] can do.
    pub fn transition(&mut self, to: Status) -> Result<(), TransitionError> {
        match to {
            Status::Active => Err(TransitionError::ActiveRequiresQuestion),
            Status::Idle => {
                self.deactivate();
                Ok(())
            }
            Status::Revealed | Status::Leaderboard => {
                self.status = to;
                Ok(())
            }
        }
    }

    /// Stops the round back to idle
    ///
    /// Clears the question reference and start time. The quiz reference
    /// stays so a console keeps its selection across stops.
    pub fn deactivate(&mut self) {
        self.status = Status::Idle;
        self.question_id = None;
        self.started_at = None;
    }

    /// Whether this question is live and accepting answers
    ///
    /// # Arguments
    ///
    /// * `question_id` - The question a submission or notification refers to
    pub fn is_active_for(&self, question_id: QuestionId) -> bool {
        self.status == Status::Active && self.question_id == Some(question_id)
    }

    /// Time left on the countdown, zero whenever no question is live
    ///
    /// # Arguments
    ///
    /// * `now` - The local clock reading
    pub fn remaining(&self, now: SystemTime) -> Duration {
        match (self.status, self.started_at) {
            (Status::Active, Some(started_at)) => timing::remaining(started_at, self.timer, now),
            _ => Duration::ZERO,
        }
    }

    /// Milliseconds since the round started, if it has a start timestamp
    ///
    /// # Arguments
    ///
    /// * `now` - The local clock reading
    pub fn elapsed_millis(&self, now: SystemTime) -> Option<u64> {
        self.started_at
            .map(|started_at| timing::elapsed_millis(started_at, now))
    }

    /// The countdown length in whole milliseconds
    pub fn timer_millis(&self) -> u64 {
        self.timer.as_millis() as u64
    }
}
