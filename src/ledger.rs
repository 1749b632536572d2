//! Answer submissions and their authoritative record
//!
//! Every answer a participant submits lands here, subject to the two rules
//! the store enforces at the point of write: at most one response per
//! question and participant name, and nothing after the round's deadline.
//! Elapsed time and correctness are computed here from the write-side clock
//! and the stored question, never trusted from the submitting device.

use std::{
    collections::HashSet,
    fmt::Display,
    str::FromStr,
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use uuid::Uuid;
use web_time::SystemTime;

use crate::{
    catalog::{Question, QuestionId},
    round::RoundState,
    timing,
};

/// A unique identifier for a response
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct ResponseId(Uuid);

impl ResponseId {
    /// Creates a new random response ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ResponseId {
    /// Creates a new random response ID (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ResponseId {
    /// Formats the ID as a UUID string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ResponseId {
    type Err = uuid::Error;

    /// Parses a response ID from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A recorded answer to a question
///
/// The selected index always refers to the question's stored option order,
/// not the shuffled order the participant saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Unique identifier of the response
    pub id: ResponseId,
    /// The question this answers
    pub question_id: QuestionId,
    /// Display name of the participant who answered
    pub player_name: String,
    /// The chosen option, as an index into the stored option order
    pub selected_index: usize,
    /// Whether the chosen option was the correct one
    pub is_correct: bool,
    /// Milliseconds between the round's start and this write
    pub elapsed_ms: u64,
}

/// Ways a submission can be refused
///
/// Both are terminal for the participant: neither is retried, and neither
/// creates a response.
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// This participant already answered this question
    #[error("already answered this question")]
    Duplicate,
    /// The submission arrived after the round's deadline
    #[error("the time for answering has expired")]
    Late,
}

/// Serialization helper for the AnswerLedger struct
#[derive(Deserialize)]
struct AnswerLedgerSerde {
    responses: Vec<Response>,
}

/// The append-only record of submitted answers
///
/// Responses keep their arrival order, which later aggregation relies on for
/// stable ordering. The uniqueness set is rebuilt on deserialization rather
/// than serialized.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(from = "AnswerLedgerSerde")]
pub struct AnswerLedger {
    /// All responses in arrival order
    responses: Vec<Response>,

    /// Uniqueness guard over (question, participant name)
    #[serde(skip_serializing)]
    claimed: HashSet<(QuestionId, String)>,
}

impl From<AnswerLedgerSerde> for AnswerLedger {
    /// Reconstructs the AnswerLedger from serialized data
    ///
    /// This rebuilds the uniqueness set from the recorded responses, which is
    /// necessary since the set is not serialized.
    fn from(serde: AnswerLedgerSerde) -> Self {
        let AnswerLedgerSerde { responses } = serde;
        let claimed = responses
            .iter()
            .map(|response| (response.question_id, response.player_name.clone()))
            .collect();
        Self { responses, claimed }
    }
}

impl AnswerLedger {
    /// Records an answer, enforcing uniqueness and the round's deadline
    ///
    /// The duplicate check runs before the deadline check, so a participant
    /// who already answered is told so even once time has run out. A
    /// submission for anything other than the currently active question is
    /// late by definition. On success the response's elapsed time is
    /// `now - started_at` and its correctness comes from the stored question.
    ///
    /// # Arguments
    ///
    /// * `round` - The current round record
    /// * `question` - The stored question being answered
    /// * `player_name` - The participant's display name
    /// * `selected_index` - The chosen option in the stored option order
    /// * `now` - The write-side clock reading
    ///
    /// # Returns
    ///
    /// The recorded response
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Duplicate`] if this participant already
    /// answered this question, or [`SubmitError::Late`] if the deadline has
    /// passed or the question is not the active one.
    pub fn submit(
        &mut self,
        round: &RoundState,
        question: &Question,
        player_name: &str,
        selected_index: usize,
        now: SystemTime,
    ) -> Result<Response, SubmitError> {
        if self
            .claimed
            .contains(&(question.id, player_name.to_owned()))
        {
            return Err(SubmitError::Duplicate);
        }
        if !round.is_active_for(question.id) {
            return Err(SubmitError::Late);
        }
        let Some(started_at) = round.started_at else {
            return Err(SubmitError::Late);
        };
        let elapsed_ms = timing::elapsed_millis(started_at, now);
        if elapsed_ms > round.timer_millis() {
            return Err(SubmitError::Late);
        }

        let response = Response {
            id: ResponseId::new(),
            question_id: question.id,
            player_name: player_name.to_owned(),
            selected_index,
            is_correct: selected_index == question.correct_index,
            elapsed_ms,
        };
        self.claimed
            .insert((question.id, player_name.to_owned()));
        self.responses.push(response.clone());
        Ok(response)
    }

    /// Removes every response to the given questions
    ///
    /// Freeing the (question, name) claims as well, so the same participants
    /// can answer those questions again in a later round.
    ///
    /// # Arguments
    ///
    /// * `question_ids` - The questions whose responses to remove
    ///
    /// # Returns
    ///
    /// How many responses were removed
    pub fn clear_for_questions(&mut self, question_ids: &[QuestionId]) -> usize {
        let doomed: HashSet<QuestionId> = question_ids.iter().copied().collect();
        let before = self.responses.len();
        self.responses
            .retain(|response| !doomed.contains(&response.question_id));
        self.claimed.retain(|(question_id, _)| !doomed.contains(question_id));
        before - self.responses.len()
    }

    /// All responses to a question, in arrival order
    ///
    /// # Arguments
    ///
    /// * `question_id` - The question whose responses to list
    pub fn for_question(&self, question_id: QuestionId) -> Vec<&Response> {
        self.responses
            .iter()
            .filter(|response| response.question_id == question_id)
            .collect_vec()
    }

    /// All responses to any of the given questions, in arrival order
    ///
    /// # Arguments
    ///
    /// * `question_ids` - The questions whose responses to list
    pub fn for_questions(&self, question_ids: &[QuestionId]) -> Vec<&Response> {
        let wanted: HashSet<QuestionId> = question_ids.iter().copied().collect();
        self.responses
            .iter()
            .filter(|response| wanted.contains(&response.question_id))
            .collect_vec()
    }

    /// How many responses a question has received
    ///
    /// # Arguments
    ///
    /// * `question_id` - The question whose responses to count
    pub fn count_for(&self, question_id: QuestionId) -> usize {
        self.responses
            .iter()
            .filter(|response| response.question_id == question_id)
            .count()
    }

    /// A participant's own response to a question, if they answered
    ///
    /// # Arguments
    ///
    /// * `question_id` - The question to look up
    /// * `player_name` - The participant's display name
    pub fn own_response(&self, question_id: QuestionId, player_name: &str) -> Option<&Response> {
        self.responses.iter().find(|response| {
            response.question_id == question_id && response.player_name == player_name
        })
    }

    /// Total number of recorded responses
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Whether the ledger holds no responses
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}
