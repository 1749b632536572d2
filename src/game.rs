//! Core game logic and state management
//!
//! This module contains the main game struct and logic for running a
//! quiz session: catalog editing, question activation, round status
//! flow, answer acceptance, response clearing, standings, and
//! real-time fan-out to every connected observer.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::{Duration, SystemTime};

use super::{
    SyncMessage, TopList, UpdateMessage,
    catalog::{self, Bilingual, Catalog, Question, QuestionDraft, QuestionId, Quiz, QuizId},
    constants::round as round_constants,
    leaderboard::{self, LeaderboardEntry},
    ledger::{AnswerLedger, Response, SubmitError},
    observer::{self, Id, Observers, Role, RoleKind},
    round::{self, RoundState, Status},
    session::{Disconnected, Fetch, Tunnel},
};

/// The main game session struct
///
/// This struct owns the complete state of one quiz session: the
/// editable content catalog, the single shared round record, the
/// ledger of recorded answers, and the registry of connected
/// observers. Every mutation flows through it so that the matching
/// broadcasts always go out.
#[derive(Default, Serialize, Deserialize)]
pub struct Game {
    /// Editable quizzes and their questions
    catalog: Catalog,
    /// The single shared round record all observers follow
    pub round: RoundState,
    /// Every recorded answer with its duplicate claims
    ledger: AnswerLedger,
    /// Registry of connected participants, displays, and moderators
    pub observers: Observers,
}

impl Debug for Game {
    /// Custom debug implementation that avoids printing large amounts of data
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("round", &self.round)
            .finish_non_exhaustive()
    }
}

/// Errors that can occur when handling moderator requests
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The referenced quiz does not exist
    #[error("quiz does not exist")]
    UnknownQuiz,
    /// The referenced question does not exist
    #[error("question does not exist")]
    UnknownQuestion,
    /// The question does not belong to the selected quiz
    #[error("question does not belong to the selected quiz")]
    QuizMismatch,
    /// The countdown length is outside the allowed range
    #[error("timer must be between 1 and 240 seconds")]
    TimerOutOfRange,
    /// The active status can only be entered by activating a question
    #[error("a question must be selected before activating")]
    MissingQuestion,
    /// The correct answer index is outside the options list
    #[error("correct answer index is out of range")]
    CorrectIndexOutOfRange,
    /// The quiz or question content failed validation
    #[error("invalid content: {0}")]
    InvalidContent(String),
}

impl From<catalog::Error> for ControlError {
    fn from(error: catalog::Error) -> Self {
        match error {
            catalog::Error::UnknownQuiz => Self::UnknownQuiz,
            catalog::Error::UnknownQuestion => Self::UnknownQuestion,
            catalog::Error::CorrectIndexOutOfRange => Self::CorrectIndexOutOfRange,
            catalog::Error::Invalid(message) => Self::InvalidContent(message),
        }
    }
}

impl From<round::TransitionError> for ControlError {
    fn from(error: round::TransitionError) -> Self {
        match error {
            round::TransitionError::ActiveRequiresQuestion => Self::MissingQuestion,
        }
    }
}

/// Outcome of a participant's own submission
///
/// Delivered only to the submitting participant, so their device can
/// lock in the answer or explain the refusal.
#[derive(Debug, Serialize, Clone)]
pub enum SubmitFeedback {
    /// The answer was recorded
    Accepted(Response),
    /// The answer was refused
    Rejected(SubmitError),
}

/// Result of clearing recorded responses
///
/// Lists each quiz that was processed together with how many response
/// rows it lost.
#[derive(Debug, Serialize, Clone, Default)]
pub struct ClearReport {
    /// Quizzes whose responses were removed, with the row count for each
    pub cleared: Vec<(QuizId, usize)>,
}

impl ClearReport {
    /// Total number of response rows removed across all quizzes
    pub fn total(&self) -> usize {
        self.cleared.iter().map(|(_, count)| count).sum()
    }
}

/// Outcome of a moderator's own control request
///
/// Successful requests that change the round are answered by the round
/// broadcast itself; this feedback covers refusals and the clearing
/// report, which has no broadcast.
#[derive(Debug, Serialize, Clone)]
pub enum ControlFeedback {
    /// The request was refused and nothing changed
    Rejected(ControlError),
    /// Responses were cleared as requested
    Cleared(ClearReport),
}

/// Requests the moderator console can send
#[derive(Debug, Deserialize, Clone)]
pub enum ControlRequest {
    /// Put a question in play and start its countdown
    SetActiveQuestion {
        /// The question to run
        question_id: QuestionId,
        /// The quiz the question must belong to
        quiz_id: QuizId,
        /// Countdown length in seconds
        timer_seconds: u64,
    },
    /// Move the shared round to a new status
    UpdateStatus(Status),
    /// Remove recorded responses for one quiz
    ClearResponses(QuizId),
    /// Remove recorded responses for every quiz
    ClearAllResponses,
    /// Create a quiz, or retitle an existing one
    UpsertQuiz {
        /// Existing quiz to update, or `None` to create one
        id: Option<QuizId>,
        /// The quiz title in both languages
        title: Bilingual,
    },
    /// Delete a quiz, its questions, and their responses
    DeleteQuiz(QuizId),
    /// Create or update a question
    UpsertQuestion {
        /// Existing question to update, or `None` to create one
        id: Option<QuestionId>,
        /// The quiz the question belongs to
        quiz_id: QuizId,
        /// The question content
        draft: QuestionDraft,
    },
    /// Delete a question and its responses
    DeleteQuestion(QuestionId),
}

/// A participant's answer to the active question
#[derive(Debug, Deserialize, Clone)]
pub struct SubmitRequest {
    /// The question being answered
    pub question_id: QuestionId,
    /// The chosen option, as an index into the original option order
    pub selected_index: usize,
}

/// Messages received from observers over the wire
///
/// This enum categorizes incoming messages based on the sender's role,
/// ensuring that only appropriate messages are processed from each
/// observer.
#[derive(Debug, Deserialize, Clone)]
pub enum IncomingMessage {
    /// Messages from the moderator console
    Moderator(ControlRequest),
    /// Messages from participants
    Participant(SubmitRequest),
}

impl IncomingMessage {
    /// Validates that a message matches the sender's role
    ///
    /// # Arguments
    ///
    /// * `sender_kind` - The role of the observer sending the message
    ///
    /// # Returns
    ///
    /// `true` if the message type matches the sender's role
    fn follows(&self, sender_kind: RoleKind) -> bool {
        matches!(
            (self, sender_kind),
            (IncomingMessage::Moderator(_), RoleKind::Moderator)
                | (IncomingMessage::Participant(_), RoleKind::Participant)
        )
    }
}

impl Game {
    /// Registers an observer and synchronizes them with the current state
    ///
    /// A freshly joined observer immediately receives a sync message so
    /// its view matches everyone already connected, no matter where in
    /// the round lifecycle the join happens.
    ///
    /// # Arguments
    ///
    /// * `observer_id` - The unique ID for the observer
    /// * `role` - The requested role
    /// * `tunnel_finder` - Function to retrieve the tunnel for a given ID
    ///
    /// # Errors
    ///
    /// Returns an [`observer::Error`] if a participant name fails
    /// validation.
    pub fn add_observer<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        observer_id: Id,
        role: Role,
        tunnel_finder: F,
    ) -> Result<(), observer::Error> {
        self.observers.add_observer(observer_id, role)?;
        self.sync_observer(observer_id, tunnel_finder);
        Ok(())
    }

    /// Resynchronizes an observer's view with the current round state
    ///
    /// Used on reconnects and whenever a client suspects it missed
    /// updates.
    ///
    /// # Arguments
    ///
    /// * `observer_id` - The observer to synchronize
    /// * `tunnel_finder` - Function to retrieve the tunnel for a given ID
    pub fn sync_observer<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        observer_id: Id,
        tunnel_finder: F,
    ) {
        self.observers.send_state(
            &SyncMessage::Round(self.round.clone()),
            observer_id,
            tunnel_finder,
        );
    }

    /// Removes an observer, closing their tunnel and releasing any feed
    ///
    /// # Arguments
    ///
    /// * `observer_id` - The observer to remove
    /// * `tunnel_finder` - Function to retrieve the tunnel for a given ID
    pub fn remove_observer<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        observer_id: Id,
        tunnel_finder: F,
    ) {
        self.observers.remove_observer(&observer_id, tunnel_finder);
    }

    /// Handles an incoming message from an observer
    ///
    /// Messages from unknown observers, and messages whose type does
    /// not match the sender's role, are dropped without a reply.
    /// Refusals of well-formed requests are reported back to the
    /// sender alone.
    ///
    /// # Arguments
    ///
    /// * `observer_id` - The sender
    /// * `message` - The received message
    /// * `now` - The authoritative clock reading for this message
    /// * `tunnel_finder` - Function to retrieve tunnels for observers
    pub fn receive_message<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        observer_id: Id,
        message: IncomingMessage,
        now: SystemTime,
        tunnel_finder: F,
    ) {
        let Some(role) = self.observers.get_role(observer_id) else {
            return;
        };

        if !message.follows(role.kind()) {
            return;
        }

        match message {
            IncomingMessage::Moderator(request) => {
                self.handle_control(observer_id, request, now, &tunnel_finder);
            }
            IncomingMessage::Participant(request) => {
                let Role::Participant { name } = role else {
                    return;
                };
                self.handle_submit(observer_id, &name, &request, now, &tunnel_finder);
            }
        }
    }

    /// Executes a moderator request and reports the outcome to the sender
    fn handle_control<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        observer_id: Id,
        request: ControlRequest,
        now: SystemTime,
        tunnel_finder: &F,
    ) {
        let outcome = match request {
            ControlRequest::SetActiveQuestion {
                question_id,
                quiz_id,
                timer_seconds,
            } => self
                .set_active_question(question_id, quiz_id, timer_seconds, now, tunnel_finder)
                .map(|()| None),
            ControlRequest::UpdateStatus(status) => self
                .update_round_status(status, tunnel_finder)
                .map(|()| None),
            ControlRequest::ClearResponses(quiz_id) => {
                self.clear_responses(quiz_id).map(|count| {
                    Some(ClearReport {
                        cleared: vec![(quiz_id, count)],
                    })
                })
            }
            ControlRequest::ClearAllResponses => Ok(Some(self.clear_all_responses())),
            ControlRequest::UpsertQuiz { id, title } => {
                self.upsert_quiz(id, title, now).map(|_| None)
            }
            ControlRequest::DeleteQuiz(quiz_id) => {
                self.delete_quiz(quiz_id, tunnel_finder).map(|()| None)
            }
            ControlRequest::UpsertQuestion { id, quiz_id, draft } => {
                self.upsert_question(id, quiz_id, draft).map(|_| None)
            }
            ControlRequest::DeleteQuestion(question_id) => self
                .delete_question(question_id, tunnel_finder)
                .map(|()| None),
        };

        match outcome {
            Ok(Some(report)) => self.observers.send_message(
                &UpdateMessage::Control(ControlFeedback::Cleared(report)),
                observer_id,
                tunnel_finder,
            ),
            Ok(None) => {}
            Err(error) => self.observers.send_message(
                &UpdateMessage::Control(ControlFeedback::Rejected(error)),
                observer_id,
                tunnel_finder,
            ),
        }
    }

    /// Records a participant's answer and fans out the results
    fn handle_submit<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        observer_id: Id,
        player_name: &str,
        request: &SubmitRequest,
        now: SystemTime,
        tunnel_finder: &F,
    ) {
        match self.submit(
            player_name,
            request.question_id,
            request.selected_index,
            now,
        ) {
            Ok(response) => {
                self.observers.publish_answer(&response, tunnel_finder);
                self.observers.send_message(
                    &UpdateMessage::Submission(SubmitFeedback::Accepted(response)),
                    observer_id,
                    tunnel_finder,
                );
            }
            Err(error) => self.observers.send_message(
                &UpdateMessage::Submission(SubmitFeedback::Rejected(error)),
                observer_id,
                tunnel_finder,
            ),
        }
    }

    /// Puts a question in play and broadcasts the new round state
    ///
    /// Validates that the question exists, belongs to the given quiz,
    /// and that the countdown length is within bounds, then enters the
    /// active status with a fresh shuffle seed and start timestamp.
    /// This is the only path into the active status.
    ///
    /// # Arguments
    ///
    /// * `question_id` - The question to run
    /// * `quiz_id` - The quiz the question must belong to
    /// * `timer_seconds` - Countdown length in seconds
    /// * `now` - The authoritative start timestamp
    /// * `tunnel_finder` - Function to retrieve tunnels for observers
    ///
    /// # Errors
    ///
    /// Returns a [`ControlError`] and leaves the round untouched if any
    /// validation fails.
    pub fn set_active_question<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        question_id: QuestionId,
        quiz_id: QuizId,
        timer_seconds: u64,
        now: SystemTime,
        tunnel_finder: F,
    ) -> Result<(), ControlError> {
        let question = self
            .catalog
            .question(question_id)
            .ok_or(ControlError::UnknownQuestion)?;
        if question.quiz_id != quiz_id {
            return Err(ControlError::QuizMismatch);
        }
        if !(round_constants::MIN_TIMER_SECONDS..=round_constants::MAX_TIMER_SECONDS)
            .contains(&timer_seconds)
        {
            return Err(ControlError::TimerOutOfRange);
        }

        self.round.activate(
            question_id,
            quiz_id,
            Duration::from_secs(timer_seconds),
            fastrand::u32(..),
            now,
        );
        self.broadcast_round(tunnel_finder);
        Ok(())
    }

    /// Moves the round to a non-active status and broadcasts it
    ///
    /// # Arguments
    ///
    /// * `status` - The status to enter
    /// * `tunnel_finder` - Function to retrieve tunnels for observers
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::MissingQuestion`] when asked to enter the
    /// active status, which only
    /// [`set_active_question`](Game::set_active_question) can do.
    pub fn update_round_status<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        status: Status,
        tunnel_finder: F,
    ) -> Result<(), ControlError> {
        self.round.transition(status)?;
        self.broadcast_round(tunnel_finder);
        Ok(())
    }

    /// Records an answer to the active question
    ///
    /// The answer is judged against the question's original option
    /// order; clients that shuffle their display map the choice back
    /// before submitting. Correctness and the elapsed time are frozen
    /// into the response at acceptance.
    ///
    /// # Arguments
    ///
    /// * `player_name` - The participant's display name
    /// * `question_id` - The question being answered
    /// * `selected_index` - The chosen option in original order
    /// * `now` - The authoritative clock reading
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Duplicate`] if this participant already
    /// answered this question, or [`SubmitError::Late`] if the question
    /// is not live or its deadline has passed.
    pub fn submit(
        &mut self,
        player_name: &str,
        question_id: QuestionId,
        selected_index: usize,
        now: SystemTime,
    ) -> Result<Response, SubmitError> {
        let Some(question) = self.catalog.question(question_id) else {
            return Err(SubmitError::Late);
        };
        self.ledger
            .submit(&self.round, question, player_name, selected_index, now)
    }

    /// Removes recorded responses for one quiz
    ///
    /// # Arguments
    ///
    /// * `quiz_id` - The quiz whose responses to remove
    ///
    /// # Returns
    ///
    /// How many responses were removed
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::UnknownQuiz`] if the quiz does not exist.
    pub fn clear_responses(&mut self, quiz_id: QuizId) -> Result<usize, ControlError> {
        if !self.catalog.has_quiz(quiz_id) {
            return Err(ControlError::UnknownQuiz);
        }
        let question_ids = self.catalog.question_ids_of(quiz_id);
        Ok(self.ledger.clear_for_questions(&question_ids))
    }

    /// Removes recorded responses for every quiz, one quiz at a time
    ///
    /// Each quiz is processed independently, and the report lists the
    /// removed row count per quiz.
    pub fn clear_all_responses(&mut self) -> ClearReport {
        let quiz_ids = self
            .catalog
            .quizzes()
            .iter()
            .map(|quiz| quiz.id)
            .collect::<Vec<_>>();

        let mut report = ClearReport::default();
        for quiz_id in quiz_ids {
            if let Ok(count) = self.clear_responses(quiz_id) {
                report.cleared.push((quiz_id, count));
            }
        }
        report
    }

    /// Ranks one quiz's recorded responses into standings
    ///
    /// Only responses to the quiz's own questions count; an unknown
    /// quiz yields empty standings.
    ///
    /// # Arguments
    ///
    /// * `quiz_id` - The quiz to rank
    /// * `limit` - Maximum number of entries to include
    pub fn get_leaderboard(&self, quiz_id: QuizId, limit: usize) -> TopList<LeaderboardEntry> {
        let question_ids = self.catalog.question_ids_of(quiz_id);
        leaderboard::rank(self.ledger.for_questions(&question_ids), limit)
    }

    /// Creates a quiz, or retitles an existing one
    ///
    /// # Arguments
    ///
    /// * `id` - Existing quiz to update, or `None` to create one
    /// * `title` - The quiz title in both languages
    /// * `now` - Creation timestamp for new quizzes
    ///
    /// # Errors
    ///
    /// Returns a [`ControlError`] if the quiz is unknown or the title
    /// fails validation.
    pub fn upsert_quiz(
        &mut self,
        id: Option<QuizId>,
        title: Bilingual,
        now: SystemTime,
    ) -> Result<QuizId, ControlError> {
        Ok(self.catalog.upsert_quiz(id, title, now)?)
    }

    /// Deletes a quiz, cascading to its questions and their responses
    ///
    /// If the shared round currently references the quiz, the round is
    /// stopped back to idle, its quiz reference is cleared, and the
    /// change is broadcast.
    ///
    /// # Arguments
    ///
    /// * `quiz_id` - The quiz to delete
    /// * `tunnel_finder` - Function to retrieve tunnels for observers
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::UnknownQuiz`] if the quiz does not exist.
    pub fn delete_quiz<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        quiz_id: QuizId,
        tunnel_finder: F,
    ) -> Result<(), ControlError> {
        let removed = self.catalog.delete_quiz(quiz_id)?;
        self.ledger.clear_for_questions(&removed);

        if self.round.quiz_id == Some(quiz_id) {
            self.round.deactivate();
            self.round.quiz_id = None;
            self.broadcast_round(tunnel_finder);
        }
        Ok(())
    }

    /// Creates or updates a question
    ///
    /// # Arguments
    ///
    /// * `id` - Existing question to update, or `None` to create one
    /// * `quiz_id` - The quiz the question belongs to
    /// * `draft` - The question content
    ///
    /// # Errors
    ///
    /// Returns a [`ControlError`] if the quiz or question is unknown,
    /// the content fails validation, or the correct answer index is out
    /// of range.
    pub fn upsert_question(
        &mut self,
        id: Option<QuestionId>,
        quiz_id: QuizId,
        draft: QuestionDraft,
    ) -> Result<QuestionId, ControlError> {
        Ok(self.catalog.upsert_question(id, quiz_id, draft)?)
    }

    /// Deletes a question, cascading to its responses
    ///
    /// If the question is the one currently in play, the round is
    /// stopped back to idle and the change is broadcast; the quiz
    /// reference stays.
    ///
    /// # Arguments
    ///
    /// * `question_id` - The question to delete
    /// * `tunnel_finder` - Function to retrieve tunnels for observers
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::UnknownQuestion`] if the question does
    /// not exist.
    pub fn delete_question<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        question_id: QuestionId,
        tunnel_finder: F,
    ) -> Result<(), ControlError> {
        self.catalog.delete_question(question_id)?;
        self.ledger.clear_for_questions(&[question_id]);

        if self.round.question_id == Some(question_id) {
            self.round.deactivate();
            self.broadcast_round(tunnel_finder);
        }
        Ok(())
    }

    /// Broadcasts the current round state to every observer
    fn broadcast_round<T: Tunnel, F: Fn(Id) -> Option<T>>(&self, tunnel_finder: F) {
        self.observers
            .announce(&UpdateMessage::Round(self.round.clone()), tunnel_finder);
    }
}

/// In-process reads for clients living in the same process as the game
///
/// Networked deployments put a transport behind [`Fetch`] instead; this
/// implementation is the reference for what each read returns.
impl Fetch for Game {
    fn fetch_round(&self) -> Result<RoundState, Disconnected> {
        Ok(self.round.clone())
    }

    fn fetch_question(&self, question_id: QuestionId) -> Result<Option<Question>, Disconnected> {
        Ok(self.catalog.question(question_id).cloned())
    }

    fn fetch_quizzes(&self) -> Result<Vec<Quiz>, Disconnected> {
        Ok(self.catalog.quizzes().into_iter().cloned().collect())
    }

    fn fetch_questions(&self, quiz_id: QuizId) -> Result<Vec<Question>, Disconnected> {
        Ok(self
            .catalog
            .questions_of(quiz_id)
            .into_iter()
            .cloned()
            .collect())
    }

    fn fetch_responses(&self, question_id: QuestionId) -> Result<Vec<Response>, Disconnected> {
        Ok(self
            .ledger
            .for_question(question_id)
            .into_iter()
            .cloned()
            .collect())
    }

    fn fetch_response_count(&self, question_id: QuestionId) -> Result<usize, Disconnected> {
        Ok(self.ledger.count_for(question_id))
    }

    fn fetch_own_response(
        &self,
        question_id: QuestionId,
        player_name: &str,
    ) -> Result<Option<Response>, Disconnected> {
        Ok(self.ledger.own_response(question_id, player_name).cloned())
    }

    fn fetch_leaderboard(
        &self,
        quiz_id: QuizId,
        limit: usize,
    ) -> Result<TopList<LeaderboardEntry>, Disconnected> {
        Ok(self.get_leaderboard(quiz_id, limit))
    }
}
