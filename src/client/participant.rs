//! State machine for a participant's answering device
//!
//! A participant joins under a chosen name and answers the live
//! question by tapping one of the shuffled options. After the reveal
//! they see whether they were right, and the standings screen marks
//! their own row. The machine tracks exactly one answer per question
//! run: a fresh activation reopens it, and reconnecting recovers a
//! previously recorded answer by name.

use web_time::{Duration, SystemTime};

use super::ClientCore;
use crate::{
    TopList, UpdateMessage,
    catalog::{Bilingual, QuestionId},
    constants::{cadence, leaderboard::DEFAULT_LIMIT},
    game::{SubmitFeedback, SubmitRequest},
    leaderboard::{self, LeaderboardEntry},
    ledger::{Response, SubmitError},
    round::{RoundState, Status},
    session::{Disconnected, Fetch},
    timing,
};

/// Where this participant's answer for the current question run stands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AnswerState {
    /// No answer sent yet
    #[default]
    Open,
    /// An answer is on its way to the engine
    Pending,
    /// The engine recorded this response
    Submitted(Response),
    /// Refused: a response was already recorded under this name
    Duplicate,
    /// Refused: the deadline had passed
    Late,
}

impl AnswerState {
    /// Whether the device should stop offering the option buttons
    pub fn is_locked(&self) -> bool {
        !matches!(self, AnswerState::Open)
    }
}

/// What the participant's device should render
#[derive(Debug, Clone)]
pub enum Screen {
    /// Nothing to answer; wait for the moderator
    Waiting,
    /// A question is live
    Question {
        /// The question prompt
        prompt: Bilingual,
        /// Options in this participant's shuffled order, with letters
        options: Vec<(char, Bilingual)>,
        /// Whole seconds left on the countdown
        seconds_left: u64,
        /// Whether the countdown is in its final stretch
        urgent: bool,
        /// Whether an answer is already locked in
        answered: bool,
    },
    /// The correct answer has been revealed
    Result {
        /// Whether this participant was right, if they answered
        correct: Option<bool>,
        /// Points earned on this question
        points: u64,
        /// The correct option's text
        answer: Bilingual,
    },
    /// The quiz standings, with this participant's own row marked
    Standings {
        /// The ranked standings rows
        list: TopList<LeaderboardEntry>,
        /// Position of this participant's row among the shown rows
        own_position: Option<usize>,
    },
}

/// The state machine behind a participant's device
#[derive(Debug, Default)]
pub struct ParticipantClient {
    core: ClientCore,
    name: String,
    answer: AnswerState,
    standings: Option<TopList<LeaderboardEntry>>,
    /// Identifies one question run; a change reopens the answer
    run: (Option<QuestionId>, Option<SystemTime>),
}

impl ParticipantClient {
    /// How often the device should re-render the countdown
    pub const TICK: Duration = Duration::from_millis(cadence::PARTICIPANT_TICK_MILLIS);

    /// Creates a client for a participant playing under the given name
    ///
    /// The engine validates the name at registration; the client keeps
    /// it only to recognize its own recorded responses.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The name this participant plays under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This participant's answer state for the current question run
    pub fn answer(&self) -> &AnswerState {
        &self.answer
    }

    /// Synchronizes with the engine on connect or reconnect
    ///
    /// Reads the current round, and if a question is live, looks up
    /// whether a response was already recorded under this name so a
    /// reconnect cannot be used to answer twice.
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if a read fails.
    pub fn connect<F: Fetch>(&mut self, fetch: &F) -> Result<(), Disconnected> {
        let round = fetch.fetch_round()?;
        self.apply_round(round, fetch)?;

        if self.answer.is_locked() {
            return Ok(());
        }
        let Some(question_id) = self.core.round().and_then(|round| round.question_id) else {
            return Ok(());
        };
        if let Some(response) = fetch.fetch_own_response(question_id, &self.name)? {
            self.answer = AnswerState::Submitted(response);
        }
        Ok(())
    }

    /// Handles one update message from the engine
    ///
    /// Round broadcasts replace the snapshot; submission feedback
    /// resolves a pending answer. Messages meant for other roles are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if applying a round needs a read that
    /// fails.
    pub fn apply_update<F: Fetch>(
        &mut self,
        update: UpdateMessage,
        fetch: &F,
    ) -> Result<(), Disconnected> {
        match update {
            UpdateMessage::Round(round) => self.apply_round(round, fetch),
            UpdateMessage::Submission(feedback) => {
                self.record_feedback(feedback);
                Ok(())
            }
            UpdateMessage::Answer(_) | UpdateMessage::Control(_) => Ok(()),
        }
    }

    fn apply_round<F: Fetch>(&mut self, round: RoundState, fetch: &F) -> Result<(), Disconnected> {
        let run = (round.question_id, round.started_at);
        if self.run != run {
            self.answer = AnswerState::Open;
            self.standings = None;
            self.run = run;
        }
        self.core.apply_round(round, fetch)?;

        if self.core.round().map(|round| round.status) == Some(Status::Leaderboard)
            && self.standings.is_none()
        {
            let Some(quiz_id) = self.core.round().and_then(|round| round.quiz_id) else {
                return Ok(());
            };
            self.standings = Some(fetch.fetch_leaderboard(quiz_id, DEFAULT_LIMIT)?);
        }
        Ok(())
    }

    /// Resolves the outcome of this participant's own submission
    pub fn record_feedback(&mut self, feedback: SubmitFeedback) {
        match feedback {
            SubmitFeedback::Accepted(response) => {
                self.answer = AnswerState::Submitted(response);
            }
            SubmitFeedback::Rejected(error) => {
                // a recorded answer is never downgraded by a stray refusal
                if !matches!(self.answer, AnswerState::Submitted(_)) {
                    self.answer = match error {
                        SubmitError::Duplicate => AnswerState::Duplicate,
                        SubmitError::Late => AnswerState::Late,
                    };
                }
            }
        }
    }

    /// Locks in the option at a displayed position
    ///
    /// Produces the request the host should send to the engine, with
    /// the displayed position mapped back to the original option
    /// index. Returns `None` when there is nothing to answer: no live
    /// question, the countdown hit zero, an answer is already locked
    /// in, or the position is out of range.
    ///
    /// # Arguments
    ///
    /// * `position` - The tapped option's displayed position
    /// * `now` - The local clock reading
    pub fn choose(&mut self, position: usize, now: SystemTime) -> Option<SubmitRequest> {
        if self.answer.is_locked() {
            return None;
        }
        let round = self.core.round()?;
        let question = self.core.question()?;
        if !round.is_active_for(question.id) || round.remaining(now).is_zero() {
            return None;
        }
        let question_id = question.id;
        let selected_index = self.core.original_index(position)?;

        self.answer = AnswerState::Pending;
        Some(SubmitRequest {
            question_id,
            selected_index,
        })
    }

    /// What the device should render right now
    ///
    /// # Arguments
    ///
    /// * `now` - The local clock reading, driving the countdown
    pub fn screen(&self, now: SystemTime) -> Screen {
        let Some(round) = self.core.round() else {
            return Screen::Waiting;
        };

        match round.status {
            Status::Idle => Screen::Waiting,
            Status::Leaderboard => match &self.standings {
                Some(list) => Screen::Standings {
                    own_position: list
                        .items()
                        .iter()
                        .position(|entry| entry.player_name == self.name),
                    list: list.clone(),
                },
                None => Screen::Waiting,
            },
            Status::Active => {
                let Some(question) = self.core.question() else {
                    return Screen::Waiting;
                };
                let remaining = round.remaining(now);
                Screen::Question {
                    prompt: question.prompt.clone(),
                    options: self
                        .core
                        .shuffled_options()
                        .into_iter()
                        .enumerate()
                        .map(|(position, text)| (super::letter(position), text.clone()))
                        .collect(),
                    seconds_left: timing::display_seconds(remaining),
                    urgent: timing::is_urgent(remaining),
                    answered: self.answer.is_locked(),
                }
            }
            Status::Revealed => {
                let Some(answer) = self
                    .core
                    .question()
                    .and_then(|question| question.options.get(question.correct_index))
                else {
                    return Screen::Waiting;
                };
                match &self.answer {
                    AnswerState::Submitted(response) => Screen::Result {
                        correct: Some(response.is_correct),
                        points: leaderboard::score(
                            response.is_correct,
                            response.elapsed_ms,
                            round.timer_millis(),
                        ),
                        answer: answer.clone(),
                    },
                    _ => Screen::Result {
                        correct: None,
                        points: 0,
                        answer: answer.clone(),
                    },
                }
            }
        }
    }
}
