//! Quiz and question content management
//!
//! This module holds the editable content of the game: quizzes, their
//! questions, and the bilingual text shown to players. It provides the
//! upsert/delete operations the moderator's editor invokes, validated on the
//! way in, plus the ordered listings clients read. Content is independent of
//! any running round; the round only references it by id.

use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    str::FromStr,
};

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use uuid::Uuid;
use web_time::SystemTime;

use crate::constants;

/// A unique identifier for a quiz
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct QuizId(Uuid);

impl QuizId {
    /// Creates a new random quiz ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuizId {
    /// Creates a new random quiz ID (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for QuizId {
    /// Formats the ID as a UUID string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for QuizId {
    type Err = uuid::Error;

    /// Parses a quiz ID from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A unique identifier for a question
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct QuestionId(Uuid);

impl QuestionId {
    /// Creates a new random question ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuestionId {
    /// Creates a new random question ID (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for QuestionId {
    /// Formats the ID as a UUID string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for QuestionId {
    type Err = uuid::Error;

    /// Parses a question ID from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// User-visible text in both of the game's languages
///
/// The game presents everything in English and Arabic side by side, so every
/// piece of authored text carries both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bilingual {
    /// English text
    pub en: String,
    /// Arabic text
    pub ar: String,
}

impl Bilingual {
    /// Creates a bilingual text from its two languages
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }
}

type ValidationResult = garde::Result;

/// Validates both languages of a text against a character limit
fn validate_text<const MAX_CHARS: usize>(
    field_name: &str,
    value: &Bilingual,
) -> ValidationResult {
    if value.en.chars().count() > MAX_CHARS {
        return Err(garde::Error::new(format!(
            "{field_name} English text must be at most {MAX_CHARS} characters"
        )));
    }
    if value.ar.chars().count() > MAX_CHARS {
        return Err(garde::Error::new(format!(
            "{field_name} Arabic text must be at most {MAX_CHARS} characters"
        )));
    }
    Ok(())
}

/// Validates the prompt of a question
fn validate_prompt(val: &Bilingual) -> ValidationResult {
    validate_text::<{ constants::question::MAX_PROMPT_LENGTH }>("prompt", val)
}

/// Validates the option texts of a question
fn validate_options(val: &[Bilingual]) -> ValidationResult {
    for option in val {
        validate_text::<{ constants::question::MAX_OPTION_LENGTH }>("option", option)?;
    }
    Ok(())
}

/// Editor-submitted content of a question
///
/// This is what the moderator's editor sends when creating or updating a
/// question: everything except the identifiers, which the store manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuestionDraft {
    /// What is being asked
    #[garde(custom(|v, _| validate_prompt(v)))]
    pub prompt: Bilingual,
    /// The options shown to players, in authored order
    #[garde(
        length(min = constants::question::MIN_OPTION_COUNT, max = constants::question::MAX_OPTION_COUNT),
        custom(|v, _| validate_options(v))
    )]
    pub options: Vec<Bilingual>,
    /// Index of the correct option within `options`
    #[garde(skip)]
    pub correct_index: usize,
    /// Position of the question within its quiz
    #[garde(skip)]
    pub sort_order: i32,
}

/// A quiz: a titled collection of questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    /// Unique identifier of the quiz
    pub id: QuizId,
    /// Title shown in listings and on the leaderboard
    pub title: Bilingual,
    /// When the quiz was created, used to order listings
    pub created_at: SystemTime,
}

/// A stored question within a quiz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier of the question
    pub id: QuestionId,
    /// The quiz this question belongs to
    pub quiz_id: QuizId,
    /// What is being asked
    pub prompt: Bilingual,
    /// The options shown to players, in authored order
    pub options: Vec<Bilingual>,
    /// Index of the correct option within `options`
    pub correct_index: usize,
    /// Position of the question within its quiz
    pub sort_order: i32,
}

/// Errors that can occur when editing content
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The referenced quiz does not exist
    #[error("unknown quiz")]
    UnknownQuiz,
    /// The referenced question does not exist
    #[error("unknown question")]
    UnknownQuestion,
    /// The correct option index does not address any of the options
    #[error("correct option index is out of range")]
    CorrectIndexOutOfRange,
    /// The submitted content failed validation
    #[error("invalid content: {0}")]
    Invalid(String),
}

/// Serialization helper for the Catalog struct
#[derive(Deserialize)]
struct CatalogSerde {
    quizzes: HashMap<QuizId, Quiz>,
    questions: HashMap<QuestionId, Question>,
}

/// The store of all editable content
///
/// Quizzes and questions are kept by id, with a per-quiz index maintained for
/// listings and cascade deletes. The index is rebuilt on deserialization
/// rather than serialized.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(from = "CatalogSerde")]
pub struct Catalog {
    /// All quizzes by id
    quizzes: HashMap<QuizId, Quiz>,
    /// All questions by id
    questions: HashMap<QuestionId, Question>,

    /// Reverse index from quiz to its question ids
    #[serde(skip_serializing)]
    by_quiz: HashMap<QuizId, HashSet<QuestionId>>,
}

impl From<CatalogSerde> for Catalog {
    /// Reconstructs the Catalog from serialized data
    ///
    /// This rebuilds the per-quiz index from the question table, which is
    /// necessary since the index is not serialized.
    fn from(serde: CatalogSerde) -> Self {
        let CatalogSerde { quizzes, questions } = serde;
        let mut by_quiz: HashMap<QuizId, HashSet<QuestionId>> = HashMap::new();
        for (id, question) in &questions {
            by_quiz.entry(question.quiz_id).or_default().insert(*id);
        }
        Self {
            quizzes,
            questions,
            by_quiz,
        }
    }
}

impl Catalog {
    /// Creates or updates a quiz
    ///
    /// With no id a new quiz is created; with an id the existing quiz's title
    /// is replaced and its creation time kept.
    ///
    /// # Arguments
    ///
    /// * `id` - The quiz to update, or `None` to create one
    /// * `title` - The new title
    /// * `now` - Creation timestamp for a new quiz
    ///
    /// # Returns
    ///
    /// The id of the created or updated quiz
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownQuiz`] when updating a quiz that does not
    /// exist, or [`Error::Invalid`] when the title fails validation.
    pub fn upsert_quiz(
        &mut self,
        id: Option<QuizId>,
        title: Bilingual,
        now: SystemTime,
    ) -> Result<QuizId, Error> {
        validate_text::<{ constants::quiz::MAX_TITLE_LENGTH }>("title", &title)
            .map_err(|e| Error::Invalid(e.to_string()))?;

        match id {
            Some(id) => {
                let quiz = self.quizzes.get_mut(&id).ok_or(Error::UnknownQuiz)?;
                quiz.title = title;
                Ok(id)
            }
            None => {
                let id = QuizId::new();
                self.quizzes.insert(
                    id,
                    Quiz {
                        id,
                        title,
                        created_at: now,
                    },
                );
                self.by_quiz.entry(id).or_default();
                Ok(id)
            }
        }
    }

    /// Deletes a quiz along with all of its questions
    ///
    /// # Arguments
    ///
    /// * `id` - The quiz to delete
    ///
    /// # Returns
    ///
    /// The ids of the questions removed by the cascade, so the caller can
    /// drop anything else keyed by them
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownQuiz`] if the quiz does not exist.
    pub fn delete_quiz(&mut self, id: QuizId) -> Result<Vec<QuestionId>, Error> {
        self.quizzes.remove(&id).ok_or(Error::UnknownQuiz)?;
        let removed = self
            .by_quiz
            .remove(&id)
            .unwrap_or_default()
            .into_iter()
            .collect_vec();
        for question_id in &removed {
            self.questions.remove(question_id);
        }
        Ok(removed)
    }

    /// Creates or updates a question
    ///
    /// With no id a new question is created under `quiz_id`; with an id the
    /// existing question is replaced, moving it between quizzes if the quiz
    /// reference changed.
    ///
    /// # Arguments
    ///
    /// * `id` - The question to update, or `None` to create one
    /// * `quiz_id` - The quiz the question belongs to
    /// * `draft` - The submitted content
    ///
    /// # Returns
    ///
    /// The id of the created or updated question
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownQuiz`] if the quiz does not exist,
    /// [`Error::UnknownQuestion`] when updating a missing question,
    /// [`Error::Invalid`] when the draft fails validation, or
    /// [`Error::CorrectIndexOutOfRange`] when the correct index does not
    /// address an option.
    pub fn upsert_question(
        &mut self,
        id: Option<QuestionId>,
        quiz_id: QuizId,
        draft: QuestionDraft,
    ) -> Result<QuestionId, Error> {
        draft
            .validate()
            .map_err(|report| Error::Invalid(report.to_string()))?;
        if draft.correct_index >= draft.options.len() {
            return Err(Error::CorrectIndexOutOfRange);
        }
        if !self.quizzes.contains_key(&quiz_id) {
            return Err(Error::UnknownQuiz);
        }

        let id = match id {
            Some(id) => {
                let previous = self.questions.get(&id).ok_or(Error::UnknownQuestion)?;
                if previous.quiz_id != quiz_id {
                    if let Some(set) = self.by_quiz.get_mut(&previous.quiz_id) {
                        set.remove(&id);
                    }
                }
                id
            }
            None => QuestionId::new(),
        };

        let QuestionDraft {
            prompt,
            options,
            correct_index,
            sort_order,
        } = draft;
        self.questions.insert(
            id,
            Question {
                id,
                quiz_id,
                prompt,
                options,
                correct_index,
                sort_order,
            },
        );
        self.by_quiz.entry(quiz_id).or_default().insert(id);
        Ok(id)
    }

    /// Deletes a question
    ///
    /// # Arguments
    ///
    /// * `id` - The question to delete
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownQuestion`] if the question does not exist.
    pub fn delete_question(&mut self, id: QuestionId) -> Result<(), Error> {
        let question = self.questions.remove(&id).ok_or(Error::UnknownQuestion)?;
        if let Some(set) = self.by_quiz.get_mut(&question.quiz_id) {
            set.remove(&id);
        }
        Ok(())
    }

    /// Gets a quiz by id
    pub fn quiz(&self, id: QuizId) -> Option<&Quiz> {
        self.quizzes.get(&id)
    }

    /// Gets a question by id
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.get(&id)
    }

    /// Lists all quizzes, oldest first
    pub fn quizzes(&self) -> Vec<&Quiz> {
        self.quizzes
            .values()
            .sorted_by_key(|quiz| (quiz.created_at, quiz.id))
            .collect_vec()
    }

    /// Lists the questions of a quiz in their authored order
    ///
    /// # Arguments
    ///
    /// * `quiz_id` - The quiz whose questions to list
    pub fn questions_of(&self, quiz_id: QuizId) -> Vec<&Question> {
        self.by_quiz
            .get(&quiz_id)
            .into_iter()
            .flat_map(|set| set.iter())
            .filter_map(|id| self.questions.get(id))
            .sorted_by_key(|question| (question.sort_order, question.id))
            .collect_vec()
    }

    /// Lists the question ids of a quiz, unordered
    ///
    /// # Arguments
    ///
    /// * `quiz_id` - The quiz whose question ids to collect
    pub fn question_ids_of(&self, quiz_id: QuizId) -> Vec<QuestionId> {
        self.by_quiz
            .get(&quiz_id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
            .collect_vec()
    }

    /// Whether a quiz with this id exists
    pub fn has_quiz(&self, id: QuizId) -> bool {
        self.quizzes.contains_key(&id)
    }
}
