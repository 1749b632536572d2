//! Configuration constants for the quizcast game system
//!
//! This module contains all the configuration limits and constraints
//! used throughout the round lifecycle to ensure data integrity and
//! provide consistent boundaries for different game components.

/// Quiz configuration constants
pub mod quiz {
    /// Maximum length of a quiz title in characters (per language)
    pub const MAX_TITLE_LENGTH: usize = 200;
}

/// Question configuration constants
pub mod question {
    /// Maximum length of a question prompt in characters (per language)
    pub const MAX_PROMPT_LENGTH: usize = 200;
    /// Maximum length of an option's text in characters (per language)
    pub const MAX_OPTION_LENGTH: usize = 200;
    /// Minimum number of options on a question
    pub const MIN_OPTION_COUNT: usize = 2;
    /// Maximum number of options on a question
    pub const MAX_OPTION_COUNT: usize = 8;
}

/// Round configuration constants
pub mod round {
    /// Minimum countdown length in seconds for an active question
    pub const MIN_TIMER_SECONDS: u64 = 1;
    /// Maximum countdown length in seconds for an active question
    pub const MAX_TIMER_SECONDS: u64 = 240;
    /// Countdown length used when the moderator does not pick one
    pub const DEFAULT_TIMER_SECONDS: u64 = 20;
    /// Remaining seconds at or below which clients render the countdown as urgent
    pub const URGENT_SECONDS: u64 = 5;
}

/// Scoring configuration constants
pub mod scoring {
    /// Points awarded for any correct answer regardless of speed
    pub const BASE_POINTS: u64 = 1000;
    /// Maximum additional points awarded for answering instantly
    pub const MAX_SPEED_BONUS: u64 = 500;
    /// Milliseconds of elapsed time that cost one point of speed bonus
    pub const BONUS_DECAY_MILLIS: u64 = 40;
}

/// Participant configuration constants
pub mod participant {
    /// Maximum length of a participant's display name in characters
    pub const MAX_NAME_LENGTH: usize = 30;
}

/// Leaderboard configuration constants
pub mod leaderboard {
    /// Number of entries clients request when none is specified
    pub const DEFAULT_LIMIT: usize = 10;
}

/// Client refresh cadence constants
pub mod cadence {
    /// Milliseconds between countdown recomputations on participant devices
    pub const PARTICIPANT_TICK_MILLIS: u64 = 250;
    /// Milliseconds between countdown recomputations on the moderator console
    pub const MODERATOR_TICK_MILLIS: u64 = 250;
    /// Milliseconds between countdown recomputations on the shared display
    pub const DISPLAY_TICK_MILLIS: u64 = 100;
}
