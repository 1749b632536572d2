//! Client state machines for the three observer roles
//!
//! Everything a device renders is a projection of the shared round
//! record plus data read through the [`Fetch`] seam. The state
//! machines here consume the engine's update messages, keep their
//! local snapshot consistent, and answer "what should the screen show
//! right now" without doing any IO of their own. Hosts pump messages
//! in, send the requests the clients produce, and re-render on a
//! timer while a countdown is running.
//!
//! The three roles live in their own submodules:
//! [`participant`] for answering devices, [`display`] for the shared
//! screen, and [`moderator`] for the operator console.

pub mod display;
pub mod moderator;
pub mod participant;

use super::{
    catalog::{Bilingual, Question, QuestionId},
    round::RoundState,
    session::{Disconnected, Fetch},
    shuffle,
};

/// The letter label for a displayed option position
///
/// Positions count from zero, so the first displayed option is `A`.
/// Questions carry at most a handful of options, well within the
/// alphabet.
pub fn letter(position: usize) -> char {
    char::from(b'A' + position as u8)
}

/// Shared snapshot logic every client role builds on
///
/// Holds the latest round record, the content of the question it
/// references, and the shuffled display order for that question's
/// options. Applying a round record replaces the snapshot wholesale;
/// the round is authoritative and local state never argues with it.
#[derive(Debug, Default)]
pub struct ClientCore {
    /// The last round record received
    round: Option<RoundState>,
    /// Content of the question the round references
    question: Option<Question>,
    /// Displayed position to original option index
    shuffle: Vec<usize>,
}

impl ClientCore {
    /// Replaces the snapshot with a newly received round record
    ///
    /// Fetches the referenced question if it is not already held and
    /// rebuilds the shuffled display order from the round's seed. A
    /// round with no question clears both.
    ///
    /// # Arguments
    ///
    /// * `round` - The received round record
    /// * `fetch` - The read seam for question content
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if the question content cannot be
    /// read; the snapshot is left unchanged in that case.
    pub fn apply_round<F: Fetch>(
        &mut self,
        round: RoundState,
        fetch: &F,
    ) -> Result<(), Disconnected> {
        match round.question_id {
            Some(question_id) => {
                if !self
                    .question
                    .as_ref()
                    .is_some_and(|question| question.id == question_id)
                {
                    self.question = fetch.fetch_question(question_id)?;
                }
                // the question may have been deleted since the broadcast
                self.shuffle = match &self.question {
                    Some(question) => {
                        shuffle::shuffle_map(question.options.len(), round.shuffle_seed)
                    }
                    None => Vec::new(),
                };
            }
            None => {
                self.question = None;
                self.shuffle = Vec::new();
            }
        }
        self.round = Some(round);
        Ok(())
    }

    /// Reads the current round from the engine and applies it
    ///
    /// Used when connecting, reconnecting, or whenever the client
    /// suspects it missed updates.
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if the read fails.
    pub fn resync<F: Fetch>(&mut self, fetch: &F) -> Result<(), Disconnected> {
        let round = fetch.fetch_round()?;
        self.apply_round(round, fetch)
    }

    /// The last round record received, if any
    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    /// Content of the question the round references, if held
    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    /// The question to stream recorded answers for
    ///
    /// Present while a held question is live; displays and moderators
    /// point their answer feeds here.
    pub fn feed_target(&self) -> Option<QuestionId> {
        let round = self.round.as_ref()?;
        let question = self.question.as_ref()?;
        round.is_active_for(question.id).then_some(question.id)
    }

    /// The question's options in this client's shuffled display order
    pub fn shuffled_options(&self) -> Vec<&Bilingual> {
        match &self.question {
            Some(question) => self
                .shuffle
                .iter()
                .filter_map(|&original| question.options.get(original))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Maps a displayed position back to the original option index
    ///
    /// Submissions carry original indices, so every answer taps back
    /// through this before leaving the device.
    pub fn original_index(&self, position: usize) -> Option<usize> {
        self.shuffle.get(position).copied()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        catalog::{QuestionDraft, QuizId},
        game::Game,
        session::Tunnel,
        shuffle::shuffle_map,
    };
    use web_time::{Duration, SystemTime};

    struct NoTunnel;

    impl Tunnel for NoTunnel {
        fn send_message(&self, _message: &crate::UpdateMessage) {}
        fn send_state(&self, _message: &crate::SyncMessage) {}
        fn close(self) {}
    }

    fn silent(_id: crate::observer::Id) -> Option<NoTunnel> {
        None
    }

    fn at(seconds: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(seconds)
    }

    fn bilingual(text: &str) -> Bilingual {
        Bilingual::new(text, format!("{text} بالعربية"))
    }

    fn seeded_game() -> (Game, QuizId, QuestionId) {
        let mut game = Game::default();
        let quiz_id = game.upsert_quiz(None, bilingual("Colors"), at(0)).unwrap();
        let question_id = game
            .upsert_question(
                None,
                quiz_id,
                QuestionDraft {
                    prompt: bilingual("What color is the sky?"),
                    options: vec![
                        bilingual("red"),
                        bilingual("green"),
                        bilingual("blue"),
                        bilingual("yellow"),
                    ],
                    correct_index: 2,
                    sort_order: 0,
                },
            )
            .unwrap();
        (game, quiz_id, question_id)
    }

    #[test]
    fn test_letters_follow_display_positions() {
        assert_eq!(letter(0), 'A');
        assert_eq!(letter(1), 'B');
        assert_eq!(letter(3), 'D');
        assert_eq!(letter(7), 'H');
    }

    #[test]
    fn test_apply_round_fetches_question_and_builds_shuffle() {
        let (mut game, quiz_id, question_id) = seeded_game();
        game.set_active_question(question_id, quiz_id, 20, at(100), silent)
            .unwrap();

        let mut core = ClientCore::default();
        core.apply_round(game.round.clone(), &game).unwrap();

        assert_eq!(core.question().map(|q| q.id), Some(question_id));
        assert_eq!(
            core.shuffle,
            shuffle_map(4, game.round.shuffle_seed)
        );
        assert_eq!(core.feed_target(), Some(question_id));

        let options = core.shuffled_options();
        assert_eq!(options.len(), 4);
        for position in 0..4 {
            let original = core.original_index(position).unwrap();
            assert_eq!(options[position].en, core.question().unwrap().options[original].en);
        }
    }

    #[test]
    fn test_idle_round_clears_question() {
        let (mut game, quiz_id, question_id) = seeded_game();
        game.set_active_question(question_id, quiz_id, 20, at(100), silent)
            .unwrap();

        let mut core = ClientCore::default();
        core.apply_round(game.round.clone(), &game).unwrap();
        game.update_round_status(crate::round::Status::Idle, silent)
            .unwrap();
        core.apply_round(game.round.clone(), &game).unwrap();

        assert_eq!(core.question(), None);
        assert!(core.shuffled_options().is_empty());
        assert_eq!(core.feed_target(), None);
        assert_eq!(core.original_index(0), None);
    }

    #[test]
    fn test_reactivation_rebuilds_shuffle_from_new_seed() {
        let (mut game, quiz_id, question_id) = seeded_game();
        game.set_active_question(question_id, quiz_id, 20, at(100), silent)
            .unwrap();
        let mut core = ClientCore::default();

        let mut round = game.round.clone();
        round.shuffle_seed = 42;
        core.apply_round(round.clone(), &game).unwrap();
        assert_eq!(core.shuffle, vec![2, 3, 0, 1]);

        // same question, new seed: the question is kept but the order moves
        round.shuffle_seed = 7;
        core.apply_round(round, &game).unwrap();
        assert_eq!(core.question().map(|q| q.id), Some(question_id));
        assert_eq!(core.shuffle, vec![3, 1, 2, 0]);
    }

    #[test]
    fn test_resync_reads_current_round() {
        let (mut game, quiz_id, question_id) = seeded_game();
        game.set_active_question(question_id, quiz_id, 30, at(100), silent)
            .unwrap();

        let mut core = ClientCore::default();
        core.resync(&game).unwrap();

        assert_eq!(
            core.round().and_then(|round| round.question_id),
            Some(question_id)
        );
        assert_eq!(core.round().map(RoundState::timer_millis), Some(30_000));
    }

    #[test]
    fn test_missing_question_degrades_to_empty_snapshot() {
        let (game, _quiz_id, _question_id) = seeded_game();
        let mut core = ClientCore::default();

        let mut round = game.round.clone();
        round.question_id = Some(QuestionId::new());
        round.status = crate::round::Status::Active;
        core.apply_round(round, &game).unwrap();

        assert_eq!(core.question(), None);
        assert!(core.shuffled_options().is_empty());
        assert_eq!(core.feed_target(), None);
    }
}
