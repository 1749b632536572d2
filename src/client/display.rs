//! State machine for the shared display screen
//!
//! The display is the room's common view: while a question is live it
//! shows the prompt, the shuffled options, the countdown ring, and a
//! live count of received answers; on reveal it shows the tally bars,
//! the correct option, and who answered correctly first; on the
//! leaderboard it shows the top standings. It never identifies which
//! participant picked what while the question is still open.

use std::collections::HashSet;

use web_time::{Duration, SystemTime};

use super::ClientCore;
use crate::{
    TopList, UpdateMessage,
    catalog::{Bilingual, QuestionId},
    constants::{cadence, leaderboard::DEFAULT_LIMIT},
    leaderboard::{self, LeaderboardEntry},
    ledger::{Response, ResponseId},
    round::{RoundState, Status},
    session::{Disconnected, Fetch},
    timing,
};

/// One option's tally row on the reveal board, in display order
#[derive(Debug, Clone, PartialEq)]
pub struct RevealRow {
    /// The option's letter label
    pub letter: char,
    /// The option's text
    pub text: Bilingual,
    /// How many responses picked this option
    pub count: usize,
    /// This option's share of all responses, in percent
    pub percent: f64,
    /// Whether this is the correct option
    pub is_correct: bool,
}

/// The first participant to answer correctly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    /// The participant's display name
    pub player_name: String,
    /// Their response time, formatted for display
    pub time: String,
    /// The points their response earned
    pub points: u64,
}

/// Everything the reveal view shows
#[derive(Debug, Clone, PartialEq)]
pub struct RevealBoard {
    /// Tally rows in display order
    pub rows: Vec<RevealRow>,
    /// The fastest correct answerer, if anyone was right
    pub winner: Option<Winner>,
}

/// What the shared screen should render
#[derive(Debug, Clone)]
pub enum Screen {
    /// Nothing is live; show the join hint
    Waiting,
    /// A question is live
    Question {
        /// The question prompt
        prompt: Bilingual,
        /// Options in the display's shuffled order, with letters
        options: Vec<(char, Bilingual)>,
        /// Whole seconds left on the countdown
        seconds_left: u64,
        /// Fraction of the countdown remaining, for the ring
        progress: f64,
        /// Whether the countdown is in its final stretch
        urgent: bool,
        /// How many answers have been received so far
        answer_count: usize,
    },
    /// The correct answer has been revealed
    Reveal(RevealBoard),
    /// The top standings across the whole game
    Standings(TopList<LeaderboardEntry>),
}

/// The state machine behind the shared display
#[derive(Debug, Default)]
pub struct DisplayClient {
    core: ClientCore,
    /// Responses already counted, so replays do not inflate the count
    seen: HashSet<ResponseId>,
    answer_count: usize,
    reveal: Option<RevealBoard>,
    standings: Option<TopList<LeaderboardEntry>>,
    /// Identifies one question run; a change resets the live state
    run: (Option<QuestionId>, Option<SystemTime>),
}

impl DisplayClient {
    /// How often the screen should re-render the countdown ring
    pub const TICK: Duration = Duration::from_millis(cadence::DISPLAY_TICK_MILLIS);

    /// Creates a display client with nothing on screen yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronizes with the engine on connect or reconnect
    ///
    /// Rejoining mid-question recovers the answer count from the
    /// recorded responses, so the screen never undercounts after a
    /// drop.
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if a read fails.
    pub fn connect<F: Fetch>(&mut self, fetch: &F) -> Result<(), Disconnected> {
        let round = fetch.fetch_round()?;
        self.apply_round(round, fetch)
    }

    /// Handles one update message from the engine
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
            UpdateMessage::Answer(response) => {
                self.record_answer(&response);
                Ok(())
            }
            UpdateMessage::Submission(_) | UpdateMessage::Control(_) => Ok(()),
        }
    }

    /// The question this display wants recorded answers streamed for
    pub fn answer_feed(&self) -> Option<QuestionId> {
        self.core.feed_target()
    }

    /// How many answers the live question has received
    pub fn answer_count(&self) -> usize {
        self.answer_count
    }

    fn record_answer(&mut self, response: &Response) {
        let Some(question_id) = self.core.question().map(|question| question.id) else {
            return;
        };
        if response.question_id != question_id {
            return;
        }
        if self.seen.insert(response.id) {
            self.answer_count += 1;
        }
    }

    fn apply_round<F: Fetch>(&mut self, round: RoundState, fetch: &F) -> Result<(), Disconnected> {
        let run = (round.question_id, round.started_at);
        let new_run = self.run != run;
        if new_run {
            self.seen.clear();
            self.answer_count = 0;
            self.reveal = None;
            self.standings = None;
            self.run = run;
        }
        self.core.apply_round(round, fetch)?;

        let status = self.core.round().map(|round| round.status);
        match status {
            // seed the count from the recorded responses; a reconnect
            // may have missed live answer updates
            Some(Status::Active) => {
                let Some(question_id) = self.core.question().map(|question| question.id) else {
                    return Ok(());
                };
                let responses = fetch.fetch_responses(question_id)?;
                self.seen = responses.iter().map(|response| response.id).collect();
                self.answer_count = self.seen.len();
            }
            Some(Status::Revealed) if self.reveal.is_none() => {
                self.reveal = self.build_reveal(fetch)?;
            }
            Some(Status::Leaderboard) if self.standings.is_none() => {
                let Some(quiz_id) = self.core.round().and_then(|round| round.quiz_id) else {
                    return Ok(());
                };
                self.standings = Some(fetch.fetch_leaderboard(quiz_id, DEFAULT_LIMIT)?);
            }
            _ => {}
        }
        Ok(())
    }

    fn build_reveal<F: Fetch>(&self, fetch: &F) -> Result<Option<RevealBoard>, Disconnected> {
        let (Some(round), Some(question)) = (self.core.round(), self.core.question()) else {
            return Ok(None);
        };

        let responses = fetch.fetch_responses(question.id)?;
        let refs: Vec<&Response> = responses.iter().collect();
        let tallies = leaderboard::distribution(question, &refs);

        let mut rows = Vec::new();
        for position in 0..question.options.len() {
            let Some(original) = self.core.original_index(position) else {
                continue;
            };
            let (Some(text), Some(tally)) = (question.options.get(original), tallies.get(original))
            else {
                continue;
            };
            rows.push(RevealRow {
                letter: super::letter(position),
                text: text.clone(),
                count: tally.count,
                percent: tally.percent,
                is_correct: tally.is_correct,
            });
        }

        let winner = leaderboard::fastest_correct(&refs).map(|response| Winner {
            player_name: response.player_name.clone(),
            time: timing::format_elapsed(response.elapsed_ms),
            points: leaderboard::score(true, response.elapsed_ms, round.timer_millis()),
        });

        Ok(Some(RevealBoard { rows, winner }))
    }

    /// What the screen should render right now
    ///
    /// # Arguments
    ///
    /// * `now` - The local clock reading, driving the countdown ring
    pub fn screen(&self, now: SystemTime) -> Screen {
        let Some(round) = self.core.round() else {
            return Screen::Waiting;
        };

        match round.status {
            Status::Idle => Screen::Waiting,
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
                    progress: timing::progress(remaining, round.timer),
                    urgent: timing::is_urgent(remaining),
                    answer_count: self.answer_count,
                }
            }
            Status::Revealed => match &self.reveal {
                Some(board) => Screen::Reveal(board.clone()),
                None => Screen::Waiting,
            },
            Status::Leaderboard => match &self.standings {
                Some(standings) => Screen::Standings(standings.clone()),
                None => Screen::Waiting,
            },
        }
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
        shuffle::{position_of, shuffle_map},
    };

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

    fn apply_current_round(client: &mut DisplayClient, game: &Game) {
        client
            .apply_update(crate::UpdateMessage::Round(game.round.clone()), game)
            .unwrap();
    }

    #[test]
    fn test_waiting_until_a_question_goes_live() {
        let (game, _quiz_id, _question_id) = seeded_game();
        let mut client = DisplayClient::new();
        client.connect(&game).unwrap();

        assert!(matches!(client.screen(at(50)), Screen::Waiting));
        assert_eq!(client.answer_feed(), None);
    }

    #[test]
    fn test_live_question_counts_answers_without_replays() {
        let (mut game, quiz_id, question_id) = seeded_game();
        game.set_active_question(question_id, quiz_id, 20, at(100), silent)
            .unwrap();
        let mut client = DisplayClient::new();
        client.connect(&game).unwrap();
        assert_eq!(client.answer_feed(), Some(question_id));

        let first = game.submit("sara", question_id, 2, at(102)).unwrap();
        let second = game.submit("omar", question_id, 0, at(104)).unwrap();
        client
            .apply_update(crate::UpdateMessage::Answer(first.clone()), &game)
            .unwrap();
        client
            .apply_update(crate::UpdateMessage::Answer(second), &game)
            .unwrap();
        // the same insert delivered twice must not inflate the count
        client
            .apply_update(crate::UpdateMessage::Answer(first), &game)
            .unwrap();

        match client.screen(at(110)) {
            Screen::Question {
                answer_count,
                seconds_left,
                progress,
                urgent,
                ..
            } => {
                assert_eq!(answer_count, 2);
                assert_eq!(seconds_left, 10);
                assert!((progress - 0.5).abs() < 1e-9);
                assert!(!urgent);
            }
            other => panic!("expected the question screen, got {other:?}"),
        }
    }

    #[test]
    fn test_answers_for_other_questions_are_ignored() {
        let (mut game, quiz_id, question_id) = seeded_game();
        let other = game
            .upsert_question(
                None,
                quiz_id,
                QuestionDraft {
                    prompt: bilingual("What color is grass?"),
                    options: vec![bilingual("green"), bilingual("blue")],
                    correct_index: 0,
                    sort_order: 1,
                },
            )
            .unwrap();
        game.set_active_question(question_id, quiz_id, 20, at(100), silent)
            .unwrap();
        let mut client = DisplayClient::new();
        client.connect(&game).unwrap();

        let stray = Response {
            id: crate::ledger::ResponseId::new(),
            question_id: other,
            player_name: "sara".to_owned(),
            selected_index: 0,
            is_correct: true,
            elapsed_ms: 1000,
        };
        client
            .apply_update(crate::UpdateMessage::Answer(stray), &game)
            .unwrap();

        assert_eq!(client.answer_count(), 0);
    }

    #[test]
    fn test_reconnect_mid_question_recovers_the_count() {
        let (mut game, quiz_id, question_id) = seeded_game();
        game.set_active_question(question_id, quiz_id, 20, at(100), silent)
            .unwrap();
        game.submit("sara", question_id, 2, at(101)).unwrap();
        game.submit("omar", question_id, 1, at(102)).unwrap();

        let mut client = DisplayClient::new();
        client.connect(&game).unwrap();

        assert_eq!(client.answer_count(), 2);
    }

    #[test]
    fn test_reveal_board_tallies_in_display_order() {
        let (mut game, quiz_id, question_id) = seeded_game();
        game.set_active_question(question_id, quiz_id, 20, at(100), silent)
            .unwrap();
        game.submit("sara", question_id, 2, at(102)).unwrap();
        game.submit("omar", question_id, 2, at(105)).unwrap();
        game.submit("lina", question_id, 0, at(103)).unwrap();
        let map = shuffle_map(4, game.round.shuffle_seed);
        game.update_round_status(Status::Revealed, silent).unwrap();

        let mut client = DisplayClient::new();
        client.connect(&game).unwrap();

        let Screen::Reveal(board) = client.screen(at(110)) else {
            panic!("expected the reveal board");
        };
        assert_eq!(board.rows.len(), 4);

        let blue_position = position_of(&map, 2).unwrap();
        let blue = &board.rows[blue_position];
        assert_eq!(blue.letter, crate::client::letter(blue_position));
        assert_eq!(blue.text.en, "blue");
        assert_eq!(blue.count, 2);
        assert!((blue.percent - 200.0 / 3.0).abs() < 1e-9);
        assert!(blue.is_correct);

        let red_position = position_of(&map, 0).unwrap();
        let red = &board.rows[red_position];
        assert_eq!(red.count, 1);
        assert!(!red.is_correct);

        let winner = board.winner.expect("someone answered correctly");
        assert_eq!(winner.player_name, "sara");
        assert_eq!(winner.time, "2.00s");
        assert_eq!(winner.points, 1450);
    }

    #[test]
    fn test_reveal_without_correct_answers_has_no_winner() {
        let (mut game, quiz_id, question_id) = seeded_game();
        game.set_active_question(question_id, quiz_id, 20, at(100), silent)
            .unwrap();
        game.submit("sara", question_id, 0, at(102)).unwrap();
        game.update_round_status(Status::Revealed, silent).unwrap();

        let mut client = DisplayClient::new();
        client.connect(&game).unwrap();

        let Screen::Reveal(board) = client.screen(at(110)) else {
            panic!("expected the reveal board");
        };
        assert_eq!(board.winner, None);
    }

    #[test]
    fn test_standings_show_top_entries() {
        let (mut game, quiz_id, question_id) = seeded_game();
        game.set_active_question(question_id, quiz_id, 20, at(100), silent)
            .unwrap();
        game.submit("sara", question_id, 2, at(102)).unwrap();
        game.submit("omar", question_id, 1, at(103)).unwrap();
        game.update_round_status(Status::Leaderboard, silent).unwrap();

        let mut client = DisplayClient::new();
        client.connect(&game).unwrap();

        let Screen::Standings(standings) = client.screen(at(110)) else {
            panic!("expected the standings");
        };
        assert_eq!(standings.exact_count(), 2);
        assert_eq!(standings.items()[0].player_name, "sara");
    }

    #[test]
    fn test_board_survives_a_detour_through_the_leaderboard() {
        let (mut game, quiz_id, question_id) = seeded_game();
        game.set_active_question(question_id, quiz_id, 20, at(100), silent)
            .unwrap();
        game.submit("sara", question_id, 2, at(102)).unwrap();
        let mut client = DisplayClient::new();
        client.connect(&game).unwrap();

        game.update_round_status(Status::Revealed, silent).unwrap();
        apply_current_round(&mut client, &game);
        game.update_round_status(Status::Leaderboard, silent).unwrap();
        apply_current_round(&mut client, &game);
        game.update_round_status(Status::Revealed, silent).unwrap();
        apply_current_round(&mut client, &game);

        assert!(matches!(client.screen(at(120)), Screen::Reveal(_)));
    }

    #[test]
    fn test_new_activation_resets_the_live_state() {
        let (mut game, quiz_id, question_id) = seeded_game();
        game.set_active_question(question_id, quiz_id, 20, at(100), silent)
            .unwrap();
        let mut client = DisplayClient::new();
        client.connect(&game).unwrap();
        let response = game.submit("sara", question_id, 2, at(102)).unwrap();
        client
            .apply_update(crate::UpdateMessage::Answer(response), &game)
            .unwrap();
        assert_eq!(client.answer_count(), 1);

        game.clear_all_responses();
        game.set_active_question(question_id, quiz_id, 20, at(200), silent)
            .unwrap();
        apply_current_round(&mut client, &game);

        assert_eq!(client.answer_count(), 0);
        assert!(matches!(
            client.screen(at(201)),
            Screen::Question { answer_count: 0, .. }
        ));
    }

    #[test]
    fn test_stop_returns_to_waiting() {
        let (mut game, quiz_id, question_id) = seeded_game();
        game.set_active_question(question_id, quiz_id, 20, at(100), silent)
            .unwrap();
        let mut client = DisplayClient::new();
        client.connect(&game).unwrap();

        game.update_round_status(Status::Idle, silent).unwrap();
        apply_current_round(&mut client, &game);

        assert!(matches!(client.screen(at(110)), Screen::Waiting));
        assert_eq!(client.answer_feed(), None);
    }
}
