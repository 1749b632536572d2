//! State machine for the moderator console
//!
//! The console is the round's only writer: it picks a quiz, starts a
//! question with a countdown, reveals the answer, puts the standings
//! up, stops, and clears recorded responses. While a question runs it
//! watches the responses arrive with names attached, ordered fastest
//! first. Requests are optimistic: the console disables its controls
//! the moment one leaves and re-enables them when the engine answers,
//! with a round broadcast standing in for an acknowledgement.

use std::collections::HashSet;

use web_time::{Duration, SystemTime};

use super::ClientCore;
use crate::{
    UpdateMessage,
    catalog::{Question, QuestionId, Quiz, QuizId},
    constants::cadence,
    game::{ClearReport, ControlError, ControlFeedback, ControlRequest},
    ledger::{Response, ResponseId},
    round::{RoundState, Status},
    session::{Disconnected, Fetch},
};

/// Which console buttons should currently be enabled
///
/// Derived from the round status plus whether a request is in flight,
/// never from any local history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    /// Starting a question is offered while a quiz with questions is
    /// selected
    pub can_start: bool,
    /// Revealing is offered only while a question is live
    pub can_reveal: bool,
    /// The standings are offered while live or revealed
    pub can_show_standings: bool,
    /// Stopping is offered whenever the round is not already idle
    pub can_stop: bool,
}

/// The state machine behind the operator console
#[derive(Debug, Default)]
pub struct ModeratorClient {
    core: ClientCore,
    quizzes: Vec<Quiz>,
    selected_quiz: Option<QuizId>,
    questions: Vec<Question>,
    /// Responses to the live question, ordered fastest first
    responses: Vec<Response>,
    /// Responses already listed, so replays are not listed twice
    seen: HashSet<ResponseId>,
    in_flight: bool,
    last_error: Option<ControlError>,
    last_report: Option<ClearReport>,
    /// Identifies one question run; a change resets the live state
    run: (Option<QuestionId>, Option<SystemTime>),
}

impl ModeratorClient {
    /// How often the console should re-render the countdown
    pub const TICK: Duration = Duration::from_millis(cadence::MODERATOR_TICK_MILLIS);

    /// Creates a console with nothing selected yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronizes with the engine on connect or reconnect
    ///
    /// Loads the quiz listing and the current round; rejoining during
    /// a live question also recovers its response list.
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if a read fails.
    pub fn connect<F: Fetch>(&mut self, fetch: &F) -> Result<(), Disconnected> {
        self.refresh_catalog(fetch)?;
        let round = fetch.fetch_round()?;
        self.apply_round(round, fetch)
    }

    /// Re-reads the quiz listing and the selected quiz's questions
    ///
    /// The selection survives the refresh unless its quiz is gone, in
    /// which case it is dropped together with the question listing.
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if a read fails.
    pub fn refresh_catalog<F: Fetch>(&mut self, fetch: &F) -> Result<(), Disconnected> {
        self.quizzes = fetch.fetch_quizzes()?;
        match self.selected_quiz {
            Some(quiz_id) if self.quizzes.iter().any(|quiz| quiz.id == quiz_id) => {
                self.questions = fetch.fetch_questions(quiz_id)?;
            }
            _ => {
                self.selected_quiz = None;
                self.questions = Vec::new();
            }
        }
        Ok(())
    }

    /// Selects the quiz the console works with
    ///
    /// A quiz that is not in the current listing is ignored.
    ///
    /// # Arguments
    ///
    /// * `quiz_id` - The quiz to select
    /// * `fetch` - The read seam for its question listing
    ///
    /// # Errors
    ///
    /// Returns [`Disconnected`] if reading the questions fails.
    pub fn select_quiz<F: Fetch>(
        &mut self,
        quiz_id: QuizId,
        fetch: &F,
    ) -> Result<(), Disconnected> {
        if !self.quizzes.iter().any(|quiz| quiz.id == quiz_id) {
            return Ok(());
        }
        self.selected_quiz = Some(quiz_id);
        self.questions = fetch.fetch_questions(quiz_id)?;
        Ok(())
    }

    /// Handles one update message from the engine
    ///
    /// Round broadcasts replace the snapshot and count as the
    /// acknowledgement of a pending request; answer inserts extend the
    /// live response list; control feedback resolves a refusal or a
    /// clearing report.
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
            UpdateMessage::Round(round) => {
                self.in_flight = false;
                self.last_error = None;
                self.apply_round(round, fetch)
            }
            UpdateMessage::Answer(response) => {
                self.record_answer(response);
                Ok(())
            }
            UpdateMessage::Control(feedback) => {
                self.record_feedback(feedback);
                Ok(())
            }
            UpdateMessage::Submission(_) => Ok(()),
        }
    }

    fn apply_round<F: Fetch>(&mut self, round: RoundState, fetch: &F) -> Result<(), Disconnected> {
        let run = (round.question_id, round.started_at);
        if self.run != run {
            self.responses.clear();
            self.seen.clear();
            self.last_report = None;
            self.run = run;
        }
        self.core.apply_round(round, fetch)?;

        // seed the list from the recorded responses; a reconnect may
        // have missed live answer updates
        if self.core.round().map(|round| round.status) == Some(Status::Active) {
            let Some(question_id) = self.core.question().map(|question| question.id) else {
                return Ok(());
            };
            let responses = fetch.fetch_responses(question_id)?;
            self.seen = responses.iter().map(|response| response.id).collect();
            self.responses = responses;
            self.responses.sort_by_key(|response| response.elapsed_ms);
        }
        Ok(())
    }

    fn record_answer(&mut self, response: Response) {
        let Some(question_id) = self.core.question().map(|question| question.id) else {
            return;
        };
        if response.question_id != question_id {
            return;
        }
        if self.seen.insert(response.id) {
            self.responses.push(response);
            self.responses.sort_by_key(|response| response.elapsed_ms);
        }
    }

    /// Resolves the outcome of this console's own control request
    ///
    /// A refusal re-enables the controls and keeps the error until the
    /// next request. A clearing report empties the live response list
    /// when the cleared quizzes include the one being played.
    pub fn record_feedback(&mut self, feedback: ControlFeedback) {
        self.in_flight = false;
        match feedback {
            ControlFeedback::Rejected(error) => {
                self.last_error = Some(error);
            }
            ControlFeedback::Cleared(report) => {
                let live_quiz = self.core.round().and_then(|round| round.quiz_id);
                let live_cleared = live_quiz.is_some_and(|quiz_id| {
                    report.cleared.iter().any(|&(cleared, _)| cleared == quiz_id)
                });
                if live_cleared {
                    self.responses.clear();
                    self.seen.clear();
                }
                self.last_report = Some(report);
            }
        }
    }

    /// Which buttons the console should offer right now
    pub fn controls(&self) -> Controls {
        let status = self.core.round().map(|round| round.status);
        let settled = !self.in_flight;
        Controls {
            can_start: settled && self.selected_quiz.is_some() && !self.questions.is_empty(),
            can_reveal: settled && status == Some(Status::Active),
            can_show_standings: settled
                && matches!(status, Some(Status::Active | Status::Revealed)),
            can_stop: settled && status.is_some_and(|status| status != Status::Idle),
        }
    }

    fn dispatch(&mut self, request: ControlRequest) -> Option<ControlRequest> {
        self.in_flight = true;
        self.last_error = None;
        self.last_report = None;
        Some(request)
    }

    /// Starts a question from the selected quiz
    ///
    /// Returns the request the host should send, or `None` when no
    /// request may leave: a request is already in flight, no quiz is
    /// selected, or the question is not in the selected quiz's
    /// listing. The countdown length is passed through for the engine
    /// to validate.
    ///
    /// # Arguments
    ///
    /// * `question_id` - The question to run
    /// * `timer_seconds` - The requested countdown length
    pub fn start_question(
        &mut self,
        question_id: QuestionId,
        timer_seconds: u64,
    ) -> Option<ControlRequest> {
        if self.in_flight {
            return None;
        }
        let quiz_id = self.selected_quiz?;
        if !self
            .questions
            .iter()
            .any(|question| question.id == question_id)
        {
            return None;
        }
        self.dispatch(ControlRequest::SetActiveQuestion {
            question_id,
            quiz_id,
            timer_seconds,
        })
    }

    /// Reveals the live question's correct answer
    pub fn reveal(&mut self) -> Option<ControlRequest> {
        if !self.controls().can_reveal {
            return None;
        }
        self.dispatch(ControlRequest::UpdateStatus(Status::Revealed))
    }

    /// Puts the standings on the shared display
    pub fn show_standings(&mut self) -> Option<ControlRequest> {
        if !self.controls().can_show_standings {
            return None;
        }
        self.dispatch(ControlRequest::UpdateStatus(Status::Leaderboard))
    }

    /// Stops the round back to idle
    pub fn stop(&mut self) -> Option<ControlRequest> {
        if !self.controls().can_stop {
            return None;
        }
        self.dispatch(ControlRequest::UpdateStatus(Status::Idle))
    }

    /// Clears the selected quiz's recorded responses
    pub fn clear_quiz(&mut self) -> Option<ControlRequest> {
        if self.in_flight {
            return None;
        }
        let quiz_id = self.selected_quiz?;
        self.dispatch(ControlRequest::ClearResponses(quiz_id))
    }

    /// Clears recorded responses for every quiz
    pub fn clear_everything(&mut self) -> Option<ControlRequest> {
        if self.in_flight {
            return None;
        }
        self.dispatch(ControlRequest::ClearAllResponses)
    }

    /// The question this console wants recorded answers streamed for
    pub fn answer_feed(&self) -> Option<QuestionId> {
        self.core.feed_target()
    }

    /// The last round record received, if any
    pub fn round(&self) -> Option<&RoundState> {
        self.core.round()
    }

    /// The quiz listing, in creation order
    pub fn quizzes(&self) -> &[Quiz] {
        &self.quizzes
    }

    /// The selected quiz, if any
    pub fn selected_quiz(&self) -> Option<QuizId> {
        self.selected_quiz
    }

    /// The selected quiz's questions, in sort order
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The live question's responses, fastest first
    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// Whether a control request is waiting for the engine's answer
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// The last refusal the engine sent back, until the next request
    pub fn last_error(&self) -> Option<&ControlError> {
        self.last_error.as_ref()
    }

    /// The outcome of the last clearing request, until the next one
    pub fn last_report(&self) -> Option<&ClearReport> {
        self.last_report.as_ref()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        catalog::{Bilingual, QuestionDraft},
        game::{Game, IncomingMessage},
        observer::{Id, Role},
        session::Tunnel,
    };

    struct NoTunnel;

    impl Tunnel for NoTunnel {
        fn send_message(&self, _message: &crate::UpdateMessage) {}
        fn send_state(&self, _message: &crate::SyncMessage) {}
        fn close(self) {}
    }

    fn silent(_id: Id) -> Option<NoTunnel> {
        None
    }

    #[derive(Clone)]
    struct MockTunnel {
        messages:
            std::sync::Arc<std::sync::Mutex<std::collections::VecDeque<crate::UpdateMessage>>>,
    }

    impl MockTunnel {
        fn new() -> Self {
            Self {
                messages: std::sync::Arc::new(std::sync::Mutex::new(
                    std::collections::VecDeque::new(),
                )),
            }
        }

        fn pop_message(&self) -> Option<crate::UpdateMessage> {
            self.messages.lock().unwrap().pop_front()
        }
    }

    impl Tunnel for MockTunnel {
        fn send_message(&self, message: &crate::UpdateMessage) {
            self.messages.lock().unwrap().push_back(message.clone());
        }

        fn send_state(&self, _message: &crate::SyncMessage) {}

        fn close(self) {}
    }

    fn at(seconds: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(seconds)
    }

    fn bilingual(text: &str) -> Bilingual {
        Bilingual::new(text, format!("{text} بالعربية"))
    }

    fn seeded_game() -> (Game, QuizId, Vec<QuestionId>) {
        let mut game = Game::default();
        let quiz_id = game.upsert_quiz(None, bilingual("Colors"), at(0)).unwrap();
        let sky = game
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
        let grass = game
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
        (game, quiz_id, vec![sky, grass])
    }

    fn apply_current_round(client: &mut ModeratorClient, game: &Game) {
        client
            .apply_update(crate::UpdateMessage::Round(game.round.clone()), game)
            .unwrap();
    }

    #[test]
    fn test_connect_loads_the_catalog() {
        let (game, quiz_id, questions) = seeded_game();
        let mut client = ModeratorClient::new();
        client.connect(&game).unwrap();

        assert_eq!(client.quizzes().len(), 1);
        assert_eq!(client.quizzes()[0].title.en, "Colors");
        assert_eq!(client.selected_quiz(), None);
        assert!(!client.controls().can_start);

        client.select_quiz(quiz_id, &game).unwrap();
        assert_eq!(client.selected_quiz(), Some(quiz_id));
        assert_eq!(client.questions().len(), 2);
        assert_eq!(client.questions()[0].id, questions[0]);
        assert_eq!(client.questions()[1].id, questions[1]);
        assert!(client.controls().can_start);
        assert!(!client.controls().can_reveal);
        assert!(!client.controls().can_stop);
    }

    #[test]
    fn test_start_question_disables_until_the_broadcast() {
        let (mut game, quiz_id, questions) = seeded_game();
        let mut client = ModeratorClient::new();
        client.connect(&game).unwrap();
        client.select_quiz(quiz_id, &game).unwrap();

        let request = client.start_question(questions[0], 20).unwrap();
        match request {
            ControlRequest::SetActiveQuestion {
                question_id,
                quiz_id: requested_quiz,
                timer_seconds,
            } => {
                assert_eq!(question_id, questions[0]);
                assert_eq!(requested_quiz, quiz_id);
                assert_eq!(timer_seconds, 20);
            }
            other => panic!("expected an activation request, got {other:?}"),
        }
        assert!(client.in_flight());
        assert!(!client.controls().can_start);
        assert!(client.start_question(questions[1], 20).is_none());

        // the engine runs the request; its broadcast re-enables the console
        game.set_active_question(questions[0], quiz_id, 20, at(100), silent)
            .unwrap();
        apply_current_round(&mut client, &game);

        assert!(!client.in_flight());
        assert!(client.controls().can_reveal);
        assert_eq!(client.answer_feed(), Some(questions[0]));
    }

    #[test]
    fn test_start_refuses_questions_outside_the_selection() {
        let (game, quiz_id, _questions) = seeded_game();
        let mut client = ModeratorClient::new();
        client.connect(&game).unwrap();
        client.select_quiz(quiz_id, &game).unwrap();

        assert!(client.start_question(QuestionId::new(), 20).is_none());
        assert!(!client.in_flight());
    }

    #[test]
    fn test_gating_follows_the_status() {
        let (mut game, quiz_id, questions) = seeded_game();
        let mut client = ModeratorClient::new();
        client.connect(&game).unwrap();
        client.select_quiz(quiz_id, &game).unwrap();

        let idle = client.controls();
        assert!(!idle.can_reveal && !idle.can_show_standings && !idle.can_stop);

        game.set_active_question(questions[0], quiz_id, 20, at(100), silent)
            .unwrap();
        apply_current_round(&mut client, &game);
        let active = client.controls();
        assert!(active.can_reveal && active.can_show_standings && active.can_stop);

        game.update_round_status(Status::Revealed, silent).unwrap();
        apply_current_round(&mut client, &game);
        let revealed = client.controls();
        assert!(!revealed.can_reveal && revealed.can_show_standings && revealed.can_stop);

        game.update_round_status(Status::Leaderboard, silent).unwrap();
        apply_current_round(&mut client, &game);
        let standings = client.controls();
        assert!(!standings.can_reveal && !standings.can_show_standings && standings.can_stop);

        game.update_round_status(Status::Idle, silent).unwrap();
        apply_current_round(&mut client, &game);
        assert!(!client.controls().can_stop);
    }

    #[test]
    fn test_status_requests_follow_the_gating() {
        let (mut game, quiz_id, questions) = seeded_game();
        let mut client = ModeratorClient::new();
        client.connect(&game).unwrap();
        client.select_quiz(quiz_id, &game).unwrap();

        // nothing live yet, so neither reveal nor stop may leave
        assert!(client.reveal().is_none());
        assert!(client.stop().is_none());

        game.set_active_question(questions[0], quiz_id, 20, at(100), silent)
            .unwrap();
        apply_current_round(&mut client, &game);

        let request = client.reveal().unwrap();
        assert!(matches!(
            request,
            ControlRequest::UpdateStatus(Status::Revealed)
        ));
        // in flight: the next request is held back
        assert!(client.show_standings().is_none());

        game.update_round_status(Status::Revealed, silent).unwrap();
        apply_current_round(&mut client, &game);
        assert!(matches!(
            client.show_standings(),
            Some(ControlRequest::UpdateStatus(Status::Leaderboard))
        ));
    }

    #[test]
    fn test_rejected_feedback_reverts_the_console() {
        let (game, quiz_id, questions) = seeded_game();
        let mut client = ModeratorClient::new();
        client.connect(&game).unwrap();
        client.select_quiz(quiz_id, &game).unwrap();

        assert!(client.start_question(questions[0], 0).is_some());
        assert!(client.in_flight());

        client.record_feedback(ControlFeedback::Rejected(ControlError::TimerOutOfRange));

        assert!(!client.in_flight());
        assert_eq!(client.last_error(), Some(&ControlError::TimerOutOfRange));
        assert!(client.controls().can_start);

        // the next request dismisses the stale error
        assert!(client.start_question(questions[0], 20).is_some());
        assert_eq!(client.last_error(), None);
    }

    #[test]
    fn test_wire_round_trip_with_the_engine() {
        let (mut game, quiz_id, questions) = seeded_game();
        let moderator = Id::new();
        let tunnel = MockTunnel::new();
        let tunnels = std::collections::HashMap::from([(moderator, tunnel.clone())]);
        let finder = |id| tunnels.get(&id).cloned();
        game.add_observer(moderator, Role::Moderator, finder).unwrap();

        let mut client = ModeratorClient::new();
        client.connect(&game).unwrap();
        client.select_quiz(quiz_id, &game).unwrap();

        let request = client.start_question(questions[0], 20).unwrap();
        game.receive_message(moderator, IncomingMessage::Moderator(request), at(100), finder);

        let update = tunnel.pop_message().unwrap();
        assert!(matches!(update, crate::UpdateMessage::Round(_)));
        client.apply_update(update, &game).unwrap();

        assert!(!client.in_flight());
        assert!(client.controls().can_reveal);
        assert_eq!(client.answer_feed(), Some(questions[0]));
    }

    #[test]
    fn test_live_responses_stay_ordered_by_speed() {
        let (mut game, quiz_id, questions) = seeded_game();
        game.set_active_question(questions[0], quiz_id, 20, at(100), silent)
            .unwrap();
        let mut client = ModeratorClient::new();
        client.connect(&game).unwrap();
        assert!(client.responses().is_empty());

        let slow = game.submit("lina", questions[0], 0, at(105)).unwrap();
        let fast = game.submit("sara", questions[0], 2, at(101)).unwrap();
        let middle = game.submit("omar", questions[0], 2, at(103)).unwrap();
        for response in [slow.clone(), fast, middle] {
            client
                .apply_update(crate::UpdateMessage::Answer(response), &game)
                .unwrap();
        }
        // a replayed insert is not listed twice
        client
            .apply_update(crate::UpdateMessage::Answer(slow), &game)
            .unwrap();

        let names: Vec<&str> = client
            .responses()
            .iter()
            .map(|response| response.player_name.as_str())
            .collect();
        assert_eq!(names, vec!["sara", "omar", "lina"]);
    }

    #[test]
    fn test_reconnect_recovers_the_response_list() {
        let (mut game, quiz_id, questions) = seeded_game();
        game.set_active_question(questions[0], quiz_id, 20, at(100), silent)
            .unwrap();
        game.submit("omar", questions[0], 1, at(104)).unwrap();
        game.submit("sara", questions[0], 2, at(102)).unwrap();

        let mut client = ModeratorClient::new();
        client.connect(&game).unwrap();

        assert_eq!(client.responses().len(), 2);
        assert_eq!(client.responses()[0].player_name, "sara");
        assert_eq!(client.responses()[1].player_name, "omar");
    }

    #[test]
    fn test_new_activation_resets_the_response_list() {
        let (mut game, quiz_id, questions) = seeded_game();
        game.set_active_question(questions[0], quiz_id, 20, at(100), silent)
            .unwrap();
        let mut client = ModeratorClient::new();
        client.connect(&game).unwrap();
        let response = game.submit("sara", questions[0], 2, at(101)).unwrap();
        client
            .apply_update(crate::UpdateMessage::Answer(response), &game)
            .unwrap();
        assert_eq!(client.responses().len(), 1);

        game.set_active_question(questions[1], quiz_id, 20, at(200), silent)
            .unwrap();
        apply_current_round(&mut client, &game);

        assert!(client.responses().is_empty());
        assert_eq!(client.answer_feed(), Some(questions[1]));
    }

    #[test]
    fn test_clear_requests_name_the_selection() {
        let (game, quiz_id, _questions) = seeded_game();
        let mut client = ModeratorClient::new();
        client.connect(&game).unwrap();

        // nothing selected, so there is nothing to clear
        assert!(client.clear_quiz().is_none());

        client.select_quiz(quiz_id, &game).unwrap();
        let request = client.clear_quiz().unwrap();
        assert!(matches!(
            request,
            ControlRequest::ClearResponses(cleared) if cleared == quiz_id
        ));
        assert!(client.in_flight());

        client.record_feedback(ControlFeedback::Cleared(ClearReport {
            cleared: vec![(quiz_id, 3)],
        }));
        assert!(!client.in_flight());
        assert_eq!(client.last_report().map(ClearReport::total), Some(3));

        assert!(matches!(
            client.clear_everything(),
            Some(ControlRequest::ClearAllResponses)
        ));
        // a fresh request dismisses the previous report
        assert!(client.last_report().is_none());
    }

    #[test]
    fn test_clearing_the_played_quiz_empties_the_live_list() {
        let (mut game, quiz_id, questions) = seeded_game();
        game.set_active_question(questions[0], quiz_id, 20, at(100), silent)
            .unwrap();
        game.submit("sara", questions[0], 2, at(101)).unwrap();
        let mut client = ModeratorClient::new();
        client.connect(&game).unwrap();
        assert_eq!(client.responses().len(), 1);

        client.record_feedback(ControlFeedback::Cleared(ClearReport {
            cleared: vec![(quiz_id, 1)],
        }));

        assert!(client.responses().is_empty());
        assert_eq!(client.last_report().map(ClearReport::total), Some(1));
    }

    #[test]
    fn test_clearing_another_quiz_keeps_the_live_list() {
        let (mut game, quiz_id, questions) = seeded_game();
        game.set_active_question(questions[0], quiz_id, 20, at(100), silent)
            .unwrap();
        game.submit("sara", questions[0], 2, at(101)).unwrap();
        let mut client = ModeratorClient::new();
        client.connect(&game).unwrap();

        client.record_feedback(ControlFeedback::Cleared(ClearReport {
            cleared: vec![(QuizId::new(), 4)],
        }));

        assert_eq!(client.responses().len(), 1);
    }

    #[test]
    fn test_selection_is_dropped_when_the_quiz_is_deleted() {
        let (mut game, quiz_id, _questions) = seeded_game();
        let mut client = ModeratorClient::new();
        client.connect(&game).unwrap();
        client.select_quiz(quiz_id, &game).unwrap();
        assert!(client.controls().can_start);

        game.delete_quiz(quiz_id, silent).unwrap();
        client.refresh_catalog(&game).unwrap();

        assert_eq!(client.selected_quiz(), None);
        assert!(client.questions().is_empty());
        assert!(!client.controls().can_start);
    }
}
