//! Game Session State Machine
//!
//! Owns one game's players, optional teams, the question queue, and per-player
//! answer history. All methods are synchronous in-memory mutations; the async
//! coordination (timers, broadcast) lives in `network/`.
//!
//! Lifecycle: `Waiting → InProgress → Finished`, both transitions
//! one-directional. While `InProgress`, rounds cycle through
//! dequeue → answer window → advance.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;

use crate::game::player::{Player, PlayerId, Team, TeamId};
use crate::game::question::{AnswerRecord, Question, QuestionId};
use crate::game::scoring::{compare_players, time_bonus, LeaderboardEntry, TeamStanding};
use crate::game::settings::GameSettings;
use crate::providers::QuestionProvider;

/// Minimum spacing between two round advances for the same session.
///
/// Prevents a double-advance when the round timer and an "all answered"
/// trigger race; whichever advance lands second inside this window is a no-op.
pub const ADVANCE_GUARD: Duration = Duration::from_secs(5);

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// Accepting players, no questions drawn yet.
    Waiting,
    /// A game is running; rounds are cycling.
    InProgress,
    /// The game ended; state is frozen for final reads.
    Finished,
}

/// Result of judging one answer submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// Right option inside the window; carries the points earned.
    Correct {
        /// Base value plus time bonus.
        points: u32,
    },
    /// Wrong option inside the window. Earns nothing, costs nothing.
    Incorrect,
    /// No open round for this player, or the window had closed.
    TimeUp,
}

/// Session errors. Expected conditions, reported as values and never panics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Session already holds `max_players`.
    #[error("Game is full")]
    GameFull,

    /// Game started and late joining is disabled.
    #[error("Game already started")]
    LateJoinDisabled,

    /// Operation not valid in the current lifecycle state.
    #[error("Invalid game state")]
    InvalidState,

    /// Cannot start a game with zero players.
    #[error("No players in game")]
    NoPlayers,

    /// The question provider returned nothing for the requested filters.
    #[error("No questions available for the requested filters")]
    NoQuestions,

    /// Explicit player id collides with an existing player.
    #[error("Player id already in use")]
    DuplicateId,
}

/// One running trivia game.
pub struct GameSession {
    code: String,
    status: GameStatus,
    settings: GameSettings,
    players: BTreeMap<PlayerId, Player>,
    teams: Vec<Team>,
    question_queue: VecDeque<Question>,
    current_question: Option<Question>,
    current_question_number: u32,
    question_started_at: Option<Instant>,
    answers: BTreeMap<PlayerId, Vec<AnswerRecord>>,
}

impl GameSession {
    /// Create a session in `Waiting`. Teams are fixed at construction.
    pub fn new(code: impl Into<String>, settings: GameSettings) -> Self {
        let teams = match settings.teams {
            Some(count) => (1..=count)
                .map(|id| Team::new(id, format!("Team {id}")))
                .collect(),
            None => Vec::new(),
        };

        Self {
            code: code.into(),
            status: GameStatus::Waiting,
            settings,
            players: BTreeMap::new(),
            teams,
            question_queue: VecDeque::new(),
            current_question: None,
            current_question_number: 0,
            question_started_at: None,
            answers: BTreeMap::new(),
        }
    }

    // =========================================================================
    // PLAYER ADMISSION
    // =========================================================================

    /// Add a player. Fails if the session is full, or started without late
    /// joining enabled.
    ///
    /// Ids are assigned monotonically (max existing + 1) unless the caller
    /// supplies one; a supplied id that is already taken is rejected. In team
    /// mode the player lands on the requested team if it
    /// exists, otherwise on the team with the fewest members (creation order
    /// breaks ties).
    pub fn add_player(
        &mut self,
        name: impl Into<String>,
        explicit_id: Option<PlayerId>,
        joined_at: Option<chrono::DateTime<Utc>>,
        team_preference: Option<TeamId>,
    ) -> Result<PlayerId, GameError> {
        if self.players.len() >= self.settings.max_players {
            return Err(GameError::GameFull);
        }
        if self.status == GameStatus::InProgress && !self.settings.allow_late_join {
            return Err(GameError::LateJoinDisabled);
        }
        if self.status == GameStatus::Finished {
            return Err(GameError::InvalidState);
        }

        let id = match explicit_id {
            Some(id) => {
                if self.players.contains_key(&id) {
                    return Err(GameError::DuplicateId);
                }
                id
            }
            None => self.players.keys().next_back().map_or(1, |max| max + 1),
        };

        let mut player = Player::new(id, name, joined_at.unwrap_or_else(Utc::now));

        if self.settings.team_mode() {
            let team_id = team_preference
                .filter(|id| self.teams.iter().any(|t| t.id == *id))
                .unwrap_or_else(|| {
                    // min_by_key keeps the first minimum, i.e. creation order.
                    self.teams
                        .iter()
                        .min_by_key(|t| t.members.len())
                        .map(|t| t.id)
                        .unwrap_or(1)
                });
            if let Some(team) = self.teams.iter_mut().find(|t| t.id == team_id) {
                team.members.push(id);
            }
            player.team = Some(team_id);
        }

        self.players.insert(id, player);
        self.answers.entry(id).or_default();

        Ok(id)
    }

    // =========================================================================
    // GAME START
    // =========================================================================

    /// Draw questions and enter `InProgress`, advancing straight to round 1.
    ///
    /// No state changes on failure: the session remains `Waiting` and the
    /// queue untouched if the provider returns zero questions.
    pub fn start_game(
        &mut self,
        provider: &dyn QuestionProvider,
        categories: Option<&[String]>,
        max_difficulty: Option<crate::game::question::Difficulty>,
    ) -> Result<(), GameError> {
        self.start_game_at(provider, categories, max_difficulty, Instant::now())
    }

    /// `start_game` with an explicit clock, for tests.
    pub fn start_game_at(
        &mut self,
        provider: &dyn QuestionProvider,
        categories: Option<&[String]>,
        max_difficulty: Option<crate::game::question::Difficulty>,
        now: Instant,
    ) -> Result<(), GameError> {
        if self.players.is_empty() {
            return Err(GameError::NoPlayers);
        }
        if self.status != GameStatus::Waiting {
            return Err(GameError::InvalidState);
        }

        let categories = categories.unwrap_or(&self.settings.categories);
        let difficulty = max_difficulty.unwrap_or(self.settings.max_difficulty);
        let mut questions =
            provider.questions(categories, difficulty, self.settings.questions_per_game);
        if questions.is_empty() {
            return Err(GameError::NoQuestions);
        }

        // Questions without their own answer window get the session default.
        for q in &mut questions {
            if q.time_limit_secs == 0 {
                q.time_limit_secs = self.settings.default_time_limit_secs;
            }
        }

        self.question_queue = questions.into();
        self.status = GameStatus::InProgress;
        self.current_question_number = 0;
        self.advance_round_at(now);

        Ok(())
    }

    // =========================================================================
    // ROUND CYCLE
    // =========================================================================

    /// Move to the next question. Returns whether a question is now active.
    ///
    /// An empty queue ends the game and returns false. A call landing within
    /// [`ADVANCE_GUARD`] of the current round's start is a no-op returning
    /// true (the round stays open).
    pub fn advance_round(&mut self) -> bool {
        self.advance_round_at(Instant::now())
    }

    /// `advance_round` with an explicit clock, for tests.
    pub fn advance_round_at(&mut self, now: Instant) -> bool {
        if self.status != GameStatus::InProgress {
            return false;
        }

        if self.current_question.is_some() {
            if let Some(started) = self.question_started_at {
                if now.saturating_duration_since(started) < ADVANCE_GUARD {
                    return true;
                }
            }
        }

        match self.question_queue.pop_front() {
            Some(question) => {
                self.current_question = Some(question);
                self.current_question_number += 1;
                self.question_started_at = Some(now);
                true
            }
            None => {
                self.end_game();
                false
            }
        }
    }

    /// Judge an answer for the current round.
    ///
    /// `TimeUp` covers every way the submission can miss the window: no
    /// running game, no active question, unknown player, or a late arrival.
    /// Only a correct answer changes scores; incorrect never decrements.
    pub fn submit_answer(&mut self, player_id: PlayerId, selected_option: usize) -> AnswerOutcome {
        self.submit_answer_at(player_id, selected_option, Instant::now())
    }

    /// `submit_answer` with an explicit clock, for tests.
    pub fn submit_answer_at(
        &mut self,
        player_id: PlayerId,
        selected_option: usize,
        now: Instant,
    ) -> AnswerOutcome {
        if self.status != GameStatus::InProgress || !self.players.contains_key(&player_id) {
            return AnswerOutcome::TimeUp;
        }
        let (question_id, correct_option, base_points, time_limit_secs) =
            match (&self.current_question, self.question_started_at) {
                (Some(q), Some(_)) => (q.id, q.correct_option, q.points(), q.time_limit_secs),
                _ => return AnswerOutcome::TimeUp,
            };

        let started = self.question_started_at.expect("checked above");
        let elapsed = now.saturating_duration_since(started);
        if elapsed >= Duration::from_secs(u64::from(time_limit_secs)) {
            return AnswerOutcome::TimeUp;
        }

        self.answers.entry(player_id).or_default().push(AnswerRecord {
            player_id,
            question_id,
            selected_option,
            submitted_at: Utc::now(),
        });

        if selected_option != correct_option {
            return AnswerOutcome::Incorrect;
        }

        let points = base_points + time_bonus(time_limit_secs, elapsed);
        let team_id = {
            let player = self.players.get_mut(&player_id).expect("checked above");
            player.score += points;
            player.correct_answers += 1;
            player.team
        };
        if let Some(team_id) = team_id {
            if let Some(team) = self.teams.iter_mut().find(|t| t.id == team_id) {
                team.total_score += points;
                team.correct_answers += 1;
            }
        }

        AnswerOutcome::Correct { points }
    }

    /// True iff every active player has answered the current question.
    pub fn all_players_answered(&self) -> bool {
        let question_id = match &self.current_question {
            Some(q) => q.id,
            None => return false,
        };
        self.players
            .values()
            .filter(|p| p.is_active)
            .all(|p| self.has_answered(p.id, question_id))
    }

    /// Whether a player already has a recorded answer for a question.
    pub fn has_answered(&self, player_id: PlayerId, question_id: QuestionId) -> bool {
        self.answers
            .get(&player_id)
            .is_some_and(|records| records.iter().any(|r| r.question_id == question_id))
    }

    /// Idempotent transition to `Finished`.
    pub fn end_game(&mut self) {
        self.status = GameStatus::Finished;
        self.current_question = None;
        self.question_started_at = None;
    }

    // =========================================================================
    // QUERIES (defensive snapshots)
    // =========================================================================

    /// Active players ranked by score desc, correct answers desc, join time asc.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut ranked: Vec<&Player> = self.players.values().filter(|p| p.is_active).collect();
        ranked.sort_by(|a, b| compare_players(a, b));
        ranked.into_iter().map(LeaderboardEntry::from_player).collect()
    }

    /// Teams ranked by aggregate score desc, then aggregate correct answers desc.
    pub fn team_leaderboard(&self) -> Vec<TeamStanding> {
        let mut standings: Vec<TeamStanding> = self
            .teams
            .iter()
            .map(|t| TeamStanding {
                team_id: t.id,
                name: t.name.clone(),
                total_score: t.total_score,
                correct_answers: t.correct_answers,
            })
            .collect();
        standings.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then(b.correct_answers.cmp(&a.correct_answers))
        });
        standings
    }

    /// Game code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Lifecycle state.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Session settings.
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// The active question, if a round is open.
    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    /// 1-based ordinal of the active question.
    pub fn current_question_number(&self) -> u32 {
        self.current_question_number
    }

    /// When the current round opened.
    pub fn question_started_at(&self) -> Option<Instant> {
        self.question_started_at
    }

    /// Look up a player.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Number of admitted players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// (id, name) pairs for roster broadcasts, in id order.
    pub fn roster(&self) -> Vec<(PlayerId, String)> {
        self.players.values().map(|p| (p.id, p.name.clone())).collect()
    }

    /// Snapshot of the teams (team mode only; empty otherwise).
    pub fn teams(&self) -> Vec<Team> {
        self.teams.clone()
    }

    /// Snapshot of one player's answer history.
    pub fn answers_for(&self, player_id: PlayerId) -> Vec<AnswerRecord> {
        self.answers.get(&player_id).cloned().unwrap_or_default()
    }

    /// Mark a player active or inactive. Returns false for unknown ids.
    ///
    /// Inactive players keep their score but drop out of the leaderboard and
    /// the "all answered" check.
    pub fn set_player_active(&mut self, player_id: PlayerId, active: bool) -> bool {
        match self.players.get_mut(&player_id) {
            Some(player) => {
                player.is_active = active;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::question::Difficulty;
    use std::collections::HashMap;

    /// Provider returning a fixed list in order (no shuffling).
    struct FixedProvider(Vec<Question>);

    impl QuestionProvider for FixedProvider {
        fn questions(
            &self,
            _categories: &[String],
            _max_difficulty: Difficulty,
            count: usize,
        ) -> Vec<Question> {
            self.0.iter().take(count).cloned().collect()
        }

        fn category_counts(&self) -> HashMap<String, usize> {
            HashMap::new()
        }
    }

    fn question(id: QuestionId, difficulty: Difficulty, correct: usize, limit: u32) -> Question {
        Question {
            id,
            text: format!("question {id}"),
            options: [
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
                "d".to_string(),
            ],
            correct_option: correct,
            category: "general".to_string(),
            difficulty,
            time_limit_secs: limit,
        }
    }

    fn session_with(settings: GameSettings) -> GameSession {
        GameSession::new("TEST42", settings)
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_add_player_assigns_monotonic_ids() {
        let mut session = session_with(GameSettings::default());
        assert_eq!(session.add_player("a", None, None, None), Ok(1));
        assert_eq!(session.add_player("b", None, None, None), Ok(2));
        assert_eq!(session.add_player("c", Some(10), None, None), Ok(10));
        assert_eq!(session.add_player("d", None, None, None), Ok(11));
    }

    #[test]
    fn test_duplicate_explicit_id_rejected() {
        let settings = GameSettings {
            teams: Some(2),
            ..Default::default()
        };
        let mut session = session_with(settings);
        session.add_player("alice", Some(1), None, Some(1)).unwrap();

        assert_eq!(
            session.add_player("mallory", Some(1), None, Some(1)),
            Err(GameError::DuplicateId)
        );
        // The original player and their team membership are untouched.
        assert_eq!(session.player(1).unwrap().name, "alice");
        assert_eq!(session.player_count(), 1);
        assert_eq!(session.teams()[0].members, vec![1]);
    }

    #[test]
    fn test_add_player_respects_capacity() {
        let settings = GameSettings {
            max_players: 2,
            ..Default::default()
        };
        let mut session = session_with(settings);
        session.add_player("a", None, None, None).unwrap();
        session.add_player("b", None, None, None).unwrap();
        assert_eq!(session.add_player("c", None, None, None), Err(GameError::GameFull));
        assert_eq!(session.player_count(), 2);
    }

    #[test]
    fn test_late_join_rejected_by_default() {
        let mut session = session_with(GameSettings::default());
        session.add_player("a", None, None, None).unwrap();
        let provider = FixedProvider(vec![question(1, Difficulty::Easy, 0, 20)]);
        session.start_game(&provider, None, None).unwrap();

        assert_eq!(
            session.add_player("late", None, None, None),
            Err(GameError::LateJoinDisabled)
        );
    }

    #[test]
    fn test_late_join_allowed_when_enabled() {
        let settings = GameSettings {
            allow_late_join: true,
            ..Default::default()
        };
        let mut session = session_with(settings);
        session.add_player("a", None, None, None).unwrap();
        let provider = FixedProvider(vec![question(1, Difficulty::Easy, 0, 20)]);
        session.start_game(&provider, None, None).unwrap();

        assert_eq!(session.add_player("late", None, None, None), Ok(2));
    }

    #[test]
    fn test_start_requires_players() {
        let mut session = session_with(GameSettings::default());
        let provider = FixedProvider(vec![question(1, Difficulty::Easy, 0, 20)]);
        assert_eq!(
            session.start_game(&provider, None, None),
            Err(GameError::NoPlayers)
        );
        assert_eq!(session.status(), GameStatus::Waiting);
    }

    #[test]
    fn test_start_fails_without_questions() {
        let mut session = session_with(GameSettings::default());
        session.add_player("a", None, None, None).unwrap();
        let provider = FixedProvider(Vec::new());

        assert_eq!(
            session.start_game(&provider, None, None),
            Err(GameError::NoQuestions)
        );
        // No partial mutation.
        assert_eq!(session.status(), GameStatus::Waiting);
        assert!(session.current_question().is_none());
    }

    #[test]
    fn test_start_enters_first_round() {
        let mut session = session_with(GameSettings::default());
        session.add_player("a", None, None, None).unwrap();
        let provider = FixedProvider(vec![
            question(1, Difficulty::Easy, 0, 20),
            question(2, Difficulty::Hard, 1, 30),
        ]);
        session.start_game(&provider, None, None).unwrap();

        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.current_question_number(), 1);
        assert_eq!(session.current_question().unwrap().id, 1);
    }

    #[test]
    fn test_missing_time_limit_gets_session_default() {
        let settings = GameSettings {
            default_time_limit_secs: 25,
            ..Default::default()
        };
        let mut session = session_with(settings);
        session.add_player("a", None, None, None).unwrap();
        let provider = FixedProvider(vec![question(1, Difficulty::Easy, 0, 0)]);
        session.start_game(&provider, None, None).unwrap();

        assert_eq!(session.current_question().unwrap().time_limit_secs, 25);
    }

    #[test]
    fn test_cannot_start_twice() {
        let mut session = session_with(GameSettings::default());
        session.add_player("a", None, None, None).unwrap();
        let provider = FixedProvider(vec![question(1, Difficulty::Easy, 0, 20)]);
        session.start_game(&provider, None, None).unwrap();

        assert_eq!(
            session.start_game(&provider, None, None),
            Err(GameError::InvalidState)
        );
    }

    #[test]
    fn test_advance_guard_blocks_double_advance() {
        let mut session = session_with(GameSettings::default());
        session.add_player("a", None, None, None).unwrap();
        let provider = FixedProvider(vec![
            question(1, Difficulty::Easy, 0, 20),
            question(2, Difficulty::Easy, 0, 20),
        ]);
        let t0 = Instant::now();
        session.start_game_at(&provider, None, None, t0).unwrap();

        // A second advance 2 seconds into the round is absorbed.
        assert!(session.advance_round_at(t0 + secs(2)));
        assert_eq!(session.current_question().unwrap().id, 1);

        // Past the guard window it advances normally.
        assert!(session.advance_round_at(t0 + secs(6)));
        assert_eq!(session.current_question().unwrap().id, 2);
    }

    #[test]
    fn test_advance_ends_game_on_empty_queue() {
        let mut session = session_with(GameSettings::default());
        session.add_player("a", None, None, None).unwrap();
        let provider = FixedProvider(vec![question(1, Difficulty::Easy, 0, 20)]);
        let t0 = Instant::now();
        session.start_game_at(&provider, None, None, t0).unwrap();

        assert!(!session.advance_round_at(t0 + secs(6)));
        assert_eq!(session.status(), GameStatus::Finished);
        assert!(session.current_question().is_none());
    }

    #[test]
    fn test_correct_answer_scoring() {
        // Medium question: 20 base points, 30s limit.
        let mut session = session_with(GameSettings::default());
        let id = session.add_player("a", None, None, None).unwrap();
        let provider = FixedProvider(vec![question(1, Difficulty::Medium, 2, 30)]);
        let t0 = Instant::now();
        session.start_game_at(&provider, None, None, t0).unwrap();

        let outcome = session.submit_answer_at(id, 2, t0 + secs(10));
        assert_eq!(outcome, AnswerOutcome::Correct { points: 40 });
        assert_eq!(session.player(id).unwrap().score, 40);
        assert_eq!(session.player(id).unwrap().correct_answers, 1);
    }

    #[test]
    fn test_incorrect_answer_scores_nothing() {
        let mut session = session_with(GameSettings::default());
        let id = session.add_player("a", None, None, None).unwrap();
        let provider = FixedProvider(vec![question(1, Difficulty::Medium, 2, 30)]);
        let t0 = Instant::now();
        session.start_game_at(&provider, None, None, t0).unwrap();

        assert_eq!(session.submit_answer_at(id, 0, t0 + secs(5)), AnswerOutcome::Incorrect);
        assert_eq!(session.player(id).unwrap().score, 0);
        assert_eq!(session.player(id).unwrap().correct_answers, 0);
        // The attempt is still recorded.
        assert!(session.has_answered(id, 1));
    }

    #[test]
    fn test_submission_at_limit_is_time_up() {
        let mut session = session_with(GameSettings::default());
        let id = session.add_player("a", None, None, None).unwrap();
        let provider = FixedProvider(vec![question(1, Difficulty::Medium, 2, 30)]);
        let t0 = Instant::now();
        session.start_game_at(&provider, None, None, t0).unwrap();

        assert_eq!(session.submit_answer_at(id, 2, t0 + secs(30)), AnswerOutcome::TimeUp);
        assert_eq!(session.submit_answer_at(id, 2, t0 + secs(45)), AnswerOutcome::TimeUp);
        // Late submissions are not recorded.
        assert!(!session.has_answered(id, 1));
    }

    #[test]
    fn test_time_up_for_unknown_player_or_no_question() {
        let mut session = session_with(GameSettings::default());
        let id = session.add_player("a", None, None, None).unwrap();

        // No game running yet.
        assert_eq!(session.submit_answer(id, 0), AnswerOutcome::TimeUp);

        let provider = FixedProvider(vec![question(1, Difficulty::Easy, 0, 20)]);
        session.start_game(&provider, None, None).unwrap();

        // Unknown player, regardless of option index.
        assert_eq!(session.submit_answer(99, 0), AnswerOutcome::TimeUp);
    }

    #[test]
    fn test_all_players_answered() {
        let mut session = session_with(GameSettings::default());
        let a = session.add_player("a", None, None, None).unwrap();
        let b = session.add_player("b", None, None, None).unwrap();
        let provider = FixedProvider(vec![question(1, Difficulty::Easy, 0, 20)]);
        let t0 = Instant::now();
        session.start_game_at(&provider, None, None, t0).unwrap();

        assert!(!session.all_players_answered());
        session.submit_answer_at(a, 0, t0 + secs(1));
        assert!(!session.all_players_answered());
        session.submit_answer_at(b, 3, t0 + secs(2));
        assert!(session.all_players_answered());
    }

    #[test]
    fn test_all_players_answered_ignores_inactive() {
        let mut session = session_with(GameSettings::default());
        let a = session.add_player("a", None, None, None).unwrap();
        let b = session.add_player("b", None, None, None).unwrap();
        let provider = FixedProvider(vec![question(1, Difficulty::Easy, 0, 20)]);
        let t0 = Instant::now();
        session.start_game_at(&provider, None, None, t0).unwrap();

        session.set_player_active(b, false);
        session.submit_answer_at(a, 0, t0 + secs(1));
        assert!(session.all_players_answered());
        assert_eq!(session.leaderboard().len(), 1);
    }

    #[test]
    fn test_no_question_means_not_all_answered() {
        let session = session_with(GameSettings::default());
        assert!(!session.all_players_answered());
    }

    #[test]
    fn test_end_game_is_idempotent() {
        let mut session = session_with(GameSettings::default());
        session.add_player("a", None, None, None).unwrap();
        let provider = FixedProvider(vec![question(1, Difficulty::Easy, 0, 20)]);
        session.start_game(&provider, None, None).unwrap();

        session.end_game();
        assert_eq!(session.status(), GameStatus::Finished);
        session.end_game();
        assert_eq!(session.status(), GameStatus::Finished);
        assert!(session.current_question().is_none());
    }

    #[test]
    fn test_end_to_end_two_player_game() {
        // The full scenario: 2 players, 1 easy question (10 points, 20s,
        // correct index 2).
        let settings = GameSettings {
            max_players: 2,
            questions_per_game: 1,
            ..Default::default()
        };
        let mut session = session_with(settings);
        let a = session.add_player("A", None, None, None).unwrap();
        let b = session.add_player("B", None, None, None).unwrap();
        assert_eq!((a, b), (1, 2));

        let provider = FixedProvider(vec![question(1, Difficulty::Easy, 2, 20)]);
        let t0 = Instant::now();
        session.start_game_at(&provider, None, None, t0).unwrap();

        assert_eq!(
            session.submit_answer_at(a, 2, t0 + secs(5)),
            AnswerOutcome::Correct { points: 25 }
        );
        assert_eq!(session.submit_answer_at(b, 0, t0 + secs(6)), AnswerOutcome::Incorrect);
        assert!(session.all_players_answered());

        let board = session.leaderboard();
        assert_eq!(board.len(), 2);
        assert_eq!((board[0].player_id, board[0].score, board[0].correct_answers), (a, 25, 1));
        assert_eq!((board[1].player_id, board[1].score, board[1].correct_answers), (b, 0, 0));

        assert!(!session.advance_round_at(t0 + secs(10)));
        assert_eq!(session.status(), GameStatus::Finished);
    }

    #[test]
    fn test_team_assignment_balances_membership() {
        let settings = GameSettings {
            teams: Some(2),
            ..Default::default()
        };
        let mut session = session_with(settings);
        let a = session.add_player("a", None, None, Some(1)).unwrap();
        let b = session.add_player("b", None, None, Some(2)).unwrap();
        // No preference: goes to the emptier team; with a tie, team 1 wins by
        // creation order. After a and b, both teams have one member.
        let c = session.add_player("c", None, None, None).unwrap();
        assert_eq!(session.player(c).unwrap().team, Some(1));
        // Unknown team preference falls back to the emptier team.
        let d = session.add_player("d", None, None, Some(9)).unwrap();
        assert_eq!(session.player(d).unwrap().team, Some(2));

        assert_eq!(session.player(a).unwrap().team, Some(1));
        assert_eq!(session.player(b).unwrap().team, Some(2));
    }

    #[test]
    fn test_team_scores_aggregate() {
        let settings = GameSettings {
            teams: Some(2),
            ..Default::default()
        };
        let mut session = session_with(settings);
        let a = session.add_player("a", None, None, Some(1)).unwrap();
        let b = session.add_player("b", None, None, Some(2)).unwrap();

        let provider = FixedProvider(vec![question(1, Difficulty::Easy, 1, 20)]);
        let t0 = Instant::now();
        session.start_game_at(&provider, None, None, t0).unwrap();

        let pa = match session.submit_answer_at(a, 1, t0 + secs(5)) {
            AnswerOutcome::Correct { points } => points,
            other => panic!("expected correct, got {other:?}"),
        };
        let pb = match session.submit_answer_at(b, 1, t0 + secs(10)) {
            AnswerOutcome::Correct { points } => points,
            other => panic!("expected correct, got {other:?}"),
        };

        let standings = session.team_leaderboard();
        assert_eq!(standings.len(), 2);
        // Team 1 answered faster, so it leads.
        assert_eq!(standings[0].team_id, 1);
        assert_eq!(standings[0].total_score, pa);
        assert_eq!(standings[0].correct_answers, 1);
        assert_eq!(standings[1].total_score, pb);
        assert_eq!(standings[1].correct_answers, 1);
    }

    #[test]
    fn test_leaderboard_is_snapshot() {
        let mut session = session_with(GameSettings::default());
        session.add_player("a", None, None, None).unwrap();
        let mut board = session.leaderboard();
        board[0].score = 9999;
        assert_eq!(session.leaderboard()[0].score, 0);
    }
}
