//! Session Registry / Coordinator
//!
//! Maps game codes to live sessions, owns the per-session round timer,
//! serializes the reveal-and-advance protocol so it runs exactly once per
//! round, and fans session events out to attached clients.
//!
//! Clients attach as an `mpsc` sender; the transport behind it (WebSocket,
//! test harness, ...) is out of scope. Each session mutates under a single
//! `Mutex<GameSession>`; the registry map uses its own lighter `RwLock`
//! scoped to insert/lookup/remove.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::game::player::PlayerId;
use crate::game::question::{Difficulty, QuestionId};
use crate::game::scoring::{rating_delta, LeaderboardEntry};
use crate::game::session::{AnswerOutcome, GameError, GameSession};
use crate::game::settings::GameSettings;
use crate::network::protocol::{ClientMessage, QuestionInfo, RosterEntry, ServerMessage};
use crate::providers::{PlayerResult, QuestionProvider, StatsSink};

/// Pause between revealing a round's answer and opening the next round.
///
/// Must not be shorter than [`crate::game::session::ADVANCE_GUARD`], or the
/// early-finish path would trip the double-advance guard.
pub const REVEAL_PAUSE: Duration = Duration::from_secs(5);

/// Length of generated game codes.
const CODE_LENGTH: usize = 6;

/// Code alphabet, with easily confused characters removed.
const CODE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Outbound channel to one attached client.
pub type ClientSender = mpsc::Sender<ServerMessage>;

/// Coordinator errors. Each maps to a user-visible `Error` event.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// Unknown game code.
    #[error("Game not found")]
    GameNotFound,

    /// The current round's answer has already been revealed.
    #[error("Round already closed")]
    AlreadyRevealed,

    /// The player already answered this question.
    #[error("Answer already submitted for this question")]
    AlreadyAnswered,

    /// Unparseable difficulty label.
    #[error("Unknown difficulty: {0}")]
    UnknownDifficulty(String),

    /// Rejected by the session state machine.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// All coordinator-side state for one live game.
struct SessionEntry {
    code: String,
    session: Mutex<GameSession>,
    /// Outbound senders, keyed by player id.
    clients: RwLock<HashMap<PlayerId, ClientSender>>,
    /// Bridge from session-scoped ids back to durable identities for the
    /// stats sink.
    identities: Mutex<HashMap<PlayerId, String>>,
    /// Active round timer, aborted when superseded or cancelled.
    timer: Mutex<Option<JoinHandle<()>>>,
    /// Questions whose answer has been revealed. Set-once per question;
    /// whichever of the timer or "all answered" paths inserts first performs
    /// the reveal, the other becomes a no-op.
    revealed: Mutex<HashSet<QuestionId>>,
}

/// The session registry and round protocol driver.
pub struct Coordinator {
    registry: RwLock<HashMap<String, Arc<SessionEntry>>>,
    provider: Arc<dyn QuestionProvider>,
    stats: Arc<dyn StatsSink>,
}

impl Coordinator {
    /// Create a coordinator over the given collaborators.
    pub fn new(provider: Arc<dyn QuestionProvider>, stats: Arc<dyn StatsSink>) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            provider,
            stats,
        }
    }

    // =========================================================================
    // CLIENT OPERATIONS
    // =========================================================================

    /// Create a game, admit the requestor as player 1, and confirm privately.
    pub async fn create_game(
        &self,
        name: &str,
        identity: Option<String>,
        max_players: usize,
        questions_per_game: usize,
        sender: ClientSender,
    ) -> Result<(String, PlayerId), CoordinatorError> {
        let mut registry = self.registry.write().await;

        let code = {
            let mut rng = rand::thread_rng();
            loop {
                let candidate = generate_code(&mut rng);
                if !registry.contains_key(&candidate) {
                    break candidate;
                }
            }
        };

        let settings = GameSettings {
            max_players,
            questions_per_game,
            ..Default::default()
        };
        let mut session = GameSession::new(code.clone(), settings);
        let player_id = session.add_player(name, None, None, None)?;

        let entry = Arc::new(SessionEntry {
            code: code.clone(),
            session: Mutex::new(session),
            clients: RwLock::new(HashMap::from([(player_id, sender.clone())])),
            identities: Mutex::new(match identity {
                Some(identity) => HashMap::from([(player_id, identity)]),
                None => HashMap::new(),
            }),
            timer: Mutex::new(None),
            revealed: Mutex::new(HashSet::new()),
        });
        registry.insert(code.clone(), entry);
        drop(registry);

        info!(%code, player = name, "game created");
        let _ = sender
            .send(ServerMessage::GameCreated {
                code: code.clone(),
                player_id,
            })
            .await;

        Ok((code, player_id))
    }

    /// Join an existing game: confirm privately, then notify the group.
    pub async fn join_game(
        &self,
        code: &str,
        name: &str,
        identity: Option<String>,
        sender: ClientSender,
    ) -> Result<PlayerId, CoordinatorError> {
        let entry = self.entry(code).await.ok_or(CoordinatorError::GameNotFound)?;

        let (player_id, roster) = {
            let mut session = entry.session.lock().await;
            let player_id = session.add_player(name, None, None, None)?;
            (player_id, roster_of(&session))
        };

        entry.clients.write().await.insert(player_id, sender.clone());
        if let Some(identity) = identity {
            entry.identities.lock().await.insert(player_id, identity);
        }

        info!(code, player = name, player_id, "player joined");
        let _ = sender
            .send(ServerMessage::JoinedGame {
                code: code.to_string(),
                player_id,
                roster: roster.clone(),
            })
            .await;
        self.broadcast(&entry, ServerMessage::PlayerJoined { roster }).await;

        Ok(player_id)
    }

    /// Start the game and open round 1 for the whole group.
    pub async fn start_game(
        self: &Arc<Self>,
        code: &str,
        categories: Option<Vec<String>>,
        difficulty: Option<&str>,
    ) -> Result<(), CoordinatorError> {
        let entry = self.entry(code).await.ok_or(CoordinatorError::GameNotFound)?;

        let max_difficulty = match difficulty {
            Some(label) => Some(
                Difficulty::from_label(label)
                    .ok_or_else(|| CoordinatorError::UnknownDifficulty(label.to_string()))?,
            ),
            None => None,
        };

        {
            let mut session = entry.session.lock().await;
            session.start_game(self.provider.as_ref(), categories.as_deref(), max_difficulty)?;
        }

        info!(code, "game started");
        self.broadcast(&entry, ServerMessage::GameStarted).await;
        self.send_round(code).await;

        Ok(())
    }

    /// Judge one submission, reply privately, and close the round early when
    /// everyone has answered.
    ///
    /// Rejects submissions for an already-revealed round and duplicate
    /// submissions for the same question; the session itself only
    /// time-window-checks.
    pub async fn submit_answer(
        self: &Arc<Self>,
        code: &str,
        player_id: PlayerId,
        option: usize,
    ) -> Result<AnswerOutcome, CoordinatorError> {
        let entry = self.entry(code).await.ok_or(CoordinatorError::GameNotFound)?;

        let (outcome, all_answered) = {
            let mut session = entry.session.lock().await;

            if let Some(question_id) = session.current_question().map(|q| q.id) {
                if entry.revealed.lock().await.contains(&question_id) {
                    return Err(CoordinatorError::AlreadyRevealed);
                }
                if session.has_answered(player_id, question_id) {
                    return Err(CoordinatorError::AlreadyAnswered);
                }
            }

            let outcome = session.submit_answer(player_id, option);
            (outcome, session.all_players_answered())
        };

        debug!(code, player_id, ?outcome, "answer submitted");
        self.unicast(&entry, player_id, ServerMessage::AnswerResult { outcome })
            .await;

        if all_answered {
            // Fast path: everyone answered, the timer is no longer needed.
            cancel_round_timer(&entry).await;
            self.reveal_and_advance(code).await;
        }

        Ok(outcome)
    }

    /// Manual advance, the fallback outside the timer / all-answered flow.
    ///
    /// Goes through the reveal guard, so it cannot double-fire a round.
    pub async fn next_question(self: &Arc<Self>, code: &str) -> Result<(), CoordinatorError> {
        let entry = self.entry(code).await.ok_or(CoordinatorError::GameNotFound)?;
        cancel_round_timer(&entry).await;
        self.reveal_and_advance(code).await;
        Ok(())
    }

    /// Send the category menu to one client.
    pub async fn available_categories(&self, sender: &ClientSender) {
        let counts = self.provider.category_counts();
        let _ = sender.send(ServerMessage::Categories { counts }).await;
    }

    /// Detach a client connection from its game.
    ///
    /// The player stays in the session and keeps their score; their future
    /// answers simply never arrive and time out.
    pub async fn disconnect(&self, code: &str, player_id: PlayerId) {
        let Some(entry) = self.entry(code).await else {
            return;
        };
        if entry.clients.write().await.remove(&player_id).is_some() {
            info!(code, player_id, "player disconnected");
            self.broadcast(&entry, ServerMessage::PlayerDisconnected { player_id })
                .await;
        }
    }

    /// Dispatch a decoded client message, converting any rejection into an
    /// `Error` event on the caller's channel.
    pub async fn handle_message(
        self: &Arc<Self>,
        msg: ClientMessage,
        identity: Option<String>,
        sender: ClientSender,
    ) {
        let result: Result<(), CoordinatorError> = match msg {
            ClientMessage::CreateGame {
                name,
                max_players,
                questions_per_game,
            } => self
                .create_game(&name, identity, max_players, questions_per_game, sender.clone())
                .await
                .map(|_| ()),
            ClientMessage::JoinGame { code, name } => self
                .join_game(&code, &name, identity, sender.clone())
                .await
                .map(|_| ()),
            ClientMessage::StartGame {
                code,
                categories,
                difficulty,
            } => {
                self.start_game(&code, categories, difficulty.as_deref())
                    .await
            }
            ClientMessage::SubmitAnswer {
                code,
                player_id,
                option,
            } => self.submit_answer(&code, player_id, option).await.map(|_| ()),
            ClientMessage::NextQuestion { code } => self.next_question(&code).await,
            ClientMessage::GetCategories => {
                self.available_categories(&sender).await;
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!(error = %e, "rejected client action");
            let _ = sender
                .send(ServerMessage::Error {
                    message: e.to_string(),
                })
                .await;
        }
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.registry.read().await.len()
    }

    // =========================================================================
    // ROUND PROTOCOL
    // =========================================================================

    /// Open the current round for the group: broadcast the question (never
    /// the correct index) and arm the round timer.
    ///
    /// Boxed because the round cycle is recursive (the timer and the reveal
    /// continuation both re-enter here for the next round).
    pub fn send_round<'a>(
        self: &'a Arc<Self>,
        code: &'a str,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(self.send_round_inner(code))
    }

    async fn send_round_inner(self: &Arc<Self>, code: &str) {
        let Some(entry) = self.entry(code).await else {
            return;
        };

        let (info, question_id, time_limit) = {
            let session = entry.session.lock().await;
            match session.current_question() {
                Some(q) => (
                    QuestionInfo::from_question(session.current_question_number(), q),
                    q.id,
                    q.time_limit(),
                ),
                None => return,
            }
        };

        // Supersede any stale timer before the new round opens.
        cancel_round_timer(&entry).await;

        debug!(code, number = info.number, "round open");
        self.broadcast(&entry, ServerMessage::NewQuestion(info)).await;

        let this = Arc::clone(self);
        let code = code.to_string();
        let handle = tokio::spawn(async move {
            sleep(time_limit).await;
            this.reveal_round(&code, true, Some(question_id)).await;
        });
        *entry.timer.lock().await = Some(handle);
    }

    /// Reveal the current round's answer exactly once, then advance.
    pub async fn reveal_and_advance(self: &Arc<Self>, code: &str) {
        self.reveal_round(code, false, None).await;
    }

    /// The reveal entry point shared by the timer, the "all answered"
    /// trigger, and the manual advance.
    ///
    /// The leaderboard snapshot and the per-question guard claim happen in
    /// one critical section under the session lock, so the winning caller
    /// reveals a leaderboard that includes every accepted answer and the
    /// losers return without side effects (no stray "time up" broadcast).
    /// `expected` pins a timer to the round it was armed for; a stale timer
    /// finds a different question and does nothing.
    async fn reveal_round(
        self: &Arc<Self>,
        code: &str,
        timed_out: bool,
        expected: Option<QuestionId>,
    ) {
        let Some(entry) = self.entry(code).await else {
            return;
        };

        let session = entry.session.lock().await;
        let Some(question) = session.current_question() else {
            return;
        };
        if expected.is_some_and(|id| id != question.id) {
            return;
        }

        let mut revealed = entry.revealed.lock().await;
        if !revealed.insert(question.id) {
            return;
        }
        let correct_option = question.correct_option;
        let correct_text = question.correct_text().to_string();
        let leaderboard = session.leaderboard();

        // Guard claimed. Run the reveal on a detached task so that an
        // aborted round timer can never strand a half-revealed round.
        let this = Arc::clone(self);
        let code = code.to_string();
        tokio::spawn(async move {
            this.run_reveal(code, timed_out, correct_option, correct_text, leaderboard)
                .await;
        });
    }

    /// The reveal body: broadcast the answer (preceded by the timeout notice
    /// when the round expired), pause for clients to display results, then
    /// open the next round or finish the game.
    async fn run_reveal(
        self: Arc<Self>,
        code: String,
        timed_out: bool,
        correct_option: usize,
        correct_text: String,
        leaderboard: Vec<LeaderboardEntry>,
    ) {
        let Some(entry) = self.entry(&code).await else {
            return;
        };

        if timed_out {
            debug!(%code, "round timed out");
            self.broadcast(&entry, ServerMessage::TimeUp).await;
        }

        self.broadcast(
            &entry,
            ServerMessage::AnswerRevealed {
                correct_option,
                correct_text,
                leaderboard,
            },
        )
        .await;

        sleep(REVEAL_PAUSE).await;

        let has_next = entry.session.lock().await.advance_round();
        if has_next {
            self.send_round(&code).await;
        } else {
            self.finish_game(&code).await;
        }
    }

    /// Tear down a finished game: final standings to the stats sink (exactly
    /// once) and to the group, then drop all bookkeeping.
    async fn finish_game(&self, code: &str) {
        // Claiming the entry out of the registry first makes this path
        // exactly-once: a second caller finds nothing.
        let Some(entry) = self.registry.write().await.remove(code) else {
            return;
        };

        cancel_round_timer(&entry).await;

        let leaderboard = {
            let mut session = entry.session.lock().await;
            session.end_game();
            session.leaderboard()
        };

        let results = {
            let identities = entry.identities.lock().await;
            leaderboard
                .iter()
                .enumerate()
                .map(|(rank, row)| PlayerResult {
                    identity: identities
                        .get(&row.player_id)
                        .cloned()
                        .unwrap_or_else(|| row.name.clone()),
                    points: row.score,
                    rating_delta: rating_delta(rank, leaderboard.len()),
                })
                .collect::<Vec<_>>()
        };
        self.stats.apply_game_result(&results);

        info!(code, players = leaderboard.len(), "game finished");
        self.broadcast(&entry, ServerMessage::GameEnded { leaderboard })
            .await;

        entry.revealed.lock().await.clear();
        entry.clients.write().await.clear();
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    async fn entry(&self, code: &str) -> Option<Arc<SessionEntry>> {
        self.registry.read().await.get(code).cloned()
    }

    /// Fan a message out to every attached client of a session. Send errors
    /// from slow or dead clients are ignored; they never block a round.
    async fn broadcast(&self, entry: &SessionEntry, message: ServerMessage) {
        let clients = entry.clients.read().await;
        for sender in clients.values() {
            let _ = sender.send(message.clone()).await;
        }
    }

    async fn unicast(&self, entry: &SessionEntry, player_id: PlayerId, message: ServerMessage) {
        let sender = entry.clients.read().await.get(&player_id).cloned();
        if let Some(sender) = sender {
            let _ = sender.send(message).await;
        } else {
            debug!(code = %entry.code, player_id, "no channel for unicast");
        }
    }
}

/// Abort the outstanding round timer, if any. Safe to call repeatedly and to
/// race against the timer's own completion.
async fn cancel_round_timer(entry: &SessionEntry) {
    if let Some(handle) = entry.timer.lock().await.take() {
        handle.abort();
    }
}

fn roster_of(session: &GameSession) -> Vec<RosterEntry> {
    session
        .roster()
        .into_iter()
        .map(|(id, name)| RosterEntry { id, name })
        .collect()
}

fn generate_code(rng: &mut impl Rng) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect()
}
