//! Protocol Messages
//!
//! Event contracts between the coordinator and attached clients. Serialized
//! as tagged JSON; the transport carrying them is out of scope here (clients
//! attach through an `mpsc` sender).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::game::player::PlayerId;
use crate::game::question::{Difficulty, Question, OPTION_COUNT};
use crate::game::scoring::LeaderboardEntry;
use crate::game::session::AnswerOutcome;

// =============================================================================
// CLIENT -> COORDINATOR MESSAGES
// =============================================================================

/// Client-invocable operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Create a new game and join it as the first player.
    CreateGame {
        /// Requestor's display name.
        name: String,
        /// Player cap for the new session.
        max_players: usize,
        /// How many questions to draw at start.
        questions_per_game: usize,
    },

    /// Join an existing game by code.
    JoinGame {
        /// Game code.
        code: String,
        /// Display name.
        name: String,
    },

    /// Start the game (first player / host action).
    StartGame {
        /// Game code.
        code: String,
        /// Category filter override; `None` uses session settings.
        categories: Option<Vec<String>>,
        /// Difficulty label override ("easy" | "medium" | "hard").
        difficulty: Option<String>,
    },

    /// Submit an answer for the current round.
    SubmitAnswer {
        /// Game code.
        code: String,
        /// Submitting player.
        player_id: PlayerId,
        /// Chosen option index.
        option: usize,
    },

    /// Manually advance to the next question. Fallback path only; normal
    /// rounds advance via the timer or "all answered".
    NextQuestion {
        /// Game code.
        code: String,
    },

    /// Request the category menu.
    GetCategories,
}

// =============================================================================
// COORDINATOR -> CLIENT MESSAGES
// =============================================================================

/// A roster line in join/leave notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Session-scoped player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
}

/// The client-visible view of a round's question.
///
/// Never includes the correct option index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionInfo {
    /// 1-based ordinal within the game.
    pub number: u32,
    /// Question text.
    pub text: String,
    /// The four options in display order.
    pub options: [String; OPTION_COUNT],
    /// Category.
    pub category: String,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Answer window in seconds.
    pub time_limit_secs: u32,
    /// Base point value.
    pub points: u32,
}

impl QuestionInfo {
    /// Build the broadcastable view of a question.
    pub fn from_question(number: u32, question: &Question) -> Self {
        Self {
            number,
            text: question.text.clone(),
            options: question.options.clone(),
            category: question.category.clone(),
            difficulty: question.difficulty,
            time_limit_secs: question.time_limit_secs,
            points: question.points(),
        }
    }
}

/// Events emitted to clients, broadcast or unicast per the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// New game created (to the requestor only).
    GameCreated {
        /// Game code to share.
        code: String,
        /// The requestor's player id.
        player_id: PlayerId,
    },

    /// Join confirmation (to the joiner only).
    JoinedGame {
        /// Game code.
        code: String,
        /// Assigned player id.
        player_id: PlayerId,
        /// Current roster including the joiner.
        roster: Vec<RosterEntry>,
    },

    /// Roster update after a join (whole group).
    PlayerJoined {
        /// Updated roster.
        roster: Vec<RosterEntry>,
    },

    /// The game has started (whole group).
    GameStarted,

    /// A new round is open (whole group).
    NewQuestion(QuestionInfo),

    /// Result of the submitter's own answer (private).
    AnswerResult {
        /// Judged outcome.
        outcome: AnswerOutcome,
    },

    /// The round timer expired (whole group).
    TimeUp,

    /// Round reveal: correct answer plus live standings (whole group).
    AnswerRevealed {
        /// Index of the correct option.
        correct_option: usize,
        /// Text of the correct option.
        correct_text: String,
        /// Live leaderboard.
        leaderboard: Vec<LeaderboardEntry>,
    },

    /// Final results (whole group).
    GameEnded {
        /// Final leaderboard.
        leaderboard: Vec<LeaderboardEntry>,
    },

    /// A rejected action (to the requestor only).
    Error {
        /// Human-readable reason.
        message: String,
    },

    /// A participant's connection dropped (remaining group).
    PlayerDisconnected {
        /// The disconnected player.
        player_id: PlayerId,
    },

    /// Category menu (to the requestor only).
    Categories {
        /// Question count per category.
        counts: HashMap<String, usize>,
    },
}

impl ClientMessage {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl ServerMessage {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
