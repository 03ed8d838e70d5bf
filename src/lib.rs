//! # Quizwire Server
//!
//! A real-time multiplayer trivia engine. Players gather in code-addressed
//! game sessions, answer timed multiple-choice questions, and compete on
//! speed-weighted scoring; many games run concurrently under one coordinator.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Coordinator                        │
//! │   code → session registry, round timers, broadcast      │
//! └────────────┬───────────────────────────────┬────────────┘
//!              │                               │
//! ┌────────────▼────────────┐     ┌────────────▼────────────┐
//! │       GameSession       │     │        Protocol         │
//! │  players, teams, queue, │     │  tagged JSON client /   │
//! │  judging, leaderboards  │     │  server messages        │
//! └────────────┬────────────┘     └─────────────────────────┘
//!              │
//! ┌────────────▼────────────┐
//! │        Providers        │
//! │  QuestionProvider and   │
//! │  StatsSink interfaces   │
//! └─────────────────────────┘
//! ```
//!
//! Layering is strict: `game` is synchronous in-memory state, `network` owns
//! every task, timer, and channel, and `providers` keeps persistence behind
//! traits so the engine never couples to a storage backend.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod game;
pub mod network;
pub mod providers;

pub use game::{
    AnswerOutcome, Difficulty, GameError, GameSession, GameSettings, GameStatus,
    LeaderboardEntry, Player, PlayerId, Question, QuestionId,
};
pub use network::{ClientMessage, Coordinator, CoordinatorError, ServerMessage};
pub use providers::{MemoryQuestionBank, PlayerResult, QuestionProvider, StatsSink};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
