//! Game Engine
//!
//! The synchronous trivia state machine: questions, players, scoring rules,
//! and the per-game session that ties them together. Nothing in here spawns
//! tasks or touches channels; async coordination lives in [`crate::network`].

pub mod player;
pub mod question;
pub mod scoring;
pub mod session;
pub mod settings;

pub use player::{Player, PlayerId, Team, TeamId};
pub use question::{AnswerRecord, Difficulty, Question, QuestionId, OPTION_COUNT};
pub use scoring::{LeaderboardEntry, TeamStanding};
pub use session::{AnswerOutcome, GameError, GameSession, GameStatus, ADVANCE_GUARD};
pub use settings::GameSettings;
