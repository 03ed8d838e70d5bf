//! Game Session Settings

use serde::{Deserialize, Serialize};

use crate::game::question::Difficulty;

/// Configuration for a game session, fixed at creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameSettings {
    /// Maximum players admitted to the session.
    pub max_players: usize,
    /// Number of questions drawn at start.
    pub questions_per_game: usize,
    /// Fallback answer window for questions without their own limit.
    pub default_time_limit_secs: u32,
    /// Whether players may join after the game has started.
    pub allow_late_join: bool,
    /// Allowed categories; empty means all categories.
    pub categories: Vec<String>,
    /// Hardest difficulty to draw.
    pub max_difficulty: Difficulty,
    /// Number of fixed teams; `None` disables team mode.
    pub teams: Option<u32>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_players: 8,
            questions_per_game: 10,
            default_time_limit_secs: 30,
            allow_late_join: false,
            categories: Vec::new(),
            max_difficulty: Difficulty::Hard,
            teams: None,
        }
    }
}

impl GameSettings {
    /// True if this session aggregates scores into teams.
    #[inline]
    pub fn team_mode(&self) -> bool {
        self.teams.is_some()
    }
}
