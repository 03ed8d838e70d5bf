//! In-Session Player and Team Records
//!
//! These live and die with their owning session; they are distinct from any
//! persisted account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session-scoped player identifier, assigned monotonically from 1.
pub type PlayerId = u32;

/// Team identifier within a team-mode session.
pub type TeamId = u32;

/// A player participating in one game session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    /// Session-scoped id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// False once the player has left the game for good.
    pub is_active: bool,
    /// When the player joined (leaderboard tie-break).
    pub joined_at: DateTime<Utc>,
    /// Points accumulated this game.
    pub score: u32,
    /// Number of correctly answered questions.
    pub correct_answers: u32,
    /// Team membership, set only in team mode.
    pub team: Option<TeamId>,
}

impl Player {
    /// Create a fresh player with zero score.
    pub fn new(id: PlayerId, name: impl Into<String>, joined_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            is_active: true,
            joined_at,
            score: 0,
            correct_answers: 0,
            team: None,
        }
    }
}

/// A fixed team in team mode, aggregating its members' results.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Team {
    /// Team identifier (creation order, from 1).
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// Member player ids, in join order.
    pub members: Vec<PlayerId>,
    /// Sum of member points.
    pub total_score: u32,
    /// Sum of member correct answers.
    pub correct_answers: u32,
}

impl Team {
    /// Create an empty team.
    pub fn new(id: TeamId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            members: Vec::new(),
            total_score: 0,
            correct_answers: 0,
        }
    }
}
