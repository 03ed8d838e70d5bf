//! Scoring Rules
//!
//! Leaderboard ordering, the time bonus, and end-of-game rating deltas.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;

use crate::game::player::{Player, PlayerId, TeamId};

/// One row of a leaderboard snapshot.
///
/// Snapshots are detached copies; mutating them never touches session state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Session-scoped player id.
    pub player_id: PlayerId,
    /// Display name.
    pub name: String,
    /// Points at snapshot time.
    pub score: u32,
    /// Correct answers at snapshot time.
    pub correct_answers: u32,
}

impl LeaderboardEntry {
    /// Snapshot a player's current standing.
    pub fn from_player(player: &Player) -> Self {
        Self {
            player_id: player.id,
            name: player.name.clone(),
            score: player.score,
            correct_answers: player.correct_answers,
        }
    }
}

/// One row of a team leaderboard snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TeamStanding {
    /// Team id.
    pub team_id: TeamId,
    /// Team name.
    pub name: String,
    /// Aggregate points.
    pub total_score: u32,
    /// Aggregate correct answers.
    pub correct_answers: u32,
}

/// Leaderboard ordering: score desc, correct answers desc, join time asc.
///
/// Join times come from a session-local monotonic clock; the final id
/// comparison makes the order total even if two clocks coincide.
pub fn compare_players(a: &Player, b: &Player) -> Ordering {
    b.score
        .cmp(&a.score)
        .then(b.correct_answers.cmp(&a.correct_answers))
        .then(a.joined_at.cmp(&b.joined_at))
        .then(a.id.cmp(&b.id))
}

/// Time bonus for a correct answer: whole seconds remaining at submission.
///
/// Elapsed time is truncated to whole seconds before the subtraction, so a
/// 29.9s answer on a 30s question still earns a 1-point bonus.
pub fn time_bonus(time_limit_secs: u32, elapsed: Duration) -> u32 {
    time_limit_secs.saturating_sub(elapsed.as_secs() as u32)
}

/// Rating delta for a final leaderboard position.
///
/// Rank 0 is first place. Below the podium, finishing in the better half of
/// the field is still worth a small gain.
pub fn rating_delta(rank: usize, player_count: usize) -> i32 {
    match rank {
        0 => 25,
        1 => 15,
        2 => 10,
        r if r < player_count / 2 => 5,
        _ => -5,
    }
}
