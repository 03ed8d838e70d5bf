//! Question and Answer Types
//!
//! Value types for the question bank and per-round answer records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::player::PlayerId;

/// Unique question identifier (bank-scoped).
pub type QuestionId = u32;

/// Every question has exactly this many answer options.
pub const OPTION_COUNT: usize = 4;

/// Question difficulty tier.
///
/// The ordinal value doubles as the scoring multiplier:
/// base points = `difficulty as u32 * 10`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Difficulty {
    /// 10 base points.
    Easy = 1,
    /// 20 base points.
    Medium = 2,
    /// 30 base points.
    Hard = 3,
}

impl Difficulty {
    /// Base point value for a correct answer at this difficulty.
    #[inline]
    pub fn points(self) -> u32 {
        self as u32 * 10
    }

    /// Parse a client-supplied difficulty label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Difficulty> {
        match label.to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// A single trivia question with a fixed set of four options.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
    /// Bank-scoped identifier.
    pub id: QuestionId,
    /// Question text shown to players.
    pub text: String,
    /// The four answer options, in display order.
    pub options: [String; OPTION_COUNT],
    /// Index into `options` of the correct answer.
    pub correct_option: usize,
    /// Category the question belongs to.
    pub category: String,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// How long players have to answer, in whole seconds.
    pub time_limit_secs: u32,
}

impl Question {
    /// Base point value (derived from difficulty).
    #[inline]
    pub fn points(&self) -> u32 {
        self.difficulty.points()
    }

    /// Answer window as a `Duration`.
    #[inline]
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(u64::from(self.time_limit_secs))
    }

    /// Text of the correct option.
    pub fn correct_text(&self) -> &str {
        &self.options[self.correct_option]
    }
}

/// An accepted answer submission. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Submitting player (session-scoped id).
    pub player_id: PlayerId,
    /// Question this answer was for.
    pub question_id: QuestionId,
    /// Option index the player chose.
    pub selected_option: usize,
    /// Wall-clock submission time.
    pub submitted_at: DateTime<Utc>,
}
