//! External Collaborator Interfaces
//!
//! The engine consumes a question provider and a stats sink as abstract
//! interfaces; persistence and retry policy belong to their implementations,
//! never to the engine. Includes in-memory implementations for the demo
//! binary and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::seq::SliceRandom;

use crate::game::question::{Difficulty, Question};

/// Source of questions for new games.
///
/// Returns a randomized list satisfying the filters; fewer than `count` when
/// the bank is exhausted. Pure from the engine's point of view.
pub trait QuestionProvider: Send + Sync {
    /// Draw up to `count` questions matching the category and difficulty
    /// filters. An empty `categories` slice means all categories.
    fn questions(&self, categories: &[String], max_difficulty: Difficulty, count: usize) -> Vec<Question>;

    /// Question counts per category, for menu population.
    fn category_counts(&self) -> HashMap<String, usize>;
}

/// Final per-player result handed to the stats sink at game end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerResult {
    /// Durable identity token supplied at join time.
    pub identity: String,
    /// Points earned this game.
    pub points: u32,
    /// Rating change for this placement.
    pub rating_delta: i32,
}

/// Durable storage for final game results.
///
/// Invoked exactly once per finished game. Idempotency and retries are the
/// sink's contract; the engine never retries.
pub trait StatsSink: Send + Sync {
    /// Persist one game's final results.
    fn apply_game_result(&self, results: &[PlayerResult]);
}

/// In-memory question bank with random draw order.
pub struct MemoryQuestionBank {
    questions: Vec<Question>,
}

impl MemoryQuestionBank {
    /// Build a bank from a fixed question list.
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// A small built-in bank for the demo binary.
    pub fn sample() -> Self {
        let q = |id, text: &str, options: [&str; 4], correct, category: &str, difficulty, limit| {
            Question {
                id,
                text: text.to_string(),
                options: options.map(str::to_string),
                correct_option: correct,
                category: category.to_string(),
                difficulty,
                time_limit_secs: limit,
            }
        };

        Self::new(vec![
            q(
                1,
                "Which planet is known as the Red Planet?",
                ["Venus", "Mars", "Jupiter", "Mercury"],
                1,
                "science",
                Difficulty::Easy,
                20,
            ),
            q(
                2,
                "What is the chemical symbol for gold?",
                ["Au", "Ag", "Gd", "Go"],
                0,
                "science",
                Difficulty::Medium,
                30,
            ),
            q(
                3,
                "In which year did the Berlin Wall fall?",
                ["1987", "1989", "1991", "1993"],
                1,
                "history",
                Difficulty::Medium,
                30,
            ),
            q(
                4,
                "Who composed The Four Seasons?",
                ["Bach", "Mozart", "Vivaldi", "Haydn"],
                2,
                "arts",
                Difficulty::Hard,
                30,
            ),
            q(
                5,
                "Which country hosted the 1998 FIFA World Cup?",
                ["Brazil", "Germany", "France", "Italy"],
                2,
                "sports",
                Difficulty::Easy,
                20,
            ),
        ])
    }
}

impl QuestionProvider for MemoryQuestionBank {
    fn questions(&self, categories: &[String], max_difficulty: Difficulty, count: usize) -> Vec<Question> {
        let mut matching: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| q.difficulty <= max_difficulty)
            .filter(|q| categories.is_empty() || categories.contains(&q.category))
            .cloned()
            .collect();
        matching.shuffle(&mut rand::thread_rng());
        matching.truncate(count);
        matching
    }

    fn category_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for q in &self.questions {
            *counts.entry(q.category.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Stats sink that records every invocation. Test and demo double.
#[derive(Default)]
pub struct RecordingStatsSink {
    invocations: Mutex<Vec<Vec<PlayerResult>>>,
}

impl RecordingStatsSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded invocations, in order.
    pub fn invocations(&self) -> Vec<Vec<PlayerResult>> {
        self.invocations.lock().expect("sink lock poisoned").clone()
    }
}

impl StatsSink for RecordingStatsSink {
    fn apply_game_result(&self, results: &[PlayerResult]) {
        self.invocations
            .lock()
            .expect("sink lock poisoned")
            .push(results.to_vec());
    }
}
