//! Quizwire Game Server
//!
//! Real-time multiplayer trivia server. Runs the session coordinator over the
//! built-in sample question bank and drives a scripted demo game.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc::{self, Receiver};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use quizwire::game::PlayerId;
use quizwire::network::{Coordinator, ServerMessage, REVEAL_PAUSE};
use quizwire::providers::RecordingStatsSink;
use quizwire::{MemoryQuestionBank, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Quizwire Server v{}", VERSION);
    info!("Reveal pause: {}s", REVEAL_PAUSE.as_secs());

    // Demo: run a scripted game
    demo_game().await;

    Ok(())
}

/// Demo function to exercise a full game end to end.
async fn demo_game() {
    info!("=== Starting Demo Game ===");

    let sink = Arc::new(RecordingStatsSink::new());
    let coordinator = Arc::new(Coordinator::new(
        Arc::new(MemoryQuestionBank::sample()),
        sink.clone(),
    ));

    let (alice_tx, alice_rx) = mpsc::channel(64);
    let (bob_tx, bob_rx) = mpsc::channel(64);

    let (code, alice) = coordinator
        .create_game("Alice", Some("acct-alice".to_string()), 4, 3, alice_tx)
        .await
        .expect("Failed to create demo game");
    let bob = coordinator
        .join_game(&code, "Bob", Some("acct-bob".to_string()), bob_tx)
        .await
        .expect("Failed to join demo game");

    info!("Game code: {}", code);

    // Scripted clients: answer every question with a random option shortly
    // after it opens.
    let alice_task = spawn_client(coordinator.clone(), code.clone(), alice, "Alice", alice_rx);
    let bob_task = spawn_client(coordinator.clone(), code.clone(), bob, "Bob", bob_rx);

    coordinator
        .start_game(&code, None, None)
        .await
        .expect("Failed to start demo game");

    let _ = tokio::join!(alice_task, bob_task);

    info!("=== Demo Results ===");
    for results in sink.invocations() {
        for result in results {
            info!(
                "{}: {} points ({:+} rating)",
                result.identity, result.points, result.rating_delta
            );
        }
    }
}

/// Spawn a scripted client that reacts to game events until the game ends.
fn spawn_client(
    coordinator: Arc<Coordinator>,
    code: String,
    player_id: PlayerId,
    name: &'static str,
    mut rx: Receiver<ServerMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match msg {
                ServerMessage::NewQuestion(question) => {
                    info!(
                        "[{}] Q{} ({}): {}",
                        name, question.number, question.category, question.text
                    );
                    let option = rand::thread_rng().gen_range(0..question.options.len());
                    sleep(Duration::from_millis(500)).await;
                    let _ = coordinator.submit_answer(&code, player_id, option).await;
                }
                ServerMessage::AnswerResult { outcome } => {
                    info!("[{}] answered: {:?}", name, outcome);
                }
                ServerMessage::AnswerRevealed {
                    correct_text,
                    leaderboard,
                    ..
                } => {
                    if let Some(leader) = leaderboard.first() {
                        info!(
                            "[{}] answer was '{}'; {} leads with {} points",
                            name, correct_text, leader.name, leader.score
                        );
                    }
                }
                ServerMessage::GameEnded { leaderboard } => {
                    info!("[{}] === Final Standings ===", name);
                    for (rank, row) in leaderboard.iter().enumerate() {
                        info!(
                            "[{}] #{}: {} - {} points ({} correct)",
                            name,
                            rank + 1,
                            row.name,
                            row.score,
                            row.correct_answers
                        );
                    }
                    break;
                }
                _ => {}
            }
        }
    })
}
