//! Network Layer
//!
//! The async side of the engine: the client/server message contracts and the
//! coordinator that maps game codes to live sessions, drives round timers,
//! and fans events out to attached clients.

pub mod coordinator;
pub mod protocol;

pub use coordinator::{ClientSender, Coordinator, CoordinatorError, REVEAL_PAUSE};
pub use protocol::{ClientMessage, QuestionInfo, RosterEntry, ServerMessage};
