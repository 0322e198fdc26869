//! Per-connection session state machine and protocol engine.

pub mod engine;
mod handlers;
pub mod state;

pub use engine::{ActiveSession, PendingSession, SessionEngine};
pub use state::SessionState;
