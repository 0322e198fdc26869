//! # chathub-realtime
//!
//! Realtime engine for ChatHub direct messaging. Provides:
//!
//! - Handshake authentication through an [`IdentityVerifier`](chathub_core::traits::IdentityVerifier)
//! - A presence registry enforcing one live session per user
//! - Best-effort delivery of pushes to online users
//! - The per-connection session state machine and event protocol
//! - A background writer for `isOnline` / `lastSeen` flags

pub mod connection;
pub mod delivery;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod server;
pub mod session;

pub use connection::SessionHandle;
pub use delivery::{DeliveryOutcome, DeliveryRouter};
pub use presence::{PresenceFlagWriter, PresenceRegistry};
pub use server::RealtimeEngine;
pub use session::{ActiveSession, PendingSession, SessionEngine, SessionState};
