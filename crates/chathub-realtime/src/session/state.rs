//! Session lifecycle states.

use std::fmt;

use chathub_core::error::AppError;

/// Lifecycle of one realtime connection.
///
/// `Connecting → Authenticated → Active → Closed`; a failed handshake goes
/// straight to `Closed`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Handshake received, credential not yet verified.
    Connecting,
    /// Credential verified, not yet registered.
    Authenticated,
    /// Registered and processing events.
    Active,
    /// Torn down.
    Closed,
}

impl SessionState {
    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, Authenticated)
                | (Connecting, Closed)
                | (Authenticated, Active)
                | (Authenticated, Closed)
                | (Active, Closed)
        )
    }

    /// Move to `next`, rejecting illegal transitions.
    pub fn transition(&mut self, next: SessionState) -> Result<(), AppError> {
        if !self.can_transition_to(next) {
            return Err(AppError::internal(format!(
                "Illegal session transition {self} -> {next}"
            )));
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Authenticated => "authenticated",
            Self::Active => "active",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}
