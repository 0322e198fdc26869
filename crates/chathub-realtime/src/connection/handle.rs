//! Handle to a single live session.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use chathub_core::types::id::{SessionId, UserId};

use crate::message::types::OutboundEvent;

/// Why a non-blocking push was not enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushRejected {
    /// The outbound queue is at capacity.
    Full,
    /// The session has closed or its writer is gone.
    Closed,
}

/// A handle to one authenticated realtime session.
///
/// Holds the sender half of the session's bounded outbound queue and the
/// token used to force the session closed. Handles are shared as
/// `Arc<SessionHandle>` between the registry and the session task.
#[derive(Debug)]
pub struct SessionHandle {
    /// Unique session ID.
    pub id: SessionId,
    /// User who owns this session.
    pub user_id: UserId,
    /// When the session was established.
    pub created_at: DateTime<Utc>,
    sender: mpsc::Sender<OutboundEvent>,
    cancel: CancellationToken,
}

impl SessionHandle {
    /// Create a handle for `user_id` writing into `sender`.
    pub fn new(user_id: UserId, sender: mpsc::Sender<OutboundEvent>) -> Self {
        Self {
            id: SessionId::new(),
            user_id,
            created_at: Utc::now(),
            sender,
            cancel: CancellationToken::new(),
        }
    }

    /// Enqueue an event without waiting. Used for pushes to other users.
    pub fn try_push(&self, event: OutboundEvent) -> Result<(), PushRejected> {
        if self.is_closed() {
            return Err(PushRejected::Closed);
        }
        self.sender.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PushRejected::Full,
            mpsc::error::TrySendError::Closed(_) => PushRejected::Closed,
        })
    }

    /// Enqueue an event for this session's own client, waiting for room.
    ///
    /// Returns `false` once the session is closed.
    pub async fn send(&self, event: OutboundEvent) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            res = self.sender.send(event) => res.is_ok(),
        }
    }

    /// Force the session closed. Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the session has been closed.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}
