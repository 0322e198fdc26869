//! Delivery router: turns a target user into a live push or a no-op.

use std::sync::Arc;

use tracing::{debug, warn};

use chathub_core::types::id::UserId;

use crate::connection::PushRejected;
use crate::message::types::OutboundEvent;
use crate::metrics::EngineMetrics;
use crate::presence::PresenceRegistry;

/// Result of a push attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Enqueued on the target's outbound queue.
    Delivered,
    /// The target has no live session.
    Offline,
    /// The target's queue was full or closed.
    Dropped,
}

/// Pushes events to whichever session a user currently has.
///
/// Nothing is queued or retried for offline users; stored messages are
/// recovered through history instead.
#[derive(Debug, Clone)]
pub struct DeliveryRouter {
    registry: Arc<PresenceRegistry>,
    metrics: Arc<EngineMetrics>,
}

impl DeliveryRouter {
    /// Creates a router over the shared registry.
    pub fn new(registry: Arc<PresenceRegistry>, metrics: Arc<EngineMetrics>) -> Self {
        Self { registry, metrics }
    }

    /// Push `event` to `target` if reachable. Never waits.
    pub fn push(&self, target: UserId, event: OutboundEvent) -> DeliveryOutcome {
        let Some(session) = self.registry.lookup(target) else {
            debug!(user_id = %target, event = event.name(), "Target offline, push skipped");
            EngineMetrics::inc(&self.metrics.pushes_offline);
            return DeliveryOutcome::Offline;
        };

        let name = event.name();
        match session.try_push(event) {
            Ok(()) => {
                EngineMetrics::inc(&self.metrics.pushes_delivered);
                DeliveryOutcome::Delivered
            }
            Err(reason) => {
                match reason {
                    PushRejected::Full => warn!(
                        user_id = %target,
                        session_id = %session.id,
                        event = name,
                        "Outbound queue full, dropping push"
                    ),
                    PushRejected::Closed => debug!(
                        user_id = %target,
                        session_id = %session.id,
                        event = name,
                        "Session closing, dropping push"
                    ),
                }
                EngineMetrics::inc(&self.metrics.pushes_dropped);
                DeliveryOutcome::Dropped
            }
        }
    }
}
