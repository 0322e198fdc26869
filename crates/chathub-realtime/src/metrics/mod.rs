//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Sessions ever activated
    pub sessions_opened: AtomicU64,
    /// Sessions currently running
    pub sessions_active: AtomicU64,
    /// Sessions force-closed by a newer session for the same user
    pub sessions_evicted: AtomicU64,
    /// Handshakes rejected
    pub handshakes_rejected: AtomicU64,
    /// Inbound events processed
    pub events_received: AtomicU64,
    /// Inbound events answered with `error`
    pub events_failed: AtomicU64,
    /// Messages persisted
    pub messages_stored: AtomicU64,
    /// Pushes enqueued to a live session
    pub pushes_delivered: AtomicU64,
    /// Pushes skipped because the target was offline
    pub pushes_offline: AtomicU64,
    /// Pushes dropped on a full or closed queue
    pub pushes_dropped: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a session activation
    pub fn session_opened(&self) {
        Self::inc(&self.sessions_opened);
        Self::inc(&self.sessions_active);
    }

    /// Record a session teardown
    pub fn session_closed(&self) {
        self.sessions_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            sessions_active: self.sessions_active.load(Ordering::Relaxed),
            sessions_evicted: self.sessions_evicted.load(Ordering::Relaxed),
            handshakes_rejected: self.handshakes_rejected.load(Ordering::Relaxed),
            events_received: self.events_received.load(Ordering::Relaxed),
            events_failed: self.events_failed.load(Ordering::Relaxed),
            messages_stored: self.messages_stored.load(Ordering::Relaxed),
            pushes_delivered: self.pushes_delivered.load(Ordering::Relaxed),
            pushes_offline: self.pushes_offline.load(Ordering::Relaxed),
            pushes_dropped: self.pushes_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Sessions ever activated
    pub sessions_opened: u64,
    /// Sessions currently running
    pub sessions_active: u64,
    /// Evictions
    pub sessions_evicted: u64,
    /// Rejected handshakes
    pub handshakes_rejected: u64,
    /// Inbound events
    pub events_received: u64,
    /// Failed inbound events
    pub events_failed: u64,
    /// Stored messages
    pub messages_stored: u64,
    /// Delivered pushes
    pub pushes_delivered: u64,
    /// Offline pushes
    pub pushes_offline: u64,
    /// Dropped pushes
    pub pushes_dropped: u64,
}
