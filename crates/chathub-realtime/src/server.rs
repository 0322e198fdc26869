//! Top-level realtime engine that ties together all subsystems.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use chathub_core::config::RealtimeConfig;
use chathub_core::traits::IdentityVerifier;
use chathub_database::store::MessageStore;

use crate::connection::WsAuthenticator;
use crate::metrics::EngineMetrics;
use crate::presence::{PresenceFlagWriter, PresenceRegistry};
use crate::session::SessionEngine;

/// Central realtime engine shared by the HTTP layer.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Presence registry.
    pub registry: Arc<PresenceRegistry>,
    /// Session protocol engine.
    pub sessions: Arc<SessionEngine>,
    /// Presence flag writer.
    pub flags: Arc<PresenceFlagWriter>,
    /// Metrics collector.
    pub metrics: Arc<EngineMetrics>,
    config: RealtimeConfig,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("online", &self.registry.online_count())
            .finish()
    }
}

impl RealtimeEngine {
    /// Creates the engine and spawns the presence flag writer.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(
        config: RealtimeConfig,
        store: Arc<dyn MessageStore>,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        let metrics = Arc::new(EngineMetrics::new());
        let registry = Arc::new(PresenceRegistry::new());
        let flags = Arc::new(PresenceFlagWriter::spawn(
            Arc::clone(&store),
            config.presence_queue_size,
        ));
        let sessions = Arc::new(SessionEngine::new(
            WsAuthenticator::new(verifier),
            Arc::clone(&registry),
            store,
            Arc::clone(&flags),
            Arc::clone(&metrics),
            config.clone(),
        ));

        info!("Realtime engine initialized");

        Self {
            registry,
            sessions,
            flags,
            metrics,
            config,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Number of users with a live session.
    pub fn online_count(&self) -> usize {
        self.registry.online_count()
    }

    /// Closes every live session, waits up to `grace` for their teardowns,
    /// then flushes pending presence writes.
    pub async fn shutdown(&self, grace: Duration) {
        let closed = self.registry.close_all();
        info!(sessions = closed, "Shutting down realtime engine");

        let drained = tokio::time::timeout(grace, async {
            while self.registry.online_count() > 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;
        if drained.is_err() {
            warn!(
                remaining = self.registry.online_count(),
                "Sessions still registered after shutdown grace period"
            );
        }

        self.flags.flush().await;
        let snapshot = self.metrics.snapshot();
        info!(?snapshot, "Realtime engine shut down");
    }
}
