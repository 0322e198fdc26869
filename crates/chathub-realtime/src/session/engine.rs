//! Session protocol engine: handshake, event loop, teardown.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use chathub_core::config::RealtimeConfig;
use chathub_core::result::AppResult;
use chathub_core::types::id::UserId;
use chathub_database::store::MessageStore;

use super::state::SessionState;
use crate::connection::{SessionHandle, WsAuthenticator};
use crate::delivery::DeliveryRouter;
use crate::message::types::OutboundEvent;
use crate::metrics::EngineMetrics;
use crate::presence::{PresenceFlagWriter, PresenceRegistry};

/// A connection whose credential has been verified but which is not yet
/// registered.
#[derive(Debug)]
pub struct PendingSession {
    user_id: UserId,
    state: SessionState,
}

impl PendingSession {
    /// The verified user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Always [`SessionState::Authenticated`].
    pub fn state(&self) -> SessionState {
        self.state
    }
}

/// A registered session processing events.
#[derive(Debug)]
pub struct ActiveSession {
    handle: Arc<SessionHandle>,
    state: SessionState,
}

impl ActiveSession {
    /// Shared handle, also held by the presence registry.
    pub fn handle(&self) -> &Arc<SessionHandle> {
        &self.handle
    }

    /// Owning user.
    pub fn user_id(&self) -> UserId {
        self.handle.user_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }
}

/// Drives every realtime session through its lifecycle.
///
/// One engine is shared by all connection tasks; each task owns its
/// [`ActiveSession`] and feeds frames in arrival order through
/// [`run`](Self::run).
pub struct SessionEngine {
    pub(super) authenticator: WsAuthenticator,
    pub(super) registry: Arc<PresenceRegistry>,
    pub(super) store: Arc<dyn MessageStore>,
    pub(super) router: DeliveryRouter,
    pub(super) flags: Arc<PresenceFlagWriter>,
    pub(super) metrics: Arc<EngineMetrics>,
    pub(super) config: RealtimeConfig,
}

impl std::fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("config", &self.config)
            .finish()
    }
}

impl SessionEngine {
    /// Creates an engine over the shared realtime components.
    pub fn new(
        authenticator: WsAuthenticator,
        registry: Arc<PresenceRegistry>,
        store: Arc<dyn MessageStore>,
        flags: Arc<PresenceFlagWriter>,
        metrics: Arc<EngineMetrics>,
        config: RealtimeConfig,
    ) -> Self {
        let router = DeliveryRouter::new(Arc::clone(&registry), Arc::clone(&metrics));
        Self {
            authenticator,
            registry,
            store,
            router,
            flags,
            metrics,
            config,
        }
    }

    /// Router used for pushes to other users.
    pub fn router(&self) -> &DeliveryRouter {
        &self.router
    }

    /// `Connecting → Authenticated`, or `Connecting → Closed` on failure.
    ///
    /// Failures carry only the generic authentication message.
    pub async fn authenticate(&self, credential: Option<&str>) -> AppResult<PendingSession> {
        let mut state = SessionState::Connecting;
        match self.authenticator.authenticate(credential).await {
            Ok(user_id) => {
                state.transition(SessionState::Authenticated)?;
                Ok(PendingSession { user_id, state })
            }
            Err(e) => {
                state.transition(SessionState::Closed)?;
                EngineMetrics::inc(&self.metrics.handshakes_rejected);
                debug!(error = %e, "Realtime handshake rejected");
                Err(e)
            }
        }
    }

    /// `Authenticated → Active`: register and enqueue the online flag under
    /// the registry entry lock, then force-close any evicted session.
    ///
    /// Returns the session and the receiver for its outbound queue.
    pub fn activate(
        &self,
        pending: PendingSession,
    ) -> AppResult<(ActiveSession, mpsc::Receiver<OutboundEvent>)> {
        let PendingSession { user_id, mut state } = pending;
        state.transition(SessionState::Active)?;

        let (tx, rx) = mpsc::channel(self.config.outbound_buffer_size.max(1));
        let handle = Arc::new(SessionHandle::new(user_id, tx));

        let evicted = self
            .registry
            .register_then(Arc::clone(&handle), || self.flags.mark_online(user_id));
        if let Some(evicted) = evicted {
            evicted.close();
            EngineMetrics::inc(&self.metrics.sessions_evicted);
            info!(
                user_id = %user_id,
                evicted_session_id = %evicted.id,
                session_id = %handle.id,
                "Evicted previous session"
            );
        }
        self.metrics.session_opened();

        info!(user_id = %user_id, session_id = %handle.id, "Realtime session active");
        Ok((ActiveSession { handle, state }, rx))
    }

    /// Processes `inbox` frames one at a time until the transport closes
    /// the inbox or the session is force-closed, then tears down.
    pub async fn run(&self, mut session: ActiveSession, mut inbox: mpsc::Receiver<String>) {
        let handle = Arc::clone(&session.handle);
        loop {
            tokio::select! {
                biased;
                _ = handle.closed() => {
                    debug!(session_id = %handle.id, "Session closed, leaving event loop");
                    break;
                }
                frame = inbox.recv() => match frame {
                    Some(raw) => self.handle_frame(&session, &raw).await,
                    None => break,
                },
            }
        }
        self.teardown(&mut session);
    }

    /// `Active → Closed`. Enqueues the offline flag only if this session was
    /// still the registered one, under the same entry lock that removes it.
    /// Idempotent.
    pub fn teardown(&self, session: &mut ActiveSession) {
        if session.state == SessionState::Closed {
            return;
        }
        if let Err(e) = session.state.transition(SessionState::Closed) {
            warn!(error = %e, "Unexpected state during teardown");
            session.state = SessionState::Closed;
        }

        let handle = &session.handle;
        handle.close();
        let removed = self.registry.deregister_then(handle.user_id, handle, || {
            self.flags.mark_offline(handle.user_id)
        });
        self.metrics.session_closed();

        info!(
            user_id = %handle.user_id,
            session_id = %handle.id,
            deregistered = removed,
            "Realtime session closed"
        );
    }
}
