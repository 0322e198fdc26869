//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use chathub_auth::{AuthService, JwtVerifier};
use chathub_core::config::AppConfig;
use chathub_core::traits::IdentityVerifier;
use chathub_database::store::MessageStore;
use chathub_realtime::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Message store (PostgreSQL or in-memory)
    pub store: Arc<dyn MessageStore>,
    /// Bearer credential verifier shared by REST and WebSocket
    pub verifier: Arc<dyn IdentityVerifier>,
    /// Signup and login
    pub auth: Arc<AuthService>,
    /// Realtime engine
    pub realtime: RealtimeEngine,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("realtime", &self.realtime)
            .finish()
    }
}

impl AppState {
    /// Wire every component over `store`. Must be called inside a Tokio
    /// runtime because the realtime engine spawns its flag writer.
    pub fn new(config: AppConfig, store: Arc<dyn MessageStore>) -> Self {
        let verifier: Arc<dyn IdentityVerifier> = Arc::new(JwtVerifier::new(&config.auth));
        let auth = Arc::new(AuthService::new(Arc::clone(&store), &config.auth));
        let realtime = RealtimeEngine::new(
            config.realtime.clone(),
            Arc::clone(&store),
            Arc::clone(&verifier),
        );

        Self {
            config: Arc::new(config),
            store,
            verifier,
            auth,
            realtime,
        }
    }
}
