//! Handshake authentication for realtime connections.

use std::sync::Arc;

use chathub_core::result::AppResult;
use chathub_core::traits::IdentityVerifier;
use chathub_core::types::id::UserId;

/// Authenticates realtime connections before they are upgraded.
#[derive(Clone)]
pub struct WsAuthenticator {
    verifier: Arc<dyn IdentityVerifier>,
}

impl std::fmt::Debug for WsAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsAuthenticator").finish()
    }
}

impl WsAuthenticator {
    /// Creates a new authenticator over the shared verifier.
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { verifier }
    }

    /// Resolves a handshake credential, if any, to a user.
    ///
    /// A missing credential is verified as an empty string so that every
    /// rejection carries the same generic message.
    pub async fn authenticate(&self, credential: Option<&str>) -> AppResult<UserId> {
        self.verifier.verify(credential.unwrap_or_default()).await
    }
}
