//! Credential verification capability shared by REST and realtime entry points.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::UserId;

/// Resolves a bearer credential to the user it was issued for.
///
/// Implementations must reject missing, malformed, expired, and
/// signature-invalid credentials with an `Authentication` error whose
/// message does not reveal which check failed.
#[async_trait]
pub trait IdentityVerifier: Send + Sync + 'static {
    /// Verify `credential` and return the owning user identity.
    async fn verify(&self, credential: &str) -> AppResult<UserId>;
}
