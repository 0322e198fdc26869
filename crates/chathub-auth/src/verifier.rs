//! JWT-backed identity verification.

use async_trait::async_trait;
use tracing::debug;

use chathub_core::config::AuthConfig;
use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_core::traits::IdentityVerifier;
use chathub_core::types::id::UserId;

use crate::jwt::JwtDecoder;

/// Message returned for every credential failure.
pub const AUTHENTICATION_ERROR: &str = "Authentication error";

/// Verifies HS256 bearer tokens issued by [`JwtEncoder`](crate::jwt::JwtEncoder).
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    decoder: JwtDecoder,
}

impl JwtVerifier {
    /// Create a verifier from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            decoder: JwtDecoder::new(config),
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, credential: &str) -> AppResult<UserId> {
        let credential = credential.trim();
        if credential.is_empty() {
            debug!("Rejected empty credential");
            return Err(AppError::authentication(AUTHENTICATION_ERROR));
        }

        match self.decoder.decode_token(credential) {
            Ok(claims) => Ok(claims.user_id()),
            Err(e) => {
                debug!(reason = %e.message, "Credential verification failed");
                Err(AppError::authentication(AUTHENTICATION_ERROR))
            }
        }
    }
}
