//! Signup and login flows.

use std::sync::Arc;

use tracing::info;

use chathub_core::config::AuthConfig;
use chathub_core::error::{AppError, ErrorKind};
use chathub_core::result::AppResult;
use chathub_database::store::MessageStore;
use chathub_entity::user::{CreateUser, User};

use crate::jwt::JwtEncoder;
use crate::password::PasswordHasher;

/// Input for account creation.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    /// Desired username.
    pub username: String,
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Creates accounts and issues bearer tokens.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn MessageStore>,
    encoder: JwtEncoder,
    hasher: PasswordHasher,
    password_min_length: usize,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("password_min_length", &self.password_min_length)
            .finish()
    }
}

impl AuthService {
    /// Creates a new auth service over the shared store.
    pub fn new(store: Arc<dyn MessageStore>, config: &AuthConfig) -> Self {
        Self {
            store,
            encoder: JwtEncoder::new(config),
            hasher: PasswordHasher::new(),
            password_min_length: config.password_min_length,
        }
    }

    /// Registers a new user. Duplicate username or email yields `Conflict`.
    pub async fn signup(&self, req: SignupRequest) -> AppResult<User> {
        let username = req.username.trim();
        let email = req.email.trim();
        if username.is_empty() || email.is_empty() {
            return Err(AppError::validation("Username and email are required"));
        }
        if req.password.chars().count() < self.password_min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.password_min_length
            )));
        }

        let password_hash = self.hasher.hash_password(&req.password)?;
        let user = self
            .store
            .create_user(CreateUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e.kind {
                ErrorKind::Conflict => {
                    AppError::conflict("Username or email already in use")
                }
                _ => e,
            })?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Checks credentials and returns a fresh token.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<String> {
        let user = self
            .store
            .find_user_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if !self.hasher.verify_password(password, &user.password_hash)? {
            return Err(AppError::authentication("Invalid credentials"));
        }

        let (token, _) = self.encoder.generate_token(user.id)?;
        info!(user_id = %user.id, "User logged in");
        Ok(token)
    }
}
