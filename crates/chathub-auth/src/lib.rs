//! # chathub-auth
//!
//! Credential handling for ChatHub.
//!
//! ## Modules
//!
//! - `jwt`: HS256 token creation and validation
//! - `password`: Argon2id password hashing
//! - `verifier`: the [`IdentityVerifier`](chathub_core::traits::IdentityVerifier)
//!   used by the REST middleware and the realtime handshake
//! - `service`: signup and login flows

pub mod jwt;
pub mod password;
pub mod service;
pub mod verifier;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::PasswordHasher;
pub use service::{AuthService, SignupRequest};
pub use verifier::JwtVerifier;
