//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use chathub_core::types::id::UserId;

/// A registered chat user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique display handle.
    pub username: String,
    /// Unique login email.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the user currently has a live realtime session.
    pub is_online: bool,
    /// When the user's last realtime session changed state.
    pub last_seen: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Public projection without credential material.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            is_online: self.is_online,
            last_seen: self.last_seen,
        }
    }

    /// Identity embedded alongside messages in history listings.
    pub fn participant(&self) -> Participant {
        Participant {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Identity of a message sender or receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// User ID.
    pub id: UserId,
    /// Username.
    pub username: String,
    /// Email.
    pub email: String,
}

/// Public view of a user shown to conversation partners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// User ID.
    pub id: UserId,
    /// Username.
    pub username: String,
    /// Email.
    pub email: String,
    /// Presence flag.
    pub is_online: bool,
    /// Last presence change.
    pub last_seen: Option<DateTime<Utc>>,
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
}
