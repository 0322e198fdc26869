//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use chathub_core::types::id::{MessageId, UserId};

/// Signup request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    /// Username.
    #[validate(length(min = 1, max = 100, message = "Username is required"))]
    pub username: String,
    /// Email.
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Mark-as-read request: either explicit IDs or every unread message
/// from one sender.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsReadRequest {
    /// Messages to mark.
    #[serde(default)]
    pub message_ids: Option<Vec<MessageId>>,
    /// Sender whose messages to mark.
    #[serde(default)]
    pub sender_id: Option<UserId>,
}
