//! Response DTOs.

use serde::{Deserialize, Serialize};

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

/// Issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// HS256 JWT.
    pub token: String,
}

/// Result of a REST mark-as-read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkAsReadResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Messages changed.
    pub count: u64,
}

/// Unread total for the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    /// Unread messages addressed to the caller.
    pub unread_count: i64,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `ok` when the process answers.
    pub status: String,
    /// Users with a live realtime session.
    pub online_users: usize,
}
