//! Conversation listing projections.

use serde::{Deserialize, Serialize};

use crate::message::MessageWithParticipants;
use crate::user::UserSummary;

/// One row of a user's conversation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// The other participant.
    pub partner: UserSummary,
    /// Most recent message in either direction.
    pub last_message: Option<MessageWithParticipants>,
    /// Messages from the partner the caller has not read.
    pub unread_count: i64,
}
