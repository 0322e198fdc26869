//! Message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use chathub_core::types::id::{MessageId, UserId};

use crate::user::Participant;

/// A direct message between two users.
///
/// Immutable once created except for `is_read`, which only ever moves
/// from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Store-assigned identifier, increasing with creation order.
    pub id: MessageId,
    /// Author.
    pub sender_id: UserId,
    /// Addressee.
    pub receiver_id: UserId,
    /// Text body.
    pub content: String,
    /// Whether the receiver has read the message.
    pub is_read: bool,
    /// When the message was stored.
    pub created_at: DateTime<Utc>,
    /// When the read flag last changed.
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Whether `user_id` is one of the two participants.
    pub fn involves(&self, user_id: UserId) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }

    /// The participant that is not `user_id`.
    pub fn partner_of(&self, user_id: UserId) -> UserId {
        if self.sender_id == user_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

/// A message with both participants' identity attached, as returned by
/// conversation history and the conversation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageWithParticipants {
    /// The message itself, serialized inline.
    #[serde(flatten)]
    pub message: Message,
    /// Author identity.
    pub sender: Participant,
    /// Addressee identity.
    pub receiver: Participant,
}

/// Data required to store a new message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    /// Author.
    pub sender_id: UserId,
    /// Addressee.
    pub receiver_id: UserId,
    /// Validated text body.
    pub content: String,
}
