//! Inbound and outbound realtime event definitions.
//!
//! Every frame is a JSON text frame of the form
//! `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};

use chathub_core::types::id::{MessageId, UserId};
use chathub_entity::message::Message;

/// Events sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum InboundEvent {
    /// Create a message and route it to the receiver.
    SendMessage(SendMessagePayload),
    /// Read receipt for a single message.
    MessageRead(MessageReadPayload),
    /// Mark everything from one sender as read.
    MarkAllAsRead(MarkAllAsReadPayload),
    /// The caller started typing to `receiverId`.
    Typing(TypingPayload),
    /// The caller stopped typing to `receiverId`.
    StopTyping(TypingPayload),
}

impl InboundEvent {
    /// Wire name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SendMessage(_) => "sendMessage",
            Self::MessageRead(_) => "messageRead",
            Self::MarkAllAsRead(_) => "markAllAsRead",
            Self::Typing(_) => "typing",
            Self::StopTyping(_) => "stopTyping",
        }
    }
}

/// `sendMessage` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    /// Addressee.
    pub receiver_id: UserId,
    /// Message text.
    pub content: String,
}

/// `messageRead` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReadPayload {
    /// Message being read.
    pub message_id: MessageId,
}

/// `markAllAsRead` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllAsReadPayload {
    /// Sender whose messages are being read.
    pub sender_id: UserId,
}

/// `typing` / `stopTyping` payload from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    /// Who is being typed to.
    pub receiver_id: UserId,
}

/// Events sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    /// The sender's message was stored.
    MessageSent(Message),
    /// A message addressed to this user arrived.
    ReceiveMessage(Message),
    /// This user's read receipt was applied.
    MessageReadConfirmed(Message),
    /// The receiver read a message this user sent.
    MessageReadByReceiver(Message),
    /// This user's bulk read was applied.
    AllMessagesRead(AllMessagesReadPayload),
    /// The receiver bulk-read messages this user sent.
    MessagesReadByReceiver(MessagesReadByReceiverPayload),
    /// `senderId` is typing to this user.
    Typing(TypingRelayPayload),
    /// `senderId` stopped typing to this user.
    StopTyping(TypingRelayPayload),
    /// A request from this session failed.
    Error(ErrorPayload),
}

impl OutboundEvent {
    /// Build an `error` event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            message: message.into(),
        })
    }

    /// Wire name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MessageSent(_) => "messageSent",
            Self::ReceiveMessage(_) => "receiveMessage",
            Self::MessageReadConfirmed(_) => "messageReadConfirmed",
            Self::MessageReadByReceiver(_) => "messageReadByReceiver",
            Self::AllMessagesRead(_) => "allMessagesRead",
            Self::MessagesReadByReceiver(_) => "messagesReadByReceiver",
            Self::Typing(_) => "typing",
            Self::StopTyping(_) => "stopTyping",
            Self::Error(_) => "error",
        }
    }
}

/// `allMessagesRead` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllMessagesReadPayload {
    /// Sender whose messages were marked.
    pub sender_id: UserId,
    /// Rows changed.
    pub count: u64,
}

/// `messagesReadByReceiver` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesReadByReceiverPayload {
    /// Who read them.
    pub receiver_id: UserId,
    /// Rows changed.
    pub count: u64,
}

/// `typing` / `stopTyping` payload relayed to the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingRelayPayload {
    /// Who is typing.
    pub sender_id: UserId,
}

/// `error` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Client-safe description.
    pub message: String,
}
