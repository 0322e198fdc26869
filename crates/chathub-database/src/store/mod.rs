//! The message store capability.
//!
//! The realtime engine and the REST handlers only ever talk to
//! [`MessageStore`]; the concrete backend is chosen at startup from
//! `database.provider`.

pub mod memory;
pub mod postgres;

pub use memory::MemoryMessageStore;
pub use postgres::PgMessageStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use chathub_core::result::AppResult;
use chathub_core::types::id::{MessageId, UserId};
use chathub_entity::conversation::ConversationSummary;
use chathub_entity::message::{Message, MessageWithParticipants, NewMessage};
use chathub_entity::user::{CreateUser, User};

/// Durable storage for users, messages, and presence flags.
#[async_trait]
pub trait MessageStore: Send + Sync + 'static {
    /// Insert a user. Duplicate username or email yields `Conflict`.
    async fn create_user(&self, data: CreateUser) -> AppResult<User>;

    /// Find a user by ID.
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>>;

    /// Find a user by email, case-insensitively.
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Write `isOnline` and `lastSeen` for a user.
    async fn set_presence(
        &self,
        user_id: UserId,
        online: bool,
        last_seen: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Persist a new unread message. Unknown participants yield `NotFound`.
    async fn create_message(&self, data: NewMessage) -> AppResult<Message>;

    /// Find a message by ID.
    async fn find_message(&self, id: MessageId) -> AppResult<Option<Message>>;

    /// Set `isRead` on one message, only if it is addressed to `receiver_id`.
    async fn mark_read(&self, id: MessageId, receiver_id: UserId) -> AppResult<bool>;

    /// Mark the listed unread messages addressed to `receiver_id` as read.
    async fn mark_read_many(&self, ids: &[MessageId], receiver_id: UserId) -> AppResult<u64>;

    /// Mark every unread message from `sender_id` to `receiver_id` as read
    /// in a single step, returning how many changed.
    async fn mark_all_read_from(&self, sender_id: UserId, receiver_id: UserId) -> AppResult<u64>;

    /// Messages exchanged between two users, oldest first, each with its
    /// sender and receiver identity.
    async fn conversation(
        &self,
        user_id: UserId,
        other_id: UserId,
    ) -> AppResult<Vec<MessageWithParticipants>>;

    /// Conversation list for a user, most recent first.
    async fn conversations(&self, user_id: UserId) -> AppResult<Vec<ConversationSummary>>;

    /// Unread messages addressed to a user.
    async fn unread_count(&self, user_id: UserId) -> AppResult<i64>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> AppResult<()>;
}

/// Order conversation rows by their latest message, newest first.
pub(crate) fn sort_by_recency(rows: &mut [ConversationSummary]) {
    rows.sort_by(|a, b| {
        let key = |c: &ConversationSummary| {
            c.last_message
                .as_ref()
                .map(|m| (m.message.created_at, m.message.id))
        };
        key(b).cmp(&key(a))
    });
}
