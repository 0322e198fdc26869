//! PostgreSQL-backed [`MessageStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_core::types::id::{MessageId, UserId};
use chathub_entity::conversation::ConversationSummary;
use chathub_entity::message::{Message, MessageWithParticipants, NewMessage};
use chathub_entity::user::{CreateUser, User};

use super::{MessageStore, sort_by_recency};
use crate::connection::DatabasePool;
use crate::repositories::{MessageRepository, UserRepository};

/// Message store delegating to the user and message repositories.
#[derive(Debug, Clone)]
pub struct PgMessageStore {
    db: DatabasePool,
    users: UserRepository,
    messages: MessageRepository,
}

impl PgMessageStore {
    /// Build the store over an existing pool.
    pub fn new(db: DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            users: UserRepository::new(pool.clone()),
            messages: MessageRepository::new(pool),
            db,
        }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn create_user(&self, data: CreateUser) -> AppResult<User> {
        self.users.create(&data).await
    }

    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        self.users.find_by_id(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.users.find_by_email(email).await
    }

    async fn set_presence(
        &self,
        user_id: UserId,
        online: bool,
        last_seen: DateTime<Utc>,
    ) -> AppResult<()> {
        self.users.update_presence(user_id, online, last_seen).await
    }

    async fn create_message(&self, data: NewMessage) -> AppResult<Message> {
        self.messages.create(&data).await
    }

    async fn find_message(&self, id: MessageId) -> AppResult<Option<Message>> {
        self.messages.find_by_id(id).await
    }

    async fn mark_read(&self, id: MessageId, receiver_id: UserId) -> AppResult<bool> {
        self.messages.mark_read(id, receiver_id).await
    }

    async fn mark_read_many(&self, ids: &[MessageId], receiver_id: UserId) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.messages.mark_read_many(ids, receiver_id).await
    }

    async fn mark_all_read_from(&self, sender_id: UserId, receiver_id: UserId) -> AppResult<u64> {
        self.messages.mark_all_from(sender_id, receiver_id).await
    }

    async fn conversation(
        &self,
        user_id: UserId,
        other_id: UserId,
    ) -> AppResult<Vec<MessageWithParticipants>> {
        self.messages.find_between(user_id, other_id).await
    }

    async fn conversations(&self, user_id: UserId) -> AppResult<Vec<ConversationSummary>> {
        let latest = self.messages.find_latest_per_partner(user_id).await?;
        if latest.is_empty() {
            return Ok(Vec::new());
        }
        let unread = self.messages.unread_by_sender(user_id).await?;

        let partner_ids: Vec<UserId> = latest
            .iter()
            .map(|m| m.message.partner_of(user_id))
            .collect();
        let partners: HashMap<UserId, _> = self
            .users
            .find_summaries(&partner_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut rows: Vec<ConversationSummary> = latest
            .into_iter()
            .filter_map(|message| {
                let partner_id = message.message.partner_of(user_id);
                let partner = partners.get(&partner_id)?.clone();
                Some(ConversationSummary {
                    partner,
                    unread_count: unread.get(&partner_id).copied().unwrap_or(0),
                    last_message: Some(message),
                })
            })
            .collect();
        sort_by_recency(&mut rows);
        Ok(rows)
    }

    async fn unread_count(&self, user_id: UserId) -> AppResult<i64> {
        self.messages.unread_count(user_id).await
    }

    async fn ping(&self) -> AppResult<()> {
        if self.db.health_check().await? {
            Ok(())
        } else {
            Err(AppError::service_unavailable("Database health check failed"))
        }
    }
}
