//! In-process [`MessageStore`] used when `database.provider = "memory"`
//! and by the test suites.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_core::types::id::{MessageId, UserId};
use chathub_entity::conversation::ConversationSummary;
use chathub_entity::message::{Message, MessageWithParticipants, NewMessage};
use chathub_entity::user::{CreateUser, User};

use super::{MessageStore, sort_by_recency};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    messages: BTreeMap<MessageId, Message>,
    next_user_id: i64,
    next_message_id: i64,
    presence_writes: Vec<(UserId, bool)>,
}

impl State {
    fn user_exists(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    /// Attach both participants, skipping messages whose users are gone.
    fn with_participants(&self, message: &Message) -> Option<MessageWithParticipants> {
        let sender = self.users.get(&message.sender_id)?.participant();
        let receiver = self.users.get(&message.receiver_id)?.participant();
        Some(MessageWithParticipants {
            message: message.clone(),
            sender,
            receiver,
        })
    }
}

/// Message store holding everything in memory behind a single lock.
///
/// Every trait call takes the lock once, so each operation is atomic with
/// respect to the others, matching the single-statement guarantees of the
/// PostgreSQL store.
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    state: RwLock<State>,
}

impl MemoryMessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every presence flag written for `user_id`, in write order.
    pub async fn presence_history(&self, user_id: UserId) -> Vec<bool> {
        self.state
            .read()
            .await
            .presence_writes
            .iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, online)| *online)
            .collect()
    }

    /// Number of stored messages.
    pub async fn message_count(&self) -> usize {
        self.state.read().await.messages.len()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn create_user(&self, data: CreateUser) -> AppResult<User> {
        let mut state = self.state.write().await;
        let taken = state.users.values().any(|u| {
            u.username == data.username || u.email.eq_ignore_ascii_case(&data.email)
        });
        if taken {
            return Err(AppError::conflict("Resource already exists"));
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: UserId(state.next_user_id),
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            is_online: false,
            last_seen: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn set_presence(
        &self,
        user_id: UserId,
        online: bool,
        last_seen: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.presence_writes.push((user_id, online));
        if let Some(user) = state.users.get_mut(&user_id) {
            user.is_online = online;
            user.last_seen = Some(last_seen);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn create_message(&self, data: NewMessage) -> AppResult<Message> {
        let mut state = self.state.write().await;
        if !state.user_exists(data.sender_id) || !state.user_exists(data.receiver_id) {
            return Err(AppError::not_found("Referenced user not found"));
        }

        state.next_message_id += 1;
        let now = Utc::now();
        let message = Message {
            id: MessageId(state.next_message_id),
            sender_id: data.sender_id,
            receiver_id: data.receiver_id,
            content: data.content,
            is_read: false,
            created_at: now,
            updated_at: now,
        };
        state.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn find_message(&self, id: MessageId) -> AppResult<Option<Message>> {
        Ok(self.state.read().await.messages.get(&id).cloned())
    }

    async fn mark_read(&self, id: MessageId, receiver_id: UserId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        match state.messages.get_mut(&id) {
            Some(message) if message.receiver_id == receiver_id => {
                message.is_read = true;
                message.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_read_many(&self, ids: &[MessageId], receiver_id: UserId) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut count = 0;
        for id in ids {
            if let Some(message) = state.messages.get_mut(id) {
                if message.receiver_id == receiver_id && !message.is_read {
                    message.is_read = true;
                    message.updated_at = now;
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    async fn mark_all_read_from(&self, sender_id: UserId, receiver_id: UserId) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut count = 0;
        for message in state.messages.values_mut() {
            if message.sender_id == sender_id && message.receiver_id == receiver_id && !message.is_read
            {
                message.is_read = true;
                message.updated_at = now;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn conversation(
        &self,
        user_id: UserId,
        other_id: UserId,
    ) -> AppResult<Vec<MessageWithParticipants>> {
        let state = self.state.read().await;
        let mut messages: Vec<&Message> = state
            .messages
            .values()
            .filter(|m| {
                (m.sender_id == user_id && m.receiver_id == other_id)
                    || (m.sender_id == other_id && m.receiver_id == user_id)
            })
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        Ok(messages
            .into_iter()
            .filter_map(|m| state.with_participants(m))
            .collect())
    }

    async fn conversations(&self, user_id: UserId) -> AppResult<Vec<ConversationSummary>> {
        let state = self.state.read().await;
        let mut latest: HashMap<UserId, &Message> = HashMap::new();
        let mut unread: HashMap<UserId, i64> = HashMap::new();

        for message in state.messages.values().filter(|m| m.involves(user_id)) {
            let partner_id = message.partner_of(user_id);
            let newer = latest
                .get(&partner_id)
                .is_none_or(|cur| (message.created_at, message.id) > (cur.created_at, cur.id));
            if newer {
                latest.insert(partner_id, message);
            }
            if message.receiver_id == user_id && !message.is_read {
                *unread.entry(partner_id).or_default() += 1;
            }
        }

        let mut rows: Vec<ConversationSummary> = latest
            .into_iter()
            .filter_map(|(partner_id, message)| {
                let partner = state.users.get(&partner_id)?.summary();
                Some(ConversationSummary {
                    partner,
                    last_message: Some(state.with_participants(message)?),
                    unread_count: unread.get(&partner_id).copied().unwrap_or(0),
                })
            })
            .collect();
        sort_by_recency(&mut rows);
        Ok(rows)
    }

    async fn unread_count(&self, user_id: UserId) -> AppResult<i64> {
        let state = self.state.read().await;
        let count = state
            .messages
            .values()
            .filter(|m| m.receiver_id == user_id && !m.is_read)
            .count();
        Ok(count as i64)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
