//! Message repository implementation.

use std::collections::HashMap;

use sqlx::{FromRow, PgPool};

use chathub_core::result::AppResult;
use chathub_core::types::id::{MessageId, UserId};
use chathub_entity::message::{Message, MessageWithParticipants, NewMessage};
use chathub_entity::user::Participant;

use super::map_db_error;

/// Message columns joined with both participants' identity.
#[derive(Debug, FromRow)]
struct MessageWithParticipantsRow {
    #[sqlx(flatten)]
    message: Message,
    sender_username: String,
    sender_email: String,
    receiver_username: String,
    receiver_email: String,
}

impl From<MessageWithParticipantsRow> for MessageWithParticipants {
    fn from(row: MessageWithParticipantsRow) -> Self {
        let sender = Participant {
            id: row.message.sender_id,
            username: row.sender_username,
            email: row.sender_email,
        };
        let receiver = Participant {
            id: row.message.receiver_id,
            username: row.receiver_username,
            email: row.receiver_email,
        };
        Self {
            message: row.message,
            sender,
            receiver,
        }
    }
}

/// Repository for direct message persistence and read-state updates.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a message. An unknown sender or receiver yields `NotFound`.
    pub async fn create(&self, data: &NewMessage) -> AppResult<Message> {
        sqlx::query_as::<_, Message>(
            r#"INSERT INTO messages (sender_id, receiver_id, content)
               VALUES ($1, $2, $3)
               RETURNING *"#,
        )
        .bind(data.sender_id)
        .bind(data.receiver_id)
        .bind(&data.content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to create message", e))
    }

    /// Find a message by ID.
    pub async fn find_by_id(&self, id: MessageId) -> AppResult<Option<Message>> {
        sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to find message", e))
    }

    /// Set the read flag on one message addressed to `receiver_id`.
    ///
    /// Returns `false` when no row matched both the ID and the receiver.
    pub async fn mark_read(&self, id: MessageId, receiver_id: UserId) -> AppResult<bool> {
        let result = sqlx::query(
            r#"UPDATE messages SET is_read = TRUE, updated_at = NOW()
               WHERE id = $1 AND receiver_id = $2"#,
        )
        .bind(id)
        .bind(receiver_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to mark message as read", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a batch of messages read, restricted to those addressed to
    /// `receiver_id` and still unread.
    pub async fn mark_read_many(&self, ids: &[MessageId], receiver_id: UserId) -> AppResult<u64> {
        let raw: Vec<i64> = ids.iter().map(|id| id.into_inner()).collect();
        let result = sqlx::query(
            r#"UPDATE messages SET is_read = TRUE, updated_at = NOW()
               WHERE id = ANY($1) AND receiver_id = $2 AND is_read = FALSE"#,
        )
        .bind(raw)
        .bind(receiver_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to mark messages as read", e))?;
        Ok(result.rows_affected())
    }

    /// Mark every unread message from `sender_id` to `receiver_id` read in
    /// one statement.
    pub async fn mark_all_from(&self, sender_id: UserId, receiver_id: UserId) -> AppResult<u64> {
        let result = sqlx::query(
            r#"UPDATE messages SET is_read = TRUE, updated_at = NOW()
               WHERE sender_id = $1 AND receiver_id = $2 AND is_read = FALSE"#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to mark all messages as read", e))?;
        Ok(result.rows_affected())
    }

    /// Every message exchanged between two users, oldest first, with both
    /// participants attached.
    pub async fn find_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> AppResult<Vec<MessageWithParticipants>> {
        let rows = sqlx::query_as::<_, MessageWithParticipantsRow>(
            r#"SELECT m.*,
                      s.username AS sender_username, s.email AS sender_email,
                      r.username AS receiver_username, r.email AS receiver_email
               FROM messages m
               JOIN users s ON s.id = m.sender_id
               JOIN users r ON r.id = m.receiver_id
               WHERE (m.sender_id = $1 AND m.receiver_id = $2)
                  OR (m.sender_id = $2 AND m.receiver_id = $1)
               ORDER BY m.created_at ASC, m.id ASC"#,
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to load conversation", e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// The latest message of every conversation `user_id` takes part in,
    /// with both participants attached.
    pub async fn find_latest_per_partner(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<MessageWithParticipants>> {
        let rows = sqlx::query_as::<_, MessageWithParticipantsRow>(
            r#"SELECT DISTINCT ON (LEAST(m.sender_id, m.receiver_id), GREATEST(m.sender_id, m.receiver_id))
                      m.id, m.sender_id, m.receiver_id, m.content, m.is_read,
                      m.created_at, m.updated_at,
                      s.username AS sender_username, s.email AS sender_email,
                      r.username AS receiver_username, r.email AS receiver_email
               FROM messages m
               JOIN users s ON s.id = m.sender_id
               JOIN users r ON r.id = m.receiver_id
               WHERE m.sender_id = $1 OR m.receiver_id = $1
               ORDER BY LEAST(m.sender_id, m.receiver_id), GREATEST(m.sender_id, m.receiver_id),
                        m.created_at DESC, m.id DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to load conversations", e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Unread counts addressed to `user_id`, keyed by sender.
    pub async fn unread_by_sender(&self, user_id: UserId) -> AppResult<HashMap<UserId, i64>> {
        let rows: Vec<(UserId, i64)> = sqlx::query_as(
            r#"SELECT sender_id, COUNT(*) FROM messages
               WHERE receiver_id = $1 AND is_read = FALSE
               GROUP BY sender_id"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to count unread messages", e))?;
        Ok(rows.into_iter().collect())
    }

    /// Total unread messages addressed to `user_id`.
    pub async fn unread_count(&self, user_id: UserId) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE receiver_id = $1 AND is_read = FALSE")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to count unread messages", e))
    }
}
