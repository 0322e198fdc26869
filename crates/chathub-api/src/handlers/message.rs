//! Message history and read-state handlers.
//!
//! Read-state changes made here go through the same store as the realtime
//! events, but do not push notifications to the sender.

use axum::Json;
use axum::extract::{Path, State};
use tracing::info;

use chathub_core::error::AppError;
use chathub_core::types::id::UserId;
use chathub_entity::conversation::ConversationSummary;
use chathub_entity::message::MessageWithParticipants;

use crate::dto::request::MarkAsReadRequest;
use crate::dto::response::{MarkAsReadResponse, UnreadCountResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /api/messages/conversation/{other_user_id}
pub async fn conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(other_user_id): Path<UserId>,
) -> Result<Json<Vec<MessageWithParticipants>>, ApiError> {
    let messages = state.store.conversation(auth.user_id, other_user_id).await?;
    Ok(Json(messages))
}

/// GET /api/messages/conversations
pub async fn conversations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    let rows = state.store.conversations(auth.user_id).await?;
    Ok(Json(rows))
}

/// GET /api/messages/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let unread_count = state.store.unread_count(auth.user_id).await?;
    Ok(Json(UnreadCountResponse { unread_count }))
}

/// POST /api/messages/mark-as-read
pub async fn mark_as_read(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<MarkAsReadRequest>,
) -> Result<Json<MarkAsReadResponse>, ApiError> {
    let count = match (req.message_ids, req.sender_id) {
        (Some(ids), _) if !ids.is_empty() => {
            state.store.mark_read_many(&ids, auth.user_id).await?
        }
        (_, Some(sender_id)) => {
            state
                .store
                .mark_all_read_from(sender_id, auth.user_id)
                .await?
        }
        _ => {
            return Err(AppError::validation("messageIds or senderId required").into());
        }
    };

    info!(user_id = %auth.user_id, count, "Marked messages as read");
    Ok(Json(MarkAsReadResponse {
        message: "Messages marked as read".to_string(),
        count,
    }))
}
