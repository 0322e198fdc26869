//! Event handlers for active sessions.

use tracing::{debug, error, info, warn};

use chathub_core::error::{AppError, ErrorKind};
use chathub_core::result::AppResult;
use chathub_entity::message::NewMessage;

use super::engine::{ActiveSession, SessionEngine};
use crate::message::serializer::deserialize_inbound;
use crate::message::types::{
    AllMessagesReadPayload, InboundEvent, MarkAllAsReadPayload, MessageReadPayload,
    MessagesReadByReceiverPayload, OutboundEvent, SendMessagePayload, TypingPayload,
    TypingRelayPayload,
};
use crate::message::validator::{validate_content, validate_frame};
use crate::metrics::EngineMetrics;

const INVALID_PAYLOAD: &str = "Invalid event payload";
const SEND_FAILED: &str = "Failed to send message";
const READ_FAILED: &str = "Failed to mark message as read";
const READ_ALL_FAILED: &str = "Failed to mark messages as read";

impl SessionEngine {
    /// Validate, decode, and dispatch one inbound text frame.
    pub async fn handle_frame(&self, session: &ActiveSession, raw: &str) {
        EngineMetrics::inc(&self.metrics.events_received);

        if let Err(e) = validate_frame(raw, self.config.max_frame_bytes) {
            self.fail(session, "frame", e, INVALID_PAYLOAD).await;
            return;
        }

        let event = match deserialize_inbound(raw) {
            Ok(event) => event,
            Err(e) => {
                debug!(session_id = %session.handle().id, error = %e, "Undecodable frame");
                let err = AppError::validation(INVALID_PAYLOAD);
                self.fail(session, "frame", err, INVALID_PAYLOAD).await;
                return;
            }
        };

        let name = event.name();
        let result = match event {
            InboundEvent::SendMessage(p) => self
                .on_send_message(session, p)
                .await
                .map_err(|e| (e, SEND_FAILED)),
            InboundEvent::MessageRead(p) => self
                .on_message_read(session, p)
                .await
                .map_err(|e| (e, READ_FAILED)),
            InboundEvent::MarkAllAsRead(p) => self
                .on_mark_all_as_read(session, p)
                .await
                .map_err(|e| (e, READ_ALL_FAILED)),
            InboundEvent::Typing(p) => {
                self.on_typing(session, p, false);
                Ok(())
            }
            InboundEvent::StopTyping(p) => {
                self.on_typing(session, p, true);
                Ok(())
            }
        };

        if let Err((e, fallback)) = result {
            self.fail(session, name, e, fallback).await;
        }
    }

    async fn on_send_message(
        &self,
        session: &ActiveSession,
        p: SendMessagePayload,
    ) -> AppResult<()> {
        validate_content(&p.content, self.config.max_message_length)?;

        let message = self
            .store
            .create_message(NewMessage {
                sender_id: session.user_id(),
                receiver_id: p.receiver_id,
                content: p.content,
            })
            .await
            .map_err(|e| match e.kind {
                ErrorKind::NotFound => AppError::not_found("Receiver not found"),
                _ => e,
            })?;
        EngineMetrics::inc(&self.metrics.messages_stored);

        info!(
            message_id = %message.id,
            sender_id = %message.sender_id,
            receiver_id = %message.receiver_id,
            "Message stored"
        );

        session.handle().send(OutboundEvent::MessageSent(message.clone())).await;
        let outcome = self
            .router
            .push(message.receiver_id, OutboundEvent::ReceiveMessage(message));
        debug!(?outcome, "receiveMessage routed");
        Ok(())
    }

    async fn on_message_read(
        &self,
        session: &ActiveSession,
        p: MessageReadPayload,
    ) -> AppResult<()> {
        let caller = session.user_id();
        let message = self
            .store
            .find_message(p.message_id)
            .await?
            .ok_or_else(|| AppError::not_found("Message not found"))?;

        if message.receiver_id != caller {
            warn!(
                message_id = %message.id,
                user_id = %caller,
                "Read receipt from a user other than the receiver"
            );
            return Err(AppError::authorization(
                "Not authorized to mark this message as read",
            ));
        }

        if !self.store.mark_read(message.id, caller).await? {
            return Err(AppError::not_found("Message not found"));
        }
        let updated = self
            .store
            .find_message(message.id)
            .await?
            .ok_or_else(|| AppError::not_found("Message not found"))?;

        debug!(message_id = %updated.id, user_id = %caller, "Message marked as read");
        session
            .handle()
            .send(OutboundEvent::MessageReadConfirmed(updated.clone()))
            .await;
        self.router
            .push(updated.sender_id, OutboundEvent::MessageReadByReceiver(updated));
        Ok(())
    }

    async fn on_mark_all_as_read(
        &self,
        session: &ActiveSession,
        p: MarkAllAsReadPayload,
    ) -> AppResult<()> {
        let caller = session.user_id();
        let count = self.store.mark_all_read_from(p.sender_id, caller).await?;

        debug!(sender_id = %p.sender_id, user_id = %caller, count, "Marked all as read");
        session
            .handle()
            .send(OutboundEvent::AllMessagesRead(AllMessagesReadPayload {
                sender_id: p.sender_id,
                count,
            }))
            .await;

        if count > 0 {
            self.router.push(
                p.sender_id,
                OutboundEvent::MessagesReadByReceiver(MessagesReadByReceiverPayload {
                    receiver_id: caller,
                    count,
                }),
            );
        }
        Ok(())
    }

    fn on_typing(&self, session: &ActiveSession, p: TypingPayload, stopped: bool) {
        let relay = TypingRelayPayload {
            sender_id: session.user_id(),
        };
        let event = if stopped {
            OutboundEvent::StopTyping(relay)
        } else {
            OutboundEvent::Typing(relay)
        };
        self.router.push(p.receiver_id, event);
    }

    /// Report a failed event to the originating session only.
    async fn fail(&self, session: &ActiveSession, event: &str, err: AppError, fallback: &str) {
        EngineMetrics::inc(&self.metrics.events_failed);
        let handle = session.handle();
        if err.kind.is_client_facing() {
            debug!(
                session_id = %handle.id,
                user_id = %handle.user_id,
                event,
                error = %err,
                "Event rejected"
            );
        } else {
            error!(
                session_id = %handle.id,
                user_id = %handle.user_id,
                event,
                error = %err,
                "Event failed"
            );
        }
        handle
            .send(OutboundEvent::error(err.public_message(fallback)))
            .await;
    }
}
