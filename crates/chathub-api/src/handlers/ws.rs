//! WebSocket upgrade handler.
//!
//! The credential is checked before the upgrade, so a rejected handshake
//! never becomes a session. After the upgrade the socket is split into a
//! reader task feeding the session inbox and a writer task draining its
//! outbound queue; the session engine runs in between.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use chathub_realtime::message::OutboundEvent;
use chathub_realtime::message::serializer::serialize_outbound;
use chathub_realtime::session::PendingSession;

use crate::error::ApiError;
use crate::extractors::bearer_token;
use crate::state::AppState;

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Default, serde::Deserialize)]
pub struct WsQuery {
    /// Bearer credential; falls back to the `Authorization` header.
    pub token: Option<String>,
}

/// GET /ws?token={jwt}
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let credential = query.token.as_deref().or_else(|| bearer_token(&headers));
    let pending = state.realtime.sessions.authenticate(credential).await?;

    let max_frame = state.realtime.config().max_frame_bytes;
    Ok(ws
        .max_message_size(max_frame)
        .on_upgrade(move |socket| handle_socket(state, pending, socket)))
}

/// Drives one upgraded connection to completion.
async fn handle_socket(state: AppState, pending: PendingSession, socket: WebSocket) {
    let engine = Arc::clone(&state.realtime.sessions);
    let (session, mut outbound_rx) = match engine.activate(pending) {
        Ok(activated) => activated,
        Err(e) => {
            error!(error = %e, "Failed to activate realtime session");
            return;
        }
    };

    let handle = Arc::clone(session.handle());
    let (mut ws_tx, mut ws_rx) = socket.split();
    let inbox_size = state.realtime.config().inbox_buffer_size.max(1);
    let (inbox_tx, inbox_rx) = mpsc::channel::<String>(inbox_size);

    let writer_handle = Arc::clone(&handle);
    let writer = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                event = outbound_rx.recv() => match event {
                    Some(event) => {
                        if !write_event(&mut ws_tx, &event).await {
                            break;
                        }
                    }
                    None => break,
                },
                _ = writer_handle.closed() => {
                    while let Ok(event) = outbound_rx.try_recv() {
                        if !write_event(&mut ws_tx, &event).await {
                            break;
                        }
                    }
                    break;
                }
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    let reader_handle = Arc::clone(&handle);
    let reader = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = reader_handle.closed() => break,
                frame = ws_rx.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if inbox_tx.send(text.as_str().to_owned()).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Binary(_))) => {
                        debug!(session_id = %reader_handle.id, "Ignoring binary frame");
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(session_id = %reader_handle.id, error = %e, "WebSocket read error");
                        break;
                    }
                },
            }
        }
    });

    engine.run(session, inbox_rx).await;

    if let Err(e) = writer.await {
        warn!(session_id = %handle.id, error = %e, "Writer task failed");
    }
    reader.abort();
}

/// Writes one event to the socket. Returns `false` once the socket is gone.
async fn write_event(sink: &mut SplitSink<WebSocket, Message>, event: &OutboundEvent) -> bool {
    let text = match serialize_outbound(event) {
        Ok(text) => text,
        Err(e) => {
            error!(event = event.name(), error = %e, "Failed to serialize outbound event");
            return true;
        }
    };
    sink.send(Message::Text(text.into())).await.is_ok()
}
