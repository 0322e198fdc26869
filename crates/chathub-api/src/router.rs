//! Route definitions for the ChatHub HTTP API.
//!
//! REST routes are mounted under `/api`; the WebSocket upgrade lives at
//! `/ws`. Every handler receives `AppState` through `State`.

use axum::Router;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// Build the router with all routes, without the outer middleware layers.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(message_routes())
        .route("/health", get(handlers::health::health));

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/ws", get(handlers::ws::ws_upgrade))
        .nest("/api", api_routes)
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
}

fn message_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/messages/conversation/{other_user_id}",
            get(handlers::message::conversation),
        )
        .route(
            "/messages/conversations",
            get(handlers::message::conversations),
        )
        .route(
            "/messages/unread-count",
            get(handlers::message::unread_count),
        )
        .route(
            "/messages/mark-as-read",
            post(handlers::message::mark_as_read),
        )
}
