//! # chathub-api
//!
//! HTTP API layer for ChatHub built on Axum.
//!
//! Provides the REST endpoints for signup, login, and message history,
//! the WebSocket upgrade into the realtime engine, middleware (CORS,
//! logging), extractors, DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
