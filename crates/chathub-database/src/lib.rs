//! # chathub-database
//!
//! PostgreSQL connection management, repository implementations for
//! users and messages, and the [`MessageStore`] capability consumed by
//! the realtime engine and the REST handlers.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{MemoryMessageStore, MessageStore, PgMessageStore};
