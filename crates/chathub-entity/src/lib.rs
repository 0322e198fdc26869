//! # chathub-entity
//!
//! Domain entity models for ChatHub. Every struct in this crate
//! represents a database table row or a domain value object. Database
//! entities additionally derive `sqlx::FromRow`.
//!
//! Entities that travel over the wire serialize with camelCase keys
//! (`senderId`, `isRead`, ...), which is the client contract.

pub mod conversation;
pub mod message;
pub mod user;
