//! # chathub-core
//!
//! Core crate for ChatHub. Contains configuration schemas, typed
//! identifiers, the identity verification trait, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other ChatHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
