//! Repository implementations for ChatHub entities.

pub mod message;
pub mod user;

pub use message::MessageRepository;
pub use user::UserRepository;

use chathub_core::error::{AppError, ErrorKind};

/// PostgreSQL `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Map a sqlx error into an [`AppError`], classifying constraint
/// violations so callers can answer with `Conflict` or `NotFound`.
pub(crate) fn map_db_error(context: &'static str, err: sqlx::Error) -> AppError {
    let code = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|c| c.into_owned());

    match code.as_deref() {
        Some(UNIQUE_VIOLATION) => {
            AppError::with_source(ErrorKind::Conflict, "Resource already exists", err)
        }
        Some(FOREIGN_KEY_VIOLATION) => {
            AppError::with_source(ErrorKind::NotFound, "Referenced user not found", err)
        }
        _ => AppError::with_source(ErrorKind::Database, context, err),
    }
}
