//! Validation rules for inbound frames and message content.

use chathub_core::error::AppError;

/// Rejects frames that are larger than `max_bytes` or blank.
pub fn validate_frame(raw: &str, max_bytes: usize) -> Result<(), AppError> {
    if raw.len() > max_bytes {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {max_bytes} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }

    Ok(())
}

/// Message text must be non-empty after trimming and at most
/// `max_chars` characters long.
pub fn validate_content(content: &str, max_chars: usize) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::validation("Message content cannot be empty"));
    }

    if content.chars().count() > max_chars {
        return Err(AppError::validation(format!(
            "Message content exceeds {max_chars} characters"
        )));
    }

    Ok(())
}
