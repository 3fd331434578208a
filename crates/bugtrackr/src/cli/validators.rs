//! CLI input validation functions.
//!
//! Used by clap's `value_parser` so bad input is rejected at parse time.

use crate::domain::MAX_TITLE_LENGTH;
use crate::trend::WINDOW_PRESETS;

/// Validate a bug ID prefix. Delegates to [`crate::config::validate_prefix`].
pub fn validate_prefix(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    crate::config::validate_prefix(trimmed).map_err(|e| e.to_string())?;
    Ok(trimmed.to_string())
}

/// Validate a bug ID.
///
/// IDs are opaque to the CLI (imported bugs keep whatever ID they had), so
/// this only rejects input no store would have produced: empty strings,
/// whitespace and punctuation other than `-` and `_`.
pub fn validate_bug_id(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Bug ID cannot be empty".to_string());
    }
    if let Some(bad) = s
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(format!("Bug ID '{s}' contains invalid character '{bad}'"));
    }
    if s.starts_with('-') {
        return Err("Bug ID cannot start with a hyphen".to_string());
    }

    Ok(s.to_string())
}

/// Validate a user ID: non-empty, no whitespace.
pub fn validate_uid(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("User ID cannot be empty".to_string());
    }
    if s.chars().any(char::is_whitespace) {
        return Err(format!("User ID cannot contain whitespace: '{s}'"));
    }
    Ok(s.to_string())
}

/// Validate an email address loosely: something on both sides of one `@`.
pub fn validate_email(s: &str) -> Result<String, String> {
    let s = s.trim();
    match s.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(s.to_string())
        }
        _ => Err(format!("Invalid email address: '{s}'")),
    }
}

/// Validate title: non-empty, at most [`MAX_TITLE_LENGTH`] characters.
pub fn validate_title(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Title cannot be empty".to_string());
    }

    let length = s.chars().count();
    if length > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title cannot exceed {MAX_TITLE_LENGTH} characters, got {length} characters"
        ));
    }

    Ok(s.to_string())
}

/// Validate description: non-empty after trimming.
pub fn validate_description(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Description cannot be empty".to_string());
    }
    Ok(s.to_string())
}

/// Validate a trend window against the offered presets.
pub fn validate_window(s: &str) -> Result<u32, String> {
    let days: u32 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid window '{s}', expected a number of days"))?;
    if WINDOW_PRESETS.contains(&days) {
        Ok(days)
    } else {
        Err(format!(
            "Window must be one of {}",
            WINDOW_PRESETS.map(|d| d.to_string()).join(", ")
        ))
    }
}
