//! Error types for bugtrackr operations.

use crate::domain::{BugId, UserId, ValidationError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for bugtrackr operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization or parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No `.bugtrackr/` directory was found.
    #[error("Not a bugtrackr workspace (or any parent directory): {}", .0.display())]
    NotInitialized(PathBuf),

    /// Bug report rejected before any store call.
    #[error("Invalid bug report: {0}")]
    Validation(#[from] ValidationError),

    /// Bug not found.
    #[error("Bug not found: {0}")]
    BugNotFound(BugId),

    /// User not found in the roster.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Only the filer or the assignee may change a bug.
    #[error("{user} is neither the filer nor the assignee of {bug}")]
    NotPermitted {
        /// The acting user
        user: UserId,
        /// The bug they tried to change
        bug: BugId,
    },

    /// Backend-specific storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// A specialized Result type for bugtrackr operations.
pub type Result<T> = std::result::Result<T, Error>;
