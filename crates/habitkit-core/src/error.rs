//! Core error types for habitkit-core.
//!
//! This module defines the error hierarchy using thiserror. Pure
//! calendar computations never error on valid input; everything that
//! touches the store reports failure through these types.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for habitkit-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Store-related errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Lookup against a nonexistent entity
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Writes that would corrupt cross-entity invariants
    #[error("Consistency violation: {0}")]
    Consistency(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Shorthand for a NotFound error.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Store-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Natural-key uniqueness violated
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Validation errors.
///
/// Rejected synchronously and never retried.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Date string that is not YYYY-MM-DD
    #[error("Malformed date '{0}': expected YYYY-MM-DD")]
    MalformedDate(String),

    /// Habit target below the minimum of one
    #[error("Habit target must be at least 1")]
    ZeroTarget,

    /// Day-of-month outside 1..=31
    #[error("Monthly day {0} out of range 1-31")]
    MonthlyDayOutOfRange(u32),

    /// Month outside 1..=12
    #[error("Monthly month {0} out of range 1-12")]
    MonthlyMonthOutOfRange(u32),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg) => match e.code {
                rusqlite::ErrorCode::DatabaseLocked => StoreError::Locked,
                rusqlite::ErrorCode::ConstraintViolation => StoreError::UniqueViolation(
                    msg.clone().unwrap_or_else(|| e.to_string()),
                ),
                _ => StoreError::QueryFailed(err.to_string()),
            },
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
