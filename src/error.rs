//! Error types for the InsipiraHub store
//!
//! All errors in the crate are converted to `AppError`. The only error
//! conditions the schema itself defines are constraint violations, so the
//! type carries helpers to classify them without unwrapping sqlx internals.

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Row not found
    #[error("Resource not found")]
    NotFound,

    /// Validation error (bad arguments before any SQL runs)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error, including constraint violations
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    fn constraint_kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::Database(sqlx::Error::Database(db_err)) => Some(db_err.kind()),
            _ => None,
        }
    }

    /// True if this error is a duplicate-key (UNIQUE constraint) violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self.constraint_kind(), Some(ErrorKind::UniqueViolation))
    }

    /// True if this error is a foreign-key constraint violation.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self.constraint_kind(), Some(ErrorKind::ForeignKeyViolation))
    }

    /// True if this error is a NOT NULL constraint violation.
    pub fn is_not_null_violation(&self) -> bool {
        matches!(self.constraint_kind(), Some(ErrorKind::NotNullViolation))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
