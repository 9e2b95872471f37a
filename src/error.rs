//! Application error types

use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The payload source produced nothing this cycle
    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Payload has no records container")]
    MissingRecords,

    #[error("No expiry on or after today in payload")]
    NoValidExpiry,

    /// A snapshot could not be persisted; nothing of it was written
    #[error("Store write failed: {0}")]
    StoreWrite(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Conditions that skip the current capture cycle and are retried on the next one.
    pub fn is_cycle_skip(&self) -> bool {
        matches!(
            self,
            AppError::Capture(_)
                | AppError::Http(_)
                | AppError::MissingRecords
                | AppError::NoValidExpiry
                | AppError::Serialization(_)
        )
    }
}

/// Serializable error response for the dashboard API
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let code = match err {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Http(_) => "HTTP_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Capture(_) => "CAPTURE_FAILURE",
            AppError::MissingRecords => "MISSING_RECORDS",
            AppError::NoValidExpiry => "NO_VALID_EXPIRY",
            AppError::StoreWrite(_) => "STORE_WRITE_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        ErrorResponse::from(&err)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
