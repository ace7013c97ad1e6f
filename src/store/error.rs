//! Error types for relational store operations

use crate::error::AppError;

/// Result type for relational store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by an [`ArticleStore`](super::ArticleStore)
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Could not open or acquire a connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A statement failed to execute
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A row could not be mapped to an article
    #[error("Row decoding failed: {0}")]
    DecodeFailed(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::ConnectionFailed(err.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
                StoreError::DecodeFailed(err.to_string())
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Database(err.to_string())
    }
}
