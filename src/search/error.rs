//! Error types for index store operations

use crate::error::AppError;

/// Result type for index store operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur while talking to the index store
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// No response was received (connect failure, timeout)
    #[error("Index store unreachable: {0}")]
    Transport(String),

    /// The index store answered with a non-success status
    #[error("Index store returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Index creation lost a race against another creator
    #[error("Index already exists: {0}")]
    IndexAlreadyExists(String),

    /// The response body could not be interpreted
    #[error("Invalid index store response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SearchError {
    /// HTTP status returned by the index store, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::InvalidResponse(err.to_string())
        } else {
            SearchError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::InvalidResponse(err.to_string())
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            SearchError::Http { status, body } => AppError::IndexStore {
                status: Some(status),
                message: body,
            },
            other => AppError::IndexStore {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_http_error_keeps_upstream_status_and_body() {
        let err: AppError = SearchError::Http {
            status: 404,
            body: r#"{"error":{"type":"index_not_found_exception"}}"#.to_string(),
        }
        .into();

        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        let message = err.to_string();
        assert!(message.contains("HTTP 404"));
        assert!(message.contains("index_not_found_exception"));
    }

    #[test]
    fn test_transport_error_has_no_status() {
        let err = SearchError::Transport("connection refused".to_string());
        assert_eq!(err.status(), None);

        let app: AppError = err.into();
        assert_eq!(app.status_code(), StatusCode::BAD_GATEWAY);
    }
}
