//! Error types for the caching layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for cache accessors, backends and durable stores.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No record matched the lookup criteria
    #[error("Not found: {0}")]
    NotFound(String),

    /// Lookup criteria matched more than one record
    #[error("Multiple records found: {0}")]
    MultipleFound(String),

    /// Key or value rejected by the cache backend
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Cache backend or durable store failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// Cached value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns true for the "no matching record" case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::MultipleFound(_) => StatusCode::CONFLICT,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Backend(_) | CacheError::Serialization(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching layer.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        let response = CacheError::NotFound("record pk=1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_multiple_found_status() {
        let response = CacheError::MultipleFound("slug=a".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_backend_error_status() {
        let response = CacheError::Backend("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_is_not_found() {
        assert!(CacheError::NotFound("x".to_string()).is_not_found());
        assert!(!CacheError::Internal("x".to_string()).is_not_found());
    }
}
