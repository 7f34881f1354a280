//! Error types for talking to the catalog collaborator.

use thiserror::Error;

/// Errors that can occur while loading rooms and subjects.
#[derive(Debug, Error, Clone)]
pub enum CatalogError {
    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// Catalog answered with a non-success status
    #[error("Catalog returned {status} for {endpoint}")]
    UnexpectedStatus { endpoint: String, status: u16 },

    /// Body could not be decoded into the expected shape
    #[error("Failed to decode {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// URL parsing/construction failed
    #[error("URL error: {message}")]
    UrlError { message: String },

    /// Circuit breaker is open due to repeated failures
    #[error("Circuit breaker open - too many recent catalog failures")]
    CircuitBreakerOpen,
}

impl CatalogError {
    /// Returns true if this error is potentially transient and retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogError::Network { .. } => true,
            CatalogError::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for CatalogError {
    fn from(err: url::ParseError) -> Self {
        CatalogError::UrlError {
            message: err.to_string(),
        }
    }
}
