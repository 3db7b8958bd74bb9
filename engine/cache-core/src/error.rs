//! Error types for the caching core

use thiserror::Error;

/// Result type for caching operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors that can occur in the caching core
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("unknown cache key pattern: {0}")]
    UnknownPattern(String),

    #[error("missing parameter `{param}` for cache key pattern `{pattern}`")]
    MissingParam { pattern: String, param: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
