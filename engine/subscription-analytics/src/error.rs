//! Error types for the subscription analytics engine

use thiserror::Error;

/// Result type for analytics operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors from the billing store boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("billing store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Errors that can occur while computing or serving billing analytics
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// The billing store was unreachable before any records were read.
    #[error("billing source error: {0}")]
    Source(#[from] StoreError),

    /// A chunk failed mid-stream. The computation is aborted rather than
    /// caching a figure derived from a partial scan.
    #[error("aggregation incomplete after {records_processed} records: {source}")]
    IncompleteAggregation {
        records_processed: u64,
        #[source]
        source: StoreError,
    },

    /// The caller cancelled the computation; nothing was cached.
    #[error("aggregation cancelled after {records_processed} records")]
    Cancelled { records_processed: u64 },

    #[error("aggregation timed out after {0} seconds")]
    Timeout(u64),

    /// Contradictory or unusable filter; returned before touching the store.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("cache key error: {0}")]
    Key(#[from] cache_core::CacheError),
}
