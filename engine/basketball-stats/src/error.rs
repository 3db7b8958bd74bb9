//! Error types for the basketball statistics engine

use thiserror::Error;

/// Result type for statistics operations
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors from the event store boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("event store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Errors that can occur while computing or serving statistics
#[derive(Error, Debug)]
pub enum StatsError {
    /// The event store was unreachable before any events were read.
    #[error("event source error: {0}")]
    Source(#[from] StoreError),

    /// A chunk failed mid-stream. The aggregation is aborted rather than
    /// returning zero-filled partial stats, which would poison the cache
    /// for the full TTL.
    #[error("aggregation incomplete after {events_processed} events: {source}")]
    IncompleteAggregation {
        events_processed: u64,
        #[source]
        source: StoreError,
    },

    /// The caller cancelled the aggregation; nothing was cached.
    #[error("aggregation cancelled after {events_processed} events")]
    Cancelled { events_processed: u64 },

    #[error("aggregation timed out after {0} seconds")]
    Timeout(u64),

    /// Contradictory or unusable filter; returned before touching the store.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("cache key error: {0}")]
    Key(#[from] cache_core::CacheError),
}
