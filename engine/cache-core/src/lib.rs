//! Read-through caching core shared by the statistics and analytics engines.
//!
//! Provides deterministic cache-key construction from named templates, a
//! status-driven TTL policy, a minimal cache-store trait (no wildcard
//! deletes assumed), and a read-through orchestrator with per-key
//! single-flight and generation-stamped invalidation.

mod error;
mod keys;
mod read_through;
mod store;
mod ttl;

pub use error::{CacheError, Result};
pub use keys::KeyBuilder;
pub use read_through::ReadThroughCache;
pub use store::{CacheStore, InMemoryCacheStore};
pub use ttl::TtlPolicy;
