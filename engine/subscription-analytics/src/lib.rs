//! Subscription billing analytics - chunked scans over clubs and billing
//! events, served through the same read-through cache discipline as the
//! statistics engine.
//!
//! Three figures are computed: monthly recurring revenue (MRR), monthly
//! customer and revenue churn, and customer lifetime value (LTV). All of
//! them fold cursor-paged store scans under constant memory and cache their
//! results with explicit event-driven invalidation.

pub mod churn;
mod config;
mod error;
pub mod keys;
pub mod ltv;
pub mod mrr;
mod scan;
mod service;
mod store;
mod types;

pub use config::AnalyticsConfig;
pub use error::{AnalyticsError, Result, StoreError};
pub use service::AnalyticsService;
pub use store::{BillingStore, ClubPage, EventFilter, EventPage, InMemoryBillingStore};
pub use types::{
    BillingInterval, ChurnReport, Club, ClubSubscriptionEvent, LifetimeStats, Month, MrrSnapshot,
    PlanPricing, SubscriptionEventType, SubscriptionStatus,
};

/// Re-export commonly used cache types
pub use cache_core::{CacheStore, InMemoryCacheStore};
pub use tokio_util::sync::CancellationToken;
