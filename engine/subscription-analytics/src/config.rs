//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for billing scans and caching. Churn reports cover closed months
/// and cache longest; MRR moves with every webhook and caches shortest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Records fetched per store round-trip.
    pub chunk_size: usize,
    pub mrr_ttl_secs: u64,
    pub churn_ttl_secs: u64,
    pub ltv_ttl_secs: u64,
    /// Upper bound for a full tenant scan.
    pub aggregation_timeout_secs: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            mrr_ttl_secs: 3600,
            churn_ttl_secs: 86400,
            ltv_ttl_secs: 21600,
            aggregation_timeout_secs: 30,
        }
    }
}

impl AnalyticsConfig {
    pub fn mrr_ttl(&self) -> Duration {
        Duration::from_secs(self.mrr_ttl_secs)
    }

    pub fn churn_ttl(&self) -> Duration {
        Duration::from_secs(self.churn_ttl_secs)
    }

    pub fn ltv_ttl(&self) -> Duration {
        Duration::from_secs(self.ltv_ttl_secs)
    }
}
