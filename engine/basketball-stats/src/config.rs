//! Engine configuration.

use cache_core::TtlPolicy;
use serde::{Deserialize, Serialize};

/// Tunables for aggregation and caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Actions fetched per store round-trip.
    pub chunk_size: usize,
    /// Games fetched per round-trip when walking a team's season schedule.
    pub game_chunk_size: usize,
    /// Upper bound for a full season aggregation.
    pub aggregation_timeout_secs: u64,
    /// TTLs keyed off game status.
    pub ttl: TtlPolicy,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            game_chunk_size: 50,
            aggregation_timeout_secs: 30,
            ttl: TtlPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StatsConfig::default();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.game_chunk_size, 50);
        assert_eq!(config.aggregation_timeout_secs, 30);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: StatsConfig = serde_json::from_str(r#"{"chunk_size": 100}"#).unwrap();
        assert_eq!(config.chunk_size, 100);
        assert_eq!(config.game_chunk_size, 50);
    }
}
