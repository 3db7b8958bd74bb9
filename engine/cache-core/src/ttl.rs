//! Status-driven TTL selection.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// TTL policy for cached aggregates.
///
/// A pure function of entity status: live entities get a short TTL, finished
/// ones a longer TTL, and season/lifetime aggregates a flat 24 hours
/// regardless of any individual entity's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlPolicy {
    /// TTL for live/in-progress entities (seconds)
    pub live_secs: u64,
    /// TTL for finished/completed entities (seconds)
    pub finished_secs: u64,
    /// TTL for any other status (seconds)
    pub default_secs: u64,
    /// Flat TTL for season and lifetime aggregates (seconds)
    pub season_secs: u64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            live_secs: 300,
            finished_secs: 3600,
            default_secs: 3600,
            season_secs: 86_400,
        }
    }
}

impl TtlPolicy {
    /// Select the TTL for an entity-scoped cache entry by entity status.
    pub fn for_status(&self, status: &str) -> Duration {
        let secs = match status {
            "live" | "in_progress" | "active" => self.live_secs,
            "finished" | "completed" | "final" => self.finished_secs,
            _ => self.default_secs,
        };
        Duration::from_secs(secs)
    }

    /// TTL for season/lifetime aggregates, independent of status.
    pub fn season(&self) -> Duration {
        Duration::from_secs(self.season_secs)
    }
}
