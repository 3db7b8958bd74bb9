//! Basketball statistics engine - chunked aggregation over game-action logs
//!
//! Streams immutable game actions from a cursor-paged event store, folds them
//! into stat-line accumulators under constant memory, derives shooting
//! percentages and advanced metrics, and serves results through a
//! read-through cache with explicit, cascading invalidation.

mod aggregator;
mod config;
mod error;
pub mod keys;
pub mod metrics;
mod service;
mod store;
mod types;

pub use aggregator::StatsAggregator;
pub use config::StatsConfig;
pub use error::{Result, StatsError, StoreError};
pub use service::StatisticsService;
pub use store::{
    ActionScope, ActionStore, GameActionPage, GamePage, GameParticipant, InMemoryActionStore,
};
pub use types::{
    Game, GameAction, GameActionType, GameStatus, Player, PlayerSeasonStats, PlayerStatLine,
    ShotChart, ShotZoneLine, Team, TeamGameStats, TeamSeasonStats, TeamStatLine,
};

/// Re-export commonly used cache types
pub use cache_core::{CacheStore, InMemoryCacheStore, TtlPolicy};
pub use tokio_util::sync::CancellationToken;
