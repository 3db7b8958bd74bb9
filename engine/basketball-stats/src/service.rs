//! Cached statistics facade.
//!
//! Ties the aggregator to the read-through cache: every public accessor
//! builds its canonical key, picks a TTL from the game's status (live games
//! cache briefly, finished games for an hour, seasons for a day), and
//! delegates the compute to the aggregator under single-flight. Season
//! aggregations additionally run under a wall-clock timeout since they can
//! walk arbitrarily long schedules.

use crate::aggregator::StatsAggregator;
use crate::config::StatsConfig;
use crate::error::{Result, StatsError, StoreError};
use crate::keys::StatKeys;
use crate::store::ActionStore;
use crate::types::{
    Game, GameAction, Player, PlayerSeasonStats, PlayerStatLine, ShotChart, Team, TeamGameStats,
    TeamSeasonStats,
};
use cache_core::{CacheStore, ReadThroughCache};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Read-through cached statistics over an action store `A` and cache store `C`.
pub struct StatisticsService<A, C> {
    aggregator: StatsAggregator<A>,
    cache: ReadThroughCache<C>,
    keys: StatKeys,
}

impl<A: ActionStore, C: CacheStore> StatisticsService<A, C> {
    pub fn new(action_store: Arc<A>, cache_store: Arc<C>, config: StatsConfig) -> Self {
        Self {
            aggregator: StatsAggregator::new(action_store, config),
            cache: ReadThroughCache::new(cache_store),
            keys: StatKeys::new(),
        }
    }

    fn config(&self) -> &StatsConfig {
        self.aggregator.config()
    }

    async fn game(&self, game_id: u64) -> Result<Game> {
        self.aggregator
            .store()
            .game(game_id)
            .await
            .map_err(StatsError::Source)?
            .ok_or_else(|| StatsError::Source(StoreError::Query(format!("game {game_id} not found"))))
    }

    fn game_ttl(&self, game: &Game) -> Duration {
        self.config().ttl.for_status(game.status.as_str())
    }

    async fn with_timeout<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        let secs = self.config().aggregation_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(secs), fut).await {
            Ok(result) => result,
            Err(_) => Err(StatsError::Timeout(secs)),
        }
    }

    /// A player's cached stat line for one game.
    pub async fn player_game_stats(
        &self,
        player_id: u64,
        game_id: u64,
        cancel: &CancellationToken,
    ) -> Result<PlayerStatLine> {
        let game = self.game(game_id).await?;
        let key = self.keys.player_game(player_id, game_id)?;
        self.cache
            .get_or_compute(&key, self.game_ttl(&game), || {
                self.aggregator.player_game_stats(player_id, game_id, cancel)
            })
            .await
    }

    /// A player's cached season totals and averages.
    pub async fn player_season_stats(
        &self,
        player_id: u64,
        season: &str,
        cancel: &CancellationToken,
    ) -> Result<PlayerSeasonStats> {
        let key = self.keys.player_season(player_id, season)?;
        self.cache
            .get_or_compute(&key, self.config().ttl.season(), || {
                self.with_timeout(self.aggregator.player_season_stats(player_id, season, cancel))
            })
            .await
    }

    /// A team's cached stat line for one game.
    pub async fn team_game_stats(
        &self,
        team_id: u64,
        game_id: u64,
        cancel: &CancellationToken,
    ) -> Result<TeamGameStats> {
        let game = self.game(game_id).await?;
        let key = self.keys.team_game(team_id, game_id)?;
        self.cache
            .get_or_compute(&key, self.game_ttl(&game), || {
                self.aggregator.team_game_stats(team_id, game_id, cancel)
            })
            .await
    }

    /// A team's cached season aggregate.
    pub async fn team_season_stats(
        &self,
        team_id: u64,
        season: &str,
        cancel: &CancellationToken,
    ) -> Result<TeamSeasonStats> {
        let key = self.keys.team_season(team_id, season)?;
        self.cache
            .get_or_compute(&key, self.config().ttl.season(), || {
                self.with_timeout(self.aggregator.team_season_stats(team_id, season, cancel))
            })
            .await
    }

    /// A player's cached shot chart for one game.
    pub async fn shot_chart(
        &self,
        player_id: u64,
        game_id: u64,
        cancel: &CancellationToken,
    ) -> Result<ShotChart> {
        let game = self.game(game_id).await?;
        let key = self.keys.shot_chart(player_id, game_id)?;
        self.cache
            .get_or_compute(&key, self.game_ttl(&game), || {
                self.aggregator.shot_chart(player_id, game_id, cancel)
            })
            .await
    }

    /// A player's line for one game alongside their team's line for it.
    pub async fn player_game_context(
        &self,
        player: &Player,
        game_id: u64,
        cancel: &CancellationToken,
    ) -> Result<(PlayerStatLine, TeamGameStats)> {
        let line = self.player_game_stats(player.id, game_id, cancel).await?;
        let team = self.team_game_stats(player.team_id, game_id, cancel).await?;
        Ok((line, team))
    }

    /// A team's aggregate for the season it is registered in.
    pub async fn team_season_stats_for(
        &self,
        team: &Team,
        cancel: &CancellationToken,
    ) -> Result<TeamSeasonStats> {
        self.team_season_stats(team.id, &team.season, cancel).await
    }

    /// Invalidate every cache entry a newly recorded action dirties.
    pub async fn invalidate_for_action(&self, action: &GameAction) -> Result<()> {
        let game = self.game(action.game_id).await?;
        for key in self.keys.keys_for_action(action, &game.season)? {
            self.cache.invalidate(&key).await;
        }
        Ok(())
    }

    /// Invalidate one player's entries touching a game: their line for the
    /// game, their season line, and their shot chart.
    pub async fn invalidate_player(&self, player_id: u64, game_id: u64) -> Result<()> {
        let game = self.game(game_id).await?;
        self.cache.invalidate(&self.keys.player_game(player_id, game_id)?).await;
        self.cache.invalidate(&self.keys.player_season(player_id, &game.season)?).await;
        self.cache.invalidate(&self.keys.shot_chart(player_id, game_id)?).await;
        Ok(())
    }

    /// Invalidate one team's game and season entries.
    pub async fn invalidate_team(&self, team_id: u64, game_id: u64) -> Result<()> {
        let game = self.game(game_id).await?;
        self.cache.invalidate(&self.keys.team_game(team_id, game_id)?).await;
        self.cache.invalidate(&self.keys.team_season(team_id, &game.season)?).await;
        Ok(())
    }

    /// Invalidate every participant's entries for a game, plus both teams'
    /// game and season entries. Used when a game is corrected wholesale
    /// rather than appended to.
    pub async fn invalidate_game(&self, game_id: u64) -> Result<()> {
        let game = self.game(game_id).await?;
        let participants = self
            .aggregator
            .store()
            .game_participants(game_id)
            .await
            .map_err(StatsError::Source)?;

        for participant in &participants {
            self.cache.invalidate(&self.keys.player_game(participant.player_id, game_id)?).await;
            self.cache
                .invalidate(&self.keys.player_season(participant.player_id, &game.season)?)
                .await;
            self.cache.invalidate(&self.keys.shot_chart(participant.player_id, game_id)?).await;
        }
        for team_id in [game.home_team_id, game.away_team_id] {
            self.cache.invalidate(&self.keys.team_game(team_id, game_id)?).await;
            self.cache.invalidate(&self.keys.team_season(team_id, &game.season)?).await;
        }
        Ok(())
    }
}
