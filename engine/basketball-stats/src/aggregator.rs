//! Chunked aggregation over cursor-paged action streams.
//!
//! Every aggregation walks the store one page at a time and folds each page
//! into an accumulator before fetching the next, so memory stays bounded by
//! the chunk size no matter how long the game or season ran. Results are
//! invariant under chunk size: folding is associative and the attempted-
//! counter patch happens once, in `finalize`, after the last page.

use crate::config::StatsConfig;
use crate::error::{Result, StatsError, StoreError};
use crate::store::{ActionScope, ActionStore};
use crate::types::{
    PlayerSeasonStats, PlayerStatLine, ShotChart, TeamGameStats, TeamSeasonStats, TeamStatLine,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Streams action pages and folds them into stat lines.
pub struct StatsAggregator<S> {
    store: Arc<S>,
    config: StatsConfig,
}

/// Store failures before the first page mean the source is down and nothing
/// was read; failures after that abort a partially-consumed stream. The two
/// are reported differently because only the former is safe to retry blindly.
fn page_error(pages_read: u64, events_processed: u64, source: StoreError) -> StatsError {
    if pages_read == 0 {
        StatsError::Source(source)
    } else {
        StatsError::IncompleteAggregation { events_processed, source }
    }
}

fn check_season_filter(season: &str) -> Result<()> {
    if season.trim().is_empty() {
        return Err(StatsError::InvalidFilter("season must not be empty".into()));
    }
    Ok(())
}

impl<S: ActionStore> StatsAggregator<S> {
    pub fn new(store: Arc<S>, config: StatsConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    /// One player's stat line for one game.
    pub async fn player_game_stats(
        &self,
        player_id: u64,
        game_id: u64,
        cancel: &CancellationToken,
    ) -> Result<PlayerStatLine> {
        let mut line = PlayerStatLine::default();
        let mut cursor = None;
        let mut pages = 0u64;
        let mut events = 0u64;

        loop {
            if cancel.is_cancelled() {
                return Err(StatsError::Cancelled { events_processed: events });
            }
            let page = self
                .store
                .game_actions(game_id, ActionScope::Player(player_id), cursor, self.config.chunk_size)
                .await
                .map_err(|e| page_error(pages, events, e))?;
            pages += 1;
            events += page.actions.len() as u64;
            for action in &page.actions {
                line.apply(action.action_type);
            }
            match page.next_cursor {
                Some(c) => cursor = Some(c),
                None => break,
            }
        }

        line.finalize();
        tracing::debug!(player_id, game_id, events, "player game aggregation complete");
        Ok(line)
    }

    /// One player's season totals and per-game averages over finished games.
    pub async fn player_season_stats(
        &self,
        player_id: u64,
        season: &str,
        cancel: &CancellationToken,
    ) -> Result<PlayerSeasonStats> {
        check_season_filter(season)?;

        let mut stats = PlayerSeasonStats::default();
        // Distinct games, not actions, drive the averages. Bounded by the
        // length of a season schedule, not the stream.
        let mut games_seen: HashSet<u64> = HashSet::new();
        let mut cursor = None;
        let mut pages = 0u64;
        let mut events = 0u64;

        loop {
            if cancel.is_cancelled() {
                return Err(StatsError::Cancelled { events_processed: events });
            }
            let page = self
                .store
                .season_actions(player_id, season, cursor, self.config.chunk_size)
                .await
                .map_err(|e| page_error(pages, events, e))?;
            pages += 1;
            events += page.actions.len() as u64;
            for action in &page.actions {
                stats.totals.apply(action.action_type);
                games_seen.insert(action.game_id);
            }
            match page.next_cursor {
                Some(c) => cursor = Some(c),
                None => break,
            }
        }

        stats.games_played = games_seen.len() as u32;
        stats.totals.finalize();
        stats.finalize();
        tracing::debug!(player_id, season, events, "player season aggregation complete");
        Ok(stats)
    }

    /// One team's stat line for one game, with result context from the score.
    pub async fn team_game_stats(
        &self,
        team_id: u64,
        game_id: u64,
        cancel: &CancellationToken,
    ) -> Result<TeamGameStats> {
        let game = self
            .store
            .game(game_id)
            .await
            .map_err(StatsError::Source)?
            .ok_or_else(|| StatsError::Source(StoreError::Query(format!("game {game_id} not found"))))?;

        let mut line = TeamStatLine::default();
        let mut cursor = None;
        let mut pages = 0u64;
        let mut events = 0u64;

        loop {
            if cancel.is_cancelled() {
                return Err(StatsError::Cancelled { events_processed: events });
            }
            let page = self
                .store
                .game_actions(game_id, ActionScope::Team(team_id), cursor, self.config.chunk_size)
                .await
                .map_err(|e| page_error(pages, events, e))?;
            pages += 1;
            events += page.actions.len() as u64;
            for action in &page.actions {
                line.apply(action.action_type);
            }
            match page.next_cursor {
                Some(c) => cursor = Some(c),
                None => break,
            }
        }

        line.finalize();
        let (final_score, opponent_score) = game.score_for(team_id);
        tracing::debug!(team_id, game_id, events, "team game aggregation complete");
        Ok(TeamGameStats {
            line,
            opponent_team_id: game.opponent_of(team_id),
            final_score,
            opponent_score,
            is_win: final_score > opponent_score,
            margin: i64::from(final_score) - i64::from(opponent_score),
        })
    }

    /// One team's season aggregate. The schedule is walked in game chunks;
    /// each chunk's actions are then streamed and folded before the next
    /// chunk of games is fetched.
    pub async fn team_season_stats(
        &self,
        team_id: u64,
        season: &str,
        cancel: &CancellationToken,
    ) -> Result<TeamSeasonStats> {
        check_season_filter(season)?;

        let mut stats = TeamSeasonStats::default();
        let mut game_cursor = None;
        let mut pages = 0u64;
        let mut events = 0u64;

        loop {
            if cancel.is_cancelled() {
                return Err(StatsError::Cancelled { events_processed: events });
            }
            let game_page = self
                .store
                .season_games(team_id, season, game_cursor, self.config.game_chunk_size)
                .await
                .map_err(|e| page_error(pages, events, e))?;
            pages += 1;

            let game_ids: Vec<u64> = game_page.games.iter().map(|g| g.id).collect();
            for game in &game_page.games {
                let (for_points, against_points) = game.score_for(team_id);
                stats.games_played += 1;
                stats.points_for += for_points;
                stats.points_against += against_points;
                if for_points > against_points {
                    stats.wins += 1;
                } else {
                    stats.losses += 1;
                }
            }

            let mut action_cursor = None;
            loop {
                if cancel.is_cancelled() {
                    return Err(StatsError::Cancelled { events_processed: events });
                }
                if game_ids.is_empty() {
                    break;
                }
                let page = self
                    .store
                    .actions_for_games(&game_ids, team_id, action_cursor, self.config.chunk_size)
                    .await
                    .map_err(|e| page_error(pages, events, e))?;
                pages += 1;
                events += page.actions.len() as u64;
                for action in &page.actions {
                    stats.totals.apply(action.action_type);
                }
                match page.next_cursor {
                    Some(c) => action_cursor = Some(c),
                    None => break,
                }
            }

            match game_page.next_cursor {
                Some(c) => game_cursor = Some(c),
                None => break,
            }
        }

        stats.finalize();
        tracing::debug!(team_id, season, events, "team season aggregation complete");
        Ok(stats)
    }

    /// Zoned shot chart for one player in one game.
    pub async fn shot_chart(
        &self,
        player_id: u64,
        game_id: u64,
        cancel: &CancellationToken,
    ) -> Result<ShotChart> {
        let mut chart = ShotChart::default();
        let mut cursor = None;
        let mut pages = 0u64;
        let mut events = 0u64;

        loop {
            if cancel.is_cancelled() {
                return Err(StatsError::Cancelled { events_processed: events });
            }
            let page = self
                .store
                .game_actions(game_id, ActionScope::Player(player_id), cursor, self.config.chunk_size)
                .await
                .map_err(|e| page_error(pages, events, e))?;
            pages += 1;
            events += page.actions.len() as u64;
            for action in &page.actions {
                chart.apply(action);
            }
            match page.next_cursor {
                Some(c) => cursor = Some(c),
                None => break,
            }
        }

        chart.finalize();
        tracing::debug!(player_id, game_id, events, "shot chart aggregation complete");
        Ok(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryActionStore;
    use crate::types::{Game, GameAction, GameActionType, GameStatus};
    use chrono::Utc;

    fn game(id: u64, status: GameStatus) -> Game {
        Game {
            id,
            season: "2025-26".to_string(),
            status,
            home_team_id: 10,
            away_team_id: 20,
            home_score: 102,
            away_score: 95,
        }
    }

    fn action(id: u64, game_id: u64, player_id: u64, action_type: GameActionType) -> GameAction {
        GameAction {
            id,
            game_id,
            player_id,
            team_id: 10,
            action_type,
            period: 1,
            shot_x: None,
            shot_y: None,
            recorded_at: Utc::now(),
        }
    }

    async fn seeded_store() -> Arc<InMemoryActionStore> {
        let store = Arc::new(InMemoryActionStore::new());
        store.insert_game(game(1, GameStatus::Finished)).await;
        store
            .insert_actions(vec![
                action(1, 1, 7, GameActionType::FieldGoalMade),
                action(2, 1, 7, GameActionType::FieldGoalMade),
                action(3, 1, 7, GameActionType::FieldGoalMade),
                action(4, 1, 7, GameActionType::FieldGoalMissed),
                action(5, 1, 7, GameActionType::FieldGoalMissed),
                action(6, 1, 7, GameActionType::Assist),
            ])
            .await;
        store
    }

    fn aggregator_with_chunk(
        store: Arc<InMemoryActionStore>,
        chunk_size: usize,
    ) -> StatsAggregator<InMemoryActionStore> {
        let config = StatsConfig { chunk_size, ..StatsConfig::default() };
        StatsAggregator::new(store, config)
    }

    #[tokio::test]
    async fn test_player_game_fold() {
        let store = seeded_store().await;
        let aggregator = aggregator_with_chunk(store, 500);
        let cancel = CancellationToken::new();

        let line = aggregator.player_game_stats(7, 1, &cancel).await.unwrap();
        assert_eq!(line.field_goals_made, 3);
        assert_eq!(line.field_goals_attempted, 5);
        assert_eq!(line.total_points, 6);
        assert_eq!(line.field_goal_percentage, 60.0);
        assert_eq!(line.assists, 1);
    }

    #[tokio::test]
    async fn test_chunk_size_does_not_change_results() {
        let kinds = [
            GameActionType::FieldGoalMade,
            GameActionType::FieldGoalMissed,
            GameActionType::ThreePointMade,
            GameActionType::ThreePointMissed,
            GameActionType::FreeThrowMade,
            GameActionType::FreeThrowMissed,
            GameActionType::ReboundOffensive,
            GameActionType::ReboundDefensive,
            GameActionType::Assist,
            GameActionType::Steal,
            GameActionType::Block,
            GameActionType::Turnover,
            GameActionType::FoulPersonal,
            GameActionType::FoulTechnical,
        ];
        let store = Arc::new(InMemoryActionStore::new());
        store.insert_game(game(1, GameStatus::Finished)).await;
        store
            .insert_actions(
                (1..=120u64).map(|id| action(id, 1, 7, kinds[(id as usize - 1) % kinds.len()])),
            )
            .await;
        let cancel = CancellationToken::new();

        let baseline = aggregator_with_chunk(store.clone(), 500)
            .player_game_stats(7, 1, &cancel)
            .await
            .unwrap();
        assert_eq!(baseline.total_points, 9 * 6);

        for chunk_size in [1, 3, 50, 120, 5000] {
            let line = aggregator_with_chunk(store.clone(), chunk_size)
                .player_game_stats(7, 1, &cancel)
                .await
                .unwrap();
            assert_eq!(line, baseline, "chunk size {chunk_size} diverged");
        }
    }

    #[tokio::test]
    async fn test_cancellation_stops_aggregation() {
        let store = seeded_store().await;
        let aggregator = aggregator_with_chunk(store, 500);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = aggregator.player_game_stats(7, 1, &cancel).await;
        assert!(matches!(result, Err(StatsError::Cancelled { events_processed: 0 })));
    }

    #[tokio::test]
    async fn test_empty_season_filter_rejected() {
        let store = seeded_store().await;
        let aggregator = aggregator_with_chunk(store, 500);
        let cancel = CancellationToken::new();

        let result = aggregator.player_season_stats(7, "  ", &cancel).await;
        assert!(matches!(result, Err(StatsError::InvalidFilter(_))));
    }

    #[tokio::test]
    async fn test_missing_game_is_a_source_error() {
        let store = seeded_store().await;
        let aggregator = aggregator_with_chunk(store, 500);
        let cancel = CancellationToken::new();

        let result = aggregator.team_game_stats(10, 999, &cancel).await;
        assert!(matches!(result, Err(StatsError::Source(_))));
    }

    #[tokio::test]
    async fn test_team_season_counts_results() {
        let store = Arc::new(InMemoryActionStore::new());
        store.insert_game(game(1, GameStatus::Finished)).await;
        store
            .insert_game(Game {
                id: 2,
                home_score: 90,
                away_score: 99,
                ..game(2, GameStatus::Finished)
            })
            .await;
        // Live game must not count toward the season.
        store.insert_game(game(3, GameStatus::Live)).await;
        store
            .insert_actions(vec![
                action(1, 1, 7, GameActionType::FieldGoalMade),
                action(2, 2, 7, GameActionType::Turnover),
            ])
            .await;

        let aggregator = aggregator_with_chunk(store, 500);
        let cancel = CancellationToken::new();
        let stats = aggregator.team_season_stats(10, "2025-26", &cancel).await.unwrap();

        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.points_for, 192);
        assert_eq!(stats.points_against, 194);
        assert_eq!(stats.totals.field_goals_attempted, 1);
        assert_eq!(stats.totals.turnovers, 1);
        assert_eq!(stats.avg_points_for, 96.0);
        assert_eq!(stats.win_percentage, 50.0);
    }
}
