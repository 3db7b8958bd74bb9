//! Cache key construction and the invalidation edge table.
//!
//! Key formats are part of the persisted contract: a deployed cache outlives
//! any single process, so patterns live here as named constants and every key
//! goes through [`StatKeys`]. Invalidation is a static edge table from one
//! recorded action to the exact keys it dirties; there are no wildcard or
//! prefix deletes.

use crate::types::GameAction;
use cache_core::{KeyBuilder, Result};

pub const PLAYER_GAME: &str = "player_game";
pub const PLAYER_SEASON: &str = "player_season";
pub const TEAM_GAME: &str = "team_game";
pub const TEAM_SEASON: &str = "team_season";
pub const SHOT_CHART: &str = "shot_chart";

const PATTERNS: &[(&str, &str)] = &[
    (PLAYER_GAME, "stats:player:{player_id}:game:{game_id}"),
    (PLAYER_SEASON, "stats:player:{player_id}:season:{season}"),
    (TEAM_GAME, "stats:team:{team_id}:game:{game_id}"),
    (TEAM_SEASON, "stats:team:{team_id}:season:{season}"),
    (SHOT_CHART, "stats:shot_chart:{player_id}:game:{game_id}"),
];

/// Typed key constructors over the statistics key namespace.
pub struct StatKeys {
    builder: KeyBuilder,
}

impl Default for StatKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl StatKeys {
    pub fn new() -> Self {
        Self { builder: KeyBuilder::new(PATTERNS) }
    }

    pub fn player_game(&self, player_id: u64, game_id: u64) -> Result<String> {
        self.builder.build(
            PLAYER_GAME,
            &[("player_id", player_id.to_string()), ("game_id", game_id.to_string())],
        )
    }

    pub fn player_season(&self, player_id: u64, season: &str) -> Result<String> {
        self.builder.build(
            PLAYER_SEASON,
            &[("player_id", player_id.to_string()), ("season", season.to_string())],
        )
    }

    pub fn team_game(&self, team_id: u64, game_id: u64) -> Result<String> {
        self.builder.build(
            TEAM_GAME,
            &[("team_id", team_id.to_string()), ("game_id", game_id.to_string())],
        )
    }

    pub fn team_season(&self, team_id: u64, season: &str) -> Result<String> {
        self.builder.build(
            TEAM_SEASON,
            &[("team_id", team_id.to_string()), ("season", season.to_string())],
        )
    }

    pub fn shot_chart(&self, player_id: u64, game_id: u64) -> Result<String> {
        self.builder.build(
            SHOT_CHART,
            &[("player_id", player_id.to_string()), ("game_id", game_id.to_string())],
        )
    }

    /// Every key a newly recorded action dirties: the acting player's game
    /// and season lines, the team's game and season lines, and the player's
    /// shot chart for the game.
    pub fn keys_for_action(&self, action: &GameAction, season: &str) -> Result<Vec<String>> {
        Ok(vec![
            self.player_game(action.player_id, action.game_id)?,
            self.player_season(action.player_id, season)?,
            self.team_game(action.team_id, action.game_id)?,
            self.team_season(action.team_id, season)?,
            self.shot_chart(action.player_id, action.game_id)?,
        ])
    }
}
