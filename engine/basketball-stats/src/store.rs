//! Event store boundary.
//!
//! All action queries are keyset-paginated by ascending action id. Offset
//! pagination is deliberately absent from the trait: actions are appended
//! while aggregations run, and an id cursor keeps a multi-chunk scan stable
//! where an offset would skip or double-count rows.

use crate::error::StoreError;
use crate::types::{Game, GameAction};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Which actions of a game to stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionScope {
    /// Every action recorded in the game.
    All,
    /// Actions attributed to one player.
    Player(u64),
    /// Actions attributed to one team.
    Team(u64),
}

impl ActionScope {
    fn matches(&self, action: &GameAction) -> bool {
        match self {
            ActionScope::All => true,
            ActionScope::Player(player_id) => action.player_id == *player_id,
            ActionScope::Team(team_id) => action.team_id == *team_id,
        }
    }
}

/// One page of actions. `next_cursor` is the id of the last action when the
/// page is full, `None` once the scan is exhausted.
#[derive(Debug, Clone)]
pub struct GameActionPage {
    pub actions: Vec<GameAction>,
    pub next_cursor: Option<u64>,
}

/// One page of games, cursor semantics as for [`GameActionPage`].
#[derive(Debug, Clone)]
pub struct GamePage {
    pub games: Vec<Game>,
    pub next_cursor: Option<u64>,
}

/// A player who recorded at least one action in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameParticipant {
    pub player_id: u64,
    pub team_id: u64,
}

/// Read-only access to games and their action logs.
#[async_trait]
pub trait ActionStore: Send + Sync {
    /// Game metadata, `None` when the game does not exist.
    async fn game(&self, game_id: u64) -> Result<Option<Game>, StoreError>;

    /// Actions of one game within `scope`, id-ascending, after `after_id`.
    async fn game_actions(
        &self,
        game_id: u64,
        scope: ActionScope,
        after_id: Option<u64>,
        limit: usize,
    ) -> Result<GameActionPage, StoreError>;

    /// A player's actions across the finished games of a season.
    async fn season_actions(
        &self,
        player_id: u64,
        season: &str,
        after_id: Option<u64>,
        limit: usize,
    ) -> Result<GameActionPage, StoreError>;

    /// A team's finished games in a season, id-ascending.
    async fn season_games(
        &self,
        team_id: u64,
        season: &str,
        after_id: Option<u64>,
        limit: usize,
    ) -> Result<GamePage, StoreError>;

    /// A team's actions restricted to an explicit set of games.
    async fn actions_for_games(
        &self,
        game_ids: &[u64],
        team_id: u64,
        after_id: Option<u64>,
        limit: usize,
    ) -> Result<GameActionPage, StoreError>;

    /// Distinct players that acted in a game, for cascading invalidation.
    async fn game_participants(&self, game_id: u64) -> Result<Vec<GameParticipant>, StoreError>;
}

#[derive(Default)]
struct InMemoryState {
    games: HashMap<u64, Game>,
    /// Kept sorted by id; inserts append monotonically in practice.
    actions: Vec<GameAction>,
}

/// In-memory [`ActionStore`] for tests and local development.
#[derive(Default)]
pub struct InMemoryActionStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryActionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_game(&self, game: Game) {
        self.state.write().await.games.insert(game.id, game);
    }

    pub async fn insert_action(&self, action: GameAction) {
        let mut state = self.state.write().await;
        state.actions.push(action);
        state.actions.sort_by_key(|a| a.id);
    }

    pub async fn insert_actions(&self, actions: impl IntoIterator<Item = GameAction>) {
        let mut state = self.state.write().await;
        state.actions.extend(actions);
        state.actions.sort_by_key(|a| a.id);
    }
}

fn page_of(matching: impl Iterator<Item = GameAction>, limit: usize) -> GameActionPage {
    let actions: Vec<GameAction> = matching.take(limit).collect();
    let next_cursor =
        if actions.len() == limit { actions.last().map(|a| a.id) } else { None };
    GameActionPage { actions, next_cursor }
}

#[async_trait]
impl ActionStore for InMemoryActionStore {
    async fn game(&self, game_id: u64) -> Result<Option<Game>, StoreError> {
        Ok(self.state.read().await.games.get(&game_id).cloned())
    }

    async fn game_actions(
        &self,
        game_id: u64,
        scope: ActionScope,
        after_id: Option<u64>,
        limit: usize,
    ) -> Result<GameActionPage, StoreError> {
        let state = self.state.read().await;
        let after = after_id.unwrap_or(0);
        Ok(page_of(
            state
                .actions
                .iter()
                .filter(|a| a.game_id == game_id && a.id > after && scope.matches(a))
                .cloned(),
            limit,
        ))
    }

    async fn season_actions(
        &self,
        player_id: u64,
        season: &str,
        after_id: Option<u64>,
        limit: usize,
    ) -> Result<GameActionPage, StoreError> {
        let state = self.state.read().await;
        let after = after_id.unwrap_or(0);
        Ok(page_of(
            state
                .actions
                .iter()
                .filter(|a| {
                    a.player_id == player_id
                        && a.id > after
                        && state
                            .games
                            .get(&a.game_id)
                            .is_some_and(|g| g.season == season && g.status.is_finished())
                })
                .cloned(),
            limit,
        ))
    }

    async fn season_games(
        &self,
        team_id: u64,
        season: &str,
        after_id: Option<u64>,
        limit: usize,
    ) -> Result<GamePage, StoreError> {
        let state = self.state.read().await;
        let after = after_id.unwrap_or(0);
        let mut games: Vec<Game> = state
            .games
            .values()
            .filter(|g| {
                g.season == season
                    && g.status.is_finished()
                    && g.id > after
                    && (g.home_team_id == team_id || g.away_team_id == team_id)
            })
            .cloned()
            .collect();
        games.sort_by_key(|g| g.id);
        games.truncate(limit);
        let next_cursor = if games.len() == limit { games.last().map(|g| g.id) } else { None };
        Ok(GamePage { games, next_cursor })
    }

    async fn actions_for_games(
        &self,
        game_ids: &[u64],
        team_id: u64,
        after_id: Option<u64>,
        limit: usize,
    ) -> Result<GameActionPage, StoreError> {
        let state = self.state.read().await;
        let after = after_id.unwrap_or(0);
        Ok(page_of(
            state
                .actions
                .iter()
                .filter(|a| {
                    a.team_id == team_id && a.id > after && game_ids.contains(&a.game_id)
                })
                .cloned(),
            limit,
        ))
    }

    async fn game_participants(&self, game_id: u64) -> Result<Vec<GameParticipant>, StoreError> {
        let state = self.state.read().await;
        let mut participants: Vec<GameParticipant> = Vec::new();
        for action in state.actions.iter().filter(|a| a.game_id == game_id) {
            let participant =
                GameParticipant { player_id: action.player_id, team_id: action.team_id };
            if !participants.contains(&participant) {
                participants.push(participant);
            }
        }
        Ok(participants)
    }
}
