//! Domain types: game actions, entity metadata, and stat-line accumulators.
//!
//! Stat lines are mutable accumulators: created empty, folded once per event
//! during chunk streaming, then finalized. During streaming the `*_attempted`
//! counters hold only misses; `finalize` patches `attempted += made` and only
//! then derives percentages. That ordering is load-bearing - folding is
//! associative across chunk boundaries precisely because the patch happens
//! exactly once, at the end.

use crate::metrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed enum of recordable game action types.
///
/// Unknown/unmapped types deserialize to [`GameActionType::Unknown`] and fold
/// to nothing. This is intentional forward-compatibility with new action
/// types, not an error condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameActionType {
    FieldGoalMade,
    FieldGoalMissed,
    ThreePointMade,
    ThreePointMissed,
    FreeThrowMade,
    FreeThrowMissed,
    ReboundOffensive,
    ReboundDefensive,
    Assist,
    Steal,
    Block,
    Turnover,
    FoulPersonal,
    FoulTechnical,
    #[serde(other)]
    Unknown,
}

/// An immutable, timestamped game fact owned by one (game, player, team) triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameAction {
    pub id: u64,
    pub game_id: u64,
    pub player_id: u64,
    pub team_id: u64,
    pub action_type: GameActionType,
    pub period: u8,
    /// Court coordinates in meters, basket at the origin (shot actions only).
    pub shot_x: Option<f64>,
    pub shot_y: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

/// Game lifecycle status; drives the cache TTL policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Scheduled,
    Live,
    InProgress,
    Finished,
    Completed,
    Final,
    Cancelled,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Scheduled => "scheduled",
            GameStatus::Live => "live",
            GameStatus::InProgress => "in_progress",
            GameStatus::Finished => "finished",
            GameStatus::Completed => "completed",
            GameStatus::Final => "final",
            GameStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the game counts toward season aggregates.
    pub fn is_finished(&self) -> bool {
        matches!(self, GameStatus::Finished | GameStatus::Completed | GameStatus::Final)
    }
}

/// Read-only game metadata supplied by the surrounding application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: u64,
    pub season: String,
    pub status: GameStatus,
    pub home_team_id: u64,
    pub away_team_id: u64,
    pub home_score: u32,
    pub away_score: u32,
}

impl Game {
    pub fn is_home_team(&self, team_id: u64) -> bool {
        self.home_team_id == team_id
    }

    pub fn opponent_of(&self, team_id: u64) -> u64 {
        if self.is_home_team(team_id) {
            self.away_team_id
        } else {
            self.home_team_id
        }
    }

    pub fn score_for(&self, team_id: u64) -> (u32, u32) {
        if self.is_home_team(team_id) {
            (self.home_score, self.away_score)
        } else {
            (self.away_score, self.home_score)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: u64,
    pub team_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: u64,
    pub season: String,
}

/// Per-player stat line: counters folded during streaming plus derived
/// fields filled in by [`PlayerStatLine::finalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatLine {
    pub total_points: u32,
    pub field_goals_made: u32,
    pub field_goals_attempted: u32,
    pub three_points_made: u32,
    pub three_points_attempted: u32,
    pub free_throws_made: u32,
    pub free_throws_attempted: u32,
    pub rebounds_offensive: u32,
    pub rebounds_defensive: u32,
    pub total_rebounds: u32,
    pub assists: u32,
    pub steals: u32,
    pub blocks: u32,
    pub turnovers: u32,
    pub personal_fouls: u32,
    pub technical_fouls: u32,
    pub field_goal_percentage: f64,
    pub three_point_percentage: f64,
    pub free_throw_percentage: f64,
    pub true_shooting_percentage: f64,
    pub player_efficiency_rating: f64,
    pub game_score: f64,
}

impl PlayerStatLine {
    /// Fold one action into the accumulator. Scoring actions bump both the
    /// made-counter and the points total; misses bump only the attempted
    /// counter (patched at finalize time).
    pub fn apply(&mut self, action_type: GameActionType) {
        match action_type {
            GameActionType::FieldGoalMade => {
                self.field_goals_made += 1;
                self.total_points += 2;
            }
            GameActionType::FieldGoalMissed => self.field_goals_attempted += 1,
            GameActionType::ThreePointMade => {
                self.three_points_made += 1;
                self.total_points += 3;
            }
            GameActionType::ThreePointMissed => self.three_points_attempted += 1,
            GameActionType::FreeThrowMade => {
                self.free_throws_made += 1;
                self.total_points += 1;
            }
            GameActionType::FreeThrowMissed => self.free_throws_attempted += 1,
            GameActionType::ReboundOffensive => {
                self.rebounds_offensive += 1;
                self.total_rebounds += 1;
            }
            GameActionType::ReboundDefensive => {
                self.rebounds_defensive += 1;
                self.total_rebounds += 1;
            }
            GameActionType::Assist => self.assists += 1,
            GameActionType::Steal => self.steals += 1,
            GameActionType::Block => self.blocks += 1,
            GameActionType::Turnover => self.turnovers += 1,
            GameActionType::FoulPersonal => self.personal_fouls += 1,
            GameActionType::FoulTechnical => self.technical_fouls += 1,
            GameActionType::Unknown => {}
        }
    }

    /// Patch attempted counters to include made shots, then derive
    /// percentages and composite metrics. Call exactly once, after all
    /// chunks are consumed.
    pub fn finalize(&mut self) {
        self.field_goals_attempted += self.field_goals_made;
        self.three_points_attempted += self.three_points_made;
        self.free_throws_attempted += self.free_throws_made;

        self.field_goal_percentage =
            metrics::shooting_percentage(self.field_goals_made, self.field_goals_attempted);
        self.three_point_percentage =
            metrics::shooting_percentage(self.three_points_made, self.three_points_attempted);
        self.free_throw_percentage =
            metrics::shooting_percentage(self.free_throws_made, self.free_throws_attempted);

        self.true_shooting_percentage = metrics::true_shooting_percentage(
            self.total_points,
            self.field_goals_attempted,
            self.free_throws_attempted,
        );
        self.player_efficiency_rating = metrics::player_efficiency_rating(self);
        self.game_score = metrics::game_score(self);
    }
}

/// Season totals plus per-game averages for a player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonStats {
    #[serde(flatten)]
    pub totals: PlayerStatLine,
    pub games_played: u32,
    pub avg_points: f64,
    pub avg_rebounds: f64,
    pub avg_assists: f64,
    pub avg_steals: f64,
    pub avg_blocks: f64,
    pub avg_turnovers: f64,
    pub avg_fouls: f64,
}

impl PlayerSeasonStats {
    /// Derive per-game averages from finalized totals.
    pub fn finalize(&mut self) {
        if self.games_played == 0 {
            return;
        }
        let gp = f64::from(self.games_played);
        self.avg_points = metrics::round1(f64::from(self.totals.total_points) / gp);
        self.avg_rebounds = metrics::round1(f64::from(self.totals.total_rebounds) / gp);
        self.avg_assists = metrics::round1(f64::from(self.totals.assists) / gp);
        self.avg_steals = metrics::round1(f64::from(self.totals.steals) / gp);
        self.avg_blocks = metrics::round1(f64::from(self.totals.blocks) / gp);
        self.avg_turnovers = metrics::round1(f64::from(self.totals.turnovers) / gp);
        self.avg_fouls = metrics::round1(f64::from(self.totals.personal_fouls) / gp);
    }
}

/// Per-team stat line folded from one game's actions. Team points come from
/// the game score, not the action log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamStatLine {
    pub total_rebounds: u32,
    pub assists: u32,
    pub steals: u32,
    pub blocks: u32,
    pub turnovers: u32,
    pub personal_fouls: u32,
    pub field_goals_made: u32,
    pub field_goals_attempted: u32,
    pub three_points_made: u32,
    pub three_points_attempted: u32,
    pub free_throws_made: u32,
    pub free_throws_attempted: u32,
}

impl TeamStatLine {
    pub fn apply(&mut self, action_type: GameActionType) {
        match action_type {
            GameActionType::FieldGoalMade => self.field_goals_made += 1,
            GameActionType::FieldGoalMissed => self.field_goals_attempted += 1,
            GameActionType::ThreePointMade => self.three_points_made += 1,
            GameActionType::ThreePointMissed => self.three_points_attempted += 1,
            GameActionType::FreeThrowMade => self.free_throws_made += 1,
            GameActionType::FreeThrowMissed => self.free_throws_attempted += 1,
            GameActionType::ReboundOffensive | GameActionType::ReboundDefensive => {
                self.total_rebounds += 1
            }
            GameActionType::Assist => self.assists += 1,
            GameActionType::Steal => self.steals += 1,
            GameActionType::Block => self.blocks += 1,
            GameActionType::Turnover => self.turnovers += 1,
            GameActionType::FoulPersonal => self.personal_fouls += 1,
            // Technical fouls and unknown types don't enter team lines.
            GameActionType::FoulTechnical | GameActionType::Unknown => {}
        }
    }

    /// Patch attempted counters to include made shots.
    pub fn finalize(&mut self) {
        self.field_goals_attempted += self.field_goals_made;
        self.three_points_attempted += self.three_points_made;
        self.free_throws_attempted += self.free_throws_made;
    }
}

/// A team's stat line for one game plus game-context fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamGameStats {
    #[serde(flatten)]
    pub line: TeamStatLine,
    pub opponent_team_id: u64,
    pub final_score: u32,
    pub opponent_score: u32,
    pub is_win: bool,
    pub margin: i64,
}

/// Season-level team aggregate: summed stat lines, game results, averages,
/// shooting percentages and ratings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonStats {
    #[serde(flatten)]
    pub totals: TeamStatLine,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub points_for: u32,
    pub points_against: u32,
    pub avg_points_for: f64,
    pub avg_points_against: f64,
    pub avg_rebounds: f64,
    pub avg_assists: f64,
    pub win_percentage: f64,
    pub field_goal_percentage: f64,
    pub three_point_percentage: f64,
    pub free_throw_percentage: f64,
    pub offensive_rating: f64,
    pub defensive_rating: f64,
    pub net_rating: f64,
}

impl TeamSeasonStats {
    /// Patch attempts, then derive averages, percentages and ratings.
    pub fn finalize(&mut self) {
        self.totals.finalize();

        if self.games_played == 0 {
            return;
        }
        let gp = f64::from(self.games_played);

        self.avg_points_for = metrics::round1(f64::from(self.points_for) / gp);
        self.avg_points_against = metrics::round1(f64::from(self.points_against) / gp);
        self.avg_rebounds = metrics::round1(f64::from(self.totals.total_rebounds) / gp);
        self.avg_assists = metrics::round1(f64::from(self.totals.assists) / gp);
        self.win_percentage = metrics::round1(f64::from(self.wins) / gp * 100.0);

        self.field_goal_percentage = metrics::shooting_percentage(
            self.totals.field_goals_made,
            self.totals.field_goals_attempted,
        );
        self.three_point_percentage = metrics::shooting_percentage(
            self.totals.three_points_made,
            self.totals.three_points_attempted,
        );
        self.free_throw_percentage = metrics::shooting_percentage(
            self.totals.free_throws_made,
            self.totals.free_throws_attempted,
        );

        let possessions = metrics::estimate_possessions(
            self.totals.field_goals_attempted,
            self.totals.free_throws_attempted,
            self.totals.turnovers,
        );
        self.offensive_rating = metrics::rating_per_100(self.points_for, possessions);
        self.defensive_rating = metrics::rating_per_100(self.points_against, possessions);
        self.net_rating = metrics::round1(self.offensive_rating - self.defensive_rating);
    }
}

/// Made/attempted line for one shot-chart zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotZoneLine {
    pub made: u32,
    pub attempted: u32,
    pub percentage: f64,
}

impl ShotZoneLine {
    fn finalize(&mut self) {
        self.attempted += self.made;
        self.percentage = metrics::shooting_percentage(self.made, self.attempted);
    }
}

/// Zoned shot chart for one player in one game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotChart {
    pub paint: ShotZoneLine,
    pub mid_range: ShotZoneLine,
    pub three_point: ShotZoneLine,
    pub overall: ShotZoneLine,
}

/// Paint ends 2.45m from the basket, the three-point arc sits at 6.75m.
const PAINT_RADIUS_M: f64 = 2.45;

impl ShotChart {
    pub fn apply(&mut self, action: &GameAction) {
        let made = match action.action_type {
            GameActionType::FieldGoalMade | GameActionType::ThreePointMade => true,
            GameActionType::FieldGoalMissed | GameActionType::ThreePointMissed => false,
            _ => return,
        };

        let zone = match action.action_type {
            GameActionType::ThreePointMade | GameActionType::ThreePointMissed => {
                &mut self.three_point
            }
            _ => match (action.shot_x, action.shot_y) {
                (Some(x), Some(y)) if (x * x + y * y).sqrt() < PAINT_RADIUS_M => &mut self.paint,
                _ => &mut self.mid_range,
            },
        };

        if made {
            zone.made += 1;
            self.overall.made += 1;
        } else {
            zone.attempted += 1;
            self.overall.attempted += 1;
        }
    }

    pub fn finalize(&mut self) {
        self.paint.finalize();
        self.mid_range.finalize();
        self.three_point.finalize();
        self.overall.finalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_action_types_are_ignored() {
        let mut line = PlayerStatLine::default();
        line.apply(GameActionType::Unknown);
        line.finalize();
        assert_eq!(line, {
            let mut empty = PlayerStatLine::default();
            empty.finalize();
            empty
        });
    }

    #[test]
    fn test_attempted_includes_made_after_finalize() {
        let mut line = PlayerStatLine::default();
        line.apply(GameActionType::FieldGoalMade);
        line.apply(GameActionType::FieldGoalMissed);
        line.apply(GameActionType::ThreePointMade);
        line.apply(GameActionType::FreeThrowMade);
        line.apply(GameActionType::FreeThrowMissed);

        // Before finalize, attempted counters hold only misses.
        assert_eq!(line.field_goals_attempted, 1);
        assert_eq!(line.three_points_attempted, 0);
        assert_eq!(line.free_throws_attempted, 1);

        line.finalize();
        assert!(line.field_goals_attempted >= line.field_goals_made);
        assert!(line.three_points_attempted >= line.three_points_made);
        assert!(line.free_throws_attempted >= line.free_throws_made);
        assert_eq!(line.field_goals_attempted, 2);
        assert_eq!(line.three_points_attempted, 1);
        assert_eq!(line.free_throws_attempted, 2);
        assert_eq!(line.total_points, 6);
    }

    #[test]
    fn test_zero_attempts_yield_zero_percentages() {
        let mut line = PlayerStatLine::default();
        line.apply(GameActionType::Assist);
        line.finalize();
        assert_eq!(line.field_goal_percentage, 0.0);
        assert_eq!(line.three_point_percentage, 0.0);
        assert_eq!(line.free_throw_percentage, 0.0);
        assert_eq!(line.true_shooting_percentage, 0.0);
    }

    #[test]
    fn test_team_line_skips_technical_fouls() {
        let mut line = TeamStatLine::default();
        line.apply(GameActionType::FoulTechnical);
        line.apply(GameActionType::FoulPersonal);
        assert_eq!(line.personal_fouls, 1);
    }

    #[test]
    fn test_shot_chart_zones() {
        let base = GameAction {
            id: 1,
            game_id: 1,
            player_id: 1,
            team_id: 1,
            action_type: GameActionType::FieldGoalMade,
            period: 1,
            shot_x: Some(1.0),
            shot_y: Some(1.0),
            recorded_at: Utc::now(),
        };

        let mut chart = ShotChart::default();
        // Layup inside the paint.
        chart.apply(&base);
        // Long two.
        chart.apply(&GameAction {
            action_type: GameActionType::FieldGoalMissed,
            shot_x: Some(5.0),
            shot_y: Some(0.0),
            ..base.clone()
        });
        // Three-pointer, zone decided by action type.
        chart.apply(&GameAction {
            action_type: GameActionType::ThreePointMade,
            shot_x: Some(7.0),
            shot_y: Some(0.5),
            ..base.clone()
        });
        // Free throws don't enter shot charts.
        chart.apply(&GameAction {
            action_type: GameActionType::FreeThrowMade,
            ..base.clone()
        });
        chart.finalize();

        assert_eq!(chart.paint.made, 1);
        assert_eq!(chart.paint.attempted, 1);
        assert_eq!(chart.mid_range.made, 0);
        assert_eq!(chart.mid_range.attempted, 1);
        assert_eq!(chart.three_point.made, 1);
        assert_eq!(chart.overall.attempted, 3);
        assert_eq!(chart.overall.made, 2);
        assert!((chart.overall.percentage - 66.7).abs() < 1e-9);
    }
}
