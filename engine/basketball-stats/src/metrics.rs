//! Pure metric formulas.
//!
//! Every function here is a total function over its inputs: zero denominators
//! yield `0.0`, never NaN or an error. Percentages are rounded to one decimal
//! place at the point of computation, so cached and freshly-computed values
//! compare bit-for-bit equal.

use crate::types::PlayerStatLine;

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places, for rate stats.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `made / attempted * 100`, one decimal, `0.0` when nothing was attempted.
pub fn shooting_percentage(made: u32, attempted: u32) -> f64 {
    if attempted == 0 {
        return 0.0;
    }
    round1(f64::from(made) / f64::from(attempted) * 100.0)
}

/// True shooting percentage: `PTS / (2 * (FGA + 0.44 * FTA)) * 100`.
pub fn true_shooting_percentage(points: u32, field_goals_attempted: u32, free_throws_attempted: u32) -> f64 {
    let denominator =
        2.0 * (f64::from(field_goals_attempted) + 0.44 * f64::from(free_throws_attempted));
    if denominator <= 0.0 {
        return 0.0;
    }
    round1(f64::from(points) / denominator * 100.0)
}

/// Effective field goal percentage: `(FGM + 0.5 * 3PM) / FGA * 100`, where
/// FGA covers two- and three-point attempts combined.
pub fn effective_field_goal_percentage(
    field_goals_made: u32,
    three_points_made: u32,
    field_goals_attempted: u32,
) -> f64 {
    if field_goals_attempted == 0 {
        return 0.0;
    }
    round1(
        (f64::from(field_goals_made) + 0.5 * f64::from(three_points_made))
            / f64::from(field_goals_attempted)
            * 100.0,
    )
}

/// Hollinger game score over a finalized stat line.
pub fn game_score(line: &PlayerStatLine) -> f64 {
    round1(
        f64::from(line.total_points)
            + 0.4 * f64::from(line.field_goals_made)
            - 0.7 * f64::from(line.field_goals_attempted)
            - 0.4 * (f64::from(line.free_throws_attempted) - f64::from(line.free_throws_made))
            + 0.7 * f64::from(line.rebounds_offensive)
            + 0.3 * f64::from(line.rebounds_defensive)
            + f64::from(line.steals)
            + 0.7 * f64::from(line.assists)
            + 0.7 * f64::from(line.blocks)
            - 0.4 * f64::from(line.personal_fouls)
            - f64::from(line.turnovers),
    )
}

/// Simplified linear efficiency rating: positive box-score contributions
/// minus turnovers and fouls.
pub fn player_efficiency_rating(line: &PlayerStatLine) -> f64 {
    round1(
        f64::from(line.total_points)
            + f64::from(line.total_rebounds)
            + f64::from(line.assists)
            + f64::from(line.steals)
            + f64::from(line.blocks)
            - f64::from(line.turnovers)
            - f64::from(line.personal_fouls),
    )
}

/// Possession estimate used for season offensive/defensive ratings:
/// `FGA + 0.8 * TOV + 0.44 * FTA`.
pub fn estimate_possessions(
    field_goals_attempted: u32,
    free_throws_attempted: u32,
    turnovers: u32,
) -> f64 {
    f64::from(field_goals_attempted)
        + 0.8 * f64::from(turnovers)
        + 0.44 * f64::from(free_throws_attempted)
}

/// Possession estimate used for single-game pace:
/// `FGA + TOV + 0.44 * FTA` (full turnover weight).
pub fn pace_possessions(
    field_goals_attempted: u32,
    free_throws_attempted: u32,
    turnovers: u32,
) -> f64 {
    f64::from(field_goals_attempted)
        + f64::from(turnovers)
        + 0.44 * f64::from(free_throws_attempted)
}

/// Points per 100 possessions, `0.0` when no possessions were estimated.
pub fn rating_per_100(points: u32, possessions: f64) -> f64 {
    if possessions <= 0.0 {
        return 0.0;
    }
    round1(f64::from(points) / possessions * 100.0)
}

/// Player impact estimate over a finalized stat line: positive box-score
/// events minus the possessions and attempts spent producing them.
pub fn player_impact_estimate(line: &PlayerStatLine) -> f64 {
    round1(
        f64::from(line.total_points)
            + f64::from(line.field_goals_made)
            + f64::from(line.free_throws_made)
            - f64::from(line.field_goals_attempted)
            - f64::from(line.free_throws_attempted)
            + f64::from(line.rebounds_defensive)
            + 0.5 * f64::from(line.rebounds_offensive)
            + f64::from(line.assists)
            + f64::from(line.steals)
            + 0.5 * f64::from(line.blocks)
            - f64::from(line.personal_fouls)
            - f64::from(line.turnovers),
    )
}

/// Assists per turnover; with zero turnovers the assist count itself.
pub fn assist_turnover_ratio(assists: u32, turnovers: u32) -> f64 {
    if turnovers == 0 {
        return f64::from(assists);
    }
    round2(f64::from(assists) / f64::from(turnovers))
}

/// Points scored per estimated possession, two decimals.
pub fn points_per_possession(points: u32, possessions: f64) -> f64 {
    if possessions <= 0.0 {
        return 0.0;
    }
    round2(f64::from(points) / possessions)
}

/// Turnovers as a percentage of estimated possessions, two decimals.
pub fn turnover_rate(turnovers: u32, possessions: f64) -> f64 {
    if possessions <= 0.0 {
        return 0.0;
    }
    round2(f64::from(turnovers) / possessions * 100.0)
}

/// Free-throw attempts per field-goal attempt, two decimals.
pub fn free_throw_rate(free_throws_attempted: u32, field_goals_attempted: u32) -> f64 {
    if field_goals_attempted == 0 {
        return 0.0;
    }
    round2(f64::from(free_throws_attempted) / f64::from(field_goals_attempted))
}

/// Dean Oliver's four factors of winning basketball.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FourFactors {
    pub effective_field_goal_percentage: f64,
    pub turnover_rate: f64,
    pub offensive_rebound_percentage: f64,
    pub free_throw_rate: f64,
}

/// The four factors for one team's finalized line. Offensive rebounding is
/// measured against the opponent's defensive rebounds, the only opponent
/// figure the formula needs.
pub fn four_factors(
    field_goals_made: u32,
    three_points_made: u32,
    field_goals_attempted: u32,
    free_throws_attempted: u32,
    turnovers: u32,
    rebounds_offensive: u32,
    opponent_rebounds_defensive: u32,
) -> FourFactors {
    let rebound_chances = rebounds_offensive + opponent_rebounds_defensive;
    let offensive_rebound_percentage = if rebound_chances == 0 {
        0.0
    } else {
        round1(f64::from(rebounds_offensive) / f64::from(rebound_chances) * 100.0)
    };

    FourFactors {
        effective_field_goal_percentage: effective_field_goal_percentage(
            field_goals_made,
            three_points_made,
            field_goals_attempted,
        ),
        turnover_rate: turnover_rate(
            turnovers,
            pace_possessions(field_goals_attempted, free_throws_attempted, turnovers),
        ),
        offensive_rebound_percentage,
        free_throw_rate: free_throw_rate(free_throws_attempted, field_goals_attempted),
    }
}
