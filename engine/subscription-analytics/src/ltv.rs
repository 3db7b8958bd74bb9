//! Customer lifetime value.

use crate::error::Result;
use crate::mrr::club_mrr;
use crate::scan::{fold_clubs, round2};
use crate::store::BillingStore;
use crate::types::{BillingInterval, Club, LifetimeStats};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// Assumed lifetime, in months, for tenants with no completed subscriptions
/// to measure from.
const DEFAULT_LIFETIME_MONTHS: f64 = 12.0;

/// The plan's monthly price regardless of subscription status, for valuing
/// subscriptions that have already ended.
fn plan_monthly_price(club: &Club) -> f64 {
    match club.plan {
        Some(plan) => match plan.interval {
            BillingInterval::Monthly => plan.price,
            BillingInterval::Yearly => plan.price / 12.0,
        },
        None => 0.0,
    }
}

fn median(sorted: &[f64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2],
        n => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// Lifetime value for a tenant: average MRR across revenue-generating clubs
/// times the average observed subscription lifetime.
///
/// Lifetime is measured only over clubs that have ended; active clubs would
/// bias the average toward however long the business has existed. When no
/// club has ended yet, a 12-month lifetime is assumed. `now` is passed in so
/// results are reproducible.
///
/// The duration list is retained for the median, so memory here is bounded
/// by the tenant's club count rather than the chunk size.
pub async fn customer_lifetime_stats<S: BillingStore>(
    store: &S,
    tenant_id: u64,
    now: DateTime<Utc>,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<LifetimeStats> {
    let mut mrr_total = 0.0;
    let mut paying_clubs = 0u64;
    let mut active_clubs = 0u64;
    let mut durations_days: Vec<f64> = Vec::new();
    let mut total_lifetime_revenue = 0.0;

    fold_clubs(store, tenant_id, chunk_size, cancel, |club| {
        let mrr = club_mrr(club);
        if mrr > 0.0 {
            mrr_total += mrr;
            paying_clubs += 1;
        }
        if club.status.is_recurring() {
            active_clubs += 1;
        }
        if let Some(ends_at) = club.ends_at {
            let end = ends_at.min(now);
            let days = if end > club.started_at {
                (end - club.started_at).num_days() as f64
            } else {
                0.0
            };
            durations_days.push(days);
            total_lifetime_revenue += plan_monthly_price(club) * (days / 30.0);
        }
    })
    .await?;

    let average_mrr =
        if paying_clubs == 0 { 0.0 } else { round2(mrr_total / paying_clubs as f64) };
    let (average_duration_days, average_lifetime_months) = if durations_days.is_empty() {
        (0.0, DEFAULT_LIFETIME_MONTHS)
    } else {
        let avg_days = durations_days.iter().sum::<f64>() / durations_days.len() as f64;
        (round2(avg_days), round2(avg_days / 30.0))
    };
    durations_days.sort_by(f64::total_cmp);

    tracing::debug!(tenant_id, paying_clubs, active_clubs, "ltv scan complete");
    Ok(LifetimeStats {
        average_mrr,
        average_lifetime_months,
        lifetime_value: round2(average_mrr * average_lifetime_months),
        average_duration_days,
        median_duration_days: round2(median(&durations_days)),
        total_lifetime_revenue: round2(total_lifetime_revenue),
        active_clubs,
    })
}
