//! Monthly recurring revenue.

use crate::error::Result;
use crate::scan::{fold_clubs, fold_events, round2};
use crate::store::{BillingStore, EventFilter};
use crate::types::{BillingInterval, Club, Month, MrrSnapshot};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// A single club's contribution to MRR, in dollars.
///
/// Only active and trialing subscriptions with a selected plan contribute;
/// yearly plans are normalized to a twelfth of their price.
pub fn club_mrr(club: &Club) -> f64 {
    if !club.status.is_recurring() {
        return 0.0;
    }
    let Some(plan) = club.plan else {
        return 0.0;
    };
    let monthly = match plan.interval {
        BillingInterval::Monthly => plan.price,
        BillingInterval::Yearly => plan.price / 12.0,
    };
    round2(monthly)
}

/// Total MRR for a tenant, folded over a chunked club scan.
pub async fn tenant_mrr<S: BillingStore>(
    store: &S,
    tenant_id: u64,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<f64> {
    let mut total = 0.0;
    let records =
        fold_clubs(store, tenant_id, chunk_size, cancel, |club| total += club_mrr(club)).await?;
    tracing::debug!(tenant_id, records, "mrr scan complete");
    Ok(round2(total))
}

/// Month-end MRR for each of the `months` most recent calendar months,
/// oldest first, ending with the month containing `now`.
///
/// Reconstructed by walking backward from the current figure: each month's
/// summed `mrr_delta` is subtracted to obtain the month before it. Events
/// older than the window are irrelevant to the walk and are skipped, so the
/// bucket map is bounded by the window length.
pub async fn historical_mrr<S: BillingStore>(
    store: &S,
    tenant_id: u64,
    months: u32,
    now: DateTime<Utc>,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<Vec<MrrSnapshot>> {
    let current = tenant_mrr(store, tenant_id, chunk_size, cancel).await?;

    // Newest first; reversed at the end.
    let mut window = Vec::with_capacity(months as usize);
    let mut month = Month::from_datetime(now);
    for _ in 0..months {
        window.push(month);
        month = month.prev();
    }
    let Some(oldest) = window.last().copied() else {
        return Ok(Vec::new());
    };

    let mut deltas: HashMap<Month, f64> = HashMap::new();
    fold_events(store, tenant_id, &EventFilter::default(), chunk_size, cancel, |event| {
        if event.occurred_at >= oldest.start() {
            *deltas.entry(Month::from_datetime(event.occurred_at)).or_insert(0.0) +=
                event.mrr_delta;
        }
    })
    .await?;

    let mut series = Vec::with_capacity(window.len());
    let mut mrr = current;
    for month in &window {
        // Inconsistent event logs could walk below zero; the floor keeps the
        // series plausible rather than surfacing negative revenue.
        series.push(MrrSnapshot { month: month.to_string(), mrr: round2(mrr.max(0.0)) });
        mrr -= deltas.get(month).copied().unwrap_or(0.0);
    }
    series.reverse();
    Ok(series)
}

/// MRR growth over the last `months` months as a percentage of the oldest
/// month's figure. `0.0` when the window is empty or started from zero.
pub async fn mrr_growth_rate<S: BillingStore>(
    store: &S,
    tenant_id: u64,
    months: u32,
    now: DateTime<Utc>,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<f64> {
    let series = historical_mrr(store, tenant_id, months, now, chunk_size, cancel).await?;
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Ok(0.0);
    };
    if first.mrr <= 0.0 {
        return Ok(0.0);
    }
    Ok(round2((last.mrr - first.mrr) / first.mrr * 100.0))
}
