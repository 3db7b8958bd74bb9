//! Customer and revenue churn.

use crate::error::Result;
use crate::scan::{fold_clubs, fold_events, round2};
use crate::store::{BillingStore, EventFilter};
use crate::types::{ChurnReport, Month};
use tokio_util::sync::CancellationToken;

/// Customer churn for one month.
///
/// The customer base is every club whose subscription existed at the first
/// instant of the month; churn is every churn-class event recorded within
/// the month, split into voluntary cancellations and involuntary losses
/// (payment failures and expired trials).
pub async fn monthly_churn_rate<S: BillingStore>(
    store: &S,
    tenant_id: u64,
    month: Month,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<ChurnReport> {
    let month_start = month.start();
    let mut customers_at_start = 0u64;
    fold_clubs(store, tenant_id, chunk_size, cancel, |club| {
        if club.started_at < month_start
            && club.ends_at.map_or(true, |ends_at| ends_at >= month_start)
        {
            customers_at_start += 1;
        }
    })
    .await?;

    let filter = EventFilter { month: Some(month), churn_only: true };
    let mut voluntary = 0u64;
    let mut involuntary = 0u64;
    fold_events(store, tenant_id, &filter, chunk_size, cancel, |event| {
        if event.event_type.is_voluntary_churn() {
            voluntary += 1;
        } else {
            involuntary += 1;
        }
    })
    .await?;

    let churned = voluntary + involuntary;
    let churn_rate = if customers_at_start == 0 {
        0.0
    } else {
        round2(churned as f64 / customers_at_start as f64 * 100.0)
    };
    tracing::debug!(tenant_id, %month, churned, customers_at_start, "churn scan complete");

    Ok(ChurnReport {
        month: month.to_string(),
        customers_at_start,
        customers_at_end: customers_at_start.saturating_sub(churned),
        churned,
        voluntary,
        involuntary,
        churn_rate,
    })
}

/// Revenue churn for one month: MRR lost to churn events as a percentage of
/// the MRR the month started with. Only negative deltas count; upgrades
/// recorded on a churn event cannot offset losses.
pub async fn revenue_churn<S: BillingStore>(
    store: &S,
    tenant_id: u64,
    month: Month,
    mrr_at_start: f64,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<f64> {
    if mrr_at_start <= 0.0 {
        return Ok(0.0);
    }

    let filter = EventFilter { month: Some(month), churn_only: true };
    let mut lost = 0.0;
    fold_events(store, tenant_id, &filter, chunk_size, cancel, |event| {
        if event.mrr_delta < 0.0 {
            lost += -event.mrr_delta;
        }
    })
    .await?;

    Ok(round2(lost / mrr_at_start * 100.0))
}
