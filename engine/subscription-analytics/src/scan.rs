//! Shared chunked-scan plumbing for the calculators.

use crate::error::{AnalyticsError, Result, StoreError};
use crate::store::{BillingStore, EventFilter};
use crate::types::{Club, ClubSubscriptionEvent};
use tokio_util::sync::CancellationToken;

/// Round to two decimals; every dollar figure leaving a calculator passes
/// through here so cached and fresh values compare equal.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// First-page failures are source errors; later failures abort a partial scan.
pub(crate) fn page_error(pages_read: u64, records_processed: u64, source: StoreError) -> AnalyticsError {
    if pages_read == 0 {
        AnalyticsError::Source(source)
    } else {
        AnalyticsError::IncompleteAggregation { records_processed, source }
    }
}

/// Walk a tenant's clubs one chunk at a time, folding each into `fold`.
/// Returns the number of clubs visited.
pub(crate) async fn fold_clubs<S, F>(
    store: &S,
    tenant_id: u64,
    chunk_size: usize,
    cancel: &CancellationToken,
    mut fold: F,
) -> Result<u64>
where
    S: BillingStore,
    F: FnMut(&Club),
{
    let mut cursor = None;
    let mut pages = 0u64;
    let mut records = 0u64;

    loop {
        if cancel.is_cancelled() {
            return Err(AnalyticsError::Cancelled { records_processed: records });
        }
        let page = store
            .clubs(tenant_id, cursor, chunk_size)
            .await
            .map_err(|e| page_error(pages, records, e))?;
        pages += 1;
        records += page.clubs.len() as u64;
        for club in &page.clubs {
            fold(club);
        }
        match page.next_cursor {
            Some(c) => cursor = Some(c),
            None => return Ok(records),
        }
    }
}

/// Walk a tenant's billing events within `filter`, folding each into `fold`.
pub(crate) async fn fold_events<S, F>(
    store: &S,
    tenant_id: u64,
    filter: &EventFilter,
    chunk_size: usize,
    cancel: &CancellationToken,
    mut fold: F,
) -> Result<u64>
where
    S: BillingStore,
    F: FnMut(&ClubSubscriptionEvent),
{
    let mut cursor = None;
    let mut pages = 0u64;
    let mut records = 0u64;

    loop {
        if cancel.is_cancelled() {
            return Err(AnalyticsError::Cancelled { records_processed: records });
        }
        let page = store
            .events(tenant_id, filter, cursor, chunk_size)
            .await
            .map_err(|e| page_error(pages, records, e))?;
        pages += 1;
        records += page.events.len() as u64;
        for event in &page.events {
            fold(event);
        }
        match page.next_cursor {
            Some(c) => cursor = Some(c),
            None => return Ok(records),
        }
    }
}
