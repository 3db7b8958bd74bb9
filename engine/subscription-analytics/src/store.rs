//! Billing store boundary.
//!
//! Clubs and events are keyset-paginated by ascending id, mirroring how the
//! statistics engine walks action logs: new rows appended during a scan can
//! never shift a cursor the way an offset would.

use crate::error::StoreError;
use crate::types::{Club, ClubSubscriptionEvent, Month};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Filter for event scans. `month: None` means all time.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventFilter {
    pub month: Option<Month>,
    pub churn_only: bool,
}

impl EventFilter {
    fn matches(&self, event: &ClubSubscriptionEvent) -> bool {
        if let Some(month) = self.month {
            if !month.contains(event.occurred_at) {
                return false;
            }
        }
        !self.churn_only || event.event_type.is_churn()
    }
}

/// One page of clubs; `next_cursor` follows full-page semantics.
#[derive(Debug, Clone)]
pub struct ClubPage {
    pub clubs: Vec<Club>,
    pub next_cursor: Option<u64>,
}

/// One page of billing events.
#[derive(Debug, Clone)]
pub struct EventPage {
    pub events: Vec<ClubSubscriptionEvent>,
    pub next_cursor: Option<u64>,
}

/// Read-only access to a tenant's clubs and billing event log.
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// A tenant's clubs, id-ascending, after `after_id`.
    async fn clubs(
        &self,
        tenant_id: u64,
        after_id: Option<u64>,
        limit: usize,
    ) -> Result<ClubPage, StoreError>;

    /// A tenant's billing events within `filter`, id-ascending.
    async fn events(
        &self,
        tenant_id: u64,
        filter: &EventFilter,
        after_id: Option<u64>,
        limit: usize,
    ) -> Result<EventPage, StoreError>;
}

#[derive(Default)]
struct InMemoryState {
    clubs: HashMap<u64, Club>,
    events: Vec<ClubSubscriptionEvent>,
}

/// In-memory [`BillingStore`] for tests and local development.
#[derive(Default)]
pub struct InMemoryBillingStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_club(&self, club: Club) {
        self.state.write().await.clubs.insert(club.id, club);
    }

    pub async fn insert_event(&self, event: ClubSubscriptionEvent) {
        let mut state = self.state.write().await;
        state.events.push(event);
        state.events.sort_by_key(|e| e.id);
    }
}

#[async_trait]
impl BillingStore for InMemoryBillingStore {
    async fn clubs(
        &self,
        tenant_id: u64,
        after_id: Option<u64>,
        limit: usize,
    ) -> Result<ClubPage, StoreError> {
        let state = self.state.read().await;
        let after = after_id.unwrap_or(0);
        let mut clubs: Vec<Club> = state
            .clubs
            .values()
            .filter(|c| c.tenant_id == tenant_id && c.id > after)
            .cloned()
            .collect();
        clubs.sort_by_key(|c| c.id);
        clubs.truncate(limit);
        let next_cursor = if clubs.len() == limit { clubs.last().map(|c| c.id) } else { None };
        Ok(ClubPage { clubs, next_cursor })
    }

    async fn events(
        &self,
        tenant_id: u64,
        filter: &EventFilter,
        after_id: Option<u64>,
        limit: usize,
    ) -> Result<EventPage, StoreError> {
        let state = self.state.read().await;
        let after = after_id.unwrap_or(0);
        let events: Vec<ClubSubscriptionEvent> = state
            .events
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.id > after && filter.matches(e))
            .take(limit)
            .cloned()
            .collect();
        let next_cursor = if events.len() == limit { events.last().map(|e| e.id) } else { None };
        Ok(EventPage { events, next_cursor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SubscriptionEventType, SubscriptionStatus};
    use chrono::{TimeZone, Utc};

    fn event(id: u64, event_type: SubscriptionEventType, month: u32) -> ClubSubscriptionEvent {
        ClubSubscriptionEvent {
            id,
            tenant_id: 1,
            club_id: id,
            event_type,
            mrr_delta: -10.0,
            occurred_at: Utc.with_ymd_and_hms(2026, month, 15, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_event_filter_by_month_and_churn() {
        let store = InMemoryBillingStore::new();
        store.insert_event(event(1, SubscriptionEventType::SubscriptionCanceled, 7)).await;
        store.insert_event(event(2, SubscriptionEventType::SubscriptionCanceled, 8)).await;
        store.insert_event(event(3, SubscriptionEventType::SubscriptionCreated, 8)).await;

        let filter =
            EventFilter { month: Month::new(2026, 8), churn_only: true };
        let page = store.events(1, &filter, None, 100).await.unwrap();
        assert_eq!(page.events.len(), 1);
        assert_eq!(page.events[0].id, 2);
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn test_club_pagination() {
        let store = InMemoryBillingStore::new();
        for id in 1..=3 {
            store
                .insert_club(Club {
                    id,
                    tenant_id: 1,
                    status: SubscriptionStatus::Active,
                    plan: None,
                    started_at: Utc::now(),
                    ends_at: None,
                })
                .await;
        }

        let first = store.clubs(1, None, 2).await.unwrap();
        assert_eq!(first.clubs.len(), 2);
        assert_eq!(first.next_cursor, Some(2));

        let rest = store.clubs(1, first.next_cursor, 2).await.unwrap();
        assert_eq!(rest.clubs.len(), 1);
        assert_eq!(rest.next_cursor, None);
    }
}
