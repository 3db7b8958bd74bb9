//! End-to-end tests over the cached analytics service.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use subscription_analytics::{
    AnalyticsConfig, AnalyticsError, AnalyticsService, BillingInterval, BillingStore,
    CancellationToken, Club, ClubPage, ClubSubscriptionEvent, EventFilter, EventPage,
    InMemoryBillingStore, InMemoryCacheStore, Month, PlanPricing, StoreError,
    SubscriptionEventType, SubscriptionStatus,
};

fn club(id: u64, status: SubscriptionStatus, price: f64, interval: BillingInterval) -> Club {
    Club {
        id,
        tenant_id: 1,
        status,
        plan: Some(PlanPricing { price, interval }),
        started_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        ends_at: None,
    }
}

fn churn_event(id: u64, event_type: SubscriptionEventType, mrr_delta: f64) -> ClubSubscriptionEvent {
    ClubSubscriptionEvent {
        id,
        tenant_id: 1,
        club_id: id,
        event_type,
        mrr_delta,
        occurred_at: Utc.with_ymd_and_hms(2026, 8, 12, 10, 0, 0).unwrap(),
    }
}

async fn seeded_service(
) -> (AnalyticsService<InMemoryBillingStore, InMemoryCacheStore>, Arc<InMemoryBillingStore>) {
    let store = Arc::new(InMemoryBillingStore::new());
    let svc = AnalyticsService::new(
        store.clone(),
        Arc::new(InMemoryCacheStore::new()),
        AnalyticsConfig::default(),
    );
    (svc, store)
}

#[tokio::test]
async fn test_tenant_mrr_mixes_intervals_and_statuses() {
    let (svc, store) = seeded_service().await;
    store.insert_club(club(1, SubscriptionStatus::Active, 120.0, BillingInterval::Yearly)).await;
    store.insert_club(club(2, SubscriptionStatus::Trialing, 50.0, BillingInterval::Monthly)).await;
    store.insert_club(club(3, SubscriptionStatus::Canceled, 99.0, BillingInterval::Monthly)).await;
    store.insert_club(club(4, SubscriptionStatus::PastDue, 99.0, BillingInterval::Monthly)).await;

    let mrr = svc.tenant_mrr(1, &CancellationToken::new()).await.unwrap();
    assert_eq!(mrr, 60.0);
}

#[tokio::test]
async fn test_monthly_churn_report_end_to_end() {
    let (svc, store) = seeded_service().await;
    for id in 1..=100 {
        store
            .insert_club(club(id, SubscriptionStatus::Active, 10.0, BillingInterval::Monthly))
            .await;
    }
    for id in 1..=6 {
        store.insert_event(churn_event(id, SubscriptionEventType::SubscriptionCanceled, -10.0)).await;
    }
    store.insert_event(churn_event(7, SubscriptionEventType::TrialEndedWithoutPayment, 0.0)).await;
    store.insert_event(churn_event(8, SubscriptionEventType::SubscriptionPaymentFailed, -10.0)).await;
    // Non-churn activity in the same month is excluded.
    store.insert_event(churn_event(9, SubscriptionEventType::SubscriptionUpdated, 5.0)).await;

    let month = Month::new(2026, 8).unwrap();
    let report = svc.monthly_churn_rate(1, month, &CancellationToken::new()).await.unwrap();
    assert_eq!(report.customers_at_start, 100);
    assert_eq!(report.churned, 8);
    assert_eq!(report.voluntary, 6);
    assert_eq!(report.involuntary, 2);
    assert_eq!(report.churn_rate, 8.0);

    let revenue = svc.revenue_churn(1, month, 1000.0, &CancellationToken::new()).await.unwrap();
    assert_eq!(revenue, 7.0);
}

#[tokio::test]
async fn test_event_invalidation_refreshes_churn_month() {
    let (svc, store) = seeded_service().await;
    store.insert_club(club(1, SubscriptionStatus::Active, 10.0, BillingInterval::Monthly)).await;
    let month = Month::new(2026, 8).unwrap();
    let cancel = CancellationToken::new();

    let before = svc.monthly_churn_rate(1, month, &cancel).await.unwrap();
    assert_eq!(before.churned, 0);

    let event = churn_event(1, SubscriptionEventType::SubscriptionCanceled, -10.0);
    store.insert_event(event.clone()).await;
    // Cached until the event edge fires.
    assert_eq!(svc.monthly_churn_rate(1, month, &cancel).await.unwrap().churned, 0);

    svc.invalidate_for_event(&event).await.unwrap();
    assert_eq!(svc.monthly_churn_rate(1, month, &cancel).await.unwrap().churned, 1);
}

#[tokio::test]
async fn test_cancellation_propagates() {
    let (svc, store) = seeded_service().await;
    store.insert_club(club(1, SubscriptionStatus::Active, 10.0, BillingInterval::Monthly)).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = svc.tenant_mrr(1, &cancel).await;
    assert!(matches!(result, Err(AnalyticsError::Cancelled { .. })));
}

/// Store that serves a first page of clubs and fails on the second.
struct FlakyStore {
    inner: InMemoryBillingStore,
    calls: AtomicU32,
    fail_after: u32,
}

#[async_trait]
impl BillingStore for FlakyStore {
    async fn clubs(
        &self,
        tenant_id: u64,
        after_id: Option<u64>,
        limit: usize,
    ) -> Result<ClubPage, StoreError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
            return Err(StoreError::Unavailable("replica lost".into()));
        }
        self.inner.clubs(tenant_id, after_id, limit).await
    }

    async fn events(
        &self,
        tenant_id: u64,
        filter: &EventFilter,
        after_id: Option<u64>,
        limit: usize,
    ) -> Result<EventPage, StoreError> {
        self.inner.events(tenant_id, filter, after_id, limit).await
    }
}

#[tokio::test]
async fn test_mid_scan_failure_aborts_instead_of_partial_mrr() {
    let inner = InMemoryBillingStore::new();
    for id in 1..=4 {
        inner
            .insert_club(club(id, SubscriptionStatus::Active, 25.0, BillingInterval::Monthly))
            .await;
    }
    let store = Arc::new(FlakyStore { inner, calls: AtomicU32::new(0), fail_after: 1 });
    let svc = AnalyticsService::new(
        store,
        Arc::new(InMemoryCacheStore::new()),
        AnalyticsConfig { chunk_size: 2, ..AnalyticsConfig::default() },
    );

    let result = svc.tenant_mrr(1, &CancellationToken::new()).await;
    match result {
        Err(AnalyticsError::IncompleteAggregation { records_processed, .. }) => {
            assert_eq!(records_processed, 2);
        }
        other => panic!("expected IncompleteAggregation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_first_page_failure_is_a_source_error() {
    let store = Arc::new(FlakyStore {
        inner: InMemoryBillingStore::new(),
        calls: AtomicU32::new(0),
        fail_after: 0,
    });
    let svc = AnalyticsService::new(
        store,
        Arc::new(InMemoryCacheStore::new()),
        AnalyticsConfig::default(),
    );

    let result = svc.tenant_mrr(1, &CancellationToken::new()).await;
    assert!(matches!(result, Err(AnalyticsError::Source(StoreError::Unavailable(_)))));
}
