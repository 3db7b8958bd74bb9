//! Cached billing analytics facade.

use crate::churn;
use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::keys::BillingKeys;
use crate::ltv;
use crate::mrr;
use crate::store::BillingStore;
use crate::types::{ChurnReport, ClubSubscriptionEvent, LifetimeStats, Month, MrrSnapshot};
use cache_core::{CacheStore, ReadThroughCache};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Read-through cached analytics over a billing store `B` and cache store `C`.
pub struct AnalyticsService<B, C> {
    store: Arc<B>,
    cache: ReadThroughCache<C>,
    keys: BillingKeys,
    config: AnalyticsConfig,
}

impl<B: BillingStore, C: CacheStore> AnalyticsService<B, C> {
    pub fn new(store: Arc<B>, cache_store: Arc<C>, config: AnalyticsConfig) -> Self {
        Self {
            store,
            cache: ReadThroughCache::new(cache_store),
            keys: BillingKeys::new(),
            config,
        }
    }

    async fn with_timeout<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        let secs = self.config.aggregation_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(secs), fut).await {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Timeout(secs)),
        }
    }

    /// The tenant's cached total monthly recurring revenue.
    pub async fn tenant_mrr(&self, tenant_id: u64, cancel: &CancellationToken) -> Result<f64> {
        let key = self.keys.mrr(tenant_id)?;
        self.cache
            .get_or_compute(&key, self.config.mrr_ttl(), || {
                self.with_timeout(mrr::tenant_mrr(
                    self.store.as_ref(),
                    tenant_id,
                    self.config.chunk_size,
                    cancel,
                ))
            })
            .await
    }

    /// Month-end MRR for each of the last `months` months, oldest first.
    /// Not cached: the series is a function of `now` and the window length.
    pub async fn historical_mrr(
        &self,
        tenant_id: u64,
        months: u32,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Vec<MrrSnapshot>> {
        if months == 0 {
            return Err(AnalyticsError::InvalidFilter("months must be at least 1".into()));
        }
        self.with_timeout(mrr::historical_mrr(
            self.store.as_ref(),
            tenant_id,
            months,
            now,
            self.config.chunk_size,
            cancel,
        ))
        .await
    }

    /// MRR growth over the last `months` months, as a percentage.
    pub async fn mrr_growth_rate(
        &self,
        tenant_id: u64,
        months: u32,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<f64> {
        if months == 0 {
            return Err(AnalyticsError::InvalidFilter("months must be at least 1".into()));
        }
        self.with_timeout(mrr::mrr_growth_rate(
            self.store.as_ref(),
            tenant_id,
            months,
            now,
            self.config.chunk_size,
            cancel,
        ))
        .await
    }

    /// Cached churn report for one month.
    pub async fn monthly_churn_rate(
        &self,
        tenant_id: u64,
        month: Month,
        cancel: &CancellationToken,
    ) -> Result<ChurnReport> {
        let key = self.keys.churn(tenant_id, month)?;
        self.cache
            .get_or_compute(&key, self.config.churn_ttl(), || {
                self.with_timeout(churn::monthly_churn_rate(
                    self.store.as_ref(),
                    tenant_id,
                    month,
                    self.config.chunk_size,
                    cancel,
                ))
            })
            .await
    }

    /// Revenue churn for one month against a caller-supplied opening MRR.
    /// Not cached: the result is a function of `mrr_at_start`, which the
    /// caller typically reads from its own bookkeeping.
    pub async fn revenue_churn(
        &self,
        tenant_id: u64,
        month: Month,
        mrr_at_start: f64,
        cancel: &CancellationToken,
    ) -> Result<f64> {
        self.with_timeout(churn::revenue_churn(
            self.store.as_ref(),
            tenant_id,
            month,
            mrr_at_start,
            self.config.chunk_size,
            cancel,
        ))
        .await
    }

    /// Cached lifetime value inputs for a tenant.
    pub async fn customer_lifetime_stats(
        &self,
        tenant_id: u64,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<LifetimeStats> {
        let key = self.keys.ltv(tenant_id)?;
        self.cache
            .get_or_compute(&key, self.config.ltv_ttl(), || {
                self.with_timeout(ltv::customer_lifetime_stats(
                    self.store.as_ref(),
                    tenant_id,
                    now,
                    self.config.chunk_size,
                    cancel,
                ))
            })
            .await
    }

    /// The single lifetime-value figure.
    pub async fn average_ltv(
        &self,
        tenant_id: u64,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<f64> {
        Ok(self.customer_lifetime_stats(tenant_id, now, cancel).await?.lifetime_value)
    }

    /// Invalidate every cache entry a newly recorded billing event dirties.
    pub async fn invalidate_for_event(&self, event: &ClubSubscriptionEvent) -> Result<()> {
        for key in self.keys.keys_for_event(event)? {
            self.cache.invalidate(&key).await;
        }
        Ok(())
    }

    /// Invalidate a tenant's month-independent figures. Month-scoped churn
    /// reports are invalidated per event; anything missed ages out on TTL.
    pub async fn invalidate_tenant(&self, tenant_id: u64) -> Result<()> {
        self.cache.invalidate(&self.keys.mrr(tenant_id)?).await;
        self.cache.invalidate(&self.keys.ltv(tenant_id)?).await;
        Ok(())
    }
}
