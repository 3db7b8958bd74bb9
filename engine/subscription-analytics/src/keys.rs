//! Cache key construction and the invalidation edge table for billing
//! analytics. Same contract as the statistics namespace: patterns are named
//! constants and invalidation is a static edge table, no wildcard deletes.

use crate::types::{ClubSubscriptionEvent, Month};
use cache_core::{KeyBuilder, Result};

pub const MRR: &str = "mrr";
pub const CHURN: &str = "churn";
pub const LTV: &str = "ltv";

const PATTERNS: &[(&str, &str)] = &[
    (MRR, "subscription:mrr:{tenant_id}"),
    (CHURN, "subscription:churn:{tenant_id}:{month}"),
    (LTV, "subscription:ltv:{tenant_id}"),
];

/// Typed key constructors over the billing analytics namespace.
pub struct BillingKeys {
    builder: KeyBuilder,
}

impl Default for BillingKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl BillingKeys {
    pub fn new() -> Self {
        Self { builder: KeyBuilder::new(PATTERNS) }
    }

    pub fn mrr(&self, tenant_id: u64) -> Result<String> {
        self.builder.build(MRR, &[("tenant_id", tenant_id.to_string())])
    }

    pub fn churn(&self, tenant_id: u64, month: Month) -> Result<String> {
        self.builder
            .build(CHURN, &[("tenant_id", tenant_id.to_string()), ("month", month.to_string())])
    }

    pub fn ltv(&self, tenant_id: u64) -> Result<String> {
        self.builder.build(LTV, &[("tenant_id", tenant_id.to_string())])
    }

    /// Every key a billing event dirties: the tenant's MRR and LTV figures,
    /// and the churn report of the month the event falls in.
    pub fn keys_for_event(&self, event: &ClubSubscriptionEvent) -> Result<Vec<String>> {
        let month = Month::from_datetime(event.occurred_at);
        Ok(vec![
            self.mrr(event.tenant_id)?,
            self.ltv(event.tenant_id)?,
            self.churn(event.tenant_id, month)?,
        ])
    }
}
