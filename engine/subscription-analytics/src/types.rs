//! Billing domain types.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription lifecycle status as reported by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Expired,
    #[serde(other)]
    Unknown,
}

impl SubscriptionStatus {
    /// Whether the subscription currently generates recurring revenue.
    pub fn is_recurring(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingInterval {
    Monthly,
    Yearly,
}

/// Price of the plan a club subscribes to, in dollars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanPricing {
    pub price: f64,
    pub interval: BillingInterval,
}

/// A subscribed club. `plan` is `None` for clubs that never selected a plan
/// (for example, incomplete signups).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Club {
    pub id: u64,
    pub tenant_id: u64,
    pub status: SubscriptionStatus,
    pub plan: Option<PlanPricing>,
    pub started_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Billing lifecycle events, appended by payment-provider webhooks.
///
/// Unknown event types deserialize to [`SubscriptionEventType::Unknown`] and
/// are skipped by every calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionEventType {
    SubscriptionCreated,
    SubscriptionRenewed,
    SubscriptionUpdated,
    SubscriptionCanceled,
    SubscriptionPaymentFailed,
    TrialEndedWithoutPayment,
    PlanUpgraded,
    PlanDowngraded,
    #[serde(other)]
    Unknown,
}

impl SubscriptionEventType {
    /// Whether the event ends a paying relationship.
    pub fn is_churn(&self) -> bool {
        matches!(
            self,
            SubscriptionEventType::SubscriptionCanceled
                | SubscriptionEventType::SubscriptionPaymentFailed
                | SubscriptionEventType::TrialEndedWithoutPayment
        )
    }

    /// Churn where the customer chose to leave, as opposed to payment
    /// failures and expired trials.
    pub fn is_voluntary_churn(&self) -> bool {
        matches!(self, SubscriptionEventType::SubscriptionCanceled)
    }
}

/// One immutable billing event. `mrr_delta` is the signed change to the
/// tenant's monthly recurring revenue caused by the event, in dollars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubSubscriptionEvent {
    pub id: u64,
    pub tenant_id: u64,
    pub club_id: u64,
    pub event_type: SubscriptionEventType,
    pub mrr_delta: f64,
    pub occurred_at: DateTime<Utc>,
}

/// A calendar month in UTC. Validated at construction so every downstream
/// range computation is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self { year: at.year(), month: at.month() }
    }

    /// First instant of the month.
    pub fn start(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(self.year, self.month, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// First instant of the following month.
    pub fn end(&self) -> DateTime<Utc> {
        let (year, month) =
            if self.month == 12 { (self.year + 1, 1) } else { (self.year, self.month + 1) };
        Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start() && at < self.end()
    }

    /// The preceding calendar month.
    pub fn prev(&self) -> Month {
        if self.month == 1 {
            Month { year: self.year - 1, month: 12 }
        } else {
            Month { year: self.year, month: self.month - 1 }
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Customer churn for one month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChurnReport {
    pub month: String,
    pub customers_at_start: u64,
    pub customers_at_end: u64,
    pub churned: u64,
    pub voluntary: u64,
    pub involuntary: u64,
    /// Percentage, two decimals, `0.0` when the month started empty.
    pub churn_rate: f64,
}

/// MRR as of the end of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrrSnapshot {
    pub month: String,
    pub mrr: f64,
}

/// Lifetime value inputs and the resulting figure, plus the duration
/// distribution of completed subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifetimeStats {
    pub average_mrr: f64,
    pub average_lifetime_months: f64,
    pub lifetime_value: f64,
    pub average_duration_days: f64,
    pub median_duration_days: f64,
    /// Revenue collected over the full lifetime of ended subscriptions.
    pub total_lifetime_revenue: f64,
    pub active_clubs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_validation() {
        assert!(Month::new(2026, 0).is_none());
        assert!(Month::new(2026, 13).is_none());
        assert!(Month::new(2026, 12).is_some());
    }

    #[test]
    fn test_month_range_and_label() {
        let month = Month::new(2026, 8).unwrap();
        assert_eq!(month.to_string(), "2026-08");
        assert!(month.contains(Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap()));
        assert!(month.contains(Utc.with_ymd_and_hms(2026, 8, 31, 23, 59, 59).unwrap()));
        assert!(!month.contains(Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_december_rolls_over() {
        let month = Month::new(2025, 12).unwrap();
        assert_eq!(month.end(), Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_prev_crosses_year_boundary() {
        let january = Month::new(2026, 1).unwrap();
        assert_eq!(january.prev(), Month::new(2025, 12).unwrap());
        assert_eq!(Month::new(2026, 8).unwrap().prev(), Month::new(2026, 7).unwrap());
    }

    #[test]
    fn test_churn_classification() {
        assert!(SubscriptionEventType::SubscriptionCanceled.is_churn());
        assert!(SubscriptionEventType::SubscriptionCanceled.is_voluntary_churn());
        assert!(SubscriptionEventType::SubscriptionPaymentFailed.is_churn());
        assert!(!SubscriptionEventType::SubscriptionPaymentFailed.is_voluntary_churn());
        assert!(SubscriptionEventType::TrialEndedWithoutPayment.is_churn());
        assert!(!SubscriptionEventType::SubscriptionCreated.is_churn());
        assert!(!SubscriptionEventType::Unknown.is_churn());
    }

    #[test]
    fn test_unknown_event_type_deserializes() {
        let parsed: SubscriptionEventType =
            serde_json::from_str("\"plan_renamed_v2\"").unwrap();
        assert_eq!(parsed, SubscriptionEventType::Unknown);
    }
}
