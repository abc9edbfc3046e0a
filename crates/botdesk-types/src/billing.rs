//! Subscription and plan types.
//!
//! A subscription row per tenant, written only by the payment-processor
//! webhook and the admin tooling. Entitlement (`is the widget allowed to
//! serve AI responses`) is derived from this row on every relay call and is
//! never cached or stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Subscription status as reported by the payment processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    Canceled,
    PastDue,
    Paused,
    Inactive,
}

impl SubscriptionStatus {
    /// Statuses under which the tenant's widget may serve AI responses.
    pub fn is_serviceable(self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::Trialing => write!(f, "trialing"),
            SubscriptionStatus::Canceled => write!(f, "canceled"),
            SubscriptionStatus::PastDue => write!(f, "past_due"),
            SubscriptionStatus::Paused => write!(f, "paused"),
            SubscriptionStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SubscriptionStatus::Active),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "paused" => Ok(SubscriptionStatus::Paused),
            "inactive" => Ok(SubscriptionStatus::Inactive),
            other => Err(format!("invalid subscription status: '{other}'")),
        }
    }
}

/// Billing plan a tenant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Trial,
    Starter,
    Growth,
    HighEnd,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plan::Trial => write!(f, "trial"),
            Plan::Starter => write!(f, "starter"),
            Plan::Growth => write!(f, "growth"),
            Plan::HighEnd => write!(f, "high_end"),
        }
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trial" => Ok(Plan::Trial),
            "starter" => Ok(Plan::Starter),
            "growth" => Ok(Plan::Growth),
            "high_end" => Ok(Plan::HighEnd),
            other => Err(format!("invalid plan: '{other}'")),
        }
    }
}

/// A tenant's subscription record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub tenant_id: Uuid,
    pub status: SubscriptionStatus,
    pub plan: Plan,
    /// End of the free trial; only meaningful while `plan` is `Trial`.
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub processor_subscription_id: Option<String>,
    pub processor_customer_id: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether this subscription entitles the tenant to AI responses right now.
    ///
    /// A trial plan is additionally bounded by `trial_ends_at`; a trial row
    /// with no end timestamp is treated as expired.
    pub fn entitles_at(&self, now: DateTime<Utc>) -> bool {
        if !self.status.is_serviceable() {
            return false;
        }
        match self.plan {
            Plan::Trial => self.trial_ends_at.is_some_and(|end| end > now),
            _ => true,
        }
    }
}
