//! Subscription state and the per-request entitlement check.

mod entitlement;
pub mod repository;

pub use entitlement::EntitlementGate;
pub use repository::SubscriptionRepository;
