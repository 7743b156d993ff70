//! Agent subscriptions, Paystack payments and featured-listing boosts.
//!
//! Plans cap how many listings and boosts an agent may hold; other areas ask
//! [`BillingService::check_feature_limit`] before creating either.

pub mod domain;
pub mod gateway;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AgentSubscription, Feature, FeatureLimits, FeaturedListing, InitiateOutcome, Payment,
    PaymentStatus, PlanConfig, StartOutcome, SubscriptionPlan, VerifyQuery, BILLING_PERIOD_DAYS,
    BOOST_DURATION_DAYS,
};
pub use gateway::{
    sign, verify_signature, GatewayError, InitializeRequest, InitializedTransaction,
    PaymentGateway, PaystackClient, VerifiedTransaction, SIGNATURE_HEADER,
};
pub use repository::BillingRepository;
pub use router::billing_router;
pub use service::{BillingError, BillingService, GatewayPayment, WebhookError, WebhookOutcome};
