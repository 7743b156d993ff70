//! Real-estate marketplace core: property listings, customer leads and
//! viewings, messaging and notifications, and subscription-gated agent
//! features paid through Paystack.

pub mod accounts;
pub mod auth;
pub mod billing;
pub mod config;
pub mod error;
pub mod leads;
pub mod listings;
pub mod mail;
pub mod marketplace;
pub mod messaging;
pub mod shared;
pub mod store;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

pub use marketplace::Marketplace;
