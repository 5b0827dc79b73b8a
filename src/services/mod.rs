//! Service layer modules for external integrations.
//!
//! Holds the price band store synchronized against Postgres and Redis.

pub mod pricing_store;

pub use pricing_store::PricingStore;
