//! Time-based billing

pub mod model;

pub use model::{format_amount, BillingCalculator, DurationTier, PricingTable};
