//! Billing calculator
//!
//! Pure and stateless: a duration is priced by an exact tier match, or
//! pro-rata from the hourly rate otherwise. All amounts are in cents.

use std::collections::HashSet;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::shared::errors::DomainError;

/// Flat price for a fixed duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationTier {
    pub minutes: i32,
    /// Price in cents
    pub price: i64,
}

impl DurationTier {
    pub const fn new(minutes: i32, price: i64) -> Self {
        Self { minutes, price }
    }
}

/// Venue price list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingTable {
    pub tiers: Vec<DurationTier>,
    /// Rate for durations outside the tier table, in cents per hour
    pub hourly_rate: i64,
    /// ISO 4217 code
    pub currency: String,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                DurationTier::new(60, 500),
                DurationTier::new(120, 900),
                DurationTier::new(180, 1200),
                DurationTier::new(300, 1800),
            ],
            hourly_rate: 500,
            currency: "USD".to_string(),
        }
    }
}

impl PricingTable {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.hourly_rate < 0 {
            return Err(DomainError::Validation(
                "Hourly rate must not be negative".to_string(),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(DomainError::Validation("Currency must be set".to_string()));
        }
        let mut seen = HashSet::new();
        for tier in &self.tiers {
            if tier.minutes <= 0 {
                return Err(DomainError::Validation(format!(
                    "Tier duration must be positive, got {}",
                    tier.minutes
                )));
            }
            if tier.price < 0 {
                return Err(DomainError::Validation(format!(
                    "Tier price for {} minutes must not be negative",
                    tier.minutes
                )));
            }
            if !seen.insert(tier.minutes) {
                return Err(DomainError::Validation(format!(
                    "Duplicate tier for {} minutes",
                    tier.minutes
                )));
            }
        }
        Ok(())
    }
}

/// Prices rental durations against a validated [`PricingTable`]
#[derive(Debug, Clone)]
pub struct BillingCalculator {
    table: PricingTable,
}

impl BillingCalculator {
    pub fn new(table: PricingTable) -> Result<Self, DomainError> {
        table.validate()?;
        Ok(Self { table })
    }

    pub fn table(&self) -> &PricingTable {
        &self.table
    }

    pub fn currency(&self) -> &str {
        &self.table.currency
    }

    /// Price of `duration_minutes` in cents.
    pub fn price_for(&self, duration_minutes: i32) -> Result<i64, DomainError> {
        if duration_minutes <= 0 {
            return Err(DomainError::Validation(format!(
                "Duration must be positive, got {} minutes",
                duration_minutes
            )));
        }

        if let Some(tier) = self
            .table
            .tiers
            .iter()
            .find(|t| t.minutes == duration_minutes)
        {
            return Ok(tier.price);
        }

        let cents = Decimal::from(duration_minutes) * Decimal::from(self.table.hourly_rate)
            / Decimal::from(60);
        cents
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or_else(|| {
                DomainError::Validation(format!(
                    "Price for {} minutes is out of range",
                    duration_minutes
                ))
            })
    }
}

/// Render cents as `"12.50 USD"`.
pub fn format_amount(cents: i64, currency: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, currency)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> BillingCalculator {
        BillingCalculator::new(PricingTable::default()).unwrap()
    }

    #[test]
    fn exact_tiers_win() {
        let c = calc();
        assert_eq!(c.price_for(60).unwrap(), 500);
        assert_eq!(c.price_for(120).unwrap(), 900);
        assert_eq!(c.price_for(180).unwrap(), 1200);
        assert_eq!(c.price_for(300).unwrap(), 1800);
    }

    #[test]
    fn other_durations_are_pro_rata() {
        let c = calc();
        assert_eq!(c.price_for(90).unwrap(), 750);
        assert_eq!(c.price_for(30).unwrap(), 250);
        assert_eq!(c.price_for(240).unwrap(), 2000);
    }

    #[test]
    fn pro_rata_rounds_half_away_from_zero() {
        let c = calc();
        // 10 min = 83.33.. cents
        assert_eq!(c.price_for(10).unwrap(), 83);
        // 3 min = 25 cents exactly, 1 min = 8.33.. cents
        assert_eq!(c.price_for(3).unwrap(), 25);
        assert_eq!(c.price_for(1).unwrap(), 8);

        let odd = BillingCalculator::new(PricingTable {
            tiers: vec![],
            hourly_rate: 30,
            currency: "USD".into(),
        })
        .unwrap();
        // 1 min at 30 cents/h = 0.5 cents
        assert_eq!(odd.price_for(1).unwrap(), 1);
    }

    #[test]
    fn non_positive_durations_are_rejected() {
        let c = calc();
        assert!(matches!(c.price_for(0), Err(DomainError::Validation(_))));
        assert!(matches!(c.price_for(-15), Err(DomainError::Validation(_))));
    }

    #[test]
    fn table_validation() {
        let mut t = PricingTable::default();
        t.tiers.push(DurationTier::new(60, 100));
        assert!(BillingCalculator::new(t).is_err());

        let mut t = PricingTable::default();
        t.tiers.push(DurationTier::new(0, 100));
        assert!(t.validate().is_err());

        let mut t = PricingTable::default();
        t.hourly_rate = -1;
        assert!(t.validate().is_err());
    }

    #[test]
    fn formatting() {
        assert_eq!(format_amount(500, "USD"), "5.00 USD");
        assert_eq!(format_amount(1005, "KWD"), "10.05 KWD");
        assert_eq!(format_amount(-5, "USD"), "-0.05 USD");
    }
}
