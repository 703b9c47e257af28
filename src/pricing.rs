//! Pricing
//!
//! The pricing rules applied to a cart: a flat tax rate, a free-shipping
//! threshold, and a standard shipping rate, plus the derived [`Totals`]
//! quadruple recomputed from scratch after every cart mutation.

use std::{fs, io, path::Path};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading pricing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading a pricing file
    #[error("Failed to read pricing file: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Negative threshold or shipping rate
    #[error("Invalid amount for {field}: {amount}")]
    InvalidAmount {
        /// Offending field name
        field: &'static str,
        /// Offending value
        amount: Decimal,
    },
}

/// Pricing rules for a storefront.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    /// Flat tax rate applied to the subtotal.
    pub tax_rate: Percentage,

    /// Subtotal at or above which shipping is waived.
    pub free_shipping_threshold: Decimal,

    /// Shipping charged below the threshold.
    pub standard_shipping: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            tax_rate: Percentage::from(0.08),
            free_shipping_threshold: Decimal::new(5_000, 2),
            standard_shipping: Decimal::new(599, 2),
        }
    }
}

/// Wrapper for pricing settings in YAML
#[derive(Debug, Deserialize)]
pub struct PricingFixture {
    /// Tax rate (e.g., "8%" or "0.08")
    pub tax_rate: String,

    /// Free-shipping threshold
    pub free_shipping_threshold: Decimal,

    /// Standard shipping rate
    pub standard_shipping: Decimal,
}

impl TryFrom<PricingFixture> for PricingConfig {
    type Error = ConfigError;

    fn try_from(fixture: PricingFixture) -> Result<Self, Self::Error> {
        if fixture.free_shipping_threshold.is_sign_negative() {
            return Err(ConfigError::InvalidAmount {
                field: "free_shipping_threshold",
                amount: fixture.free_shipping_threshold,
            });
        }

        if fixture.standard_shipping.is_sign_negative() {
            return Err(ConfigError::InvalidAmount {
                field: "standard_shipping",
                amount: fixture.standard_shipping,
            });
        }

        Ok(PricingConfig {
            tax_rate: parse_percentage(&fixture.tax_rate)?,
            free_shipping_threshold: fixture.free_shipping_threshold,
            standard_shipping: fixture.standard_shipping,
        })
    }
}

impl PricingConfig {
    /// Load pricing configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, or a
    /// value fails validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let fixture: PricingFixture = serde_norway::from_str(&contents)?;

        fixture.try_into()
    }
}

/// Parse percentage string (e.g., "8%" or "0.08") into a `Percentage`
///
/// Accepts two formats:
/// - Percentage format: "8%" for 8%
/// - Decimal format: "0.08" for 8%
///
/// # Errors
///
/// Returns an error if the string cannot be parsed.
pub fn parse_percentage(s: &str) -> Result<Percentage, ConfigError> {
    let trimmed = s.trim();

    if let Some(percent_str) = trimmed.strip_suffix('%') {
        let value = percent_str
            .trim()
            .parse::<f64>()
            .map_err(|_err| ConfigError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value / 100.0))
    } else {
        let value = trimmed
            .parse::<f64>()
            .map_err(|_err| ConfigError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value))
    }
}

/// Derived pricing fields for a cart.
///
/// Always a pure function of the current line list; recomputed from scratch
/// after every mutation, never adjusted incrementally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of price × quantity over all lines, rounded to 2 decimal places.
    pub subtotal: Decimal,

    /// Tax on the subtotal, rounded to 2 decimal places.
    pub tax: Decimal,

    /// Shipping: zero at or above the free-shipping threshold.
    pub shipping: Decimal,

    /// Subtotal + tax + shipping, rounded to 2 decimal places.
    pub total: Decimal,
}

impl Totals {
    /// Derive the full quadruple from a raw (unrounded) subtotal.
    ///
    /// A subtotal exactly at the free-shipping threshold ships free.
    #[must_use]
    pub fn from_subtotal(raw_subtotal: Decimal, config: &PricingConfig) -> Self {
        let subtotal = raw_subtotal.round_dp(2);
        let tax = (config.tax_rate * subtotal).round_dp(2);

        let shipping = if subtotal >= config.free_shipping_threshold {
            Decimal::ZERO
        } else {
            config.standard_shipping
        };

        let total = (subtotal + tax + shipping).round_dp(2);

        Totals {
            subtotal,
            tax,
            shipping,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn default_config_matches_storefront_constants() {
        let config = PricingConfig::default();

        assert_eq!(config.tax_rate, Percentage::from(0.08));
        assert_eq!(config.free_shipping_threshold, Decimal::new(5_000, 2));
        assert_eq!(config.standard_shipping, Decimal::new(599, 2));
    }

    #[test]
    fn parse_percentage_accepts_percentage_format() -> TestResult {
        assert_eq!(parse_percentage("8%")?, Percentage::from(0.08));
        assert_eq!(parse_percentage("  15%  ")?, Percentage::from(0.15));

        Ok(())
    }

    #[test]
    fn parse_percentage_accepts_decimal_format() -> TestResult {
        assert_eq!(parse_percentage("0.08")?, Percentage::from(0.08));

        Ok(())
    }

    #[test]
    fn parse_percentage_rejects_invalid_format() {
        assert!(
            matches!(
                parse_percentage("invalid"),
                Err(ConfigError::InvalidPercentage(_))
            ),
            "expected InvalidPercentage"
        );
    }

    #[test]
    fn fixture_converts_into_config() -> TestResult {
        let fixture: PricingFixture = serde_norway::from_str(
            "tax_rate: 8%\nfree_shipping_threshold: 50.00\nstandard_shipping: 5.99\n",
        )?;

        let config: PricingConfig = fixture.try_into()?;

        assert_eq!(config, PricingConfig::default());

        Ok(())
    }

    #[test]
    fn fixture_rejects_negative_amounts() -> TestResult {
        let fixture: PricingFixture = serde_norway::from_str(
            "tax_rate: 8%\nfree_shipping_threshold: -1\nstandard_shipping: 5.99\n",
        )?;

        let result: Result<PricingConfig, _> = fixture.try_into();

        assert!(
            matches!(
                result,
                Err(ConfigError::InvalidAmount {
                    field: "free_shipping_threshold",
                    ..
                })
            ),
            "expected InvalidAmount"
        );

        Ok(())
    }

    #[test]
    fn totals_below_threshold_charge_standard_shipping() {
        let totals = Totals::from_subtotal(Decimal::new(4_000, 2), &PricingConfig::default());

        assert_eq!(totals.subtotal, Decimal::new(4_000, 2));
        assert_eq!(totals.tax, Decimal::new(320, 2)); // 8% of 40.00
        assert_eq!(totals.shipping, Decimal::new(599, 2));
        assert_eq!(totals.total, Decimal::new(4_919, 2));
    }

    #[test]
    fn totals_at_threshold_exactly_ship_free() {
        let totals = Totals::from_subtotal(Decimal::new(5_000, 2), &PricingConfig::default());

        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::new(5_400, 2)); // 50.00 + 4.00 tax
    }

    #[test]
    fn totals_above_threshold_ship_free() {
        let totals = Totals::from_subtotal(Decimal::new(6_000, 2), &PricingConfig::default());

        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::new(6_480, 2));
    }

    #[test]
    fn totals_round_to_two_decimal_places() {
        let config = PricingConfig {
            tax_rate: Percentage::from(0.0825),
            ..PricingConfig::default()
        };

        // 8.25% of 19.99 is 1.649175; rounds to 1.65.
        let totals = Totals::from_subtotal(Decimal::new(1_999, 2), &config);

        assert_eq!(totals.tax, Decimal::new(165, 2));
        assert_eq!(totals.total, Decimal::new(2_763, 2)); // 19.99 + 1.65 + 5.99
    }
}
