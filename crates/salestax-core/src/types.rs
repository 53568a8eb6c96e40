//! # Domain Types
//!
//! Core domain types used throughout the tax calculator.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────────┐                     │
//! │  │      TaxRule        │   │ CalculationRequest  │                     │
//! │  │  ─────────────────  │   │  ─────────────────  │                     │
//! │  │  jurisdiction_code  │◄──│  jurisdiction_code  │                     │
//! │  │  base_rate          │   │  subtotal           │                     │
//! │  │  max_local_rate     │   │  local_rate?        │                     │
//! │  │  exempt_categories  │   │  postal_code?       │                     │
//! │  └─────────────────────┘   │  product_category?  │                     │
//! │                            └──────────┬──────────┘                     │
//! │  ┌─────────────────┐                  │ calculate_tax                  │
//! │  │    TaxRate      │                  ▼                                │
//! │  │  ─────────────  │       ┌─────────────────────┐                     │
//! │  │  fraction       │       │ CalculationResult   │                     │
//! │  │  0.04 = 4%      │       │  state/local/total  │                     │
//! │  └─────────────────┘       └─────────────────────┘                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented as a decimal fraction.
///
/// ## Why a Fraction?
/// The rule table contains rates such as 4.225% (Missouri) and 6.875%
/// (Minnesota). Basis points cannot hold those, a decimal fraction can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// Creates a tax rate from a fraction (0.0725 = 7.25%).
    #[inline]
    pub const fn from_fraction(fraction: Decimal) -> Self {
        TaxRate(fraction)
    }

    /// Creates a tax rate from basis points (825 = 8.25%).
    #[inline]
    pub fn from_bps(bps: u32) -> Self {
        TaxRate(Decimal::new(i64::from(bps), 4))
    }

    /// Returns the rate as a fraction.
    #[inline]
    pub const fn fraction(&self) -> Decimal {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(Decimal::ZERO)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if tax rate is strictly positive.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Strips trailing zeros (`0.020` → `0.02`).
    #[inline]
    pub fn normalize(&self) -> Self {
        TaxRate(self.0.normalize())
    }
}

// =============================================================================
// Tax Rule
// =============================================================================

/// The tax rule for one jurisdiction.
///
/// Loaded once when the `RuleStore` is built and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRule {
    /// Display name ("New York").
    pub jurisdiction_name: String,

    /// Unique uppercase code ("NY").
    pub jurisdiction_code: String,

    /// State-level rate applied to the subtotal.
    #[ts(as = "String")]
    pub base_rate: TaxRate,

    /// If false, any nonzero local rate is rejected.
    pub local_tax_permitted: bool,

    /// Ceiling for the caller-supplied local rate. Absent means 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>", optional)]
    pub max_local_rate: Option<TaxRate>,

    /// Informational; echoed in results, never used in arithmetic.
    #[serde(default)]
    pub has_special_districts: bool,

    /// Product categories exempt from both state and local tax.
    #[serde(default)]
    pub exempt_categories: BTreeSet<String>,

    /// Stored for reference; rule selection ignores it.
    #[ts(as = "String")]
    pub effective_date: NaiveDate,

    /// Free-form remarks about the rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub notes: Option<String>,
}

impl TaxRule {
    /// The local-rate ceiling, treating an absent maximum as zero.
    #[inline]
    pub fn local_rate_ceiling(&self) -> TaxRate {
        self.max_local_rate.unwrap_or_default()
    }

    /// Checks whether `category` is fully exempt in this jurisdiction.
    #[inline]
    pub fn is_exempt(&self, category: &str) -> bool {
        self.exempt_categories.contains(category)
    }
}

// =============================================================================
// Calculation Request
// =============================================================================

/// Inputs for one tax calculation.
///
/// ## Example
/// ```rust
/// use rust_decimal_macros::dec;
/// use salestax_core::types::{CalculationRequest, TaxRate};
///
/// let request = CalculationRequest::new("NY", dec!(100))
///     .with_local_rate(TaxRate::from_fraction(dec!(0.045)))
///     .with_postal_code("10001");
/// assert_eq!(request.postal_code.as_deref(), Some("10001"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CalculationRequest {
    /// Jurisdiction code; matched case-insensitively.
    pub jurisdiction_code: String,

    /// Taxable amount. Negative values are accepted as-is.
    #[ts(as = "String")]
    pub subtotal: Money,

    /// Additional local rate. Absent means 0.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub local_rate: Option<TaxRate>,

    /// Five-digit postal code. An empty string counts as absent.
    #[serde(default)]
    pub postal_code: Option<String>,

    /// Product category checked against the rule's exemptions.
    /// An empty string counts as absent.
    #[serde(default)]
    pub product_category: Option<String>,
}

impl CalculationRequest {
    /// Creates a request with only the required fields.
    pub fn new(jurisdiction_code: impl Into<String>, subtotal: impl Into<Money>) -> Self {
        CalculationRequest {
            jurisdiction_code: jurisdiction_code.into(),
            subtotal: subtotal.into(),
            local_rate: None,
            postal_code: None,
            product_category: None,
        }
    }

    /// Sets the local rate.
    pub fn with_local_rate(mut self, rate: TaxRate) -> Self {
        self.local_rate = Some(rate);
        self
    }

    /// Sets the postal code.
    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    /// Sets the product category.
    pub fn with_product_category(mut self, category: impl Into<String>) -> Self {
        self.product_category = Some(category.into());
        self
    }

    /// Local rate with the default applied.
    #[inline]
    pub fn effective_local_rate(&self) -> TaxRate {
        self.local_rate.unwrap_or_default()
    }

    /// Postal code, or `None` when missing or empty.
    #[inline]
    pub fn postal_code(&self) -> Option<&str> {
        self.postal_code.as_deref().filter(|code| !code.is_empty())
    }

    /// Product category, or `None` when missing or empty.
    #[inline]
    pub fn product_category(&self) -> Option<&str> {
        self.product_category.as_deref().filter(|c| !c.is_empty())
    }
}

// =============================================================================
// Calculation Result
// =============================================================================

/// Outcome of a tax calculation.
///
/// `exempt_categories` and `has_special_districts` are only populated on the
/// primary path; a degraded fallback result leaves both `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CalculationResult {
    #[ts(as = "String")]
    pub subtotal: Money,
    #[ts(as = "String")]
    pub state_tax: Money,
    #[ts(as = "String")]
    pub local_tax: Money,
    #[ts(as = "String")]
    pub total_tax: Money,
    #[ts(as = "String")]
    pub total: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub exempt_categories: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub has_special_districts: Option<bool>,
}

impl CalculationResult {
    /// True when the result came from the base-rate-only fallback.
    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.exempt_categories.is_none() && self.has_special_districts.is_none()
    }
}

// =============================================================================
// Configuration Types
// =============================================================================

/// What the calculator does when the primary path fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Replace the error with a base-rate-only result.
    #[default]
    Degrade,
    /// Return the primary error to the caller.
    Strict,
}

impl std::fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackPolicy::Degrade => write!(f, "degrade"),
            FallbackPolicy::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "degrade" => Ok(FallbackPolicy::Degrade),
            "strict" => Ok(FallbackPolicy::Strict),
            other => Err(format!("Unknown fallback policy: {}", other)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
