//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │    19.99 × 0.0725 = 1.4492749999999999 → rounds to $1.44  ❌            │
//! │                                                                         │
//! │  OUR SOLUTION: Base-10 fixed point (rust_decimal)                       │
//! │    19.99 × 0.0725 = 1.449275 exactly → rounds to $1.45  ✅              │
//! │                                                                         │
//! │  Rates such as 6.875% are not whole basis points, so integer cents     │
//! │  with bps rates cannot represent the rule table.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding
//! Tax amounts are rounded to 2 places with **midpoint away from zero**
//! (`0.125 → 0.13`, `-0.125 → -0.13`) and always carry exactly 2 places,
//! so zero tax reads `0.00`. Rounding happens only on the state and local
//! tax amounts, never on sums.
//!
//! ## Usage
//! ```rust
//! use rust_decimal_macros::dec;
//! use salestax_core::money::Money;
//! use salestax_core::types::TaxRate;
//!
//! let subtotal = Money::from_cents(1999); // $19.99
//! let tax = subtotal.calculate_tax(TaxRate::from_fraction(dec!(0.0725)));
//! assert_eq!(tax, Some(Money::from_cents(145)));
//! ```

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::types::TaxRate;
use crate::TAX_DECIMAL_PLACES;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount held as an exact base-10 decimal.
///
/// ## Design Decisions
/// - **Decimal, not cents**: subtotals are echoed back unrounded, so the
///   type must hold whatever precision the caller supplied
/// - **Transparent serde**: serializes as the decimal string (`"106.00"`)
/// - **Checked arithmetic**: overflow surfaces as `InvalidNumericInput`
///   instead of a panic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps a decimal amount.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use salestax_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // $10.99
    /// assert_eq!(price.to_string(), "$10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, TAX_DECIMAL_PLACES))
    }

    /// Converts a float amount coming from an untyped boundary (JSON, FFI).
    ///
    /// NaN and infinities have no decimal representation and fail with
    /// `InvalidNumericInput`.
    ///
    /// ## Example
    /// ```rust
    /// use salestax_core::money::Money;
    ///
    /// assert!(Money::try_from_f64(100.0).is_ok());
    /// assert!(Money::try_from_f64(f64::NAN).is_err());
    /// ```
    pub fn try_from_f64(value: f64) -> CoreResult<Self> {
        Decimal::from_f64(value)
            .map(Money)
            .ok_or_else(|| CoreError::InvalidNumericInput {
                field: "subtotal".to_string(),
                reason: format!("{value} is not a finite decimal amount"),
            })
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value at cent scale (`0.00`).
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::from_parts(0, 0, 0, false, TAX_DECIMAL_PLACES))
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Calculates tax at `rate`, rounded to cents.
    ///
    /// Returns `None` if the product cannot be represented.
    ///
    /// ## User Workflow
    /// ```text
    /// Subtotal: $100.00
    ///      │
    ///      ▼
    /// calculate_tax(4%) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// State tax: $4.00
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Option<Money> {
        self.0
            .checked_mul(rate.fraction())
            .map(|tax| Money(tax).round_to_cents())
    }

    /// Rounds to 2 decimal places, midpoint away from zero, padding to
    /// exactly 2 places (`4` → `4.00`).
    pub fn round_to_cents(&self) -> Money {
        let mut rounded = self
            .0
            .round_dp_with_strategy(TAX_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(TAX_DECIMAL_PLACES);
        Money(rounded)
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money rounded to cents, e.g. `$10.99` or `-$5.50`.
///
/// This is for logs and debugging; callers format for their own UI.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        write!(f, "{}${:.2}", sign, self.round_to_cents().0.abs())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
