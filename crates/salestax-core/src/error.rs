//! # Error Types
//!
//! Domain-specific error types for salestax-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  salestax-core errors (this file)                                      │
//! │  ├── CoreError        - Calculation failures                           │
//! │  └── ValidationError  - Rule table validation failures                 │
//! │                                                                         │
//! │  salestax-runtime errors (separate crate)                              │
//! │  └── RuntimeError     - Config / rule file loading                     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → RuntimeError → Caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## When Callers Actually See a CoreError
//! The calculator degrades to a base-rate-only result whenever the primary
//! path fails, so a `CoreError` from `calculate_tax` only escapes when the
//! fallback ALSO fails (or when the calculator runs with the strict policy).
//! The variant returned is always the one raised by the primary path.

use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Tax calculation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Postal code is present but is not exactly 5 ASCII digits.
    #[error("Invalid postal code format: '{0}'")]
    InvalidPostalCode(String),

    /// No rule matches the supplied jurisdiction code.
    #[error("Unknown jurisdiction: {0}")]
    UnknownJurisdiction(String),

    /// A nonzero local rate was requested where local tax is disallowed.
    ///
    /// ## When This Occurs
    /// ```text
    /// calculate_tax("OR", 100.00, local_rate: 0.01)
    ///      │
    ///      ▼
    /// Oregon: local_tax_permitted = false
    ///      │
    ///      ▼
    /// LocalTaxNotPermitted { jurisdiction: "OR", requested: 0.01 }
    /// ```
    #[error("Local tax not permitted in {jurisdiction} (requested rate {requested})")]
    LocalTaxNotPermitted {
        jurisdiction: String,
        requested: Decimal,
    },

    /// Local rate is above the jurisdiction's ceiling.
    #[error("Local rate {requested} exceeds maximum {maximum} for {jurisdiction}")]
    LocalRateExceedsMaximum {
        jurisdiction: String,
        requested: Decimal,
        maximum: Decimal,
    },

    /// An input or derived amount is not a representable decimal.
    ///
    /// ## When This Occurs
    /// - A NaN or infinite float is converted into `Money`
    /// - `subtotal + tax` overflows the decimal range
    #[error("Invalid numeric input for {field}: {reason}")]
    InvalidNumericInput { field: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Rule table validation errors.
///
/// Raised while building a `RuleStore`, before any calculation runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Invalid format (e.g., lowercase jurisdiction code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Rate fraction outside 0..=1.
    #[error("{field} must be between 0 and 1, got {value}")]
    RateOutOfRange { field: String, value: Decimal },

    /// Duplicate value (e.g., two rules for one jurisdiction).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
