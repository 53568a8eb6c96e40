//! # salestax-core: Pure Sales Tax Calculation
//!
//! This crate computes sales tax for a transaction from a jurisdiction code,
//! a subtotal, and an optional local rate, postal code and product category.
//! Everything here is pure computation with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sales Tax Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Caller (checkout, invoicing, ...)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Arc<TaxCalculator>                     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              salestax-runtime (composition root)                │   │
//! │  │        config.toml, rule files, tracing subscriber              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ salestax-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ calculator │  │   rules   │  │   │
//! │  │   │  TaxRule  │  │   Money   │  │   cache    │  │ RuleStore │  │   │
//! │  │   │  Request  │  │  rounding │  │  fallback  │  │  51 rows  │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO FILES • NO ENV • DETERMINISTIC                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (TaxRule, CalculationRequest, CalculationResult)
//! - [`money`] - Decimal money with 2-place rounding
//! - [`rules`] - The immutable rule store and built-in table
//! - [`calculator`] - Validation, memoization and fallback
//! - [`validation`] - Postal code and rule table checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal_macros::dec;
//! use salestax_core::{CalculationRequest, Money, RuleStore, TaxCalculator};
//!
//! let calculator = TaxCalculator::new(RuleStore::us_states());
//!
//! // Oregon has no sales tax
//! let result = calculator
//!     .calculate_tax(&CalculationRequest::new("OR", dec!(100)))
//!     .unwrap();
//! assert_eq!(result.total, Money::from_decimal(dec!(100)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculator;
pub mod error;
pub mod money;
pub mod rules;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use calculator::TaxCalculator;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use rules::RuleStore;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Decimal places kept on state and local tax amounts.
pub const TAX_DECIMAL_PLACES: u32 = 2;

/// Length of a US postal code (no ZIP+4).
pub const POSTAL_CODE_LEN: usize = 5;
