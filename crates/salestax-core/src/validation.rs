//! # Validation Module
//!
//! Input validation utilities for requests and rule tables.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Rule table (once, at RuleStore construction)                 │
//! │  ├── validate_rule: code format, name, rate ranges                     │
//! │  └── duplicate codes rejected by RuleStore::from_rules                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Request (every calculate_tax call)                           │
//! │  ├── validate_postal_code: exactly 5 ASCII digits                      │
//! │  └── local-rate checks against the matched rule (calculator)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use salestax_core::validation::{validate_jurisdiction_code, validate_postal_code};
//!
//! assert!(validate_postal_code("12345").is_ok());
//! assert!(validate_jurisdiction_code("NY").is_ok());
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::types::{TaxRate, TaxRule};
use crate::POSTAL_CODE_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest jurisdiction code accepted in a rule table.
const MAX_CODE_LEN: usize = 8;

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a US postal code.
///
/// ## Rules
/// - Exactly 5 characters
/// - Every character is an ASCII digit (no ZIP+4, no spaces)
///
/// ## Example
/// ```rust
/// use salestax_core::validation::validate_postal_code;
///
/// assert!(validate_postal_code("02139").is_ok());
/// assert!(validate_postal_code("1234").is_err());
/// assert!(validate_postal_code("12345-6789").is_err());
/// ```
pub fn validate_postal_code(postal_code: &str) -> ValidationResult<()> {
    if postal_code.len() != POSTAL_CODE_LEN || !postal_code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "postal_code".to_string(),
            reason: format!("must be exactly {} digits", POSTAL_CODE_LEN),
        });
    }

    Ok(())
}

// =============================================================================
// Rule Validators
// =============================================================================

/// Validates a jurisdiction code as stored in a rule table.
///
/// ## Rules
/// - Must not be empty
/// - At most 8 characters
/// - Uppercase ASCII letters and digits only (lookups uppercase the query)
pub fn validate_jurisdiction_code(code: &str) -> ValidationResult<()> {
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "jurisdiction_code".to_string(),
        });
    }

    if code.len() > MAX_CODE_LEN
        || !code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(ValidationError::InvalidFormat {
            field: "jurisdiction_code".to_string(),
            reason: format!(
                "must be 1-{} uppercase letters or digits, got '{}'",
                MAX_CODE_LEN, code
            ),
        });
    }

    Ok(())
}

/// Validates a rate fraction.
///
/// ## Rules
/// - Between 0 and 1 inclusive (0% to 100%)
pub fn validate_rate(field: &str, rate: TaxRate) -> ValidationResult<()> {
    let value = rate.fraction();
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ValidationError::RateOutOfRange {
            field: field.to_string(),
            value,
        });
    }

    Ok(())
}

/// Validates a single tax rule.
///
/// Cross-rule checks (duplicate codes) happen in `RuleStore::from_rules`.
pub fn validate_rule(rule: &TaxRule) -> ValidationResult<()> {
    validate_jurisdiction_code(&rule.jurisdiction_code)?;

    if rule.jurisdiction_name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: format!("jurisdiction_name ({})", rule.jurisdiction_code),
        });
    }

    validate_rate("base_rate", rule.base_rate)?;
    if let Some(max) = rule.max_local_rate {
        validate_rate("max_local_rate", max)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
