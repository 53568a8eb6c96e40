//! # Tax Calculator
//!
//! Validates a request, memoizes results, and degrades to a base-rate-only
//! fallback when the primary calculation fails.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         calculate_tax(request)                          │
//! │                                                                         │
//! │  PRIMARY                                                                │
//! │  1. postal code present? ── not 5 digits ──► InvalidPostalCode ──┐     │
//! │  2. cache hit? ─────────── yes ──► return cached result           │     │
//! │  3. rule lookup ────────── none ──► UnknownJurisdiction ─────────┤     │
//! │  4. local > 0 && !permitted ──────► LocalTaxNotPermitted ────────┤     │
//! │  5. local > ceiling ──────────────► LocalRateExceedsMaximum ─────┤     │
//! │  6. state/local amounts (exempt → 0), round, sum                  │     │
//! │  7. cache store, return                                           │     │
//! │                                                                   │     │
//! │  FALLBACK  (policy = Degrade)  ◄──────────────────────────────────┘     │
//! │  state = round(subtotal × base_rate or 0), local = 0, not cached        │
//! │       │                                                                 │
//! │       ├── Ok  ──► degraded result (no exemptions / districts fields)   │
//! │       └── Err ──► return the PRIMARY error                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! The cache sits behind a `Mutex`, so one calculator can be shared through
//! an `Arc`. Check-then-insert is not atomic: two threads missing on the same
//! key both compute, and the second insert overwrites an identical value.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::rules::RuleStore;
use crate::types::{CalculationRequest, CalculationResult, FallbackPolicy, TaxRate, TaxRule};
use crate::validation::validate_postal_code;

// =============================================================================
// Cache Key
// =============================================================================

/// Composite memoization key.
///
/// Optional fields are defaulted (rate 0, empty strings). The subtotal is
/// keyed on its exact text because the result echoes it: `100` and `100.00`
/// compare equal as decimals but must not share an entry. Rates are
/// normalized since they never appear in the result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    jurisdiction_code: String,
    subtotal: String,
    local_rate: TaxRate,
    postal_code: String,
    product_category: String,
}

impl CacheKey {
    fn from_request(request: &CalculationRequest) -> Self {
        CacheKey {
            jurisdiction_code: request.jurisdiction_code.to_ascii_uppercase(),
            subtotal: request.subtotal.amount().to_string(),
            local_rate: request.effective_local_rate().normalize(),
            postal_code: request.postal_code().unwrap_or_default().to_string(),
            product_category: request.product_category().unwrap_or_default().to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.jurisdiction_code,
            self.subtotal,
            self.local_rate.fraction(),
            self.postal_code,
            self.product_category
        )
    }
}

// =============================================================================
// Tax Calculator
// =============================================================================

/// Sales tax calculator over a fixed `RuleStore`.
///
/// Build one per process (see `salestax-runtime`'s `TaxContext`) and share
/// it; the cache only pays off when the same instance sees repeat requests.
#[derive(Debug)]
pub struct TaxCalculator {
    rules: RuleStore,
    policy: FallbackPolicy,
    cache: Mutex<HashMap<CacheKey, CalculationResult>>,
}

impl TaxCalculator {
    /// Creates a calculator with the default `Degrade` policy.
    pub fn new(rules: RuleStore) -> Self {
        TaxCalculator {
            rules,
            policy: FallbackPolicy::default(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Sets what happens when the primary path fails.
    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The active fallback policy.
    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Calculates sales tax for `request`.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal_macros::dec;
    /// use salestax_core::{CalculationRequest, Money, RuleStore, TaxCalculator, TaxRate};
    ///
    /// let calculator = TaxCalculator::new(RuleStore::us_states());
    /// let request = CalculationRequest::new("AL", dec!(100))
    ///     .with_local_rate(TaxRate::from_fraction(dec!(0.02)));
    ///
    /// let result = calculator.calculate_tax(&request).unwrap();
    /// assert_eq!(result.state_tax, Money::from_cents(400));
    /// assert_eq!(result.local_tax, Money::from_cents(200));
    /// assert_eq!(result.total, Money::from_cents(10600));
    /// ```
    ///
    /// ## Errors
    /// With `FallbackPolicy::Degrade` an error is returned only when the
    /// fallback also fails; it is the error raised by the primary path.
    /// With `FallbackPolicy::Strict` every primary error is returned.
    pub fn calculate_tax(&self, request: &CalculationRequest) -> CoreResult<CalculationResult> {
        let primary_error = match self.calculate_primary(request) {
            Ok(result) => return Ok(result),
            Err(error) => error,
        };

        if self.policy == FallbackPolicy::Strict {
            debug!(
                jurisdiction = %request.jurisdiction_code,
                error = %primary_error,
                "Tax calculation rejected (strict policy)"
            );
            return Err(primary_error);
        }

        match self.calculate_fallback(request) {
            Ok(result) => {
                warn!(
                    jurisdiction = %request.jurisdiction_code,
                    error = %primary_error,
                    state_tax = %result.state_tax,
                    "Tax calculation degraded to base-rate fallback"
                );
                Ok(result)
            }
            Err(fallback_error) => {
                warn!(
                    jurisdiction = %request.jurisdiction_code,
                    error = %primary_error,
                    fallback_error = %fallback_error,
                    "Tax fallback failed"
                );
                Err(primary_error)
            }
        }
    }

    /// Finds the rule for `code`, ignoring case.
    pub fn get_rule(&self, code: &str) -> Option<&TaxRule> {
        self.rules.lookup(code)
    }

    /// Returns a copy of every rule in table order.
    pub fn list_rules(&self) -> Vec<TaxRule> {
        self.rules.list_all()
    }

    /// Drops every memoized result.
    pub fn clear_cache(&self) {
        let mut cache = self.cache();
        let entries = cache.len();
        cache.clear();
        info!(entries, "Tax cache cleared");
    }

    /// Number of memoized results.
    pub fn cached_entries(&self) -> usize {
        self.cache().len()
    }

    // =========================================================================
    // Stages
    // =========================================================================

    fn calculate_primary(&self, request: &CalculationRequest) -> CoreResult<CalculationResult> {
        if let Some(postal_code) = request.postal_code() {
            validate_postal_code(postal_code)
                .map_err(|_| CoreError::InvalidPostalCode(postal_code.to_string()))?;
        }

        let key = CacheKey::from_request(request);
        if let Some(cached) = self.cache().get(&key) {
            debug!(key = %key, "Tax cache hit");
            return Ok(cached.clone());
        }

        let rule = self
            .rules
            .lookup(&request.jurisdiction_code)
            .ok_or_else(|| CoreError::UnknownJurisdiction(request.jurisdiction_code.clone()))?;

        let local_rate = request.effective_local_rate();
        if local_rate.is_positive() && !rule.local_tax_permitted {
            return Err(CoreError::LocalTaxNotPermitted {
                jurisdiction: rule.jurisdiction_code.clone(),
                requested: local_rate.fraction(),
            });
        }

        let ceiling = rule.local_rate_ceiling();
        if local_rate > ceiling {
            return Err(CoreError::LocalRateExceedsMaximum {
                jurisdiction: rule.jurisdiction_code.clone(),
                requested: local_rate.fraction(),
                maximum: ceiling.fraction(),
            });
        }

        let result = compute(rule, request, local_rate)?;

        debug!(key = %key, total_tax = %result.total_tax, "Tax computed");
        self.cache().insert(key, result.clone());
        Ok(result)
    }

    /// Base-rate-only estimate. A missing rule means a zero rate.
    fn calculate_fallback(&self, request: &CalculationRequest) -> CoreResult<CalculationResult> {
        let base_rate = self
            .rules
            .lookup(&request.jurisdiction_code)
            .map(|rule| rule.base_rate)
            .unwrap_or_default();

        let subtotal = request.subtotal;
        let state_tax = subtotal
            .calculate_tax(base_rate)
            .ok_or_else(|| overflow("state_tax"))?;
        let total = subtotal
            .checked_add(state_tax)
            .ok_or_else(|| overflow("total"))?;

        Ok(CalculationResult {
            subtotal,
            state_tax,
            local_tax: Money::zero(),
            total_tax: state_tax,
            total,
            exempt_categories: None,
            has_special_districts: None,
        })
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<CacheKey, CalculationResult>> {
        // Entries are pure functions of their key, so a panic elsewhere
        // cannot leave a wrong value behind.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TaxCalculator {
    fn default() -> Self {
        TaxCalculator::new(RuleStore::us_states())
    }
}

/// Step 6: amounts for a request that passed every check.
fn compute(
    rule: &TaxRule,
    request: &CalculationRequest,
    local_rate: TaxRate,
) -> CoreResult<CalculationResult> {
    let subtotal = request.subtotal;
    let exempt = request
        .product_category()
        .is_some_and(|category| rule.is_exempt(category));

    let (state_tax, local_tax) = if exempt {
        (Money::zero(), Money::zero())
    } else {
        let state_tax = subtotal
            .calculate_tax(rule.base_rate)
            .ok_or_else(|| overflow("state_tax"))?;
        let local_tax = if rule.local_tax_permitted {
            subtotal
                .calculate_tax(local_rate)
                .ok_or_else(|| overflow("local_tax"))?
        } else {
            Money::zero()
        };
        (state_tax, local_tax)
    };

    let total_tax = state_tax
        .checked_add(local_tax)
        .ok_or_else(|| overflow("total_tax"))?;
    let total = subtotal
        .checked_add(total_tax)
        .ok_or_else(|| overflow("total"))?;

    Ok(CalculationResult {
        subtotal,
        state_tax,
        local_tax,
        total_tax,
        total,
        exempt_categories: Some(rule.exempt_categories.clone()),
        has_special_districts: Some(rule.has_special_districts),
    })
}

fn overflow(field: &str) -> CoreError {
    CoreError::InvalidNumericInput {
        field: field.to_string(),
        reason: "amount exceeds the representable decimal range".to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn calculator() -> TaxCalculator {
        TaxCalculator::new(RuleStore::us_states())
    }

    fn strict() -> TaxCalculator {
        calculator().with_policy(FallbackPolicy::Strict)
    }

    fn rate(fraction: Decimal) -> TaxRate {
        TaxRate::from_fraction(fraction)
    }

    fn money(amount: Decimal) -> Money {
        Money::from_decimal(amount)
    }

    // -------------------------------------------------------------------------
    // Primary path
    // -------------------------------------------------------------------------

    #[test]
    fn test_state_and_local_tax() {
        let request = CalculationRequest::new("AL", dec!(100)).with_local_rate(rate(dec!(0.02)));
        let result = calculator().calculate_tax(&request).unwrap();

        assert_eq!(result.subtotal, money(dec!(100)));
        assert_eq!(result.state_tax, money(dec!(4)));
        assert_eq!(result.local_tax, money(dec!(2)));
        assert_eq!(result.total_tax, money(dec!(6)));
        assert_eq!(result.total, money(dec!(106)));
        assert!(!result.is_fallback());
        assert_eq!(result.has_special_districts, Some(true));
        assert!(result
            .exempt_categories
            .as_ref()
            .is_some_and(|set| set.contains("groceries")));
    }

    #[test]
    fn test_zero_base_rate_jurisdiction() {
        let result = calculator()
            .calculate_tax(&CalculationRequest::new("OR", dec!(100)))
            .unwrap();

        assert!(result.state_tax.is_zero());
        assert!(result.local_tax.is_zero());
        assert!(result.total_tax.is_zero());
        assert_eq!(result.total, money(dec!(100)));
        assert_eq!(result.has_special_districts, Some(false));
    }

    #[test]
    fn test_explicit_zero_local_rate_on_no_local_jurisdiction() {
        // Only a positive local rate trips the not-permitted check.
        let request = CalculationRequest::new("OR", dec!(100)).with_local_rate(TaxRate::zero());
        let result = calculator().calculate_tax(&request).unwrap();
        assert!(!result.is_fallback());
        assert!(result.local_tax.is_zero());

        let result = strict().calculate_tax(&request).unwrap();
        assert!(!result.is_fallback());
    }

    #[test]
    fn test_amounts_serialize_with_two_places() {
        let result = calculator()
            .calculate_tax(&CalculationRequest::new("OR", dec!(100)))
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["state_tax"], "0.00");
        assert_eq!(json["local_tax"], "0.00");
        assert_eq!(json["total_tax"], "0.00");
        assert_eq!(json["total"], "100.00");

        let result = calculator()
            .calculate_tax(&CalculationRequest::new("XX", dec!(100)))
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["state_tax"], "0.00");
        assert_eq!(json["total"], "100.00");
    }

    #[test]
    fn test_lowercase_code_uses_primary_path() {
        let result = calculator()
            .calculate_tax(&CalculationRequest::new("al", dec!(100)))
            .unwrap();
        assert_eq!(result.state_tax, money(dec!(4)));
        assert!(!result.is_fallback());
    }

    #[test]
    fn test_local_rate_at_ceiling_is_allowed() {
        let request = CalculationRequest::new("NY", dec!(100)).with_local_rate(rate(dec!(0.045)));
        let result = calculator().calculate_tax(&request).unwrap();
        assert_eq!(result.local_tax, money(dec!(4.50)));
        assert_eq!(result.total, money(dec!(108.50)));
        assert!(!result.is_fallback());
    }

    #[test]
    fn test_valid_postal_code_accepted() {
        let request = CalculationRequest::new("NY", dec!(100))
            .with_local_rate(rate(dec!(0.02)))
            .with_postal_code("12345");
        let result = calculator().calculate_tax(&request).unwrap();
        assert_eq!(result.total_tax, money(dec!(6)));
        assert!(!result.is_fallback());
    }

    #[test]
    fn test_full_exemption() {
        let request = CalculationRequest::new("NY", dec!(100))
            .with_local_rate(rate(dec!(0.045)))
            .with_product_category("groceries");
        let result = calculator().calculate_tax(&request).unwrap();

        assert!(result.state_tax.is_zero());
        assert!(result.local_tax.is_zero());
        assert!(result.total_tax.is_zero());
        assert_eq!(result.total, result.subtotal);
        assert!(!result.is_fallback());
    }

    #[test]
    fn test_non_exempt_category_is_taxed() {
        // Tennessee only lists "groceries-reduced"
        let request = CalculationRequest::new("TN", dec!(100)).with_product_category("groceries");
        let result = calculator().calculate_tax(&request).unwrap();
        assert_eq!(result.state_tax, money(dec!(7)));
    }

    #[test]
    fn test_rounding_is_midpoint_away_from_zero() {
        // 3.125 × 0.04 = 0.125 → 0.13 (banker's rounding would give 0.12)
        let result = calculator()
            .calculate_tax(&CalculationRequest::new("AL", dec!(3.125)))
            .unwrap();
        assert_eq!(result.state_tax.amount(), dec!(0.13));
        assert_eq!(result.total.amount(), dec!(3.255));
    }

    #[test]
    fn test_state_and_local_rounded_independently() {
        // 19.99 × 0.0725 = 1.449275 → 1.45
        // 19.99 × 0.02   = 0.3998   → 0.40
        let request = CalculationRequest::new("CA", dec!(19.99)).with_local_rate(rate(dec!(0.02)));
        let result = calculator().calculate_tax(&request).unwrap();
        assert_eq!(result.state_tax.amount(), dec!(1.45));
        assert_eq!(result.local_tax.amount(), dec!(0.40));
        assert_eq!(result.total_tax.amount(), dec!(1.85));
        assert_eq!(result.total.amount(), dec!(21.84));
    }

    #[test]
    fn test_negative_subtotal_is_accepted() {
        let result = calculator()
            .calculate_tax(&CalculationRequest::new("AL", dec!(-100)))
            .unwrap();
        assert_eq!(result.state_tax, money(dec!(-4)));
        assert_eq!(result.total, money(dec!(-104)));
        assert!(!result.is_fallback());
    }

    // -------------------------------------------------------------------------
    // Fallback path
    // -------------------------------------------------------------------------

    #[test]
    fn test_local_rate_above_maximum_falls_back() {
        let request = CalculationRequest::new("AL", dec!(100)).with_local_rate(rate(dec!(0.08)));
        let result = calculator().calculate_tax(&request).unwrap();

        assert_eq!(result.state_tax, money(dec!(4)));
        assert!(result.local_tax.is_zero());
        assert_eq!(result.total_tax, money(dec!(4)));
        assert_eq!(result.total, money(dec!(104)));
        assert!(result.is_fallback());
    }

    #[test]
    fn test_unknown_jurisdiction_falls_back_to_zero_rate() {
        let result = calculator()
            .calculate_tax(&CalculationRequest::new("XX", dec!(100)))
            .unwrap();

        assert!(result.state_tax.is_zero());
        assert!(result.local_tax.is_zero());
        assert_eq!(result.total, money(dec!(100)));
        assert!(result.is_fallback());
    }

    #[test]
    fn test_malformed_postal_code_falls_back() {
        // Regression: the postal code failure is swallowed and the caller
        // sees a base-rate-only result, not an error.
        let request = CalculationRequest::new("NY", dec!(100))
            .with_local_rate(rate(dec!(0.02)))
            .with_postal_code("1234");
        let result = calculator().calculate_tax(&request).unwrap();

        assert_eq!(result.state_tax, money(dec!(4)));
        assert!(result.local_tax.is_zero());
        assert_eq!(result.total, money(dec!(104)));
        assert!(result.is_fallback());
    }

    #[test]
    fn test_local_tax_not_permitted_falls_back() {
        let request = CalculationRequest::new("CT", dec!(100)).with_local_rate(rate(dec!(0.01)));
        let result = calculator().calculate_tax(&request).unwrap();
        assert_eq!(result.state_tax, money(dec!(6.35)));
        assert_eq!(result.total, money(dec!(106.35)));
        assert!(result.is_fallback());
    }

    #[test]
    fn test_fallback_ignores_exemptions() {
        let request = CalculationRequest::new("AL", dec!(100))
            .with_local_rate(rate(dec!(0.08)))
            .with_product_category("groceries");
        let result = calculator().calculate_tax(&request).unwrap();
        assert_eq!(result.state_tax, money(dec!(4)));
        assert!(result.is_fallback());
    }

    #[test]
    fn test_fallback_failure_surfaces_primary_error() {
        // Primary rejects the local rate; the fallback then overflows on
        // subtotal + tax. The caller gets the primary error.
        let request =
            CalculationRequest::new("AL", Decimal::MAX).with_local_rate(rate(dec!(0.08)));
        let err = calculator().calculate_tax(&request).unwrap_err();
        assert_eq!(
            err,
            CoreError::LocalRateExceedsMaximum {
                jurisdiction: "AL".to_string(),
                requested: dec!(0.08),
                maximum: dec!(0.07),
            }
        );
    }

    #[test]
    fn test_overflow_in_both_paths_is_invalid_numeric_input() {
        let err = calculator()
            .calculate_tax(&CalculationRequest::new("AL", Decimal::MAX))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidNumericInput { .. }));
    }

    #[test]
    fn test_fallback_results_are_not_cached() {
        let calc = calculator();
        let request = CalculationRequest::new("AL", dec!(100)).with_local_rate(rate(dec!(0.08)));
        calc.calculate_tax(&request).unwrap();
        calc.calculate_tax(&CalculationRequest::new("XX", dec!(100))).unwrap();
        assert_eq!(calc.cached_entries(), 0);
    }

    // -------------------------------------------------------------------------
    // Strict policy
    // -------------------------------------------------------------------------

    #[test]
    fn test_strict_policy_surfaces_primary_errors() {
        let calc = strict();
        assert_eq!(calc.policy(), FallbackPolicy::Strict);

        let err = calc
            .calculate_tax(&CalculationRequest::new("XX", dec!(100)))
            .unwrap_err();
        assert_eq!(err, CoreError::UnknownJurisdiction("XX".to_string()));

        let err = calc
            .calculate_tax(
                &CalculationRequest::new("OR", dec!(100)).with_local_rate(rate(dec!(0.01))),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::LocalTaxNotPermitted { .. }));

        let err = calc
            .calculate_tax(
                &CalculationRequest::new("AL", dec!(100)).with_local_rate(rate(dec!(0.08))),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::LocalRateExceedsMaximum { .. }));

        let err = calc
            .calculate_tax(&CalculationRequest::new("NY", dec!(100)).with_postal_code("1234"))
            .unwrap_err();
        assert_eq!(err, CoreError::InvalidPostalCode("1234".to_string()));
    }

    #[test]
    fn test_strict_policy_still_calculates_valid_requests() {
        let result = strict()
            .calculate_tax(&CalculationRequest::new("TX", dec!(200)))
            .unwrap();
        assert_eq!(result.state_tax, money(dec!(12.50)));
    }

    // -------------------------------------------------------------------------
    // Cache
    // -------------------------------------------------------------------------

    #[test]
    fn test_identical_request_is_served_from_cache() {
        let calc = calculator();
        let request = CalculationRequest::new("NY", dec!(59.99))
            .with_local_rate(rate(dec!(0.045)))
            .with_postal_code("10001");

        let first = calc.calculate_tax(&request).unwrap();
        assert_eq!(calc.cached_entries(), 1);

        let second = calc.calculate_tax(&request).unwrap();
        assert_eq!(calc.cached_entries(), 1);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_clear_cache_forces_recompute() {
        let calc = calculator();
        let request = CalculationRequest::new("WA", dec!(10));

        let before = calc.calculate_tax(&request).unwrap();
        calc.clear_cache();
        assert_eq!(calc.cached_entries(), 0);

        let after = calc.calculate_tax(&request).unwrap();
        assert_eq!(calc.cached_entries(), 1);
        assert_eq!(before, after);
    }

    #[test]
    fn test_output_does_not_depend_on_cache_state() {
        let request = CalculationRequest::new("AL", dec!(100.00));
        let cold = serde_json::to_string(&calculator().calculate_tax(&request).unwrap()).unwrap();

        let warm_calc = calculator();
        warm_calc
            .calculate_tax(&CalculationRequest::new("AL", dec!(100)))
            .unwrap();
        let warm = serde_json::to_string(&warm_calc.calculate_tax(&request).unwrap()).unwrap();

        assert_eq!(cold, warm);
        assert!(warm.contains(r#""subtotal":"100.00""#), "{warm}");
        assert_eq!(warm_calc.cached_entries(), 2);
    }

    #[test]
    fn test_cache_key_defaults_absent_fields() {
        let calc = calculator();
        calc.calculate_tax(&CalculationRequest::new("AL", dec!(100)))
            .unwrap();
        calc.calculate_tax(&CalculationRequest::new("al", dec!(100)))
            .unwrap();
        calc.calculate_tax(
            &CalculationRequest::new("AL", dec!(100))
                .with_local_rate(TaxRate::zero())
                .with_postal_code(""),
        )
        .unwrap();
        assert_eq!(calc.cached_entries(), 1);
    }

    #[test]
    fn test_cache_key_distinguishes_fields() {
        let calc = calculator();
        let base = CalculationRequest::new("NY", dec!(100));
        calc.calculate_tax(&base).unwrap();
        calc.calculate_tax(&base.clone().with_postal_code("10001"))
            .unwrap();
        calc.calculate_tax(&base.clone().with_product_category("groceries"))
            .unwrap();
        calc.calculate_tax(&base.with_local_rate(rate(dec!(0.01))))
            .unwrap();
        assert_eq!(calc.cached_entries(), 4);
    }

    #[test]
    fn test_cache_key_display() {
        let key = CacheKey::from_request(
            &CalculationRequest::new("ny", dec!(100.00))
                .with_local_rate(rate(dec!(0.020)))
                .with_postal_code("10001"),
        );
        assert_eq!(key.to_string(), "NY-100.00-0.02-10001-");
    }

    // -------------------------------------------------------------------------
    // Auxiliary operations
    // -------------------------------------------------------------------------

    #[test]
    fn test_get_rule_and_list_rules() {
        let calc = calculator();
        assert_eq!(calc.get_rule("ny").unwrap().jurisdiction_name, "New York");
        assert!(calc.get_rule("XX").is_none());

        let rules = calc.list_rules();
        assert_eq!(rules.len(), 51);
        assert_eq!(rules[0].jurisdiction_code, "AL");
    }

    #[test]
    fn test_shared_across_threads() {
        let calc = Arc::new(calculator());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let calc = Arc::clone(&calc);
                std::thread::spawn(move || {
                    calc.calculate_tax(&CalculationRequest::new("IL", dec!(80)))
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            let result = handle.join().unwrap();
            assert_eq!(result.state_tax, money(dec!(5)));
        }
        assert_eq!(calc.cached_entries(), 1);
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Within the local ceiling the result is exactly the sum of the
            /// two independently rounded amounts.
            #[test]
            fn totals_are_sum_of_rounded_parts(cents in 0i64..100_000_000, local_bps in 0u32..=700) {
                let subtotal = Money::from_cents(cents);
                let local = TaxRate::from_bps(local_bps);
                let request = CalculationRequest::new("AL", subtotal).with_local_rate(local);

                let result = calculator().calculate_tax(&request).unwrap();

                let base = TaxRate::from_fraction(dec!(0.04));
                let expected_state = subtotal.calculate_tax(base).unwrap();
                let expected_local = subtotal.calculate_tax(local).unwrap();
                prop_assert!(!result.is_fallback());
                prop_assert_eq!(result.state_tax, expected_state);
                prop_assert_eq!(result.local_tax, expected_local);
                prop_assert_eq!(
                    result.total_tax.amount(),
                    expected_state.amount() + expected_local.amount()
                );
                prop_assert_eq!(
                    result.total.amount(),
                    subtotal.amount() + result.total_tax.amount()
                );
            }

            /// Exempt categories zero every tax amount for any subtotal and
            /// any permitted local rate.
            #[test]
            fn exempt_category_is_never_taxed(cents in -100_000_000i64..100_000_000, local_bps in 0u32..=450) {
                let request = CalculationRequest::new("NY", Money::from_cents(cents))
                    .with_local_rate(TaxRate::from_bps(local_bps))
                    .with_product_category("prescription-drugs");

                let result = calculator().calculate_tax(&request).unwrap();
                prop_assert!(result.total_tax.is_zero());
                prop_assert_eq!(result.total, result.subtotal);
            }
        }
    }
}
