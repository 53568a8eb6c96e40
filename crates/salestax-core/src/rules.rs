//! # Rule Store
//!
//! Immutable table of per-jurisdiction tax rules.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Rule Store Lifecycle                            │
//! │                                                                         │
//! │  RuleStore::us_states()          RuleStore::from_rules(rules)           │
//! │  (built-in table below)          (e.g. parsed from a TOML file)         │
//! │           │                                │                            │
//! │           │                                ▼                            │
//! │           │                      validate_rule + duplicate check        │
//! │           │                                │                            │
//! │           └──────────────┬─────────────────┘                            │
//! │                          ▼                                              │
//! │               RuleStore { rules, index }  ── read-only from here on     │
//! │                          │                                              │
//! │             lookup("ny") ──► uppercase ──► index ──► &TaxRule           │
//! │             list_all()  ──► cloned Vec<TaxRule> in table order          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no insert/update/delete: a new table means a new
//! `RuleStore` (and a new calculator, so no cached result outlives its rule).

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{CoreResult, ValidationError};
use crate::types::{TaxRate, TaxRule};
use crate::validation::validate_rule;

// =============================================================================
// Rule Store
// =============================================================================

/// Jurisdiction code → tax rule, fixed at construction.
#[derive(Debug, Clone)]
pub struct RuleStore {
    /// Rules in table order (what `list_all` returns).
    rules: Vec<TaxRule>,
    /// Uppercase code → position in `rules`.
    index: HashMap<String, usize>,
}

impl RuleStore {
    /// Builds a store from an arbitrary rule table.
    ///
    /// ## Errors
    /// - `Validation(Required)` if the table is empty
    /// - Any `validate_rule` failure
    /// - `Validation(Duplicate)` if two rules share a code
    pub fn from_rules(rules: Vec<TaxRule>) -> CoreResult<Self> {
        if rules.is_empty() {
            return Err(ValidationError::Required {
                field: "rules".to_string(),
            }
            .into());
        }

        let mut index = HashMap::with_capacity(rules.len());
        for (position, rule) in rules.iter().enumerate() {
            validate_rule(rule)?;
            if index
                .insert(rule.jurisdiction_code.clone(), position)
                .is_some()
            {
                return Err(ValidationError::Duplicate {
                    field: "jurisdiction_code".to_string(),
                    value: rule.jurisdiction_code.clone(),
                }
                .into());
            }
        }

        Ok(RuleStore { rules, index })
    }

    /// Builds the built-in table: the 50 US states plus the District of
    /// Columbia, all effective 2024-01-01.
    pub fn us_states() -> Self {
        let effective_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN);

        let rules: Vec<TaxRule> = US_STATE_RULES
            .iter()
            .map(|seed| seed.to_rule(effective_date))
            .collect();
        let index = rules
            .iter()
            .enumerate()
            .map(|(position, rule)| (rule.jurisdiction_code.clone(), position))
            .collect();

        RuleStore { rules, index }
    }

    /// Finds the rule for `code`, ignoring case.
    pub fn lookup(&self, code: &str) -> Option<&TaxRule> {
        self.index
            .get(code.to_ascii_uppercase().as_str())
            .map(|&position| &self.rules[position])
    }

    /// Returns a copy of every rule in table order.
    pub fn list_all(&self) -> Vec<TaxRule> {
        self.rules.clone()
    }

    /// Iterates the jurisdiction codes in table order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.jurisdiction_code.as_str())
    }

    /// Number of jurisdictions.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if the table holds no rules (never the case for a built store).
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        RuleStore::us_states()
    }
}

// =============================================================================
// Built-in Table
// =============================================================================

/// Compact form of one built-in rule.
///
/// Local tax is permitted exactly when a local ceiling is present.
struct RuleSeed {
    name: &'static str,
    code: &'static str,
    base_rate: Decimal,
    max_local_rate: Option<Decimal>,
    special_districts: bool,
    exempt: &'static [&'static str],
}

impl RuleSeed {
    fn to_rule(&self, effective_date: NaiveDate) -> TaxRule {
        TaxRule {
            jurisdiction_name: self.name.to_string(),
            jurisdiction_code: self.code.to_string(),
            base_rate: TaxRate::from_fraction(self.base_rate),
            local_tax_permitted: self.max_local_rate.is_some(),
            max_local_rate: self.max_local_rate.map(TaxRate::from_fraction),
            has_special_districts: self.special_districts,
            exempt_categories: self.exempt.iter().map(|c| c.to_string()).collect::<BTreeSet<_>>(),
            effective_date,
            notes: None,
        }
    }
}

const NONE: &[&str] = &[];
const GROCERIES: &[&str] = &["groceries"];
const RX: &[&str] = &["prescription-drugs"];
const GROCERIES_RX: &[&str] = &["groceries", "prescription-drugs"];
const GROCERIES_REDUCED: &[&str] = &["groceries-reduced"];
const GROCERIES_REDUCED_RX: &[&str] = &["groceries-reduced", "prescription-drugs"];

macro_rules! seed {
    ($name:literal, $code:literal, $base:literal, local: $max:literal, special: $special:literal, $exempt:expr) => {
        RuleSeed {
            name: $name,
            code: $code,
            base_rate: dec!($base),
            max_local_rate: Some(dec!($max)),
            special_districts: $special,
            exempt: $exempt,
        }
    };
    ($name:literal, $code:literal, $base:literal, no_local, special: $special:literal, $exempt:expr) => {
        RuleSeed {
            name: $name,
            code: $code,
            base_rate: dec!($base),
            max_local_rate: None,
            special_districts: $special,
            exempt: $exempt,
        }
    };
}

#[rustfmt::skip]
const US_STATE_RULES: &[RuleSeed] = &[
    seed!("Alabama",              "AL", 0.04,    local: 0.07,   special: true,  GROCERIES_RX),
    seed!("Alaska",               "AK", 0,       local: 0.07,   special: false, NONE),
    seed!("Arizona",              "AZ", 0.056,   local: 0.05,   special: true,  GROCERIES),
    seed!("Arkansas",             "AR", 0.065,   local: 0.05,   special: true,  GROCERIES_RX),
    seed!("California",           "CA", 0.0725,  local: 0.02,   special: true,  GROCERIES_RX),
    seed!("Colorado",             "CO", 0.029,   local: 0.08,   special: true,  GROCERIES_RX),
    seed!("Connecticut",          "CT", 0.0635,  no_local,      special: false, GROCERIES_RX),
    seed!("Delaware",             "DE", 0,       no_local,      special: false, NONE),
    seed!("District of Columbia", "DC", 0.06,    no_local,      special: false, GROCERIES_RX),
    seed!("Florida",              "FL", 0.06,    local: 0.02,   special: false, GROCERIES_RX),
    seed!("Georgia",              "GA", 0.04,    local: 0.04,   special: true,  RX),
    seed!("Hawaii",               "HI", 0.04,    local: 0.005,  special: false, RX),
    seed!("Idaho",                "ID", 0.06,    local: 0.03,   special: true,  RX),
    seed!("Illinois",             "IL", 0.0625,  local: 0.04,   special: true,  RX),
    seed!("Indiana",              "IN", 0.07,    no_local,      special: false, GROCERIES_RX),
    seed!("Iowa",                 "IA", 0.06,    local: 0.01,   special: false, GROCERIES_RX),
    seed!("Kansas",               "KS", 0.065,   local: 0.04,   special: true,  RX),
    seed!("Kentucky",             "KY", 0.06,    no_local,      special: false, GROCERIES_RX),
    seed!("Louisiana",            "LA", 0.0445,  local: 0.07,   special: true,  RX),
    seed!("Maine",                "ME", 0.055,   no_local,      special: false, GROCERIES_RX),
    seed!("Maryland",             "MD", 0.06,    no_local,      special: false, GROCERIES_RX),
    seed!("Massachusetts",        "MA", 0.0625,  no_local,      special: false, GROCERIES_RX),
    seed!("Michigan",             "MI", 0.06,    no_local,      special: false, GROCERIES_RX),
    seed!("Minnesota",            "MN", 0.06875, local: 0.02,   special: true,  GROCERIES_RX),
    seed!("Mississippi",          "MS", 0.07,    no_local,      special: false, RX),
    seed!("Missouri",             "MO", 0.04225, local: 0.05,   special: true,  GROCERIES_RX),
    seed!("Montana",              "MT", 0,       local: 0.03,   special: false, NONE),
    seed!("Nebraska",             "NE", 0.055,   local: 0.02,   special: false, GROCERIES_RX),
    seed!("Nevada",               "NV", 0.0685,  local: 0.0125, special: true,  GROCERIES_RX),
    seed!("New Hampshire",        "NH", 0,       no_local,      special: false, NONE),
    seed!("New Jersey",           "NJ", 0.06625, no_local,      special: false, GROCERIES_RX),
    seed!("New Mexico",           "NM", 0.05125, local: 0.0375, special: true,  GROCERIES_RX),
    seed!("New York",             "NY", 0.04,    local: 0.045,  special: true,  GROCERIES_RX),
    seed!("North Carolina",       "NC", 0.0475,  local: 0.0275, special: false, RX),
    seed!("North Dakota",         "ND", 0.05,    local: 0.03,   special: true,  GROCERIES),
    seed!("Ohio",                 "OH", 0.0575,  local: 0.0275, special: true,  GROCERIES_RX),
    seed!("Oklahoma",             "OK", 0.045,   local: 0.06,   special: true,  RX),
    seed!("Oregon",               "OR", 0,       no_local,      special: false, NONE),
    seed!("Pennsylvania",         "PA", 0.06,    local: 0.02,   special: false, GROCERIES_RX),
    seed!("Rhode Island",         "RI", 0.07,    no_local,      special: false, GROCERIES_RX),
    seed!("South Carolina",       "SC", 0.06,    local: 0.03,   special: true,  RX),
    seed!("South Dakota",         "SD", 0.045,   local: 0.045,  special: true,  GROCERIES),
    seed!("Tennessee",            "TN", 0.07,    local: 0.0275, special: false, GROCERIES_REDUCED),
    seed!("Texas",                "TX", 0.0625,  local: 0.02,   special: true,  GROCERIES_RX),
    seed!("Utah",                 "UT", 0.0485,  local: 0.02,   special: true,  GROCERIES_REDUCED),
    seed!("Vermont",              "VT", 0.06,    local: 0.01,   special: false, GROCERIES_RX),
    seed!("Virginia",             "VA", 0.043,   local: 0.01,   special: true,  GROCERIES_REDUCED_RX),
    seed!("Washington",           "WA", 0.065,   local: 0.04,   special: true,  GROCERIES_RX),
    seed!("West Virginia",        "WV", 0.06,    local: 0.01,   special: false, GROCERIES_RX),
    seed!("Wisconsin",            "WI", 0.05,    local: 0.005,  special: false, GROCERIES_RX),
    seed!("Wyoming",              "WY", 0.04,    local: 0.02,   special: true,  GROCERIES_RX),
];

// =============================================================================
// Unit Tests
// =============================================================================
