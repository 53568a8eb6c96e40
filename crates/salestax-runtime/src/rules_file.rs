//! # Rule Files
//!
//! Loads a jurisdiction rule table from TOML in place of the built-in one.
//! Rates and dates are quoted so no value passes through a float:
//!
//! ```toml
//! [[rule]]
//! jurisdiction_name = "Alabama"
//! jurisdiction_code = "AL"
//! base_rate = "0.04"
//! local_tax_permitted = true
//! max_local_rate = "0.07"
//! has_special_districts = true
//! exempt_categories = ["groceries", "prescription-drugs"]
//! effective_date = "2024-01-01"
//! ```
//!
//! A file that fails any rule table check is rejected whole.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use salestax_core::{RuleStore, TaxRule};

use crate::error::RuntimeResult;

/// On-disk shape of a rule table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleFile {
    #[serde(rename = "rule", default)]
    pub rules: Vec<TaxRule>,
}

impl RuleFile {
    pub fn from_toml_str(contents: &str) -> RuntimeResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Snapshot of an existing store, in table order.
    pub fn from_store(store: &RuleStore) -> Self {
        RuleFile {
            rules: store.list_all(),
        }
    }

    pub fn to_toml_string(&self) -> RuntimeResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates the rules and builds a store from them.
    pub fn into_store(self) -> RuntimeResult<RuleStore> {
        Ok(RuleStore::from_rules(self.rules)?)
    }
}

/// Reads and validates the rule file at `path`.
pub fn load_rule_store(path: &Path) -> RuntimeResult<RuleStore> {
    let contents = std::fs::read_to_string(path)?;
    let store = RuleFile::from_toml_str(&contents)?.into_store()?;
    info!(?path, rules = store.len(), "Loaded tax rule table");
    Ok(store)
}

/// Loads `path` when given, otherwise the built-in table.
pub fn resolve_rule_store(path: Option<&Path>) -> RuntimeResult<RuleStore> {
    match path {
        Some(path) => load_rule_store(path),
        None => {
            debug!("Using built-in US state rule table");
            Ok(RuleStore::us_states())
        }
    }
}
