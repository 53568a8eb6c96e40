//! # salestax-runtime: Composition Root
//!
//! Turns configuration into one shared [`TaxCalculator`]. This is the only
//! place that touches the filesystem, the environment, or the global
//! tracing subscriber.
//!
//! ## Startup Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         TaxContext::bootstrap                           │
//! │                                                                         │
//! │  TaxConfig::load ──► init_tracing(logging.filter)                       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  resolve_rule_store(rules.path)                                         │
//! │        │   None ──► RuleStore::us_states()                              │
//! │        │   Some ──► load_rule_store(path) (whole file rejected on error)│
//! │        ▼                                                                │
//! │  TaxCalculator::new(store).with_policy(calculator.fallback)             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Arc<TaxCalculator> ──► cloned into every caller                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - `salestax.toml` plus `SALESTAX_*` overrides
//! - [`rules_file`] - TOML rule tables
//! - [`telemetry`] - tracing subscriber
//! - [`error`] - Startup error types
//!
//! ## Example Usage
//! ```rust,no_run
//! use salestax_runtime::TaxContext;
//! use salestax_core::{CalculationRequest, Money};
//!
//! let context = TaxContext::bootstrap(None)?;
//! let calculator = context.calculator();
//! let request = CalculationRequest::new("NY", Money::from_cents(10000));
//! let result = calculator.calculate_tax(&request)?;
//! println!("total: {}", result.total);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use salestax_core::TaxCalculator;

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod rules_file;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::TaxConfig;
pub use error::{RuntimeError, RuntimeResult};
pub use rules_file::{load_rule_store, resolve_rule_store, RuleFile};
pub use telemetry::init_tracing;

// =============================================================================
// Tax Context
// =============================================================================

/// The loaded configuration and the calculator built from it.
///
/// Construct once at startup and hand out [`TaxContext::calculator`]
/// clones; every clone shares the same rule table and cache.
#[derive(Debug, Clone)]
pub struct TaxContext {
    config: TaxConfig,
    calculator: Arc<TaxCalculator>,
}

impl TaxContext {
    /// Builds the calculator described by `config`.
    ///
    /// Does not touch the tracing subscriber.
    pub fn from_config(config: TaxConfig) -> RuntimeResult<Self> {
        config.validate()?;

        let store = resolve_rule_store(config.rules_path())?;
        let calculator = TaxCalculator::new(store).with_policy(config.fallback_policy());

        info!(
            rules = calculator.list_rules().len(),
            policy = %config.fallback_policy(),
            "Tax calculator ready"
        );

        Ok(TaxContext {
            config,
            calculator: Arc::new(calculator),
        })
    }

    /// Loads config, installs logging, and builds the calculator.
    ///
    /// An already-installed tracing subscriber is kept.
    pub fn bootstrap(config_path: Option<PathBuf>) -> RuntimeResult<Self> {
        let config = TaxConfig::load(config_path)?;

        if let Err(e) = init_tracing(config.log_filter()) {
            warn!("Keeping existing tracing subscriber: {}", e);
        }

        Self::from_config(config)
    }

    /// Shared handle to the calculator.
    pub fn calculator(&self) -> Arc<TaxCalculator> {
        Arc::clone(&self.calculator)
    }

    pub fn config(&self) -> &TaxConfig {
        &self.config
    }
}
