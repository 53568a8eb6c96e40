//! # Runtime Configuration
//!
//! Configuration for the calculator, its rule table, and logging.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SALESTAX_FALLBACK=strict                                           │
//! │     SALESTAX_RULES_PATH=/etc/salestax/rules.toml                       │
//! │     SALESTAX_LOG=info,salestax=debug                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     explicit path, else $SALESTAX_CONFIG, else                         │
//! │     ~/.config/salestax/salestax.toml (Linux)                           │
//! │     ~/Library/Application Support/com.salestax.salestax/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     degrade fallback, built-in rule table, info logging                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [calculator]
//! fallback = "degrade"  # degrade | strict
//!
//! [rules]
//! path = "/etc/salestax/rules.toml"  # omit to use the built-in table
//!
//! [logging]
//! filter = "info,salestax=debug"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use salestax_core::FallbackPolicy;

use crate::error::{RuntimeError, RuntimeResult};

/// Overrides the fallback policy (`degrade` | `strict`).
pub const ENV_FALLBACK: &str = "SALESTAX_FALLBACK";
/// Overrides the rule table path.
pub const ENV_RULES_PATH: &str = "SALESTAX_RULES_PATH";
/// Overrides the log filter directive.
pub const ENV_LOG: &str = "SALESTAX_LOG";
/// Config file location when no explicit path is given.
pub const ENV_CONFIG_PATH: &str = "SALESTAX_CONFIG";

// =============================================================================
// Sections
// =============================================================================

/// Calculator behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatorSettings {
    /// What to do when the primary calculation fails.
    #[serde(default)]
    pub fallback: FallbackPolicy,
}

/// Where the rule table comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSettings {
    /// TOML rule file. `None` selects the built-in table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info,salestax=debug".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxConfig {
    #[serde(default)]
    pub calculator: CalculatorSettings,

    #[serde(default)]
    pub rules: RuleSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl TaxConfig {
    /// Creates a config with every default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a config document. Missing sections take their defaults.
    pub fn from_toml_str(contents: &str) -> RuntimeResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (if it exists)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> RuntimeResult<Self> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from))
            .or_else(Self::default_config_path);
        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading tax config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load tax config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file, creating parent directories.
    pub fn save(&self, config_path: Option<PathBuf>) -> RuntimeResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| RuntimeError::InvalidConfig("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Tax config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> RuntimeResult<()> {
        if let Some(path) = &self.rules.path {
            if path.as_os_str().is_empty() {
                return Err(RuntimeError::InvalidConfig(
                    "rules.path must not be empty".into(),
                ));
            }
        }

        EnvFilter::try_new(&self.logging.filter).map_err(|e| {
            RuntimeError::InvalidConfig(format!(
                "logging.filter '{}' is not a valid directive: {}",
                self.logging.filter, e
            ))
        })?;

        Ok(())
    }

    /// Applies `SALESTAX_*` overrides read through `var`.
    ///
    /// Unparseable values are logged and ignored.
    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(policy) = var(ENV_FALLBACK) {
            match policy.parse::<FallbackPolicy>() {
                Ok(parsed) => {
                    debug!(policy = %parsed, "Overriding fallback policy from environment");
                    self.calculator.fallback = parsed;
                }
                Err(e) => warn!(value = %policy, "Ignoring {}: {}", ENV_FALLBACK, e),
            }
        }

        if let Some(path) = var(ENV_RULES_PATH) {
            debug!(path = %path, "Overriding rule table path from environment");
            self.rules.path = Some(PathBuf::from(path));
        }

        if let Some(filter) = var(ENV_LOG) {
            self.logging.filter = filter;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "salestax", "salestax")
            .map(|dirs| dirs.config_dir().join("salestax.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the fallback policy.
    pub fn fallback_policy(&self) -> FallbackPolicy {
        self.calculator.fallback
    }

    /// Returns the rule table path if one is configured.
    pub fn rules_path(&self) -> Option<&Path> {
        self.rules.path.as_deref()
    }

    /// Returns the log filter directive.
    pub fn log_filter(&self) -> &str {
        &self.logging.filter
    }
}
