//! # Runtime Error Types
//!
//! Errors raised while assembling a `TaxContext`.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  std::io::Error / toml::de::Error / CoreError                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  RuntimeError (this module) ← Adds config / rule-file context          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller's startup code (fails fast before serving requests)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Calculation errors never pass through here; `TaxCalculator::calculate_tax`
//! returns `CoreError` directly.

use salestax_core::CoreError;
use thiserror::Error;

/// Startup and configuration errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Reading or writing a config / rule file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A config or rule file is not valid TOML for its schema.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// The config could not be rendered back to TOML.
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A loaded rule table failed validation.
    #[error("Rule table rejected: {0}")]
    Core(#[from] CoreError),

    /// A config value is out of range or malformed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The global tracing subscriber could not be installed.
    #[error("Failed to initialize tracing: {0}")]
    Telemetry(String),
}

/// Convenience type alias for Results with RuntimeError.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
