//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::error::{RuntimeError, RuntimeResult};

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (normally
/// `logging.filter` from the config) is used. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> RuntimeResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| {
            RuntimeError::Telemetry(format!("bad filter '{}': {}", default_filter, e))
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| RuntimeError::Telemetry(e.to_string()))
}
