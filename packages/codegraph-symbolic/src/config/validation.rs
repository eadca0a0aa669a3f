//! Configuration validation

use super::capability::CapabilitySnapshot;
use super::error::ConfigResult;

/// Trait for validatable configuration objects
///
/// Callers that build a snapshot from untrusted input run `validate()` before
/// handing it to the engine.
pub trait Validatable {
    /// Returns `Ok(())` if valid, `Err(ConfigError)` with details if invalid.
    fn validate(&self) -> ConfigResult<()>;

    /// Configuration name for error messages
    fn config_name(&self) -> &'static str {
        "Config"
    }
}

impl Validatable for CapabilitySnapshot {
    fn validate(&self) -> ConfigResult<()> {
        CapabilitySnapshot::validate(self)
    }

    fn config_name(&self) -> &'static str {
        "CapabilitySnapshot"
    }
}

/// Validate any `Validatable` config and log the outcome
pub fn validate_config<V: Validatable>(config: &V) -> ConfigResult<()> {
    match config.validate() {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::warn!(config = config.config_name(), error = %e, "configuration rejected");
            Err(e)
        }
    }
}
