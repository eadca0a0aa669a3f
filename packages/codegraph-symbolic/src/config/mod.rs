//! Capability configuration
//!
//! Three levels, from simplest to most detailed:
//! - `Tier` preset: a complete snapshot in one line
//! - builder overrides on `CapabilitySnapshot`
//! - YAML v1 documents (`CapabilitySnapshot::from_yaml_file`)
//!
//! ```rust,ignore
//! use codegraph_symbolic::config::{CapabilitySnapshot, Limit, Tier};
//!
//! let snapshot = CapabilitySnapshot::for_tier(Tier::Pro).max_paths(Limit::Finite(100));
//! snapshot.validate()?;
//! ```

pub mod capability;
pub mod error;
pub mod io;
pub mod preset;
pub mod validation;

pub use capability::{CapabilitySnapshot, ConstraintTypes, FeatureFlags, Limit};
pub use error::{ConfigError, ConfigResult};
pub use io::{CapabilityExportV1, CapabilityOverrides};
pub use preset::Tier;
pub use validation::{validate_config, Validatable};
