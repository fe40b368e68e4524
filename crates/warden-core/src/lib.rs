pub mod config;
pub mod version;

pub use config::{ConfigError, ValidatorConfig};
pub use version::{ReleaseVersion, VersionError};
