//! warden.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Rule parameters shared by every validator, loaded once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidatorConfig {
    pub components: ComponentsConfig,
    pub provisioning: ProvisioningConfig,
    pub network: NetworkConfig,
    pub cluster: ClusterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ComponentsConfig {
    /// Component types every environment must contain at least one of.
    pub mandatory_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Releases at or above this environment version only accept `required_method`.
    pub image_based_only_since: String,
    pub required_method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Net provider an environment must use when vCenter is enabled.
    pub vcenter_provider: String,
    /// Net provider that does not support node groups.
    pub legacy_provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClusterConfig {
    /// Cluster fields that cannot change once the environment exists.
    pub blocked_for_update: Vec<String>,
}

impl Default for ComponentsConfig {
    fn default() -> Self {
        Self {
            mandatory_types: vec![
                "hypervisor".to_string(),
                "network".to_string(),
                "storage".to_string(),
            ],
        }
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            image_based_only_since: "7.0".to_string(),
            required_method: "image".to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            vcenter_provider: "nova_network".to_string(),
            legacy_provider: "nova_network".to_string(),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            blocked_for_update: vec!["net_provider".to_string()],
        }
    }
}

impl ValidatorConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ValidatorConfig = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Reject configs the validators cannot work with.
    fn check(&self) -> Result<(), ConfigError> {
        crate::version::ReleaseVersion::parse(&self.provisioning.image_based_only_since)
            .map_err(|e| ConfigError::Invalid(format!("provisioning.image_based_only_since: {e}")))?;
        if self.provisioning.required_method.is_empty() {
            return Err(ConfigError::Invalid(
                "provisioning.required_method must not be empty".to_string(),
            ));
        }
        if let Some(empty) = self.components.mandatory_types.iter().find(|t| t.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "components.mandatory_types contains an empty type: {empty:?}"
            )));
        }
        Ok(())
    }
}
