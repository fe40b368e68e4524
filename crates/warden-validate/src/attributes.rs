//! Editable attributes of an environment.
//!
//! Without an environment only the document itself is checked. With one,
//! the incoming patch is merged onto the stored attributes and the merged
//! result must also satisfy the environment-level rules:
//!
//! - vCenter needs the configured net provider
//! - recent releases only provision from images
//! - deployed (locked) environments only take hotpluggable or already
//!   enabled plugin versions

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;
use warden_core::{ReleaseVersion, ValidatorConfig};
use warden_state::{AttributeMap, Catalog, Cluster, NetProvider, PluginId};

use crate::attribute_types::check_attribute;
use crate::error::{ValidationError, ValidationResult};
use crate::payload::{AttributesPayload, is_truthy, validate_json};
use crate::restrictions;

/// Selected plugin version of a plugin attribute group.
#[derive(Debug, Deserialize)]
struct PluginVersions {
    #[serde(default)]
    value: Value,
    #[serde(default)]
    values: Vec<PluginVersionOption>,
}

#[derive(Debug, Deserialize)]
struct PluginVersionOption {
    #[serde(default)]
    data: Value,
}

/// Plugin ids arrive as numbers or numeric strings.
fn plugin_id(value: &Value) -> Option<PluginId> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn editable_of(attrs: &AttributeMap) -> Option<&Map<String, Value>> {
    attrs.get("editable").and_then(Value::as_object)
}

pub struct AttributesValidator<'a, C: ?Sized> {
    catalog: &'a C,
    config: &'a ValidatorConfig,
}

impl<'a, C: Catalog + ?Sized> AttributesValidator<'a, C> {
    pub fn new(catalog: &'a C, config: &'a ValidatorConfig) -> Self {
        Self { catalog, config }
    }

    /// Validate an attributes update, optionally in the context of an environment.
    ///
    /// Returns the payload as received, not the merged document.
    pub fn validate(
        &self,
        data: &[u8],
        cluster: Option<&Cluster>,
    ) -> ValidationResult<AttributesPayload> {
        let payload: AttributesPayload = validate_json(data)?;

        if payload.0.contains_key("generated") {
            return Err(ValidationError::invalid_data(
                "It is not allowed to update generated attributes",
            )
            .logged());
        }
        if payload.editable().is_some_and(|e| !e.is_object()) {
            return Err(ValidationError::invalid_data(
                "Editable attributes should be a dictionary",
            )
            .logged());
        }

        let merged;
        let attrs = match cluster {
            Some(cluster) => {
                merged = cluster.updated_editable_attributes(&payload.0);
                self.validate_net_provider(&merged, cluster)?;
                self.validate_provisioning(&merged, cluster)?;
                if let Some(editable) = editable_of(&merged) {
                    self.validate_plugin_attributes(cluster, editable)?;
                }
                &merged
            }
            None => &payload.0,
        };

        validate_editable_attributes(attrs)?;

        debug!(cluster_id = ?cluster.map(|c| c.id), "attributes accepted");
        Ok(payload)
    }

    fn validate_net_provider(&self, attrs: &AttributeMap, cluster: &Cluster) -> ValidationResult<()> {
        let use_vcenter = editable_of(attrs)
            .and_then(|e| e.get("common"))
            .and_then(|c| c.get("use_vcenter"))
            .and_then(|u| u.get("value"))
            .and_then(Value::as_bool)
            == Some(true);

        let required = self.config.network.vcenter_provider.as_str();
        if use_vcenter && cluster.net_provider.as_str() != required {
            let label = NetProvider::from_name(required).map_or(required, |p| p.label());
            return Err(ValidationError::invalid_data(format!(
                "vCenter requires {label} to be set as a network provider"
            ))
            .logged());
        }
        Ok(())
    }

    fn validate_provisioning(&self, attrs: &AttributeMap, cluster: &Cluster) -> ValidationResult<()> {
        let release = self.catalog.release(cluster.release_id)?.ok_or_else(|| {
            ValidationError::not_found(format!(
                "Release with ID '{}' is not found",
                cluster.release_id
            ))
        })?;
        let version = ReleaseVersion::parse(&release.environment_version).map_err(|e| {
            ValidationError::invalid_data(format!(
                "Release '{}' has an invalid environment version: {e}",
                release.name
            ))
            .logged()
        })?;
        let provisioning = &self.config.provisioning;
        let threshold = ReleaseVersion::parse(&provisioning.image_based_only_since).map_err(|e| {
            ValidationError::invalid_data(format!("Invalid image-based provisioning threshold: {e}"))
                .logged()
        })?;
        if version < threshold {
            return Ok(());
        }

        let method = editable_of(attrs)
            .and_then(|e| e.get("provision"))
            .filter(|p| is_truthy(p))
            .and_then(|p| p.pointer("/method/value"));

        match method {
            None => Err(ValidationError::invalid_data(
                "Provisioning method is not set. Unable to continue",
            )
            .logged()),
            Some(method) if method.as_str() != Some(provisioning.required_method.as_str()) => {
                Err(ValidationError::invalid_data(
                    "Cannot use classic provisioning for adding nodes to environment",
                )
                .logged())
            }
            Some(_) => Ok(()),
        }
    }

    /// On a deployed environment, a newly selected plugin version must be
    /// hotpluggable or already enabled.
    pub fn validate_plugin_attributes(
        &self,
        cluster: &Cluster,
        editable: &Map<String, Value>,
    ) -> ValidationResult<()> {
        if !cluster.is_locked {
            return Ok(());
        }

        let enabled: BTreeSet<PluginId> =
            self.catalog.enabled_plugin_ids(cluster.id)?.into_iter().collect();

        for group in editable.values() {
            let Some(group) = group.as_object() else {
                continue;
            };
            let Some(plugin_versions) = group.get("plugin_versions").filter(|v| !v.is_null()) else {
                continue;
            };
            let group_enabled = group
                .get("metadata")
                .and_then(|m| m.get("enabled"))
                .is_some_and(is_truthy);
            if !group_enabled {
                continue;
            }

            let selection: PluginVersions = serde_json::from_value(plugin_versions.clone())
                .map_err(|e| {
                    ValidationError::invalid_data(format!("Invalid plugin_versions attribute: {e}"))
                        .logged()
                })?;
            let chosen = plugin_id(&selection.value);

            for option in &selection.values {
                let Some(id) = plugin_id(&option.data) else {
                    continue;
                };
                let Some(plugin) = self.catalog.plugin(id)? else {
                    continue;
                };
                if Some(id) != chosen {
                    continue;
                }
                if plugin.is_hotpluggable || enabled.contains(&plugin.id) {
                    break;
                }
                return Err(ValidationError::not_allowed(
                    "This plugin version can be enabled only before environment is deployed.",
                )
                .logged());
            }
        }
        Ok(())
    }
}

/// Check every attribute of every editable group.
pub fn validate_editable_attributes(attrs: &AttributeMap) -> ValidationResult<()> {
    let Some(editable) = editable_of(attrs) else {
        return Ok(());
    };
    for group in editable.values() {
        let Some(group) = group.as_object() else {
            continue;
        };
        for (name, attr) in group {
            validate_attribute(name, attr)?;
        }
    }
    Ok(())
}

/// Check one attribute's type, value shape, and regex restriction.
///
/// Non-objects and objects with neither `type` nor `value` (group
/// metadata, for instance) are not attributes and pass.
pub fn validate_attribute(name: &str, attr: &Value) -> ValidationResult<()> {
    let Some(attr) = attr.as_object() else {
        return Ok(());
    };
    if !attr.contains_key("type") && !attr.contains_key("value") {
        return Ok(());
    }

    check_attribute(attr).map_err(|msg| ValidationError::invalid_data(format!("[{name}] {msg}")))?;

    // An empty value is never matched against the pattern.
    if attr.get("value").is_some_and(is_truthy) {
        if let Some(err) = restrictions::validate_regex(attr) {
            return Err(ValidationError::invalid_data(format!("[{name}] {err}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fixtures::{self, body, object};
    use serde_json::json;
    use warden_state::{ClusterPlugin, Plugin, StateStore};

    fn validate(
        store: &StateStore,
        data: Value,
        cluster: Option<&Cluster>,
    ) -> ValidationResult<AttributesPayload> {
        let config = ValidatorConfig::default();
        AttributesValidator::new(store, &config).validate(&body(data), cluster)
    }

    fn plugin_group(enabled: bool, chosen: &str) -> Value {
        json!({
            "metadata": {"label": "Contrail", "enabled": enabled, "weight": 70},
            "plugin_versions": {
                "type": "radio",
                "value": chosen,
                "values": [
                    {"data": "10", "label": "3.0.0"},
                    {"data": "11", "label": "3.0.1"}
                ]
            }
        })
    }

    fn plugins(store: &StateStore) {
        store
            .put_plugin(&Plugin {
                id: 10,
                name: "contrail".to_string(),
                version: "3.0.0".to_string(),
                is_hotpluggable: false,
            })
            .unwrap();
        store
            .put_plugin(&Plugin {
                id: 11,
                name: "contrail".to_string(),
                version: "3.0.1".to_string(),
                is_hotpluggable: true,
            })
            .unwrap();
    }

    // ── Document-level checks ──────────────────────────────────────

    #[test]
    fn generated_attributes_forbidden() {
        let store = fixtures::store();
        let err = validate(&store, json!({"generated": {}}), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert_eq!(err.to_string(), "It is not allowed to update generated attributes");
    }

    #[test]
    fn editable_must_be_mapping() {
        let store = fixtures::store();
        let err = validate(&store, json!({"editable": ["x"]}), None).unwrap_err();
        assert_eq!(err.to_string(), "Editable attributes should be a dictionary");
    }

    #[test]
    fn without_cluster_only_attributes_checked() {
        let store = fixtures::store();
        let data = json!({"editable": {"common": {"debug": {"type": "checkbox", "value": true}}}});
        let payload = validate(&store, data.clone(), None).unwrap();
        assert_eq!(serde_json::to_value(payload).unwrap(), data);
    }

    #[test]
    fn bad_attribute_value_prefixed_with_name() {
        let store = fixtures::store();
        let data = json!({"editable": {"common": {"debug": {"type": "checkbox", "value": "on"}}}});
        let err = validate(&store, data, None).unwrap_err();
        assert!(err.to_string().starts_with("[debug] "), "{err}");
    }

    // ── Regex restriction ──────────────────────────────────────────

    #[test]
    fn text_regex_mismatch_fails() {
        let (store, env) = fixtures::seeded();
        let data = json!({"editable": {"syslog": {"syslog_server": {"value": "bad host!"}}}});
        let err = validate(&store, data, Some(&env)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert_eq!(err.to_string(), "[syslog_server] Invalid hostname");
    }

    #[test]
    fn text_regex_empty_value_bypasses() {
        let (store, env) = fixtures::seeded();
        let data = json!({"editable": {"syslog": {"syslog_server": {"value": ""}}}});
        validate(&store, data, Some(&env)).unwrap();
    }

    #[test]
    fn text_regex_match_passes() {
        let (store, env) = fixtures::seeded();
        let data = json!({"editable": {"syslog": {"syslog_server": {"value": "log.example.com"}}}});
        validate(&store, data, Some(&env)).unwrap();
    }

    #[test]
    fn returns_original_payload_not_merged() {
        let (store, env) = fixtures::seeded();
        let data = json!({"editable": {"common": {"debug": {"value": true}}}});
        let payload = validate(&store, data.clone(), Some(&env)).unwrap();
        assert_eq!(serde_json::to_value(payload).unwrap(), data);
    }

    // ── vCenter ────────────────────────────────────────────────────

    #[test]
    fn vcenter_requires_nova_network() {
        let (store, env) = fixtures::seeded();
        let data = json!({"editable": {"common": {"use_vcenter": {"value": true}}}});
        let err = validate(&store, data.clone(), Some(&env)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "vCenter requires Nova Network to be set as a network provider"
        );

        let mut nova = env.clone();
        nova.net_provider = NetProvider::NovaNetwork;
        validate(&store, data, Some(&nova)).unwrap();
    }

    // ── Provisioning ───────────────────────────────────────────────

    #[test]
    fn classic_provisioning_rejected_on_recent_release() {
        let (store, env) = fixtures::seeded();
        let data = json!({"editable": {"provision": {"method": {"value": "cobbler"}}}});
        let err = validate(&store, data, Some(&env)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot use classic provisioning for adding nodes to environment"
        );
    }

    #[test]
    fn missing_provisioning_rejected_on_recent_release() {
        let (store, mut env) = fixtures::seeded();
        env.editable.remove("provision");
        let err = validate(&store, json!({"editable": {}}), Some(&env)).unwrap_err();
        assert_eq!(err.to_string(), "Provisioning method is not set. Unable to continue");
    }

    #[test]
    fn classic_provisioning_allowed_on_old_release() {
        let (store, env) = fixtures::seeded();
        let mut old = fixtures::release(2);
        old.environment_version = "6.1".to_string();
        store.put_release(&old).unwrap();

        let mut legacy_env = env.clone();
        legacy_env.release_id = 2;
        legacy_env.editable.remove("provision");
        validate(&store, json!({"editable": {}}), Some(&legacy_env)).unwrap();

        let data = json!({"editable": {"provision": {"method": {
            "type": "radio", "value": "cobbler", "values": [{"data": "cobbler"}]
        }}}});
        validate(&store, data, Some(&legacy_env)).unwrap();
    }

    // ── Plugins ────────────────────────────────────────────────────

    #[test]
    fn locked_cluster_rejects_cold_plugin_version() {
        let (store, mut env) = fixtures::seeded();
        plugins(&store);
        env.is_locked = true;

        let data = json!({"editable": {"contrail": plugin_group(true, "10")}});
        let err = validate(&store, data, Some(&env)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAllowed);
        assert_eq!(
            err.to_string(),
            "This plugin version can be enabled only before environment is deployed."
        );
    }

    #[test]
    fn unlocked_cluster_accepts_cold_plugin_version() {
        let (store, env) = fixtures::seeded();
        plugins(&store);

        let data = json!({"editable": {"contrail": plugin_group(true, "10")}});
        validate(&store, data, Some(&env)).unwrap();
    }

    #[test]
    fn locked_cluster_accepts_hotpluggable_version() {
        let (store, mut env) = fixtures::seeded();
        plugins(&store);
        env.is_locked = true;

        let data = json!({"editable": {"contrail": plugin_group(true, "11")}});
        validate(&store, data, Some(&env)).unwrap();
    }

    #[test]
    fn locked_cluster_accepts_already_enabled_plugin() {
        let (store, mut env) = fixtures::seeded();
        plugins(&store);
        env.is_locked = true;
        store
            .put_cluster_plugin(&ClusterPlugin {
                cluster_id: env.id,
                plugin_id: 10,
                enabled: true,
            })
            .unwrap();

        let data = json!({"editable": {"contrail": plugin_group(true, "10")}});
        validate(&store, data, Some(&env)).unwrap();
    }

    #[test]
    fn disabled_plugin_group_skipped() {
        let (store, mut env) = fixtures::seeded();
        plugins(&store);
        env.is_locked = true;

        let data = json!({"editable": {"contrail": plugin_group(false, "10")}});
        validate(&store, data, Some(&env)).unwrap();
    }

    #[test]
    fn attribute_without_type_or_value_skipped() {
        assert!(validate_attribute("metadata", &json!({"label": "x", "weight": 10})).is_ok());
        assert!(validate_attribute("toggle", &json!(true)).is_ok());
        let attrs = object(json!({"editable": {"group": "not-a-group"}}));
        assert!(validate_editable_attributes(&attrs).is_ok());
    }
}
