//! Environment create and update.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;
use warden_core::ValidatorConfig;
use warden_state::{Catalog, Cluster, NodeId, Release, ReleaseId};

use crate::components::validate_components;
use crate::error::{ValidationError, ValidationResult};
use crate::payload::{ClusterPayload, validate_json};

/// Whether an environment on `current` may be moved to `pending`.
///
/// Redeploying the same release is always allowed; otherwise both
/// releases must share an operating system and one must list the other's
/// version as an update source.
pub fn can_update_release(current: &Release, pending: &Release) -> bool {
    current.id == pending.id
        || (current.operating_system == pending.operating_system
            && (pending.can_update_from_versions.contains(&current.version)
                || current.can_update_from_versions.contains(&pending.version)))
}

pub struct ClusterValidator<'a, C: ?Sized> {
    catalog: &'a C,
    config: &'a ValidatorConfig,
}

impl<'a, C: Catalog + ?Sized> ClusterValidator<'a, C> {
    pub fn new(catalog: &'a C, config: &'a ValidatorConfig) -> Self {
        Self { catalog, config }
    }

    /// Validate a create request.
    pub fn validate(&self, data: &[u8]) -> ValidationResult<ClusterPayload> {
        let payload: ClusterPayload = validate_json(data)?;
        let release = self.validate_common(&payload, None)?;

        let Some(release) = release else {
            return Err(ValidationError::invalid_data("Release ID is required").logged());
        };

        if let Some(name) = &payload.name {
            if !self.catalog.clusters_named(name)?.is_empty() {
                return Err(ValidationError::already_exists(
                    "Environment with this name already exists",
                )
                .logged());
            }
        }

        if let Some(components) = &payload.components {
            validate_components(&release, components, &self.config.components.mandatory_types)?;
        }

        debug!(name = ?payload.name, release_id = release.id, "environment create accepted");
        Ok(payload)
    }

    /// Validate an update of `instance`.
    pub fn validate_update(
        &self,
        data: &[u8],
        instance: &Cluster,
    ) -> ValidationResult<ClusterPayload> {
        let payload: ClusterPayload = validate_json(data)?;
        self.validate_common(&payload, Some(instance))?;

        if let Some(name) = &payload.name {
            let taken = self
                .catalog
                .clusters_named(name)?
                .iter()
                .any(|other| other.id != instance.id);
            if taken {
                return Err(ValidationError::already_exists(
                    "Environment with this name already exists",
                )
                .logged());
            }
        }

        self.validate_blocked_fields(&payload, instance)?;

        let release = self.release(instance.release_id)?.ok_or_else(|| {
            ValidationError::not_found(format!(
                "Release with ID '{}' is not found",
                instance.release_id
            ))
        })?;
        validate_mode(&payload, &release)?;

        if let Some(nodes) = &payload.nodes {
            self.validate_nodes(nodes, instance)?;
        }

        debug!(cluster_id = instance.id, "environment update accepted");
        Ok(payload)
    }

    /// Checks shared by create and update.
    ///
    /// Returns the referenced release when the payload names one.
    fn validate_common(
        &self,
        payload: &ClusterPayload,
        instance: Option<&Cluster>,
    ) -> ValidationResult<Option<Release>> {
        let release_id = payload.release_ref();
        let mut release = None;

        if let Some(id) = release_id {
            let found = self
                .release(id)?
                .ok_or_else(|| ValidationError::invalid_data("Invalid release ID").logged())?;
            if !found.deployable {
                return Err(ValidationError::not_allowed(format!(
                    "Release with ID '{id}' is not deployable."
                ))
                .logged());
            }
            validate_mode(payload, &found)?;
            release = Some(found);
        }

        if let Some(pending_id) = payload.pending_release_id {
            let pending = self.release(pending_id)?.ok_or_else(|| {
                ValidationError::not_found(format!("Release with ID '{pending_id}' is not found"))
            })?;

            let current_id = match (release_id, instance) {
                (Some(id), _) => id,
                (None, Some(instance)) => instance.release_id,
                (None, None) => {
                    return Err(ValidationError::invalid_data(
                        "Cannot set pending release when there is no current release",
                    )
                    .logged());
                }
            };
            let current = match &release {
                Some(r) => Some(r.clone()),
                None => self.release(current_id)?,
            };

            if !current.is_some_and(|current| can_update_release(&current, &pending)) {
                return Err(ValidationError::invalid_data(
                    "Cannot set pending release as it cannot update current release",
                )
                .logged());
            }
        }

        Ok(release)
    }

    fn release(&self, id: ReleaseId) -> ValidationResult<Option<Release>> {
        Ok(self.catalog.release(id)?)
    }

    /// Reject a change of any field the configuration freezes after creation.
    fn validate_blocked_fields(
        &self,
        payload: &ClusterPayload,
        instance: &Cluster,
    ) -> ValidationResult<()> {
        let blocked = &self.config.cluster.blocked_for_update;
        if blocked.is_empty() {
            return Ok(());
        }

        let requested = to_object(payload)?;
        let current = to_object(instance)?;
        for field in blocked {
            let Some(value) = requested.get(field.as_str()) else {
                continue;
            };
            if current.get(field.as_str()) != Some(value) {
                return Err(ValidationError::invalid_data(format!(
                    "Changing '{field}' for environment is prohibited"
                ))
                .logged());
            }
        }
        Ok(())
    }

    /// A node may not join the environment under a hostname already taken
    /// there, unless the holder leaves in the same request.
    fn validate_nodes(&self, node_ids: &[NodeId], instance: &Cluster) -> ValidationResult<()> {
        let requested: BTreeSet<NodeId> = node_ids.iter().copied().collect();
        let current = self.catalog.nodes_in_cluster(instance.id)?;
        let current_ids: BTreeSet<NodeId> = current.iter().map(|n| n.id).collect();

        let to_add: Vec<NodeId> = requested.difference(&current_ids).copied().collect();
        let to_remove: BTreeSet<NodeId> = current_ids.difference(&requested).copied().collect();

        let hostnames: BTreeSet<String> = self
            .catalog
            .nodes(&to_add)?
            .into_iter()
            .map(|n| n.hostname)
            .collect();

        let duplicated: BTreeSet<&str> = current
            .iter()
            .filter(|n| !to_remove.contains(&n.id) && hostnames.contains(&n.hostname))
            .map(|n| n.hostname.as_str())
            .collect();

        if !duplicated.is_empty() {
            let names: Vec<&str> = duplicated.into_iter().collect();
            return Err(ValidationError::already_exists(format!(
                "Nodes with hostnames [{}] already exist in cluster {}.",
                names.join(","),
                instance.id
            )));
        }
        Ok(())
    }
}

fn validate_mode(payload: &ClusterPayload, release: &Release) -> ValidationResult<()> {
    match payload.mode.as_deref() {
        Some(mode) if !mode.is_empty() && !release.modes.iter().any(|m| m == mode) => {
            Err(ValidationError::invalid_data(format!(
                "Cannot deploy in {mode} mode in current release. Need to be one of: {}",
                release.modes.join(", ")
            ))
            .logged())
        }
        _ => Ok(()),
    }
}

fn to_object<T: serde::Serialize>(value: &T) -> ValidationResult<serde_json::Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Ok(serde_json::Map::new()),
        Err(e) => Err(ValidationError::invalid_data(format!("Invalid environment data: {e}")).logged()),
    }
}
