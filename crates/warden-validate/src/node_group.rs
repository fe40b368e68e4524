//! Node group create, update, and delete.

use tracing::debug;
use warden_core::ValidatorConfig;
use warden_state::{Catalog, ClusterId, NodeGroup, NodeGroupId};

use crate::error::{ValidationError, ValidationResult};
use crate::payload::{NodeGroupPayload, validate_json};

pub struct NodeGroupValidator<'a, C: ?Sized> {
    catalog: &'a C,
    config: &'a ValidatorConfig,
}

impl<'a, C: Catalog + ?Sized> NodeGroupValidator<'a, C> {
    pub fn new(catalog: &'a C, config: &'a ValidatorConfig) -> Self {
        Self { catalog, config }
    }

    pub fn validate(&self, data: &[u8]) -> ValidationResult<NodeGroupPayload> {
        let payload: NodeGroupPayload = validate_json(data)?;
        let cluster = self.catalog.cluster(payload.cluster_id)?.ok_or_else(|| {
            ValidationError::not_found(format!(
                "Cluster with ID '{}' is not found",
                payload.cluster_id
            ))
        })?;

        self.validate_unique_name(&payload.name, payload.cluster_id, None)?;

        if cluster.net_provider.as_str() == self.config.network.legacy_provider {
            return Err(ValidationError::not_allowed(
                "Node groups can only be created when using Neutron.",
            ));
        }

        debug!(name = %payload.name, cluster_id = payload.cluster_id, "node group create accepted");
        Ok(payload)
    }

    pub fn validate_update(
        &self,
        data: &[u8],
        instance: &NodeGroup,
    ) -> ValidationResult<NodeGroupPayload> {
        let payload: NodeGroupPayload = validate_json(data)?;
        // Groups never move between environments.
        if payload.cluster_id != instance.cluster_id {
            return Err(ValidationError::invalid_data(format!(
                "Node group {} belongs to environment {} and cannot be moved to {}.",
                instance.id, instance.cluster_id, payload.cluster_id
            )));
        }
        self.validate_unique_name(&payload.name, instance.cluster_id, Some(instance.id))?;

        debug!(id = instance.id, "node group update accepted");
        Ok(payload)
    }

    /// A group holding nodes or networks is only deleted when forced.
    pub fn validate_delete(&self, instance: &NodeGroup, force: bool) -> ValidationResult<()> {
        if !instance.is_empty() && !force {
            return Err(ValidationError::cannot_delete(
                "You cannot delete a node group that contains nodes or networks",
            ));
        }
        Ok(())
    }

    fn validate_unique_name(
        &self,
        name: &str,
        cluster_id: ClusterId,
        exclude: Option<NodeGroupId>,
    ) -> ValidationResult<()> {
        let taken = self
            .catalog
            .node_groups_named(name, cluster_id)?
            .iter()
            .any(|group| Some(group.id) != exclude);
        if taken {
            return Err(ValidationError::already_exists(format!(
                "Node group '{name}' already exists in environment {cluster_id}."
            )));
        }
        Ok(())
    }
}
