//! Deploy-changes request for an environment.
//!
//! The request carries no body; it is accepted when the environment's
//! release can still be deployed and the nodes about to be provisioned are
//! usable.

use std::collections::BTreeSet;

use tracing::debug;
use warden_state::{Catalog, Cluster, NodeId};

use crate::error::{ValidationError, ValidationResult};

/// Provisioning precondition run before changes are deployed.
pub trait ProvisionCheck<C: ?Sized> {
    fn check(&self, catalog: &C, cluster: &Cluster) -> ValidationResult<()>;
}

/// Selected nodes must belong to the environment and be online.
///
/// Without an explicit selection the environment's nodes pending addition
/// are checked.
#[derive(Debug, Clone, Default)]
pub struct SelectedNodesProvision {
    pub selection: Option<Vec<NodeId>>,
}

impl SelectedNodesProvision {
    pub fn selected(ids: Vec<NodeId>) -> Self {
        Self {
            selection: Some(ids),
        }
    }
}

impl<C: Catalog + ?Sized> ProvisionCheck<C> for SelectedNodesProvision {
    fn check(&self, catalog: &C, cluster: &Cluster) -> ValidationResult<()> {
        let nodes = match &self.selection {
            Some(ids) => {
                let found = catalog.nodes(ids)?;
                let in_cluster: BTreeSet<NodeId> = found
                    .iter()
                    .filter(|n| n.cluster_id == Some(cluster.id))
                    .map(|n| n.id)
                    .collect();
                let foreign: BTreeSet<NodeId> = ids
                    .iter()
                    .copied()
                    .filter(|id| !in_cluster.contains(id))
                    .collect();
                if !foreign.is_empty() {
                    return Err(ValidationError::not_found(format!(
                        "Nodes {foreign:?} do not belong to environment {}",
                        cluster.id
                    )));
                }
                found
            }
            None => catalog
                .nodes_in_cluster(cluster.id)?
                .into_iter()
                .filter(|n| n.pending_addition)
                .collect(),
        };

        let offline: Vec<NodeId> = nodes.iter().filter(|n| !n.online).map(|n| n.id).collect();
        if !offline.is_empty() {
            return Err(ValidationError::not_allowed(format!(
                "Nodes {offline:?} are offline. Remove them from environment and try again."
            )));
        }
        Ok(())
    }
}

pub struct ClusterChangesValidator<'a, C: ?Sized, P = SelectedNodesProvision> {
    catalog: &'a C,
    provision: P,
}

impl<'a, C: Catalog + ?Sized> ClusterChangesValidator<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self {
            catalog,
            provision: SelectedNodesProvision::default(),
        }
    }
}

impl<'a, C: Catalog + ?Sized, P: ProvisionCheck<C>> ClusterChangesValidator<'a, C, P> {
    pub fn with_provision_check(catalog: &'a C, provision: P) -> Self {
        Self { catalog, provision }
    }

    pub fn validate(&self, cluster: &Cluster) -> ValidationResult<()> {
        self.validate_release(cluster)?;
        self.provision.check(self.catalog, cluster)?;
        debug!(cluster_id = cluster.id, "deploy changes accepted");
        Ok(())
    }

    fn validate_release(&self, cluster: &Cluster) -> ValidationResult<()> {
        let deployable = self
            .catalog
            .release(cluster.release_id)?
            .is_some_and(|release| release.deployable);
        if !deployable {
            return Err(ValidationError::not_allowed(format!(
                "Release with ID '{}' is not deployable.",
                cluster.release_id
            ))
            .logged());
        }
        Ok(())
    }
}
