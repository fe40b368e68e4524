//! Dispatch of typed requests to their validators.

use serde::Serialize;
use warden_core::ValidatorConfig;
use warden_state::{Catalog, Cluster, NodeGroup, VmwareAttributes};

use crate::attributes::AttributesValidator;
use crate::changes::ClusterChangesValidator;
use crate::cluster::ClusterValidator;
use crate::error::ValidationResult;
use crate::node_group::NodeGroupValidator;
use crate::payload::{AttributesPayload, ClusterPayload, NodeGroupPayload, VmwareAttributesPayload};
use crate::vmware::VmwareAttributesValidator;

/// A request to validate: raw body and/or the record it targets.
#[derive(Debug, Clone, Copy)]
pub enum Request<'a> {
    ClusterCreate { data: &'a [u8] },
    ClusterUpdate { data: &'a [u8], instance: &'a Cluster },
    AttributesUpdate { data: &'a [u8], cluster: Option<&'a Cluster> },
    VmwareAttributesUpdate { data: &'a [u8], instance: &'a VmwareAttributes },
    NodeGroupCreate { data: &'a [u8] },
    NodeGroupUpdate { data: &'a [u8], instance: &'a NodeGroup },
    NodeGroupDelete { instance: &'a NodeGroup, force: bool },
    ClusterChanges { cluster: &'a Cluster },
}

impl Request<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Request::ClusterCreate { .. } => "cluster_create",
            Request::ClusterUpdate { .. } => "cluster_update",
            Request::AttributesUpdate { .. } => "attributes_update",
            Request::VmwareAttributesUpdate { .. } => "vmware_attributes_update",
            Request::NodeGroupCreate { .. } => "node_group_create",
            Request::NodeGroupUpdate { .. } => "node_group_update",
            Request::NodeGroupDelete { .. } => "node_group_delete",
            Request::ClusterChanges { .. } => "cluster_changes",
        }
    }
}

/// What an accepted request yields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Accepted {
    Cluster(ClusterPayload),
    Attributes(AttributesPayload),
    VmwareAttributes(VmwareAttributesPayload),
    NodeGroup(NodeGroupPayload),
    /// Requests without a body (deletes, deploy changes).
    Empty,
}

/// All validators over one catalog and configuration.
pub struct Validators<'a, C: ?Sized> {
    catalog: &'a C,
    config: &'a ValidatorConfig,
}

impl<'a, C: Catalog + ?Sized> Validators<'a, C> {
    pub fn new(catalog: &'a C, config: &'a ValidatorConfig) -> Self {
        Self { catalog, config }
    }

    pub fn cluster(&self) -> ClusterValidator<'a, C> {
        ClusterValidator::new(self.catalog, self.config)
    }

    pub fn attributes(&self) -> AttributesValidator<'a, C> {
        AttributesValidator::new(self.catalog, self.config)
    }

    pub fn node_group(&self) -> NodeGroupValidator<'a, C> {
        NodeGroupValidator::new(self.catalog, self.config)
    }

    pub fn vmware_attributes(&self) -> VmwareAttributesValidator {
        VmwareAttributesValidator
    }

    pub fn cluster_changes(&self) -> ClusterChangesValidator<'a, C> {
        ClusterChangesValidator::new(self.catalog)
    }

    /// Run the validator matching the request kind.
    pub fn validate(&self, request: Request<'_>) -> ValidationResult<Accepted> {
        let accepted = match request {
            Request::ClusterCreate { data } => Accepted::Cluster(self.cluster().validate(data)?),
            Request::ClusterUpdate { data, instance } => {
                Accepted::Cluster(self.cluster().validate_update(data, instance)?)
            }
            Request::AttributesUpdate { data, cluster } => {
                Accepted::Attributes(self.attributes().validate(data, cluster)?)
            }
            Request::VmwareAttributesUpdate { data, instance } => {
                Accepted::VmwareAttributes(self.vmware_attributes().validate(data, instance)?)
            }
            Request::NodeGroupCreate { data } => {
                Accepted::NodeGroup(self.node_group().validate(data)?)
            }
            Request::NodeGroupUpdate { data, instance } => {
                Accepted::NodeGroup(self.node_group().validate_update(data, instance)?)
            }
            Request::NodeGroupDelete { instance, force } => {
                self.node_group().validate_delete(instance, force)?;
                Accepted::Empty
            }
            Request::ClusterChanges { cluster } => {
                self.cluster_changes().validate(cluster)?;
                Accepted::Empty
            }
        };
        Ok(accepted)
    }
}
