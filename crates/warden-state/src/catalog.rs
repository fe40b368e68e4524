//! Read-only lookups the validators run against stored records.

use crate::error::StateResult;
use crate::types::*;

/// Query interface over the domain records.
///
/// Lookups by id return `Ok(None)` for unknown ids; collection queries
/// return an empty list when nothing matches.
pub trait Catalog {
    fn release(&self, id: ReleaseId) -> StateResult<Option<Release>>;

    fn cluster(&self, id: ClusterId) -> StateResult<Option<Cluster>>;

    /// Clusters whose name equals `name` exactly.
    fn clusters_named(&self, name: &str) -> StateResult<Vec<Cluster>>;

    /// Nodes with the given ids; unknown ids are skipped.
    fn nodes(&self, ids: &[NodeId]) -> StateResult<Vec<Node>>;

    /// Nodes currently assigned to the cluster.
    fn nodes_in_cluster(&self, cluster_id: ClusterId) -> StateResult<Vec<Node>>;

    fn node_group(&self, id: NodeGroupId) -> StateResult<Option<NodeGroup>>;

    /// Node groups of `cluster_id` named `name`.
    fn node_groups_named(&self, name: &str, cluster_id: ClusterId) -> StateResult<Vec<NodeGroup>>;

    fn plugin(&self, id: PluginId) -> StateResult<Option<Plugin>>;

    /// Ids of plugins enabled on the cluster.
    fn enabled_plugin_ids(&self, cluster_id: ClusterId) -> StateResult<Vec<PluginId>>;

    fn vmware_attributes(&self, cluster_id: ClusterId) -> StateResult<Option<VmwareAttributes>>;
}
