//! redb table definitions for the Warden state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain types).

use redb::TableDefinition;

/// Shape shared by every table in the store.
pub type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Releases keyed by id.
pub const RELEASES: JsonTable = TableDefinition::new("releases");

/// Clusters (environments) keyed by id.
pub const CLUSTERS: JsonTable = TableDefinition::new("clusters");

/// Nodes keyed by id.
pub const NODES: JsonTable = TableDefinition::new("nodes");

/// Node groups keyed by id.
pub const NODE_GROUPS: JsonTable = TableDefinition::new("node_groups");

/// Installed plugins keyed by id.
pub const PLUGINS: JsonTable = TableDefinition::new("plugins");

/// Cluster/plugin links keyed by `{cluster_id}:{plugin_id}`.
pub const CLUSTER_PLUGINS: JsonTable = TableDefinition::new("cluster_plugins");

/// Vmware attributes keyed by owning cluster id.
pub const VMWARE_ATTRIBUTES: JsonTable = TableDefinition::new("vmware_attributes");

/// Every table, for creation at open time.
pub const ALL: [JsonTable; 7] = [
    RELEASES,
    CLUSTERS,
    NODES,
    NODE_GROUPS,
    PLUGINS,
    CLUSTER_PLUGINS,
    VMWARE_ATTRIBUTES,
];

/// Zero-padded key so lexical order matches numeric order.
pub fn id_key(id: u64) -> String {
    format!("{id:020}")
}
