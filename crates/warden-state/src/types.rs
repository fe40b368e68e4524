//! Domain types for the Warden state store.
//!
//! These types represent the persisted state of releases, environments,
//! nodes, node groups, and plugins. All types are serializable to/from
//! JSON for storage in redb tables.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::merge::deep_merge;

pub type ReleaseId = u64;
pub type ClusterId = u64;
pub type NodeId = u64;
pub type NodeGroupId = u64;
pub type PluginId = u64;
pub type NetworkId = u64;

/// Free-form attribute document: `{group: {attribute: {...}}}`.
pub type AttributeMap = Map<String, Value>;

fn default_true() -> bool {
    true
}

/// The part of a component name before the first `:`; the whole name when
/// there is no colon.
pub fn component_type(name: &str) -> &str {
    name.split_once(':').map_or(name, |(ty, _)| ty)
}

// ── Release ───────────────────────────────────────────────────────

/// A versioned, deployable OS + software bundle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Release {
    pub id: ReleaseId,
    pub name: String,
    pub operating_system: String,
    pub version: String,
    /// Dotted platform version (e.g. "8.0") gating provisioning rules.
    pub environment_version: String,
    #[serde(default = "default_true")]
    pub deployable: bool,
    /// Cluster modes this release can be deployed in.
    #[serde(default)]
    pub modes: Vec<String>,
    /// Release versions an environment may be updated from.
    #[serde(default)]
    pub can_update_from_versions: Vec<String>,
    /// Declared component catalog.
    #[serde(default)]
    pub components: Vec<ComponentDescriptor>,
}

/// A component a release offers, e.g. `hypervisor:kvm`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub incompatible: Vec<ComponentRef>,
    #[serde(default)]
    pub requires: Vec<ComponentRef>,
}

/// Reference to other components by name; a trailing `*` makes it a prefix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            incompatible: Vec::new(),
            requires: Vec::new(),
        }
    }

    pub fn component_type(&self) -> &str {
        component_type(&self.name)
    }
}

impl ComponentRef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            message: None,
        }
    }

    pub fn component_type(&self) -> &str {
        component_type(&self.name)
    }

    /// Name up to the first `*`.
    pub fn prefix(&self) -> &str {
        self.name.split('*').next().unwrap_or_default()
    }

    /// Whether a concrete component name satisfies this reference.
    pub fn matches(&self, name: &str) -> bool {
        name.starts_with(self.prefix())
    }
}

// ── Cluster ───────────────────────────────────────────────────────

/// Network provider of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetProvider {
    NovaNetwork,
    Neutron,
}

impl NetProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetProvider::NovaNetwork => "nova_network",
            NetProvider::Neutron => "neutron",
        }
    }

    /// Human-readable name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            NetProvider::NovaNetwork => "Nova Network",
            NetProvider::Neutron => "Neutron",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "nova_network" => Some(NetProvider::NovaNetwork),
            "neutron" => Some(NetProvider::Neutron),
            _ => None,
        }
    }
}

impl fmt::Display for NetProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deployment environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cluster {
    pub id: ClusterId,
    pub name: String,
    pub release_id: ReleaseId,
    #[serde(default)]
    pub pending_release_id: Option<ReleaseId>,
    pub mode: String,
    pub net_provider: NetProvider,
    /// Set once the environment has been deployed.
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub editable: AttributeMap,
}

impl Cluster {
    /// Merge an attributes patch onto the current editable attributes.
    ///
    /// Returns `{"editable": merged}`; the stored document is untouched.
    pub fn updated_editable_attributes(&self, patch: &AttributeMap) -> AttributeMap {
        let current = Value::Object(self.editable.clone());
        let incoming = patch
            .get("editable")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        let mut updated = Map::new();
        updated.insert("editable".to_string(), deep_merge(&current, &incoming));
        updated
    }
}

// ── Node ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Discover,
    Provisioning,
    Provisioned,
    Deploying,
    Ready,
    Error,
}

/// A physical or virtual server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub hostname: String,
    #[serde(default)]
    pub cluster_id: Option<ClusterId>,
    #[serde(default)]
    pub group_id: Option<NodeGroupId>,
    #[serde(default = "default_true")]
    pub online: bool,
    pub status: NodeStatus,
    /// Assigned to an environment but not provisioned yet.
    #[serde(default)]
    pub pending_addition: bool,
}

// ── Node group ────────────────────────────────────────────────────

/// Named partition of an environment's nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeGroup {
    pub id: NodeGroupId,
    pub name: String,
    pub cluster_id: ClusterId,
    #[serde(default)]
    pub node_ids: Vec<NodeId>,
    #[serde(default)]
    pub network_ids: Vec<NetworkId>,
}

impl NodeGroup {
    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty() && self.network_ids.is_empty()
    }
}

// ── Plugins ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plugin {
    pub id: PluginId,
    pub name: String,
    pub version: String,
    /// Can be enabled on an already deployed environment.
    #[serde(default)]
    pub is_hotpluggable: bool,
}

/// Link between an environment and an installed plugin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterPlugin {
    pub cluster_id: ClusterId,
    pub plugin_id: PluginId,
    pub enabled: bool,
}

impl ClusterPlugin {
    /// Build the composite key for the cluster plugins table.
    pub fn table_key(&self) -> String {
        format!("{}:{}", self.cluster_id, self.plugin_id)
    }
}

// ── Vmware ────────────────────────────────────────────────────────

/// vCenter-specific attributes of an environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VmwareAttributes {
    pub id: u64,
    pub cluster_id: ClusterId,
    #[serde(default)]
    pub editable: AttributeMap,
}
