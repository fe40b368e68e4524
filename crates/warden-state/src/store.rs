//! StateStore: redb-backed state persistence for Warden.
//!
//! Provides typed CRUD operations over releases, clusters, nodes, node
//! groups, plugins, and vmware attributes. All values are JSON-serialized
//! into redb's `&[u8]` value columns. The store supports both on-disk and
//! in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableHandle};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{StateError, StateResult};
use crate::tables::{self, JsonTable, id_key};
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        for table in tables::ALL {
            txn.open_table(table).map_err(map_err!(Table))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Generic JSON row access ────────────────────────────────────

    fn put_json<T: Serialize>(&self, table: JsonTable, key: &str, value: &T) -> StateResult<()> {
        let value = serde_json::to_vec(value).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(table = %table.name(), %key, "record stored");
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: T =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn scan_json<T: DeserializeOwned>(&self, table: JsonTable) -> StateResult<Vec<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: T =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }

    fn remove(&self, table: JsonTable, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(table = %table.name(), %key, existed, "record deleted");
        Ok(existed)
    }

    /// Next free id in an id-keyed table (1 for an empty table).
    pub fn next_id(&self, table: JsonTable) -> StateResult<u64> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let opened = txn.open_table(table).map_err(map_err!(Table))?;
        let mut max = 0u64;
        for entry in opened.iter().map_err(map_err!(Read))? {
            let (key, _) = entry.map_err(map_err!(Read))?;
            let id: u64 = key.value().parse().map_err(|_| StateError::CorruptKey {
                table: table.name().to_string(),
                key: key.value().to_string(),
            })?;
            max = max.max(id);
        }
        Ok(max + 1)
    }

    // ── Releases ───────────────────────────────────────────────────

    pub fn put_release(&self, release: &Release) -> StateResult<()> {
        self.put_json(tables::RELEASES, &id_key(release.id), release)
    }

    // ── Clusters ───────────────────────────────────────────────────

    /// Insert or update a cluster.
    pub fn put_cluster(&self, cluster: &Cluster) -> StateResult<()> {
        self.put_json(tables::CLUSTERS, &id_key(cluster.id), cluster)
    }

    pub fn list_clusters(&self) -> StateResult<Vec<Cluster>> {
        self.scan_json(tables::CLUSTERS)
    }

    // ── Nodes ──────────────────────────────────────────────────────

    pub fn put_node(&self, node: &Node) -> StateResult<()> {
        self.put_json(tables::NODES, &id_key(node.id), node)
    }

    pub fn get_node(&self, id: NodeId) -> StateResult<Option<Node>> {
        self.get_json(tables::NODES, &id_key(id))
    }

    pub fn list_nodes(&self) -> StateResult<Vec<Node>> {
        self.scan_json(tables::NODES)
    }

    // ── Node groups ────────────────────────────────────────────────

    pub fn put_node_group(&self, group: &NodeGroup) -> StateResult<()> {
        self.put_json(tables::NODE_GROUPS, &id_key(group.id), group)
    }

    pub fn list_node_groups(&self) -> StateResult<Vec<NodeGroup>> {
        self.scan_json(tables::NODE_GROUPS)
    }

    /// Delete a node group by id. Returns true if it existed.
    pub fn delete_node_group(&self, id: NodeGroupId) -> StateResult<bool> {
        self.remove(tables::NODE_GROUPS, &id_key(id))
    }

    // ── Plugins ────────────────────────────────────────────────────

    pub fn put_plugin(&self, plugin: &Plugin) -> StateResult<()> {
        self.put_json(tables::PLUGINS, &id_key(plugin.id), plugin)
    }

    /// Insert or update a cluster/plugin link.
    pub fn put_cluster_plugin(&self, link: &ClusterPlugin) -> StateResult<()> {
        self.put_json(tables::CLUSTER_PLUGINS, &link.table_key(), link)
    }

    // ── Vmware attributes ──────────────────────────────────────────

    pub fn put_vmware_attributes(&self, attrs: &VmwareAttributes) -> StateResult<()> {
        self.put_json(tables::VMWARE_ATTRIBUTES, &id_key(attrs.cluster_id), attrs)
    }
}

impl Catalog for StateStore {
    fn release(&self, id: ReleaseId) -> StateResult<Option<Release>> {
        self.get_json(tables::RELEASES, &id_key(id))
    }

    fn cluster(&self, id: ClusterId) -> StateResult<Option<Cluster>> {
        self.get_json(tables::CLUSTERS, &id_key(id))
    }

    fn clusters_named(&self, name: &str) -> StateResult<Vec<Cluster>> {
        Ok(self
            .list_clusters()?
            .into_iter()
            .filter(|c| c.name == name)
            .collect())
    }

    fn nodes(&self, ids: &[NodeId]) -> StateResult<Vec<Node>> {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(node) = self.get_node(*id)? {
                results.push(node);
            }
        }
        Ok(results)
    }

    fn nodes_in_cluster(&self, cluster_id: ClusterId) -> StateResult<Vec<Node>> {
        Ok(self
            .list_nodes()?
            .into_iter()
            .filter(|n| n.cluster_id == Some(cluster_id))
            .collect())
    }

    fn node_group(&self, id: NodeGroupId) -> StateResult<Option<NodeGroup>> {
        self.get_json(tables::NODE_GROUPS, &id_key(id))
    }

    fn node_groups_named(&self, name: &str, cluster_id: ClusterId) -> StateResult<Vec<NodeGroup>> {
        Ok(self
            .list_node_groups()?
            .into_iter()
            .filter(|g| g.name == name && g.cluster_id == cluster_id)
            .collect())
    }

    fn plugin(&self, id: PluginId) -> StateResult<Option<Plugin>> {
        self.get_json(tables::PLUGINS, &id_key(id))
    }

    fn enabled_plugin_ids(&self, cluster_id: ClusterId) -> StateResult<Vec<PluginId>> {
        let links: Vec<ClusterPlugin> = self.scan_json(tables::CLUSTER_PLUGINS)?;
        Ok(links
            .into_iter()
            .filter(|l| l.cluster_id == cluster_id && l.enabled)
            .map(|l| l.plugin_id)
            .collect())
    }

    fn vmware_attributes(&self, cluster_id: ClusterId) -> StateResult<Option<VmwareAttributes>> {
        self.get_json(tables::VMWARE_ATTRIBUTES, &id_key(cluster_id))
    }
}
