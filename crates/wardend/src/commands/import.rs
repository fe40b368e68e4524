//! Bulk load of catalog records the API does not create itself.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;
use warden_state::{ClusterPlugin, Node, Plugin, Release, StateStore, VmwareAttributes};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogFile {
    pub releases: Vec<Release>,
    pub plugins: Vec<Plugin>,
    pub nodes: Vec<Node>,
    pub cluster_plugins: Vec<ClusterPlugin>,
    pub vmware_attributes: Vec<VmwareAttributes>,
}

pub fn run(store: &StateStore, path: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let catalog: CatalogFile =
        serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))?;
    apply(store, &catalog)?;
    println!(
        "✓ Imported {} releases, {} plugins, {} nodes",
        catalog.releases.len(),
        catalog.plugins.len(),
        catalog.nodes.len()
    );
    Ok(())
}

/// Upsert every record of the file.
pub fn apply(store: &StateStore, catalog: &CatalogFile) -> anyhow::Result<()> {
    for release in &catalog.releases {
        store.put_release(release)?;
    }
    for plugin in &catalog.plugins {
        store.put_plugin(plugin)?;
    }
    for node in &catalog.nodes {
        store.put_node(node)?;
    }
    for link in &catalog.cluster_plugins {
        store.put_cluster_plugin(link)?;
    }
    for attrs in &catalog.vmware_attributes {
        store.put_vmware_attributes(attrs)?;
    }
    info!(
        releases = catalog.releases.len(),
        plugins = catalog.plugins.len(),
        nodes = catalog.nodes.len(),
        cluster_plugins = catalog.cluster_plugins.len(),
        vmware_attributes = catalog.vmware_attributes.len(),
        "catalog imported"
    );
    Ok(())
}
