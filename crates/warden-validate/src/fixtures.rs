//! Shared test records.

use serde_json::{Map, Value, json};
use warden_state::*;

pub fn store() -> StateStore {
    StateStore::open_in_memory().unwrap()
}

pub fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

pub fn body(value: Value) -> Vec<u8> {
    serde_json::to_vec(&value).unwrap()
}

fn requires(names: &[&str]) -> Vec<ComponentRef> {
    names.iter().map(|n| ComponentRef::new(n)).collect()
}

/// Component catalog covering every mandatory type.
pub fn catalog_components() -> Vec<ComponentDescriptor> {
    let mut kvm = ComponentDescriptor::new("hypervisor:kvm");
    kvm.requires = requires(&["network:*"]);

    let mut vcenter = ComponentDescriptor::new("hypervisor:vmware");
    vcenter.incompatible = requires(&["storage:block:ceph"]);

    let vlan = ComponentDescriptor::new("network:neutron:ml2:vlan");
    let tun = ComponentDescriptor::new("network:neutron:ml2:tun");

    let mut lvm = ComponentDescriptor::new("storage:block:lvm");
    lvm.requires = requires(&["hypervisor:kvm", "hypervisor:qemu"]);

    let ceph = ComponentDescriptor::new("storage:block:ceph");

    let mut sahara = ComponentDescriptor::new("additional_service:sahara");
    sahara.requires = requires(&["storage:object:*"]);

    vec![kvm, vcenter, vlan, tun, lvm, ceph, sahara]
}

pub fn release(id: ReleaseId) -> Release {
    Release {
        id,
        name: format!("Liberty on Ubuntu {id}"),
        operating_system: "Ubuntu".to_string(),
        version: "liberty-8.0".to_string(),
        environment_version: "8.0".to_string(),
        deployable: true,
        modes: vec!["ha_compact".to_string(), "multinode".to_string()],
        can_update_from_versions: Vec::new(),
        components: catalog_components(),
    }
}

/// Editable attributes that satisfy every cluster-level rule.
pub fn editable() -> Map<String, Value> {
    object(json!({
        "common": {
            "metadata": {"label": "Common", "weight": 30},
            "debug": {"type": "checkbox", "value": false, "weight": 20},
            "use_vcenter": {"type": "hidden", "value": false}
        },
        "provision": {
            "metadata": {"label": "Provision", "weight": 80},
            "method": {
                "type": "radio",
                "value": "image",
                "values": [{"data": "image", "label": "Image"}, {"data": "cobbler", "label": "Classic"}]
            }
        },
        "syslog": {
            "syslog_server": {
                "type": "text",
                "value": "",
                "regex": {"source": "^[\\w.-]+$", "error": "Invalid hostname"}
            }
        }
    }))
}

pub fn cluster(id: ClusterId, name: &str, release_id: ReleaseId) -> Cluster {
    Cluster {
        id,
        name: name.to_string(),
        release_id,
        pending_release_id: None,
        mode: "ha_compact".to_string(),
        net_provider: NetProvider::Neutron,
        is_locked: false,
        editable: editable(),
    }
}

pub fn node(id: NodeId, hostname: &str, cluster_id: Option<ClusterId>) -> Node {
    Node {
        id,
        hostname: hostname.to_string(),
        cluster_id,
        group_id: None,
        online: true,
        status: NodeStatus::Discover,
        pending_addition: false,
    }
}

pub fn node_group(id: NodeGroupId, name: &str, cluster_id: ClusterId) -> NodeGroup {
    NodeGroup {
        id,
        name: name.to_string(),
        cluster_id,
        node_ids: Vec::new(),
        network_ids: Vec::new(),
    }
}

/// Store with release 1 and environment 1 ("prod") on it.
pub fn seeded() -> (StateStore, Cluster) {
    let store = store();
    store.put_release(&release(1)).unwrap();
    let env = cluster(1, "prod", 1);
    store.put_cluster(&env).unwrap();
    (store, env)
}
