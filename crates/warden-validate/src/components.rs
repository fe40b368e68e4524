//! Requested components vs. a release's declared component graph.
//!
//! A request names concrete components (`hypervisor:kvm`,
//! `network:neutron:ml2:vlan`, ...). Each must be declared by the release.
//! Declarations may reference other components by prefix (`storage:*`):
//!
//! - **incompatible**: no requested component may match any entry
//! - **requires**: entries are grouped by type (text before the first
//!   `:`); each group needs at least one matching requested component
//!
//! Finally, the requested set must cover every mandatory component type.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;
use warden_state::{ComponentDescriptor, ComponentRef, Release};

use crate::error::{ValidationError, ValidationResult};

/// Check a requested component list against the release catalog.
pub fn validate_components(
    release: &Release,
    requested: &[String],
    mandatory_types: &[String],
) -> ValidationResult<()> {
    let requested: BTreeSet<&str> = requested.iter().map(String::as_str).collect();

    let found: Vec<&ComponentDescriptor> = release
        .components
        .iter()
        .filter(|c| requested.contains(c.name.as_str()))
        .collect();
    let found_names: BTreeSet<&str> = found.iter().map(|c| c.name.as_str()).collect();

    if found_names != requested {
        let unmatched: Vec<&str> = requested.difference(&found_names).copied().collect();
        return Err(ValidationError::invalid_data(format!(
            "{unmatched:?} components are not related to release \"{}\".",
            release.name
        ))
        .logged());
    }

    let mut missing_types: BTreeSet<&str> = mandatory_types.iter().map(String::as_str).collect();

    for component in found {
        for incompatible in &component.incompatible {
            let clashing = resolve_names(&requested, incompatible);
            if !clashing.is_empty() {
                return Err(ValidationError::invalid_data(format!(
                    "Incompatible components were found: '{}' incompatible with {clashing:?}.",
                    component.name
                ))
                .logged());
            }
        }

        for group in requirement_groups(component).values() {
            let satisfied = group
                .iter()
                .any(|require| !resolve_names(&requested, require).is_empty());
            if !satisfied {
                let names: Vec<&str> = group.iter().map(|r| r.name.as_str()).collect();
                return Err(ValidationError::invalid_data(format!(
                    "Requires {names:?} for '{}' components were not satisfied.",
                    component.name
                ))
                .logged());
            }
        }

        missing_types.remove(component.component_type());
    }

    if !missing_types.is_empty() {
        let missing: Vec<&str> = missing_types.into_iter().collect();
        return Err(ValidationError::invalid_data(format!(
            "Components with {missing:?} types required but were not found in data"
        ))
        .logged());
    }

    debug!(release = %release.name, count = requested.len(), "components accepted");
    Ok(())
}

/// Requested names matched by a dependency entry, in sorted order.
fn resolve_names<'a>(requested: &BTreeSet<&'a str>, dependency: &ComponentRef) -> Vec<&'a str> {
    requested
        .iter()
        .copied()
        .filter(|name| dependency.matches(name))
        .collect()
}

/// `requires` entries keyed by component type, declaration order kept within a group.
fn requirement_groups(component: &ComponentDescriptor) -> BTreeMap<&str, Vec<&ComponentRef>> {
    let mut groups: BTreeMap<&str, Vec<&ComponentRef>> = BTreeMap::new();
    for require in &component.requires {
        groups.entry(require.component_type()).or_default().push(require);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fixtures;
    use warden_core::ValidatorConfig;

    fn mandatory() -> Vec<String> {
        ValidatorConfig::default().components.mandatory_types
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn message(result: ValidationResult<()>) -> String {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        err.to_string()
    }

    #[test]
    fn full_compatible_set_passes() {
        let release = fixtures::release(1);
        let requested = names(&["hypervisor:kvm", "network:neutron:ml2:vlan", "storage:block:lvm"]);
        validate_components(&release, &requested, &mandatory()).unwrap();
    }

    #[test]
    fn unknown_component_rejected() {
        let release = fixtures::release(1);
        let requested = names(&[
            "hypervisor:kvm",
            "network:neutron:ml2:vlan",
            "storage:block:lvm",
            "storage:object:swift",
            "monitoring:zabbix",
        ]);
        let msg = message(validate_components(&release, &requested, &mandatory()));
        assert_eq!(
            msg,
            "[\"monitoring:zabbix\", \"storage:object:swift\"] components are not related to release \"Liberty on Ubuntu 1\"."
        );
    }

    #[test]
    fn incompatible_pair_names_both() {
        let mut release = fixtures::release(1);
        let a = ComponentDescriptor::new("hypervisor:a");
        let mut b = ComponentDescriptor::new("hypervisor:b");
        b.incompatible = vec![ComponentRef::new("hypervisor:a*")];
        release.components = vec![a, b];

        let msg = message(validate_components(
            &release,
            &names(&["hypervisor:a", "hypervisor:b"]),
            &[],
        ));
        assert!(msg.contains("'hypervisor:b' incompatible with [\"hypervisor:a\"]"), "{msg}");
    }

    #[test]
    fn incompatible_declared_in_catalog() {
        let release = fixtures::release(1);
        let requested = names(&["hypervisor:vmware", "network:neutron:ml2:vlan", "storage:block:ceph"]);
        let msg = message(validate_components(&release, &requested, &mandatory()));
        assert_eq!(
            msg,
            "Incompatible components were found: 'hypervisor:vmware' incompatible with [\"storage:block:ceph\"]."
        );
    }

    #[test]
    fn unmet_requirement_group_reported() {
        let mut release = fixtures::release(1);
        let mut a = ComponentDescriptor::new("hypervisor:a");
        a.requires = vec![ComponentRef::new("net:*")];
        release.components = vec![a, ComponentDescriptor::new("storage:x")];

        let msg = message(validate_components(
            &release,
            &names(&["hypervisor:a", "storage:x"]),
            &[],
        ));
        assert_eq!(msg, "Requires [\"net:*\"] for 'hypervisor:a' components were not satisfied.");
    }

    #[test]
    fn any_member_of_requirement_group_suffices() {
        // storage:block:lvm requires hypervisor:kvm OR hypervisor:qemu.
        let release = fixtures::release(1);
        let requested = names(&["hypervisor:kvm", "network:neutron:ml2:tun", "storage:block:lvm"]);
        validate_components(&release, &requested, &mandatory()).unwrap();
    }

    #[test]
    fn every_requirement_group_must_hold() {
        let mut release = fixtures::release(1);
        let mut a = ComponentDescriptor::new("hypervisor:a");
        a.requires = vec![ComponentRef::new("network:*"), ComponentRef::new("storage:*")];
        release.components = vec![a, ComponentDescriptor::new("network:x")];

        let msg = message(validate_components(
            &release,
            &names(&["hypervisor:a", "network:x"]),
            &[],
        ));
        assert!(msg.starts_with("Requires [\"storage:*\"]"), "{msg}");
    }

    #[test]
    fn missing_storage_type_reported() {
        let mut release = fixtures::release(1);
        // Drop the requirement on storage so only the mandatory-type check fires.
        release.components.retain(|c| !c.name.starts_with("storage:"));
        let requested = names(&["hypervisor:kvm", "network:neutron:ml2:vlan"]);
        let msg = message(validate_components(&release, &requested, &mandatory()));
        assert_eq!(msg, "Components with [\"storage\"] types required but were not found in data");
    }

    #[test]
    fn missing_types_listed_sorted() {
        let release = fixtures::release(1);
        let msg = message(validate_components(&release, &names(&["network:neutron:ml2:vlan"]), &mandatory()));
        assert!(msg.contains("[\"hypervisor\", \"storage\"]"), "{msg}");
    }

    #[test]
    fn colonless_requirement_is_its_own_group() {
        let mut release = fixtures::release(1);
        let mut a = ComponentDescriptor::new("hypervisor:a");
        a.requires = vec![ComponentRef::new("standalone")];
        release.components = vec![a, ComponentDescriptor::new("standalone")];

        validate_components(&release, &names(&["hypervisor:a", "standalone"]), &[]).unwrap();
        let msg = message(validate_components(&release, &names(&["hypervisor:a"]), &[]));
        assert!(msg.contains("[\"standalone\"]"), "{msg}");
    }
}
