//! warden-validate: request validation for the environment API.
//!
//! Every incoming body goes through two stages:
//!
//! 1. **Parsing** ([`payload::validate_json`]) turns raw bytes into a typed
//!    payload and applies structural checks.
//! 2. **Rules**: one validator per resource checks the payload against
//!    records looked up through [`warden_state::Catalog`].
//!
//! A validator either returns the accepted payload or a classified
//! [`ValidationError`]. Validators hold no state beyond borrowed references
//! to the catalog and the [`warden_core::ValidatorConfig`].
//!
//! # Components
//!
//! - **`cluster`**: environment create/update, release and node checks
//! - **`components`**: requested components vs. the release catalog
//! - **`attributes`**: editable attributes, provisioning, plugins
//! - **`node_group`**: node group create/update/delete
//! - **`vmware`**, **`changes`**: narrow vCenter and deploy checks
//! - **`request`**: dispatch over typed request kinds

pub mod attribute_types;
pub mod attributes;
pub mod changes;
pub mod cluster;
pub mod components;
pub mod error;
pub mod node_group;
pub mod payload;
pub mod request;
pub mod restrictions;
pub mod vmware;

#[cfg(test)]
pub(crate) mod fixtures;

pub use attributes::AttributesValidator;
pub use changes::{ClusterChangesValidator, ProvisionCheck, SelectedNodesProvision};
pub use cluster::{ClusterValidator, can_update_release};
pub use components::validate_components;
pub use error::{ErrorKind, ValidationError, ValidationResult};
pub use node_group::NodeGroupValidator;
pub use payload::{
    AttributesPayload, ClusterPayload, NodeGroupPayload, Payload, VmwareAttributesPayload,
    validate_json,
};
pub use request::{Accepted, Request, Validators};
pub use vmware::VmwareAttributesValidator;
