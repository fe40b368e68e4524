//! Typed request bodies and the JSON parsing stage.
//!
//! Unknown keys are kept (flattened into `extra`) so an accepted payload
//! serializes back to what the client sent.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use warden_state::{AttributeMap, ClusterId, NetProvider, NodeId, ReleaseId};

use crate::error::{ValidationError, ValidationResult};

/// A request body that can be parsed by [`validate_json`].
pub trait Payload: DeserializeOwned {
    /// Structural checks that serde cannot express.
    fn check(&self) -> ValidationResult<()> {
        Ok(())
    }
}

/// Parse a raw request body into a typed payload.
///
/// The body must be a JSON object that deserializes into `T` and passes
/// [`Payload::check`].
pub fn validate_json<T: Payload>(data: &[u8]) -> ValidationResult<T> {
    let value: Value = serde_json::from_slice(data).map_err(|e| {
        ValidationError::invalid_data(format!("Invalid json received: {e}")).logged()
    })?;
    if !value.is_object() {
        return Err(ValidationError::invalid_data(
            "Invalid json received: expected a JSON object",
        )
        .logged());
    }
    let payload: T = serde_json::from_value(value).map_err(|e| {
        ValidationError::invalid_data(format!("Invalid json received: {e}")).logged()
    })?;
    payload.check()?;
    Ok(payload)
}

/// Whether a JSON value counts as set: false, 0, null and empty strings or containers do not.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

// ── Cluster ───────────────────────────────────────────────────────

/// Body of an environment create or update request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClusterPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<ReleaseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_id: Option<ReleaseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_release_id: Option<ReleaseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_provider: Option<NetProvider>,
    /// Target node membership (node ids).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<NodeId>>,
    /// Requested component names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClusterPayload {
    /// `release`, falling back to `release_id`.
    pub fn release_ref(&self) -> Option<ReleaseId> {
        self.release.or(self.release_id)
    }
}

impl Payload for ClusterPayload {
    fn check(&self) -> ValidationResult<()> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ValidationError::invalid_data(
                "Environment name must not be empty",
            )
            .logged());
        }
        if self.mode.as_deref() == Some("") {
            return Err(ValidationError::invalid_data("Environment mode must not be empty").logged());
        }
        Ok(())
    }
}

// ── Attributes ────────────────────────────────────────────────────

/// Body of an attributes update: a free-form object, usually `{"editable": {...}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AttributesPayload(pub AttributeMap);

impl AttributesPayload {
    pub fn editable(&self) -> Option<&Value> {
        self.0.get("editable")
    }
}

impl Payload for AttributesPayload {}

/// Body of a vmware attributes update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VmwareAttributesPayload {
    pub editable: AttributeMap,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Payload for VmwareAttributesPayload {}

// ── Node group ────────────────────────────────────────────────────

/// Body of a node group create or update request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeGroupPayload {
    pub name: String,
    pub cluster_id: ClusterId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Payload for NodeGroupPayload {
    fn check(&self) -> ValidationResult<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::invalid_data("Node group name must not be empty").logged());
        }
        Ok(())
    }
}
