//! REST API handlers.
//!
//! Bodies are taken as raw bytes and handed to the validators, which own
//! JSON parsing. Accepted payloads are applied to the stored records.

use std::collections::BTreeSet;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use warden_state::*;
use warden_validate::{ErrorKind, ValidationError, Validators};

use crate::ApiState;

/// Mode given to an environment whose request and release name none.
const DEFAULT_MODE: &str = "ha_compact";

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// HTTP status for a rejection kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidData | ErrorKind::CannotDelete => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::NotAllowed => StatusCode::FORBIDDEN,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A rejected request, rendered as an error envelope.
#[derive(Debug)]
pub struct ApiError(pub ValidationError);

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err)
    }
}

impl From<StateError> for ApiError {
    fn from(err: StateError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        if self.0.should_log() {
            warn!(kind = kind.as_str(), status = status.as_u16(), error = %self.0, "request rejected");
        }
        error_response(&self.0.to_string(), status).into_response()
    }
}

type ApiResult = Result<Response, ApiError>;

fn load_cluster(store: &StateStore, id: ClusterId) -> Result<Cluster, ApiError> {
    store
        .cluster(id)?
        .ok_or_else(|| ValidationError::not_found(format!("Cluster with ID '{id}' is not found")).into())
}

fn load_node_group(store: &StateStore, id: NodeGroupId) -> Result<NodeGroup, ApiError> {
    store
        .node_group(id)?
        .ok_or_else(|| ValidationError::not_found(format!("Node group with ID '{id}' is not found")).into())
}

/// Make `ids` the environment's node set.
///
/// Leaving nodes are detached; joining nodes are marked pending addition.
fn assign_nodes(store: &StateStore, cluster_id: ClusterId, ids: &[NodeId]) -> Result<(), ApiError> {
    let wanted: BTreeSet<NodeId> = ids.iter().copied().collect();

    for mut node in store.nodes_in_cluster(cluster_id)? {
        if !wanted.contains(&node.id) {
            node.cluster_id = None;
            node.group_id = None;
            node.pending_addition = false;
            store.put_node(&node)?;
        }
    }
    for mut node in store.nodes(ids)? {
        if node.cluster_id != Some(cluster_id) {
            node.cluster_id = Some(cluster_id);
            node.pending_addition = true;
            store.put_node(&node)?;
        }
    }
    Ok(())
}

// ── Clusters ───────────────────────────────────────────────────

/// POST /api/v1/clusters
pub async fn create_cluster(State(state): State<ApiState>, body: Bytes) -> ApiResult {
    let validators = Validators::new(&state.store, &state.config);
    let payload = validators.cluster().validate(&body)?;

    let release_id = payload
        .release_ref()
        .ok_or_else(|| ValidationError::invalid_data("Release ID is required"))?;
    let release = state
        .store
        .release(release_id)?
        .ok_or_else(|| ValidationError::invalid_data("Invalid release ID"))?;
    let name = payload
        .name
        .clone()
        .ok_or_else(|| ValidationError::invalid_data("Environment name is required"))?;

    let cluster = Cluster {
        id: state.store.next_id(tables::CLUSTERS)?,
        name,
        release_id,
        pending_release_id: payload.pending_release_id,
        mode: payload
            .mode
            .clone()
            .or_else(|| release.modes.first().cloned())
            .unwrap_or_else(|| DEFAULT_MODE.to_string()),
        net_provider: payload.net_provider.unwrap_or(NetProvider::Neutron),
        is_locked: false,
        editable: Map::new(),
    };
    state.store.put_cluster(&cluster)?;
    if let Some(nodes) = &payload.nodes {
        assign_nodes(&state.store, cluster.id, nodes)?;
    }

    info!(id = cluster.id, name = %cluster.name, "environment created");
    Ok((StatusCode::CREATED, ApiResponse::ok(cluster)).into_response())
}

/// GET /api/v1/clusters/{id}
pub async fn get_cluster(State(state): State<ApiState>, Path(id): Path<ClusterId>) -> ApiResult {
    let cluster = load_cluster(&state.store, id)?;
    Ok(ApiResponse::ok(cluster).into_response())
}

/// PUT /api/v1/clusters/{id}
pub async fn update_cluster(
    State(state): State<ApiState>,
    Path(id): Path<ClusterId>,
    body: Bytes,
) -> ApiResult {
    let mut cluster = load_cluster(&state.store, id)?;
    let validators = Validators::new(&state.store, &state.config);
    let payload = validators.cluster().validate_update(&body, &cluster)?;

    if let Some(name) = payload.name.clone() {
        cluster.name = name;
    }
    if let Some(release_id) = payload.release_ref() {
        cluster.release_id = release_id;
    }
    if let Some(pending) = payload.pending_release_id {
        cluster.pending_release_id = Some(pending);
    }
    if let Some(mode) = payload.mode {
        cluster.mode = mode;
    }
    if let Some(net_provider) = payload.net_provider {
        cluster.net_provider = net_provider;
    }
    state.store.put_cluster(&cluster)?;
    if let Some(nodes) = &payload.nodes {
        assign_nodes(&state.store, id, nodes)?;
    }

    Ok(ApiResponse::ok(cluster).into_response())
}

/// PUT /api/v1/clusters/{id}/attributes
pub async fn update_attributes(
    State(state): State<ApiState>,
    Path(id): Path<ClusterId>,
    body: Bytes,
) -> ApiResult {
    let mut cluster = load_cluster(&state.store, id)?;
    let validators = Validators::new(&state.store, &state.config);
    let payload = validators.attributes().validate(&body, Some(&cluster))?;

    let updated = cluster.updated_editable_attributes(&payload.0);
    if let Some(editable) = updated.get("editable").and_then(Value::as_object) {
        cluster.editable = editable.clone();
    }
    state.store.put_cluster(&cluster)?;

    Ok(ApiResponse::ok(json!({"editable": cluster.editable})).into_response())
}

/// PUT /api/v1/clusters/{id}/vmware_attributes
pub async fn update_vmware_attributes(
    State(state): State<ApiState>,
    Path(id): Path<ClusterId>,
    body: Bytes,
) -> ApiResult {
    let cluster = load_cluster(&state.store, id)?;
    let mut attrs = state.store.vmware_attributes(cluster.id)?.ok_or_else(|| {
        ValidationError::not_found(format!("Environment {id} has no vmware attributes"))
    })?;
    let validators = Validators::new(&state.store, &state.config);
    let payload = validators.vmware_attributes().validate(&body, &attrs)?;

    attrs.editable = payload.editable;
    state.store.put_vmware_attributes(&attrs)?;

    Ok(ApiResponse::ok(attrs).into_response())
}

/// PUT /api/v1/clusters/{id}/changes
///
/// Deployment itself is out of scope; an accepted request is acknowledged.
pub async fn deploy_changes(State(state): State<ApiState>, Path(id): Path<ClusterId>) -> ApiResult {
    let cluster = load_cluster(&state.store, id)?;
    let validators = Validators::new(&state.store, &state.config);
    validators.cluster_changes().validate(&cluster)?;

    info!(id, "deploy changes accepted");
    Ok((
        StatusCode::ACCEPTED,
        ApiResponse::ok(json!({"cluster_id": id, "status": "accepted"})),
    )
        .into_response())
}

// ── Node groups ────────────────────────────────────────────────

/// POST /api/v1/nodegroups
pub async fn create_node_group(State(state): State<ApiState>, body: Bytes) -> ApiResult {
    let validators = Validators::new(&state.store, &state.config);
    let payload = validators.node_group().validate(&body)?;

    let group = NodeGroup {
        id: state.store.next_id(tables::NODE_GROUPS)?,
        name: payload.name,
        cluster_id: payload.cluster_id,
        node_ids: Vec::new(),
        network_ids: Vec::new(),
    };
    state.store.put_node_group(&group)?;

    info!(id = group.id, name = %group.name, cluster_id = group.cluster_id, "node group created");
    Ok((StatusCode::CREATED, ApiResponse::ok(group)).into_response())
}

/// PUT /api/v1/nodegroups/{id}
pub async fn update_node_group(
    State(state): State<ApiState>,
    Path(id): Path<NodeGroupId>,
    body: Bytes,
) -> ApiResult {
    let mut group = load_node_group(&state.store, id)?;
    let validators = Validators::new(&state.store, &state.config);
    let payload = validators.node_group().validate_update(&body, &group)?;

    group.name = payload.name;
    state.store.put_node_group(&group)?;

    Ok(ApiResponse::ok(group).into_response())
}

/// Query parameters of a node group delete.
#[derive(Debug, Default, serde::Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub force: bool,
}

/// DELETE /api/v1/nodegroups/{id}
pub async fn delete_node_group(
    State(state): State<ApiState>,
    Path(id): Path<NodeGroupId>,
    Query(params): Query<DeleteParams>,
) -> ApiResult {
    let group = load_node_group(&state.store, id)?;
    let validators = Validators::new(&state.store, &state.config);
    validators.node_group().validate_delete(&group, params.force)?;

    for mut node in state.store.nodes(&group.node_ids)? {
        node.group_id = None;
        state.store.put_node(&node)?;
    }
    state.store.delete_node_group(id)?;

    info!(id, force = params.force, "node group deleted");
    Ok(ApiResponse::ok("deleted").into_response())
}
