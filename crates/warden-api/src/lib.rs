//! warden-api: REST API for Warden.
//!
//! Every mutating route runs the matching validator from
//! `warden-validate` and persists the accepted payload.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/api/v1/clusters` | Create an environment |
//! | GET | `/api/v1/clusters/{id}` | Get environment details |
//! | PUT | `/api/v1/clusters/{id}` | Update an environment |
//! | PUT | `/api/v1/clusters/{id}/attributes` | Update editable attributes |
//! | PUT | `/api/v1/clusters/{id}/vmware_attributes` | Update vCenter attributes |
//! | PUT | `/api/v1/clusters/{id}/changes` | Validate and accept a deploy |
//! | POST | `/api/v1/nodegroups` | Create a node group |
//! | PUT | `/api/v1/nodegroups/{id}` | Update a node group |
//! | DELETE | `/api/v1/nodegroups/{id}?force=<bool>` | Delete a node group |
//!
//! # Error statuses
//!
//! Rejections map to 400 (invalid data, cannot delete), 403 (not allowed),
//! 404 (not found) and 409 (already exists). A duplicate node group name
//! within an environment is a 409 Conflict, not a 403. Moving a node group
//! to another environment through `PUT /api/v1/nodegroups/{id}` is a 400.

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{post, put};
use warden_core::ValidatorConfig;
use warden_state::StateStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
    pub config: Arc<ValidatorConfig>,
}

/// Build the complete API router.
pub fn build_router(store: StateStore, config: Arc<ValidatorConfig>) -> Router {
    let api_state = ApiState { store, config };

    let api_routes = Router::new()
        .route("/clusters", post(handlers::create_cluster))
        .route(
            "/clusters/{id}",
            put(handlers::update_cluster).get(handlers::get_cluster),
        )
        .route("/clusters/{id}/attributes", put(handlers::update_attributes))
        .route(
            "/clusters/{id}/vmware_attributes",
            put(handlers::update_vmware_attributes),
        )
        .route("/clusters/{id}/changes", put(handlers::deploy_changes))
        .route("/nodegroups", post(handlers::create_node_group))
        .route(
            "/nodegroups/{id}",
            put(handlers::update_node_group).delete(handlers::delete_node_group),
        )
        .with_state(api_state);

    Router::new().nest("/api/v1", api_routes)
}
