//! Node registry endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiError, HandlerError};
use crate::api::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NodeParams {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeRegistered {
    pub name: String,
    pub created: bool,
}

/// POST /node?name=... - Register a node; duplicates are accepted
pub async fn add_node(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NodeParams>,
) -> Response {
    let Some(name) = params.name else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::bad_request("missing argument 'name'")),
        )
            .into_response();
    };

    match state.registry.register(&name) {
        Ok(created) => {
            if created {
                info!(node = %name, "registered node");
            }
            Json(NodeRegistered { name, created }).into_response()
        }
        Err(err) => HandlerError(err).into_response(),
    }
}

/// GET /nodes - Registered node names, sorted
pub async fn list_nodes(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let nodes: Vec<String> = state.registry.snapshot().into_iter().collect();
    Json(nodes)
}
