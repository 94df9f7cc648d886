//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::rest::{graph, nodes};
use super::state::AppState;
use super::websocket::handler::ws_handler;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // Browser dashboards are served from other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check))
        .route("/graph", get(graph::get_graph))
        .route("/d3graph", get(graph::get_indexed))
        .route("/vizgraph", get(graph::get_indexed))
        .route("/dotgraph", get(graph::get_dot))
        .route("/flatgraph", get(graph::get_flat))
        .route("/vizgraph3", get(graph::get_nested))
        .route("/node", post(nodes::add_node))
        .route("/nodes", get(nodes::list_nodes))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
