//! Graph endpoints - one pipeline run per request

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::warn;

use super::{ApiError, HandlerError};
use crate::api::state::AppState;
use crate::render::OutputFormat;

/// Query parameters for graph endpoints
#[derive(Debug, Deserialize)]
pub struct GraphParams {
    /// Output schema (default: raw)
    pub format: Option<String>,
    /// Query window override, e.g. `1m`
    pub time_horizon: Option<String>,
    /// Drop pairs without traffic
    #[serde(default)]
    pub filter_empty: bool,
}

async fn respond(state: &AppState, format: OutputFormat, params: GraphParams) -> Response {
    let window = state.window(params.time_horizon, params.filter_empty);
    match state.render(format, &window).await {
        Ok(body) => ([(header::CONTENT_TYPE, format.content_type())], body).into_response(),
        Err(err) => {
            warn!(error = %err, format = %format, "graph request failed");
            HandlerError(err).into_response()
        }
    }
}

/// GET /graph?format=... - Render in any supported format
pub async fn get_graph(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GraphParams>,
) -> Response {
    let format = match params.format.as_deref().map(str::parse::<OutputFormat>) {
        None => OutputFormat::Raw,
        Some(Ok(format)) => format,
        Some(Err(message)) => {
            return (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(message))).into_response()
        }
    };
    respond(&state, format, params).await
}

/// GET /d3graph, /vizgraph - Index-linked schema
pub async fn get_indexed(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GraphParams>,
) -> Response {
    respond(&state, OutputFormat::Indexed, params).await
}

/// GET /dotgraph - Graphviz text
pub async fn get_dot(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GraphParams>,
) -> Response {
    respond(&state, OutputFormat::Dot, params).await
}

/// GET /flatgraph - Flat connection schema
pub async fn get_flat(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GraphParams>,
) -> Response {
    respond(&state, OutputFormat::Flat, params).await
}

/// GET /vizgraph3 - Nested global/region/services schema
pub async fn get_nested(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GraphParams>,
) -> Response {
    respond(&state, OutputFormat::Nested, params).await
}
