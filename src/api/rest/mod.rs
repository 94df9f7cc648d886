//! REST endpoints
//!
//! - `GET /graph` - Rendered graph in the requested format
//! - `GET /d3graph`, `/vizgraph`, `/dotgraph`, `/vizgraph3`, `/flatgraph` - Fixed-format aliases
//! - `POST /node` - Register a node name
//! - `GET /nodes` - List registered node names

pub mod graph;
pub mod nodes;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::ServiceGraphError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "BAD_REQUEST".to_string(),
        }
    }

    pub fn invalid_graph(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "INVALID_GRAPH".to_string(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "BACKEND_ERROR".to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "INTERNAL_ERROR".to_string(),
        }
    }
}

/// Wrapper that turns crate errors into JSON error responses
#[derive(Debug)]
pub struct HandlerError(pub ServiceGraphError);

impl From<ServiceGraphError> for HandlerError {
    fn from(err: ServiceGraphError) -> Self {
        Self(err)
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        let (status, body) = match self.0 {
            ServiceGraphError::EmptyNodeName => {
                (StatusCode::BAD_REQUEST, ApiError::bad_request(message))
            }
            ServiceGraphError::InvalidGraph { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::invalid_graph(message),
            ),
            ServiceGraphError::Backend(_) | ServiceGraphError::BackendStatus { .. } => {
                (StatusCode::BAD_GATEWAY, ApiError::backend(message))
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::internal(message),
            ),
        };
        (status, Json(body)).into_response()
    }
}
