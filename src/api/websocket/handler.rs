//! WebSocket upgrade handler

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::{future, SinkExt, StreamExt};
use serde::Deserialize;

use super::publisher::{FixedFrame, FrameSource, SnapshotFrames, StreamPublisher};
use crate::api::rest::{ApiError, HandlerError};
use crate::api::state::AppState;
use crate::render::OutputFormat;

/// Query parameters for the streaming endpoint
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    /// Output schema for every frame (default: nested)
    pub format: Option<String>,
    pub time_horizon: Option<String>,
    #[serde(default)]
    pub filter_empty: bool,
}

/// GET /ws - Upgrade and stream one frame per publish interval
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<StreamParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let format = match params.format.as_deref() {
        None => OutputFormat::Nested,
        Some(raw) => match raw.parse::<OutputFormat>() {
            Ok(format) => format,
            Err(message) => {
                return (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(message)))
                    .into_response()
            }
        },
    };
    let window = state.window(params.time_horizon, params.filter_empty);

    let frames: Arc<dyn FrameSource> = match format {
        OutputFormat::Heartbeat => Arc::new(FixedFrame::new(state.renderer.heartbeat_payload())),
        _ => Arc::new(SnapshotFrames::new(Arc::clone(&state), format, window)),
    };
    let publisher = match StreamPublisher::new(frames, state.config.publish_interval) {
        Ok(publisher) => publisher,
        Err(err) => return HandlerError(err).into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, publisher))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, publisher: StreamPublisher) {
    let (sink, stream) = socket.split();
    let sink = sink.with(|frame: String| future::ready(Ok::<_, axum::Error>(Message::Text(frame))));
    // A close frame ends the inbound stream like a disconnect
    let stream = stream.take_while(|msg| future::ready(!matches!(msg, Ok(Message::Close(_)))));

    publisher.run(sink, stream).await;
}
