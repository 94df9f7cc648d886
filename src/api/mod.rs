//! HTTP and WebSocket endpoints
//!
//! Thin adapters: every handler runs the shared query, aggregate and render
//! pipeline held in [`state::AppState`].

pub mod http;
pub mod rest;
pub mod state;
pub mod websocket;

pub use http::create_router;
pub use state::AppState;
