//! Shared application state for HTTP and WebSocket handlers

use std::sync::Arc;

use tracing::debug;

use crate::aggregator::{Aggregation, EdgeAggregator};
use crate::config::ServiceGraphConfig;
use crate::error::Result;
use crate::render::{OutputFormat, Renderer};
use crate::source::{GraphSource, QueryWindow};
use crate::types::{DynamicGraph, StaticRegistry};

/// Everything a request needs to go from a query window to rendered bytes
pub struct AppState {
    pub registry: Arc<StaticRegistry>,
    pub source: Arc<dyn GraphSource>,
    pub aggregator: EdgeAggregator,
    pub renderer: Renderer,
    pub config: ServiceGraphConfig,
}

impl AppState {
    pub fn new(source: Arc<dyn GraphSource>, config: ServiceGraphConfig) -> Self {
        Self {
            registry: Arc::new(StaticRegistry::new()),
            source,
            aggregator: EdgeAggregator::from_config(&config),
            renderer: Renderer::from_config(&config),
            config,
        }
    }

    /// Share an existing registry instead of starting with an empty one
    pub fn with_registry(mut self, registry: Arc<StaticRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Query window from optional request overrides
    pub fn window(&self, time_horizon: Option<String>, filter_empty: bool) -> QueryWindow {
        QueryWindow::new(time_horizon.unwrap_or_else(|| self.config.time_horizon.clone()))
            .filter_empty(filter_empty)
    }

    /// Query the source, add registered nodes, then aggregate
    pub async fn snapshot(&self, window: &QueryWindow) -> Result<(DynamicGraph, Aggregation)> {
        let graph = self.source.query(window).await?.merged_with(&self.registry);
        let aggregation = self.aggregator.aggregate(&graph)?;
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            connections = aggregation.len(),
            "graph snapshot built"
        );
        Ok((graph, aggregation))
    }

    /// Full pipeline for one request or publish tick
    pub async fn render(&self, format: OutputFormat, window: &QueryWindow) -> Result<Vec<u8>> {
        if !format.needs_graph() {
            return Ok(self.renderer.heartbeat_payload().as_bytes().to_vec());
        }
        let (graph, aggregation) = self.snapshot(window).await?;
        let updated = chrono::Utc::now().timestamp_millis();
        self.renderer
            .render_to_vec(format, &graph, &aggregation, updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticGraphSource;
    use crate::types::Edge;

    fn state() -> AppState {
        let mut builder = DynamicGraph::builder();
        builder.add_edge(Edge::new("A", "B").with_label("reqs/sec", "2"));
        AppState::new(
            Arc::new(StaticGraphSource::new(builder.build())),
            ServiceGraphConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_snapshot_includes_registered_nodes() {
        let state = state();
        state.registry.register("idle-service").unwrap();

        let (graph, aggregation) = state.snapshot(&state.window(None, false)).await.unwrap();
        assert!(graph.contains_node("idle-service"));
        assert_eq!(aggregation.get("A", "B").unwrap().normal, 200.0);
    }

    #[tokio::test]
    async fn test_render_heartbeat_skips_source() {
        let state = state();
        let out = state
            .render(OutputFormat::Heartbeat, &state.window(None, false))
            .await
            .unwrap();
        assert_eq!(out, b"NGK2..");
    }

    #[test]
    fn test_window_defaults_to_config() {
        let state = state();
        assert_eq!(state.window(None, false).time_horizon, "5m");
        assert_eq!(state.window(Some("1m".into()), true).time_horizon, "1m");
    }
}
