//! Graph sources
//!
//! A [`GraphSource`] turns a query window into a call graph snapshot. The
//! core only depends on the trait; [`PrometheusSource`] is the production
//! implementation and [`StaticGraphSource`] serves a fixed graph.

mod prometheus;

use async_trait::async_trait;
use serde::Deserialize;

pub use prometheus::PrometheusSource;

use crate::error::Result;
use crate::types::DynamicGraph;

/// Query parameters forwarded to the source
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryWindow {
    /// Range selector in backend syntax, e.g. `5m`
    pub time_horizon: String,
    /// Drop pairs with no traffic in the window
    #[serde(default)]
    pub filter_empty: bool,
}

impl QueryWindow {
    pub fn new(time_horizon: impl Into<String>) -> Self {
        Self {
            time_horizon: time_horizon.into(),
            filter_empty: false,
        }
    }

    pub fn filter_empty(mut self, filter_empty: bool) -> Self {
        self.filter_empty = filter_empty;
        self
    }
}

/// Produces a call graph for a query window.
///
/// An empty result is an empty graph, not an error.
#[async_trait]
pub trait GraphSource: Send + Sync {
    async fn query(&self, window: &QueryWindow) -> Result<DynamicGraph>;
}

/// Source that always returns the same graph
#[derive(Debug, Clone, Default)]
pub struct StaticGraphSource {
    graph: DynamicGraph,
}

impl StaticGraphSource {
    pub fn new(graph: DynamicGraph) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl GraphSource for StaticGraphSource {
    async fn query(&self, _window: &QueryWindow) -> Result<DynamicGraph> {
        Ok(self.graph.clone())
    }
}
