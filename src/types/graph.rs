//! Call graph snapshot type

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::StaticRegistry;
use crate::error::{Result, ServiceGraphError};

/// Metric name to raw, string-encoded value (e.g. `"reqs/sec" -> "12.4"`)
pub type Labels = BTreeMap<String, String>;

/// A single observed call from `source` to `target`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub labels: Labels,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            labels: Labels::new(),
        }
    }

    /// Add or replace a label, builder style
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Call-topology snapshot for one query window.
///
/// Immutable once built: sources assemble it through [`GraphBuilder`] and
/// every consumer only reads it. Node identifiers are kept in a sorted set,
/// so iteration order never depends on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicGraph {
    nodes: BTreeSet<String>,
    edges: Vec<Edge>,
}

impl DynamicGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph from explicit nodes and edges (no validation)
    pub fn with_data(nodes: impl IntoIterator<Item = String>, edges: Vec<Edge>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
            edges,
        }
    }

    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    pub fn nodes(&self) -> &BTreeSet<String> {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.nodes.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check that every edge endpoint is a member of the node set.
    ///
    /// Edges are checked in sequence order, source before target, so the
    /// reported node is stable for a given graph.
    pub fn validate(&self) -> Result<()> {
        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !self.nodes.contains(endpoint) {
                    return Err(ServiceGraphError::invalid_graph(endpoint.as_str()));
                }
            }
        }
        Ok(())
    }

    /// Copy of this graph with every registry node added to the node set
    pub fn merged_with(&self, registry: &StaticRegistry) -> Self {
        let mut nodes = self.nodes.clone();
        nodes.extend(registry.snapshot());
        Self {
            nodes,
            edges: self.edges.clone(),
        }
    }

    /// Edges sorted by source, target, then labels
    pub fn sorted_edges(&self) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self.edges.iter().collect();
        edges.sort();
        edges
    }
}

/// Accumulates nodes and edges before freezing them into a [`DynamicGraph`]
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: BTreeSet<String>,
    edges: Vec<Edge>,
}

impl GraphBuilder {
    pub fn add_node(&mut self, name: impl Into<String>) -> &mut Self {
        self.nodes.insert(name.into());
        self
    }

    /// Add an edge, registering both endpoints as nodes
    pub fn add_edge(&mut self, edge: Edge) -> &mut Self {
        self.nodes.insert(edge.source.clone());
        self.nodes.insert(edge.target.clone());
        self.edges.push(edge);
        self
    }

    /// Mutable access to the labels of the most recent edge between a pair
    pub fn edge_labels_mut(&mut self, source: &str, target: &str) -> Option<&mut Labels> {
        self.edges
            .iter_mut()
            .rev()
            .find(|e| e.source == source && e.target == target)
            .map(|e| &mut e.labels)
    }

    pub fn build(self) -> DynamicGraph {
        DynamicGraph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}
