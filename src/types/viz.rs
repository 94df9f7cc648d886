//! Export models for the JSON encodings consumed by visualization front-ends

use serde::{Deserialize, Serialize};

use super::{Labels, Metrics};

/// Index-linked document: links refer to nodes by position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexedGraph {
    pub nodes: Vec<IndexedNode>,
    pub links: Vec<IndexedLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedNode {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedLink {
    pub source: usize,
    pub target: usize,
    pub labels: Labels,
}

/// Connection between two named visualization nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VizConnection {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    pub metrics: Metrics,
}

/// Labeled, optionally nested tree node.
///
/// Leaves leave `nodes` and `connections` unset so they are omitted from the
/// output; containers always carry both lists, even when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VizNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renderer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<VizNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<VizConnection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<i64>,
    #[serde(rename = "maxVolume", default, skip_serializing_if = "Option::is_none")]
    pub max_volume: Option<f64>,
}

impl VizNode {
    /// A bare leaf carrying only its name
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// An empty container with renderer and class set
    pub fn container(
        name: impl Into<String>,
        renderer: impl Into<String>,
        class: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            renderer: Some(renderer.into()),
            class,
            nodes: Some(Vec::new()),
            connections: Some(Vec::new()),
            ..Self::default()
        }
    }
}
