//! Named-connection schemas for traffic visualizations.
//!
//! The flat schema is a single region node holding every service and every
//! aggregated connection. The nested schema wraps that region in a global
//! root next to a synthetic external node, joined by one connection that
//! carries the ingress aggregate.

use std::io::Write;

use super::write_json;
use crate::aggregator::Aggregation;
use crate::config::ServiceGraphConfig;
use crate::error::Result;
use crate::types::{DynamicGraph, Metrics, VizConnection, VizNode};

const ROOT_NAME: &str = "edge";
const GLOBAL_RENDERER: &str = "global";
const REGION_RENDERER: &str = "region";
const NORMAL_CLASS: &str = "normal";
const DANGER_CLASS: &str = "danger";

/// Names and constants for the synthetic nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub region_name: String,
    pub external_node: String,
    pub max_volume: f64,
}

impl Layout {
    pub fn from_config(config: &ServiceGraphConfig) -> Self {
        Self {
            region_name: config.region_name.clone(),
            external_node: config.external_node.clone(),
            max_volume: config.max_volume,
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::from_config(&ServiceGraphConfig::default())
    }
}

fn connection(source: &str, target: &str, metrics: Metrics) -> VizConnection {
    VizConnection {
        source: source.to_string(),
        target: target.to_string(),
        class: (metrics.danger > 0.0).then(|| DANGER_CLASS.to_string()),
        metrics,
    }
}

/// Region node with every graph node as a leaf and every aggregated connection
pub fn build_flat(graph: &DynamicGraph, aggregation: &Aggregation, layout: &Layout) -> VizNode {
    let mut region = VizNode::container(
        layout.region_name.as_str(),
        REGION_RENDERER,
        Some(NORMAL_CLASS.to_string()),
    );
    region.nodes = Some(graph.nodes().iter().map(VizNode::leaf).collect());
    region.connections = Some(
        aggregation
            .connections
            .iter()
            .map(|(key, metrics)| connection(&key.source, &key.target, *metrics))
            .collect(),
    );
    region
}

/// Fixed two-level tree: global root, external leaf, region with the graph
pub fn build_nested(
    graph: &DynamicGraph,
    aggregation: &Aggregation,
    layout: &Layout,
    updated: i64,
) -> VizNode {
    let mut region = build_flat(graph, aggregation, layout);
    region.updated = Some(updated);
    region.max_volume = Some(layout.max_volume);

    let external = VizNode {
        renderer: Some(REGION_RENDERER.to_string()),
        class: Some(NORMAL_CLASS.to_string()),
        ..VizNode::leaf(layout.external_node.as_str())
    };

    let mut root = VizNode::container(ROOT_NAME, GLOBAL_RENDERER, None);
    root.nodes = Some(vec![external, region]);
    root.connections = Some(vec![connection(
        &layout.external_node,
        &layout.region_name,
        aggregation.ingress,
    )]);
    root
}

pub fn write_flat<W: Write>(
    sink: &mut W,
    graph: &DynamicGraph,
    aggregation: &Aggregation,
    layout: &Layout,
) -> Result<()> {
    graph.validate()?;
    write_json(sink, &build_flat(graph, aggregation, layout))
}

pub fn write_nested<W: Write>(
    sink: &mut W,
    graph: &DynamicGraph,
    aggregation: &Aggregation,
    layout: &Layout,
    updated: i64,
) -> Result<()> {
    graph.validate()?;
    write_json(sink, &build_nested(graph, aggregation, layout, updated))
}
