//! Edge aggregation
//!
//! Collapses every raw edge between the same ordered `(source, target)` pair
//! into one visual connection. Recognized labels are parsed, scaled and
//! combined with a field-wise maximum, so the result does not depend on edge
//! order and merging a graph with itself changes nothing.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::config::ServiceGraphConfig;
use crate::error::Result;
use crate::types::{DynamicGraph, Edge, MetricField, Metrics};

/// Ordered pair identifying an aggregated connection
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ConnectionKey {
    pub source: String,
    pub target: String,
}

impl ConnectionKey {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A label value that could not be read as a finite number
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MetricParseFailure {
    pub source: String,
    pub target: String,
    pub label: String,
    pub raw: String,
}

/// Output of one aggregation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Combined metrics per connection, sorted by key
    pub connections: BTreeMap<ConnectionKey, Metrics>,
    /// Combined metrics of every edge that targets the ingress node
    pub ingress: Metrics,
    /// Labels that degraded to zero, sorted
    pub parse_failures: Vec<MetricParseFailure>,
}

impl Aggregation {
    pub fn get(&self, source: &str, target: &str) -> Option<&Metrics> {
        self.connections.get(&ConnectionKey::new(source, target))
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

/// Combines duplicate edges using configured label fields and scale
#[derive(Debug, Clone)]
pub struct EdgeAggregator {
    scale_factor: f64,
    fields: BTreeMap<String, MetricField>,
    ingress_node: String,
}

impl EdgeAggregator {
    /// Aggregator with the default label mapping and ingress node
    pub fn new(scale_factor: f64) -> Self {
        let defaults = ServiceGraphConfig::default();
        Self {
            scale_factor,
            fields: defaults.metric_fields,
            ingress_node: defaults.ingress_node,
        }
    }

    pub fn from_config(config: &ServiceGraphConfig) -> Self {
        Self {
            scale_factor: config.scale_factor,
            fields: config.metric_fields.clone(),
            ingress_node: config.ingress_node.clone(),
        }
    }

    pub fn with_ingress_node(mut self, node: impl Into<String>) -> Self {
        self.ingress_node = node.into();
        self
    }

    pub fn with_field(mut self, label: impl Into<String>, field: MetricField) -> Self {
        self.fields.insert(label.into(), field);
        self
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn ingress_node(&self) -> &str {
        &self.ingress_node
    }

    /// Validate `graph`, then fold its edges into combined connections
    pub fn aggregate(&self, graph: &DynamicGraph) -> Result<Aggregation> {
        graph.validate()?;

        let mut aggregation = Aggregation::default();
        let mut ingress: Option<Metrics> = None;
        for edge in graph.edges() {
            let metrics = self.scaled_metrics(edge, &mut aggregation.parse_failures);

            aggregation
                .connections
                .entry(ConnectionKey::new(edge.source.as_str(), edge.target.as_str()))
                .and_modify(|existing| existing.merge_max(&metrics))
                .or_insert(metrics);

            if edge.target == self.ingress_node {
                match ingress.as_mut() {
                    Some(existing) => existing.merge_max(&metrics),
                    None => ingress = Some(metrics),
                }
            }
        }
        aggregation.ingress = ingress.unwrap_or_default();

        aggregation.parse_failures.sort();
        aggregation.parse_failures.dedup();
        Ok(aggregation)
    }

    fn scaled_metrics(&self, edge: &Edge, failures: &mut Vec<MetricParseFailure>) -> Metrics {
        let mut metrics = Metrics::default();
        let mut seen: Vec<MetricField> = Vec::with_capacity(2);
        for (label, raw) in &edge.labels {
            let Some(&field) = self.fields.get(label) else {
                continue;
            };
            // An overflow after scaling is as unusable as a malformed value
            let scaled = parse_metric(raw)
                .map(|v| v * self.scale_factor)
                .filter(|v| v.is_finite());
            let value = match scaled {
                Some(v) => v,
                None => {
                    warn!(
                        source = %edge.source,
                        target = %edge.target,
                        label = %label,
                        raw = %raw,
                        "unparseable or overflowing metric label, using 0"
                    );
                    failures.push(MetricParseFailure {
                        source: edge.source.clone(),
                        target: edge.target.clone(),
                        label: label.clone(),
                        raw: raw.clone(),
                    });
                    0.0
                }
            };
            // Two labels may feed the same field
            if seen.contains(&field) {
                metrics.set(field, metrics.get(field).max(value));
            } else {
                seen.push(field);
                metrics.set(field, value);
            }
        }
        metrics
    }
}

/// Parse a label value; NaN and infinities count as malformed
fn parse_metric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
