//! Serializers from an aggregated graph to the supported output schemas
//!
//! Every serializer builds its complete document in memory and only then
//! writes it, so a failed render never leaves partial output in the sink.
//! Nodes and edges are always emitted in identifier order.

mod dot;
mod indexed;
mod raw;
mod sink;
mod vizceral;

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::Deserialize;

pub use dot::{render_dot, write_dot};
pub use indexed::{build_indexed, write_indexed};
pub use raw::write_raw;
pub use sink::MirrorWriter;
pub use vizceral::{build_flat, build_nested, write_flat, write_nested, Layout};

use crate::aggregator::Aggregation;
use crate::config::ServiceGraphConfig;
use crate::error::Result;
use crate::types::DynamicGraph;

/// Output schema selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The call graph itself
    #[default]
    Raw,
    /// Graphviz text
    Dot,
    /// `{nodes, links}` with positional links
    #[serde(alias = "d3", alias = "index")]
    Indexed,
    /// One region node with named connections
    Flat,
    /// global -> region -> services tree
    #[serde(alias = "vizceral")]
    Nested,
    /// Fixed payload, streaming demo mode
    Heartbeat,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Dot => "dot",
            Self::Indexed => "indexed",
            Self::Flat => "flat",
            Self::Nested => "nested",
            Self::Heartbeat => "heartbeat",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Dot | Self::Heartbeat => "text/plain; charset=utf-8",
            _ => "application/json",
        }
    }

    /// Whether producing this format needs a graph at all
    pub fn needs_graph(&self) -> bool {
        !matches!(self, Self::Heartbeat)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" | "json" => Ok(Self::Raw),
            "dot" => Ok(Self::Dot),
            "indexed" | "index" | "d3" => Ok(Self::Indexed),
            "flat" => Ok(Self::Flat),
            "nested" | "vizceral" => Ok(Self::Nested),
            "heartbeat" => Ok(Self::Heartbeat),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Dispatches a graph to the serializer for a format
#[derive(Debug, Clone)]
pub struct Renderer {
    layout: Layout,
    heartbeat_payload: String,
}

impl Renderer {
    pub fn new(layout: Layout, heartbeat_payload: impl Into<String>) -> Self {
        Self {
            layout,
            heartbeat_payload: heartbeat_payload.into(),
        }
    }

    pub fn from_config(config: &ServiceGraphConfig) -> Self {
        Self::new(Layout::from_config(config), config.heartbeat_payload.clone())
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn heartbeat_payload(&self) -> &str {
        &self.heartbeat_payload
    }

    /// Write `graph` in `format`; `updated` stamps the nested schema's region node
    pub fn render<W: Write>(
        &self,
        format: OutputFormat,
        graph: &DynamicGraph,
        aggregation: &Aggregation,
        updated: i64,
        sink: &mut W,
    ) -> Result<()> {
        match format {
            OutputFormat::Raw => write_raw(sink, graph),
            OutputFormat::Dot => write_dot(sink, graph),
            OutputFormat::Indexed => write_indexed(sink, graph),
            OutputFormat::Flat => write_flat(sink, graph, aggregation, &self.layout),
            OutputFormat::Nested => write_nested(sink, graph, aggregation, &self.layout, updated),
            OutputFormat::Heartbeat => {
                sink.write_all(self.heartbeat_payload.as_bytes())?;
                Ok(())
            }
        }
    }

    /// Render into an owned buffer
    pub fn render_to_vec(
        &self,
        format: OutputFormat,
        graph: &DynamicGraph,
        aggregation: &Aggregation,
        updated: i64,
    ) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.render(format, graph, aggregation, updated, &mut buf)?;
        Ok(buf)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::from_config(&ServiceGraphConfig::default())
    }
}

/// Serialize `value` as one JSON document followed by a newline
pub(crate) fn write_json<W: Write, T: serde::Serialize>(sink: &mut W, value: &T) -> Result<()> {
    let mut buf = serde_json::to_vec(value)?;
    buf.push(b'\n');
    sink.write_all(&buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::EdgeAggregator;
    use crate::types::Edge;

    fn sample() -> (DynamicGraph, Aggregation) {
        let mut builder = DynamicGraph::builder();
        builder.add_edge(Edge::new("A", "B").with_label("reqs/sec", "1"));
        let graph = builder.build();
        let agg = EdgeAggregator::new(1.0).aggregate(&graph).unwrap();
        (graph, agg)
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("d3".parse::<OutputFormat>().unwrap(), OutputFormat::Indexed);
        assert_eq!("Vizceral".parse::<OutputFormat>().unwrap(), OutputFormat::Nested);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Raw);
        assert!("svg".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_format_deserialize_aliases() {
        let f: OutputFormat = serde_json::from_str("\"vizceral\"").unwrap();
        assert_eq!(f, OutputFormat::Nested);
        let f: OutputFormat = serde_json::from_str("\"flat\"").unwrap();
        assert_eq!(f, OutputFormat::Flat);
    }

    #[test]
    fn test_heartbeat_ignores_graph() {
        let (graph, agg) = sample();
        let renderer = Renderer::new(Layout::default(), "beat");
        let out = renderer
            .render_to_vec(OutputFormat::Heartbeat, &graph, &agg, 0)
            .unwrap();
        assert_eq!(out, b"beat");
        assert!(!OutputFormat::Heartbeat.needs_graph());
    }

    #[test]
    fn test_every_json_format_parses() {
        let (graph, agg) = sample();
        let renderer = Renderer::default();
        for format in [
            OutputFormat::Raw,
            OutputFormat::Indexed,
            OutputFormat::Flat,
            OutputFormat::Nested,
        ] {
            let out = renderer.render_to_vec(format, &graph, &agg, 42).unwrap();
            let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
            assert!(parsed.is_object(), "{} did not produce an object", format);
            assert_eq!(format.content_type(), "application/json");
        }
    }
}
