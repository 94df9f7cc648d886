//! Service Graph
//!
//! Renders a service-call topology, queried from a monitoring backend, into
//! JSON encodings for visualization front-ends, and streams periodic
//! snapshots over WebSocket connections.
//!
//! # Pipeline
//!
//! 1. A [`GraphSource`] produces a [`DynamicGraph`] for a query window.
//! 2. Nodes from the [`StaticRegistry`] are merged in and the graph is validated.
//! 3. The [`EdgeAggregator`] collapses duplicate edges with a field-wise maximum.
//! 4. A serializer from [`render`] writes the requested schema to a sink.
//!
//! # Modules
//!
//! - `types`: Call graph, node registry, metrics, export models
//! - `aggregator`: Edge aggregation and ingress summary
//! - `render`: Raw, dot, index-linked, flat and nested serializers
//! - `source`: Graph sources (Prometheus, fixed graph)
//! - `api`: HTTP routes and WebSocket streaming
//! - `config`: Runtime configuration
//!
//! # Example
//!
//! ```
//! use service_graph::{DynamicGraph, Edge, EdgeAggregator};
//! use service_graph::render::write_indexed;
//!
//! let mut builder = DynamicGraph::builder();
//! builder.add_edge(Edge::new("A", "B").with_label("reqs/sec", "5"));
//! builder.add_edge(Edge::new("A", "B").with_label("reqs/sec", "3"));
//! let graph = builder.build();
//!
//! let aggregation = EdgeAggregator::new(10.0).aggregate(&graph).unwrap();
//! assert_eq!(aggregation.get("A", "B").unwrap().normal, 50.0);
//!
//! let mut out = Vec::new();
//! write_indexed(&mut out, &graph).unwrap();
//! ```

pub mod aggregator;
pub mod api;
pub mod config;
pub mod error;
pub mod render;
pub mod source;
pub mod types;

// Re-export commonly used items at crate root
pub use aggregator::{Aggregation, ConnectionKey, EdgeAggregator, MetricParseFailure};
pub use config::ServiceGraphConfig;
pub use error::{Result, ServiceGraphError};
pub use render::{OutputFormat, Renderer};
pub use source::{GraphSource, PrometheusSource, QueryWindow, StaticGraphSource};
pub use types::{DynamicGraph, Edge, Labels, MetricField, Metrics, StaticRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
