//! Data types for service graphs
//!
//! The call graph snapshot, the node registry, combined metrics and the
//! export models the serializers emit.

mod graph;
mod metrics;
mod registry;
mod viz;

pub use graph::{DynamicGraph, Edge, GraphBuilder, Labels};
pub use metrics::{MetricField, Metrics};
pub use registry::StaticRegistry;
pub use viz::{IndexedGraph, IndexedLink, IndexedNode, VizConnection, VizNode};
