//! The call graph as-is: `{"nodes": {name: {}}, "edges": [...]}`

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use super::write_json;
use crate::error::Result;
use crate::types::{DynamicGraph, Edge};

#[derive(Serialize)]
struct EmptyAttributes {}

#[derive(Serialize)]
struct RawGraph<'a> {
    nodes: BTreeMap<&'a str, EmptyAttributes>,
    edges: Vec<&'a Edge>,
}

pub fn write_raw<W: Write>(sink: &mut W, graph: &DynamicGraph) -> Result<()> {
    graph.validate()?;
    let doc = RawGraph {
        nodes: graph
            .nodes()
            .iter()
            .map(|n| (n.as_str(), EmptyAttributes {}))
            .collect(),
        edges: graph.sorted_edges(),
    };
    write_json(sink, &doc)
}
