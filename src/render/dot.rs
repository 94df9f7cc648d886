//! Graphviz output

use std::fmt::Write as _;
use std::io::Write;

use crate::error::Result;
use crate::types::DynamicGraph;

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn quote(s: &str) -> String {
    format!("\"{}\"", escape(s))
}

/// Render `graph` as a `digraph`; edge labels become `key: value` lines
pub fn render_dot(graph: &DynamicGraph) -> String {
    let mut out = String::from("digraph \"service-graph\" {\n");
    for node in graph.nodes() {
        let _ = writeln!(out, "  {};", quote(node));
    }
    for edge in graph.sorted_edges() {
        let _ = write!(out, "  {} -> {}", quote(&edge.source), quote(&edge.target));
        if !edge.labels.is_empty() {
            let label = edge
                .labels
                .iter()
                .map(|(k, v)| format!("{}: {}", escape(k), escape(v)))
                .collect::<Vec<_>>()
                .join("\\n");
            let _ = write!(out, " [label=\"{}\"]", label);
        }
        out.push_str(";\n");
    }
    out.push_str("}\n");
    out
}

pub fn write_dot<W: Write>(sink: &mut W, graph: &DynamicGraph) -> Result<()> {
    graph.validate()?;
    sink.write_all(render_dot(graph).as_bytes())?;
    Ok(())
}
