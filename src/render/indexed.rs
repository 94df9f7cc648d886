//! Index-linked schema: `{"nodes": [{"name"}], "links": [{"source", "target", "labels"}]}`

use std::collections::HashMap;
use std::io::Write;

use super::write_json;
use crate::error::{Result, ServiceGraphError};
use crate::types::{DynamicGraph, IndexedGraph, IndexedLink, IndexedNode};

/// Build the document; links carry every raw edge with its labels
pub fn build_indexed(graph: &DynamicGraph) -> Result<IndexedGraph> {
    let nodes: Vec<IndexedNode> = graph
        .nodes()
        .iter()
        .map(|name| IndexedNode { name: name.clone() })
        .collect();

    let positions: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.name.as_str(), i))
        .collect();
    let index_of = |name: &str| {
        positions
            .get(name)
            .copied()
            .ok_or_else(|| ServiceGraphError::invalid_graph(name))
    };

    let links = graph
        .sorted_edges()
        .into_iter()
        .map(|edge| {
            Ok(IndexedLink {
                source: index_of(&edge.source)?,
                target: index_of(&edge.target)?,
                labels: edge.labels.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(IndexedGraph { nodes, links })
}

pub fn write_indexed<W: Write>(sink: &mut W, graph: &DynamicGraph) -> Result<()> {
    let doc = build_indexed(graph)?;
    write_json(sink, &doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Edge;

    #[test]
    fn test_links_use_node_positions() {
        let graph = DynamicGraph::with_data(
            vec!["b".to_string(), "a".to_string(), "c".to_string()],
            vec![
                Edge::new("c", "a").with_label("reqs/sec", "1"),
                Edge::new("a", "b"),
            ],
        );
        let doc = build_indexed(&graph).unwrap();

        let names: Vec<&str> = doc.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!((doc.links[0].source, doc.links[0].target), (0, 1));
        assert_eq!((doc.links[1].source, doc.links[1].target), (2, 0));
        assert_eq!(doc.links[1].labels.get("reqs/sec").unwrap(), "1");
    }

    #[test]
    fn test_missing_endpoint_fails_without_output() {
        let graph = DynamicGraph::with_data(
            vec!["A".to_string(), "B".to_string()],
            vec![Edge::new("A", "C")],
        );
        let mut sink = Vec::new();
        match write_indexed(&mut sink, &graph) {
            Err(ServiceGraphError::InvalidGraph { node }) => assert_eq!(node, "C"),
            other => panic!("expected InvalidGraph, got {:?}", other),
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn test_bit_exact_field_names() {
        let graph = DynamicGraph::with_data(
            vec!["A".to_string(), "B".to_string()],
            vec![Edge::new("A", "B").with_label("reqs/sec", "5")],
        );
        let mut sink = Vec::new();
        write_indexed(&mut sink, &graph).unwrap();
        let text = String::from_utf8(sink).unwrap();
        assert_eq!(
            text,
            "{\"nodes\":[{\"name\":\"A\"},{\"name\":\"B\"}],\"links\":[{\"source\":0,\"target\":1,\"labels\":{\"reqs/sec\":\"5\"}}]}\n"
        );
    }
}
