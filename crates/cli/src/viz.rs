//! Graphviz rendering of a shower tree.

use calography_graph::{NodeData, ShowerNode};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

/// Vertex of the rendered graph.
#[derive(Debug, Clone)]
pub struct VizVertex {
    pub id: u64,
    pub label: String,
    pub shape: &'static str,
}

impl VizVertex {
    fn of(node: &ShowerNode) -> Self {
        let (label, shape) = match node.data() {
            NodeData::Track(info) => (
                format!("{} pdg({})", info.source_track_id, info.particle_code),
                "diamond",
            ),
            NodeData::Process { name } => (name.clone(), "ellipse"),
            NodeData::Root => (node.id().to_string(), "box"),
        };
        Self {
            id: node.id(),
            label,
            shape,
        }
    }

    fn attributes(&self) -> String {
        format!(
            "label=\"{}\" shape=\"{}\"",
            self.label.replace('\\', "\\\\").replace('"', "\\\""),
            self.shape
        )
    }
}

/// Directed graph with one vertex per node and parent -> child edges.
pub fn shower_digraph(tree: &ShowerNode) -> DiGraph<VizVertex, ()> {
    let mut graph = DiGraph::new();
    let mut pending: Vec<(&ShowerNode, Option<NodeIndex>)> = vec![(tree, None)];
    while let Some((node, parent)) = pending.pop() {
        let index = graph.add_node(VizVertex::of(node));
        if let Some(parent) = parent {
            graph.add_edge(parent, index, ());
        }
        pending.extend(node.children().iter().rev().map(|child| (child, Some(index))));
    }
    graph
}

/// DOT source for `tree`. Vertices are named by shower node id so they
/// match the ids printed by `print` and `find`.
pub fn render_dot(tree: &ShowerNode) -> String {
    let graph = shower_digraph(tree);
    let mut dot = String::from("digraph shower {\n");
    for index in graph.node_indices() {
        let vertex = &graph[index];
        dot.push_str(&format!("    {} [ {} ]\n", vertex.id, vertex.attributes()));
    }
    for edge in graph.edge_references() {
        dot.push_str(&format!(
            "    {} -> {}\n",
            graph[edge.source()].id,
            graph[edge.target()].id
        ));
    }
    dot.push_str("}\n");
    dot
}

#[cfg(test)]
mod tests {
    use super::*;
    use calography_graph::{IdAllocator, TrackInfo, Vector4};

    #[test]
    fn test_render_dot_shapes_and_edges() {
        let ids = IdAllocator::new();
        let info = TrackInfo {
            particle_code: 22,
            source_track_id: 1,
            momentum: Vector4::ZERO,
        };
        let mut track = ShowerNode::track(&ids, info, 0.0, Vector4::ZERO);
        track.add_child(ShowerNode::process(&ids, "conv", 0.0, Vector4::ZERO));

        let graph = shower_digraph(&track);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);

        let dot = render_dot(&track);
        assert!(dot.starts_with("digraph shower {"));
        assert!(dot.contains("label=\"1 pdg(22)\" shape=\"diamond\""));
        assert!(dot.contains("label=\"conv\" shape=\"ellipse\""));
        assert!(dot.contains("0 -> 1"));
    }

    #[test]
    fn test_vertices_named_by_node_id() {
        let ids = IdAllocator::starting_at(40);
        let mut root = ShowerNode::root(&ids);
        let mut process = ShowerNode::process(&ids, "annihil", 0.0, Vector4::ZERO);
        process.add_child(ShowerNode::process(&ids, "phot", 0.0, Vector4::ZERO));
        root.add_child(process);

        let dot = render_dot(&root);
        assert!(dot.contains("    40 [ label=\"40\" shape=\"box\" ]\n"));
        assert!(dot.contains("    42 [ label=\"phot\" shape=\"ellipse\" ]\n"));
        assert!(dot.contains("    40 -> 41\n"));
        assert!(dot.contains("    41 -> 42\n"));
        assert!(!dot.contains("0 -> 1"));
        assert!(dot.ends_with("}\n"));
    }
}
