use calography_graph::{NodeKind, ShowerNode};
use serde::Serialize;
use std::path::Path;

/// Summary of one event tree.
#[derive(Debug, Clone, Serialize)]
pub struct EventStats {
    pub event: usize,
    pub root_kind: NodeKind,
    pub nodes: usize,
    pub tracks: usize,
    pub processes: usize,
    pub depth: usize,
    pub subtree_energy: f64,
}

impl EventStats {
    pub fn of(event: usize, tree: &ShowerNode) -> Self {
        let (mut tracks, mut processes, mut nodes) = (0, 0, 0);
        for node in tree.iter() {
            nodes += 1;
            match node.kind() {
                NodeKind::Track => tracks += 1,
                NodeKind::Process => processes += 1,
                NodeKind::Root => {}
            }
        }
        Self {
            event,
            root_kind: tree.kind(),
            nodes,
            tracks,
            processes,
            depth: tree.depth(),
            subtree_energy: tree.subtree_energy(),
        }
    }
}

pub fn collect_stats(trees: &[ShowerNode]) -> Vec<EventStats> {
    trees
        .iter()
        .enumerate()
        .map(|(event, tree)| EventStats::of(event, tree))
        .collect()
}

pub fn render_stats_report(file: &Path, stats: &[EventStats]) -> String {
    let mut md = String::new();
    md.push_str("# Shower collection\n\n");
    md.push_str(&format!("- File: `{}`\n", file.display()));
    md.push_str(&format!("- Events: `{}`\n\n", stats.len()));

    md.push_str("| event | root | nodes | tracks | processes | depth | energy |\n");
    md.push_str("|---:|---|---:|---:|---:|---:|---:|\n");
    for row in stats {
        md.push_str(&format!(
            "| `{}` | `{}` | `{}` | `{}` | `{}` | `{}` | `{:.6}` |\n",
            row.event,
            row.root_kind.as_str(),
            row.nodes,
            row.tracks,
            row.processes,
            row.depth,
            row.subtree_energy
        ));
    }
    md
}

/// Node line plus its ancestry, nearest ancestor first.
pub fn render_provenance(node: &ShowerNode, ancestors: &[&ShowerNode]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", node.summary()));
    for (distance, ancestor) in ancestors.iter().enumerate() {
        out.push_str(&format!("  {}: {}\n", distance + 1, ancestor.summary()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use calography_graph::{IdAllocator, Vector4};

    #[test]
    fn test_stats_counts_kinds() {
        let ids = IdAllocator::new();
        let mut root = ShowerNode::root(&ids);
        let mut process = ShowerNode::process(&ids, "msc", 0.5, Vector4::ZERO);
        process.add_child(ShowerNode::process(&ids, "eIoni", 0.25, Vector4::ZERO));
        root.add_child(process);

        let stats = EventStats::of(0, &root);
        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.processes, 2);
        assert_eq!(stats.tracks, 0);
        assert_eq!(stats.depth, 2);
        assert_eq!(stats.subtree_energy, 0.75);

        let md = render_stats_report(Path::new("run0.cg"), &[stats]);
        assert!(md.contains("| `0` | `root` | `3` | `0` | `2` | `2` | `0.750000` |"));
    }

    #[test]
    fn test_provenance_one_line_per_node() {
        let ids = IdAllocator::new();
        let mut root = ShowerNode::root(&ids);
        let mut process = ShowerNode::process(&ids, "conv", 0.0, Vector4::ZERO);
        let mut inner = ShowerNode::process(&ids, "eIoni", 0.5, Vector4::ZERO);
        inner.add_child(ShowerNode::process(&ids, "msc", 0.0, Vector4::ZERO));
        inner.add_child(ShowerNode::process(&ids, "msc", 0.0, Vector4::ZERO));
        process.add_child(inner);
        root.add_child(process);

        let node = root.find(2).unwrap();
        let ancestors = root.provenance_of(2).unwrap();
        let text = render_provenance(node, &ancestors);

        assert_eq!(text.lines().count(), ancestors.len() + 1);
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                "Process 2 eIoni 0.5 Pos(0 0 0 0)",
                "  1: Process 1 conv 0 Pos(0 0 0 0)",
                "  2: Node 0 0 Pos(0 0 0 0)",
            ]
        );
    }
}
