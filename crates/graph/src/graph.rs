use crate::types::{NodeData, ShowerNode};
use std::fmt;

/// Preorder (node first, then children left to right) walk over a subtree.
pub struct Preorder<'a> {
    pending: Vec<&'a ShowerNode>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a ShowerNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.pending.pop()?;
        self.pending.extend(node.children().iter().rev());
        Some(node)
    }
}

impl ShowerNode {
    /// Preorder iterator over this node and every descendant.
    pub fn iter(&self) -> Preorder<'_> {
        Preorder {
            pending: vec![self],
        }
    }

    /// First node in preorder (this node included) carrying `id`.
    pub fn find(&self, id: u64) -> Option<&ShowerNode> {
        self.iter().find(|node| node.id() == id)
    }

    /// This node followed by every descendant, in preorder.
    pub fn shower(&self) -> Vec<&ShowerNode> {
        self.iter().collect()
    }

    /// Sum of `energy` over this node and all descendants.
    ///
    /// Track energies are last-step deposits, so this is the cumulative
    /// deposit of the subtree.
    pub fn subtree_energy(&self) -> f64 {
        self.iter().map(ShowerNode::energy).sum()
    }

    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Largest id in the subtree.
    pub fn max_id(&self) -> u64 {
        self.iter().map(ShowerNode::id).fold(self.id(), u64::max)
    }

    /// Number of edges on the longest downward path.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 0usize)];
        while let Some((node, level)) = pending.pop() {
            deepest = deepest.max(level);
            pending.extend(node.children().iter().map(|child| (child, level + 1)));
        }
        deepest
    }

    /// Every track node describing the engine track `source_track_id`, in preorder.
    pub fn segments(&self, source_track_id: u32) -> Vec<&ShowerNode> {
        self.iter()
            .filter(|node| node.source_track_id() == Some(source_track_id))
            .collect()
    }

    /// Chain from this node down to the node carrying `id`, both ends included.
    pub fn path_to(&self, id: u64) -> Option<Vec<&ShowerNode>> {
        if self.id() == id {
            return Some(vec![self]);
        }

        let mut trail: Vec<(&ShowerNode, usize)> = vec![(self, 0)];
        while let Some(top) = trail.len().checked_sub(1) {
            let (node, next) = trail[top];
            let Some(child) = node.children().get(next) else {
                trail.pop();
                continue;
            };
            trail[top].1 += 1;
            if child.id() == id {
                let mut chain: Vec<&ShowerNode> = trail.iter().map(|(n, _)| *n).collect();
                chain.push(child);
                return Some(chain);
            }
            trail.push((child, 0));
        }
        None
    }

    /// Ancestors of the node carrying `id`, nearest first, with this node last.
    ///
    /// Nodes do not store parent links, so provenance is resolved from the
    /// tree root downward. Returns `None` when `id` is not in the subtree and
    /// an empty chain for this node itself.
    pub fn provenance_of(&self, id: u64) -> Option<Vec<&ShowerNode>> {
        let mut chain = self.path_to(id)?;
        chain.pop();
        chain.reverse();
        Some(chain)
    }

    /// Indented multi-line description of the subtree.
    pub fn dump(&self) -> String {
        self.to_string()
    }

    /// One-line description of this node alone, as it appears in [`dump`](Self::dump).
    pub fn summary(&self) -> Summary<'_> {
        Summary(self)
    }
}

/// Display adapter for a single node's line, see [`ShowerNode::summary`].
pub struct Summary<'a>(&'a ShowerNode);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0;
        match node.data() {
            NodeData::Root => write!(
                f,
                "Node {} {} Pos({})",
                node.id(),
                node.energy(),
                node.position()
            ),
            NodeData::Process { name } => write!(
                f,
                "Process {} {} {} Pos({})",
                node.id(),
                name,
                node.energy(),
                node.position()
            ),
            NodeData::Track(info) => write!(
                f,
                "Track {} {} pdg({}) E = {} X({})  P({})",
                node.id(),
                info.source_track_id,
                info.particle_code,
                node.energy(),
                node.position(),
                info.momentum
            ),
        }
    }
}

impl<'a> IntoIterator for &'a ShowerNode {
    type Item = &'a ShowerNode;
    type IntoIter = Preorder<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for ShowerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![(self, 0usize)];
        while let Some((node, level)) = pending.pop() {
            writeln!(f, "{}{}", " ".repeat(level), node.summary())?;
            pending.extend(node.children().iter().rev().map(|child| (child, level + 1)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{IdAllocator, ShowerNode, TrackInfo};
    use crate::vector::Vector4;
    use pretty_assertions::assert_eq;

    fn track(ids: &IdAllocator, source: u32, energy: f64) -> ShowerNode {
        let info = TrackInfo {
            particle_code: 11,
            source_track_id: source,
            momentum: Vector4::new(1.0, 0.0, 0.0, 1.0),
        };
        ShowerNode::track(ids, info, energy, Vector4::ZERO)
    }

    /// primary(0) -> proc(1) -> [a(2) -> proc(4), b(3)]
    fn tree() -> ShowerNode {
        let ids = IdAllocator::new();
        let mut primary = track(&ids, 1, 1.0);
        let mut process = ShowerNode::process(&ids, "eBrem", 0.0, Vector4::ZERO);
        let mut a = track(&ids, 2, 0.25);
        let b = track(&ids, 1, 0.5);
        a.add_child(ShowerNode::process(&ids, "phot", 0.0, Vector4::ZERO));
        process.add_child(a);
        process.add_child(b);
        primary.add_child(process);
        primary
    }

    fn ids_of(nodes: &[&ShowerNode]) -> Vec<u64> {
        nodes.iter().map(|n| n.id()).collect()
    }

    #[test]
    fn test_shower_is_preorder() {
        let tree = tree();
        assert_eq!(ids_of(&tree.shower()), vec![0, 1, 2, 4, 3]);
        assert_eq!(tree.node_count(), 5);
        assert_eq!(tree.max_id(), 4);
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn test_find() {
        let tree = tree();
        assert_eq!(tree.find(0).map(ShowerNode::id), Some(0));
        assert_eq!(tree.find(4).and_then(ShowerNode::process_name), Some("phot"));
        assert!(tree.find(99).is_none());
    }

    #[test]
    fn test_subtree_energy_sums_descendants() {
        let tree = tree();
        assert_eq!(tree.subtree_energy(), 1.75);
        assert_eq!(tree.children()[0].children()[0].subtree_energy(), 0.25);
    }

    #[test]
    fn test_provenance_nearest_first() {
        let tree = tree();
        assert_eq!(ids_of(&tree.provenance_of(4).unwrap()), vec![2, 1, 0]);
        assert_eq!(ids_of(&tree.provenance_of(3).unwrap()), vec![1, 0]);
        assert!(tree.provenance_of(0).unwrap().is_empty());
        assert!(tree.provenance_of(42).is_none());
    }

    #[test]
    fn test_segments_of_continuing_track() {
        let tree = tree();
        assert_eq!(ids_of(&tree.segments(1)), vec![0, 3]);
    }

    #[test]
    fn test_dump_indents_by_depth() {
        let tree = tree();
        let dump = tree.dump();
        let lines: Vec<&str> = dump.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Track 0 1 pdg(11) E = 1 X(0 0 0 0)  P(1 0 0 1)");
        assert_eq!(lines[1], " Process 1 eBrem 0 Pos(0 0 0 0)");
        assert_eq!(lines[3], "   Process 4 phot 0 Pos(0 0 0 0)");
    }

    #[test]
    fn test_summary_is_single_line() {
        let tree = tree();
        assert_eq!(
            tree.summary().to_string(),
            "Track 0 1 pdg(11) E = 1 X(0 0 0 0)  P(1 0 0 1)"
        );
        assert_eq!(
            tree.children()[0].summary().to_string(),
            "Process 1 eBrem 0 Pos(0 0 0 0)"
        );
    }
}
