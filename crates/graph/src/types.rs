use crate::vector::Vector4;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Node variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Generic event root (placeholder until the primary track is recorded)
    Root,

    /// Physics process that ended a step
    Process,

    /// Particle trajectory segment
    Track,
}

impl NodeKind {
    /// Integer tag written to the textual format.
    pub const fn tag(self) -> u8 {
        match self {
            NodeKind::Root => 0,
            NodeKind::Process => 1,
            NodeKind::Track => 2,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "0" => Some(NodeKind::Root),
            "1" => Some(NodeKind::Process),
            "2" => Some(NodeKind::Track),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Process => "process",
            NodeKind::Track => "track",
        }
    }
}

/// Kinematic identity of a track node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// PDG particle code
    pub particle_code: i32,

    /// Track identifier assigned by the simulation engine (not the node id)
    pub source_track_id: u32,

    /// Four-momentum (E, px, py, pz) when the node was created
    pub momentum: Vector4,
}

/// Variant-specific payload
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Root,
    Process { name: String },
    Track(TrackInfo),
}

impl NodeData {
    pub const fn kind(&self) -> NodeKind {
        match self {
            NodeData::Root => NodeKind::Root,
            NodeData::Process { .. } => NodeKind::Process,
            NodeData::Track(_) => NodeKind::Track,
        }
    }
}

/// Node of a shower tree. Children are exclusively owned and kept in discovery order.
pub struct ShowerNode {
    id: u64,
    energy: f64,
    position: Vector4,
    data: NodeData,
    children: Vec<ShowerNode>,
}

impl ShowerNode {
    /// Generic root with zero energy at the origin.
    pub fn root(ids: &IdAllocator) -> Self {
        Self::new(ids, NodeData::Root, 0.0, Vector4::ZERO)
    }

    pub fn process(
        ids: &IdAllocator,
        name: impl Into<String>,
        energy: f64,
        position: Vector4,
    ) -> Self {
        Self::new(ids, NodeData::Process { name: name.into() }, energy, position)
    }

    pub fn track(ids: &IdAllocator, info: TrackInfo, energy: f64, position: Vector4) -> Self {
        Self::new(ids, NodeData::Track(info), energy, position)
    }

    /// Build a node with a freshly allocated id.
    pub fn new(ids: &IdAllocator, data: NodeData, energy: f64, position: Vector4) -> Self {
        Self {
            id: ids.next_id(),
            energy,
            position,
            data,
            children: Vec::new(),
        }
    }

    /// Rebuild a node with a known id (decoding).
    pub(crate) fn from_parts(
        id: u64,
        data: NodeData,
        energy: f64,
        position: Vector4,
        children: Vec<ShowerNode>,
    ) -> Self {
        Self {
            id,
            energy,
            position,
            data,
            children,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn position(&self) -> Vector4 {
        self.position
    }

    pub fn children(&self) -> &[ShowerNode] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn process_name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Process { name } => Some(name),
            _ => None,
        }
    }

    pub fn track_info(&self) -> Option<&TrackInfo> {
        match &self.data {
            NodeData::Track(info) => Some(info),
            _ => None,
        }
    }

    pub fn particle_code(&self) -> Option<i32> {
        self.track_info().map(|t| t.particle_code)
    }

    pub fn source_track_id(&self) -> Option<u32> {
        self.track_info().map(|t| t.source_track_id)
    }

    pub fn momentum(&self) -> Option<Vector4> {
        self.track_info().map(|t| t.momentum)
    }

    pub fn set_energy(&mut self, energy: f64) {
        self.energy = energy;
    }

    pub fn set_position(&mut self, position: Vector4) {
        self.position = position;
    }

    /// Append a child, returning its index among this node's children.
    pub fn add_child(&mut self, child: ShowerNode) -> usize {
        self.children.push(child);
        self.children.len() - 1
    }

    pub(crate) fn child_mut(&mut self, index: usize) -> Option<&mut ShowerNode> {
        self.children.get_mut(index)
    }

    /// Generic root that never received its primary track.
    pub fn is_placeholder(&self) -> bool {
        self.kind() == NodeKind::Root && self.is_leaf()
    }

    fn same_fields(&self, other: &ShowerNode) -> bool {
        self.id == other.id
            && self.energy == other.energy
            && self.position == other.position
            && self.data == other.data
            && self.children.len() == other.children.len()
    }
}

/// Partially cloned node: its source and the children copied so far.
struct CloneFrame<'a> {
    source: &'a ShowerNode,
    children: Vec<ShowerNode>,
}

impl<'a> CloneFrame<'a> {
    fn new(source: &'a ShowerNode) -> Self {
        Self {
            source,
            children: Vec::with_capacity(source.children.len()),
        }
    }

    fn finish(self) -> ShowerNode {
        let source = self.source;
        ShowerNode::from_parts(
            source.id,
            source.data.clone(),
            source.energy,
            source.position,
            self.children,
        )
    }
}

// Clone, equality and drop walk the tree with explicit stacks: a track that
// keeps stepping nests two levels per step.
impl Clone for ShowerNode {
    fn clone(&self) -> Self {
        let mut current = CloneFrame::new(self);
        let mut parents: Vec<CloneFrame<'_>> = Vec::new();
        loop {
            if let Some(child) = current.source.children.get(current.children.len()) {
                parents.push(std::mem::replace(&mut current, CloneFrame::new(child)));
                continue;
            }
            let node = current.finish();
            match parents.pop() {
                Some(mut parent) => {
                    parent.children.push(node);
                    current = parent;
                }
                None => return node,
            }
        }
    }
}

impl PartialEq for ShowerNode {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            if !left.same_fields(right) {
                return false;
            }
            pending.extend(left.children.iter().zip(&right.children));
        }
        true
    }
}

/// Shallow: children are listed by id.
impl fmt::Debug for ShowerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children: Vec<u64> = self.children.iter().map(ShowerNode::id).collect();
        f.debug_struct("ShowerNode")
            .field("id", &self.id)
            .field("energy", &self.energy)
            .field("position", &self.position)
            .field("data", &self.data)
            .field("children", &children)
            .finish()
    }
}

impl Drop for ShowerNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Allocates process-unique node ids. Share one allocator (via `Arc`) across all
/// recorders of a run so ids never collide between workers.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator whose first id is `first`, e.g. one past `ShowerNode::max_id` of a
    /// decoded collection.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Id the next allocation will return.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
