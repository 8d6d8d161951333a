//! Whitespace-tokenized textual encoding of shower trees.
//!
//! A node is written in preorder as
//! `id kind [kind fields] energy t x y z [momentum] child_count children...`
//! where the kind-specific fields are the process name for processes and
//! `particle_code source_track_id` (plus the trailing momentum) for tracks.
//! Collections are plain concatenations of trees.

use crate::error::{GraphError, Result};
use crate::types::{NodeData, NodeKind, ShowerNode, TrackInfo};
use crate::vector::Vector4;
use std::fmt::Write;
use std::str::{FromStr, SplitWhitespace};

/// Upper bound on speculative child-vector capacity taken from untrusted counts.
const MAX_PREALLOCATED_CHILDREN: usize = 1024;

/// Cursor over whitespace-separated tokens.
#[derive(Clone)]
pub struct TokenStream<'a> {
    inner: SplitWhitespace<'a>,
    consumed: usize,
}

impl<'a> TokenStream<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: input.split_whitespace(),
            consumed: 0,
        }
    }

    pub fn next_token(&mut self) -> Option<&'a str> {
        let token = self.inner.next()?;
        self.consumed += 1;
        Some(token)
    }

    pub fn peek_token(&self) -> Option<&'a str> {
        self.inner.clone().next()
    }

    /// True when no token remains.
    pub fn is_exhausted(&self) -> bool {
        self.peek_token().is_none()
    }

    /// Number of tokens consumed so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Look at the `id kind` header of the next node without consuming it.
    pub fn peek_kind(&self) -> Result<NodeKind> {
        let mut probe = self.inner.clone();
        let Some(_id) = probe.next() else {
            return Err(self.truncated("node id"));
        };
        let Some(tag) = probe.next() else {
            return Err(GraphError::format(format!(
                "truncated input: missing node kind at token {}",
                self.consumed + 1
            )));
        };
        NodeKind::from_tag(tag).ok_or_else(|| {
            GraphError::format(format!(
                "unknown node kind '{tag}' at token {}",
                self.consumed + 1
            ))
        })
    }

    pub fn expect_token(&mut self, what: &str) -> Result<&'a str> {
        self.next_token().ok_or_else(|| self.truncated(what))
    }

    pub fn next_parsed<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let token = self.expect_token(what)?;
        token.parse().map_err(|_| {
            GraphError::format(format!(
                "invalid {what} '{token}' at token {}",
                self.consumed - 1
            ))
        })
    }

    pub fn next_f64(&mut self, what: &str) -> Result<f64> {
        self.next_parsed(what)
    }

    fn truncated(&self, what: &str) -> GraphError {
        GraphError::format(format!(
            "truncated input: missing {what} at token {}",
            self.consumed
        ))
    }
}

/// Process names travel as a single token.
pub fn is_valid_process_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

/// Append the preorder encoding of `root` and its subtree to `out`.
pub fn encode_node(root: &ShowerNode, out: &mut String) -> Result<()> {
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        encode_header(node, out)?;
        pending.extend(node.children().iter().rev());
    }
    Ok(())
}

fn encode_header(node: &ShowerNode, out: &mut String) -> Result<()> {
    let _ = write!(out, "{} {} ", node.id(), node.kind().tag());
    match node.data() {
        NodeData::Root => {}
        NodeData::Process { name } => {
            if !is_valid_process_name(name) {
                return Err(GraphError::format(format!(
                    "process name {name:?} of node {} cannot be encoded as one token",
                    node.id()
                )));
            }
            let _ = write!(out, "{name} ");
        }
        NodeData::Track(info) => {
            let _ = write!(out, "{} {} ", info.particle_code, info.source_track_id);
        }
    }
    let _ = write!(out, "{} ", node.energy());
    node.position().encode_into(out);
    if let NodeData::Track(info) = node.data() {
        info.momentum.encode_into(out);
    }
    let _ = write!(out, "{} ", node.children().len());
    Ok(())
}

/// Partially decoded node waiting for its children.
struct Frame {
    id: u64,
    data: NodeData,
    energy: f64,
    position: Vector4,
    remaining: usize,
    children: Vec<ShowerNode>,
}

impl Frame {
    fn finish(self) -> ShowerNode {
        ShowerNode::from_parts(self.id, self.data, self.energy, self.position, self.children)
    }
}

fn decode_header(tokens: &mut TokenStream<'_>) -> Result<Frame> {
    let kind = tokens.peek_kind()?;
    let id: u64 = tokens.next_parsed("node id")?;
    tokens.expect_token("node kind")?;

    let (data, energy, position) = match kind {
        NodeKind::Root => {
            let energy = tokens.next_f64("energy")?;
            let position = Vector4::decode(tokens)?;
            (NodeData::Root, energy, position)
        }
        NodeKind::Process => {
            let name = tokens.expect_token("process name")?.to_string();
            let energy = tokens.next_f64("energy")?;
            let position = Vector4::decode(tokens)?;
            (NodeData::Process { name }, energy, position)
        }
        NodeKind::Track => {
            let particle_code: i32 = tokens.next_parsed("particle code")?;
            let source_track_id: u32 = tokens.next_parsed("source track id")?;
            let energy = tokens.next_f64("energy")?;
            let position = Vector4::decode(tokens)?;
            let momentum = Vector4::decode(tokens)?;
            let info = TrackInfo {
                particle_code,
                source_track_id,
                momentum,
            };
            (NodeData::Track(info), energy, position)
        }
    };

    let remaining: usize = tokens.next_parsed("child count")?;
    Ok(Frame {
        id,
        data,
        energy,
        position,
        remaining,
        children: Vec::with_capacity(remaining.min(MAX_PREALLOCATED_CHILDREN)),
    })
}

/// Decode exactly one tree from the front of `tokens`.
///
/// The child count is authoritative: the tree ends once every announced child
/// has been read. Nothing is returned on failure.
pub fn decode_node(tokens: &mut TokenStream<'_>) -> Result<ShowerNode> {
    let mut open: Vec<Frame> = Vec::new();
    loop {
        open.push(decode_header(tokens)?);

        while open.last().is_some_and(|frame| frame.remaining == 0) {
            let Some(frame) = open.pop() else { break };
            let node = frame.finish();
            match open.last_mut() {
                Some(parent) => {
                    parent.children.push(node);
                    parent.remaining -= 1;
                }
                None => return Ok(node),
            }
        }
    }
}

/// Concatenate the encodings of every tree, with no separator or count.
pub fn encode_collection(trees: &[ShowerNode]) -> Result<String> {
    let mut out = String::new();
    for tree in trees {
        encode_node(tree, &mut out)?;
    }
    Ok(out)
}

/// Decode trees until the input is exhausted.
///
/// End of input between trees is success; end of input inside a tree is a
/// format error.
pub fn decode_collection(input: &str) -> Result<Vec<ShowerNode>> {
    let mut tokens = TokenStream::new(input);
    let mut trees = Vec::new();
    while !tokens.is_exhausted() {
        trees.push(decode_node(&mut tokens)?);
    }
    Ok(trees)
}

impl ShowerNode {
    /// Textual encoding of this node and its subtree.
    pub fn encode(&self) -> Result<String> {
        let mut out = String::new();
        encode_node(self, &mut out)?;
        Ok(out)
    }
}

impl FromStr for ShowerNode {
    type Err = GraphError;

    /// Parse exactly one tree; trailing tokens are rejected.
    fn from_str(input: &str) -> Result<Self> {
        let mut tokens = TokenStream::new(input);
        let node = decode_node(&mut tokens)?;
        if let Some(extra) = tokens.peek_token() {
            return Err(GraphError::format(format!(
                "unexpected token '{extra}' after tree at token {}",
                tokens.consumed()
            )));
        }
        Ok(node)
    }
}
