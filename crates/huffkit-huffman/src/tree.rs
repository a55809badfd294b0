//! Huffman tree construction.
//!
//! ## Algorithm
//!
//! Leaves are the escape token (when enabled) and every trained symbol, in
//! token order. They enter a min-heap keyed by `(weight, rank)`:
//!
//! - a leaf's rank is its position in token order
//! - an internal node's rank is `leaf_count + creation_index`
//!
//! The two smallest nodes are merged repeatedly, the first popped becoming
//! the left (`0`) child. The rank key makes the tree a pure function of the
//! frequency table.
//!
//! ## Length Limiting
//!
//! When the tree is deeper than the configured bound, the code length
//! histogram is rebalanced with the overflow redistribution of JPEG Annex K.3
//! (`adjust_BITS`): two leaves at an overlong length are replaced by one leaf
//! one level up plus a split of the deepest shorter leaf. Each step keeps the
//! Kraft sum at exactly one. Lengths are then handed out shortest first to
//! tokens ranked by `(weight desc, token asc)` and the tree is rebuilt in
//! canonical form.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use huffkit_core::{Error, Listener, Registered, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{CodecConfig, MAX_ALPHABET_SIZE, MAX_CODE_LENGTH_LIMIT};
use crate::frequency::FrequencyTable;
use crate::symbol::{Symbol, Token};

/// Child slot not yet filled while rebuilding a canonical tree.
const UNSET: u32 = u32::MAX;

/// A token and its weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "S: Symbol")]
pub struct Leaf<S: Symbol> {
    /// Escape or symbol.
    pub token: Token<S>,
    /// Trained count (or escape weight).
    pub weight: u64,
}

impl<S: Symbol> Registered for Leaf<S> {
    fn type_name() -> String {
        format!("Leaf<{}>", S::TYPE_NAME)
    }
}

/// Internal node: two children in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalNode {
    /// Child reached by a `0` bit.
    pub left: u32,
    /// Child reached by a `1` bit.
    pub right: u32,
    /// Sum of the children's weights.
    pub weight: u64,
}

impl Registered for InternalNode {
    fn type_name() -> String {
        "InternalNode".into()
    }
}

/// Node of the tree arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "S: Symbol")]
pub enum Node<S: Symbol> {
    Leaf(Leaf<S>),
    Internal(InternalNode),
}

impl<S: Symbol> Node<S> {
    /// Weight of the node.
    pub fn weight(&self) -> u64 {
        match self {
            Node::Leaf(leaf) => leaf.weight,
            Node::Internal(node) => node.weight,
        }
    }
}

/// Huffman tree stored as an arena.
///
/// Nodes are owned by the tree and addressed by `u32` index. Every internal
/// node has two children and every leaf is reached by exactly one path. A
/// single-token alphabet yields a tree whose root is that leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "S: Symbol")]
pub struct Tree<S: Symbol> {
    nodes: Vec<Node<S>>,
    root: u32,
    leaf_count: usize,
    max_code_length: u8,
}

impl<S: Symbol> Registered for Tree<S> {
    fn type_name() -> String {
        format!("Tree<{}>", S::TYPE_NAME)
    }
}

impl<S: Symbol> Tree<S> {
    /// Build the tree for a frequency table.
    ///
    /// Fails with [`Error::EmptyAlphabet`] when nothing was trained, before
    /// the escape leaf is considered. Recoverable bound widening is reported
    /// to `listener`.
    pub fn build(
        frequencies: &FrequencyTable<S>,
        config: &CodecConfig,
        listener: &dyn Listener,
    ) -> Result<Self> {
        config.validate()?;
        if frequencies.is_empty() || frequencies.total() == 0 {
            return Err(Error::EmptyAlphabet);
        }

        let mut leaves = Vec::with_capacity(frequencies.len() + 1);
        if config.escapes {
            leaves.push(Leaf {
                token: Token::Escape,
                weight: config.escape_weight,
            });
        }
        leaves.extend(frequencies.iter().map(|(symbol, weight)| Leaf {
            token: Token::Symbol(symbol.clone()),
            weight,
        }));

        let count = leaves.len();
        if count > MAX_ALPHABET_SIZE {
            return Err(Error::AlphabetTooLarge {
                size: count,
                max: MAX_ALPHABET_SIZE,
            });
        }

        let needed = min_code_length(count);
        let mut bound = config.max_code_length;
        if needed > bound {
            listener.warning(&format!(
                "alphabet of {count} tokens needs {needed}-bit codes, widening bound from {bound}"
            ));
            bound = needed;
        }

        if count == 1 {
            listener.warning("single-token alphabet, root is a lone leaf with a one-bit code");
            debug!(tokens = 1, "built degenerate single-leaf tree");
            return Ok(Self {
                nodes: leaves.into_iter().map(Node::Leaf).collect(),
                root: 0,
                leaf_count: 1,
                max_code_length: 1,
            });
        }

        let tree = Self::merge_leaves(leaves);
        let depth = tree.max_depth();
        if depth <= bound as usize {
            debug!(tokens = count, max_code_length = depth, "built huffman tree");
            return Ok(tree);
        }

        let limited = tree.limit_lengths(bound)?;
        listener.warning(&format!(
            "huffman tree depth {depth} exceeds bound {bound}, limited to {}",
            limited.max_code_length
        ));
        debug!(
            tokens = count,
            unlimited = depth,
            max_code_length = limited.max_code_length,
            "built length-limited huffman tree"
        );
        Ok(limited)
    }

    /// Greedy minimum-weight merge.
    fn merge_leaves(leaves: Vec<Leaf<S>>) -> Self {
        let leaf_count = leaves.len();
        let mut nodes: Vec<Node<S>> = Vec::with_capacity(leaf_count * 2 - 1);
        let mut heap = BinaryHeap::with_capacity(leaf_count);

        // Node index doubles as rank: leaves first, then internal nodes in
        // creation order.
        for (index, leaf) in leaves.into_iter().enumerate() {
            heap.push(Reverse((leaf.weight, index as u32)));
            nodes.push(Node::Leaf(leaf));
        }

        while let (Some(Reverse((left_weight, left))), Some(Reverse((right_weight, right)))) =
            (heap.pop(), heap.pop())
        {
            let weight = left_weight.saturating_add(right_weight);
            let index = nodes.len() as u32;
            nodes.push(Node::Internal(InternalNode {
                left,
                right,
                weight,
            }));
            heap.push(Reverse((weight, index)));
        }

        let root = (nodes.len() - 1) as u32;
        let mut tree = Self {
            nodes,
            root,
            leaf_count,
            max_code_length: 0,
        };
        tree.max_code_length = tree.max_depth() as u8;
        tree
    }

    /// Rebuild as a canonical tree whose codes fit in `bound` bits.
    fn limit_lengths(&self, bound: u8) -> Result<Self> {
        let depths = self.leaf_depths();
        let deepest = depths.iter().map(|&(_, d)| d).max().unwrap_or(0);

        let mut histogram = vec![0usize; deepest + 1];
        for &(_, depth) in &depths {
            histogram[depth] += 1;
        }
        adjust_lengths(&mut histogram, bound as usize)?;

        // Shortest codes go to the heaviest tokens, ties to the smaller token.
        let mut ranked: Vec<&Leaf<S>> = depths
            .iter()
            .filter_map(|&(index, _)| match &self.nodes[index as usize] {
                Node::Leaf(leaf) => Some(leaf),
                Node::Internal(_) => None,
            })
            .collect();
        ranked.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.token.cmp(&b.token)));

        let mut assigned = Vec::with_capacity(ranked.len());
        let mut next = ranked.into_iter();
        for (length, &count) in histogram.iter().enumerate().skip(1) {
            for leaf in next.by_ref().take(count) {
                assigned.push((leaf.clone(), length as u8));
            }
        }

        Self::canonical(assigned)
    }

    /// Build a tree from `(leaf, length)` pairs sorted by length, assigning
    /// canonical codes in that order.
    fn canonical(assigned: Vec<(Leaf<S>, u8)>) -> Result<Self> {
        let leaf_count = assigned.len();
        let max_code_length = assigned.last().map(|&(_, l)| l).unwrap_or(0);

        let mut nodes: Vec<Node<S>> = Vec::with_capacity(leaf_count * 2 - 1);
        nodes.push(Node::Internal(InternalNode {
            left: UNSET,
            right: UNSET,
            weight: 0,
        }));

        let mut code = 0u32;
        let mut previous = assigned.first().map(|&(_, l)| l).unwrap_or(0);
        for (leaf, length) in assigned {
            code <<= length - previous;
            previous = length;
            insert_path(&mut nodes, code, length, leaf)?;
            code += 1;
        }

        let incomplete = nodes.iter().any(|node| {
            matches!(node, Node::Internal(inner) if inner.left == UNSET || inner.right == UNSET)
        });
        if incomplete {
            return Err(Error::invalid_state("full prefix code", "incomplete tree"));
        }

        let mut tree = Self {
            nodes,
            root: 0,
            leaf_count,
            max_code_length,
        };
        tree.sum_weights(0);
        Ok(tree)
    }

    fn sum_weights(&mut self, index: u32) -> u64 {
        let node = match &self.nodes[index as usize] {
            Node::Leaf(leaf) => return leaf.weight,
            Node::Internal(node) => *node,
        };
        let weight = self
            .sum_weights(node.left)
            .saturating_add(self.sum_weights(node.right));
        if let Node::Internal(inner) = &mut self.nodes[index as usize] {
            inner.weight = weight;
        }
        weight
    }

    /// `(node index, depth)` of every leaf, in depth-first order.
    fn leaf_depths(&self) -> Vec<(u32, usize)> {
        let mut out = Vec::with_capacity(self.leaf_count);
        let mut stack = vec![(self.root, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            match &self.nodes[index as usize] {
                Node::Leaf(_) => out.push((index, depth)),
                Node::Internal(node) => {
                    stack.push((node.right, depth + 1));
                    stack.push((node.left, depth + 1));
                }
            }
        }
        out
    }

    fn max_depth(&self) -> usize {
        self.leaf_depths()
            .iter()
            .map(|&(_, d)| d)
            .max()
            .unwrap_or(0)
            .max(1)
    }

    /// Root node index.
    pub fn root(&self) -> u32 {
        self.root
    }

    /// Node at `index`.
    pub fn node(&self, index: u32) -> Option<&Node<S>> {
        self.nodes.get(index as usize)
    }

    /// All nodes of the arena.
    pub fn nodes(&self) -> &[Node<S>] {
        &self.nodes
    }

    /// Number of leaves (tokens).
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Longest code length in the tree.
    pub fn max_code_length(&self) -> u8 {
        self.max_code_length
    }

    /// Total weight at the root.
    pub fn weight(&self) -> u64 {
        self.nodes[self.root as usize].weight()
    }

    /// Check if the tree is a lone leaf.
    pub fn is_degenerate(&self) -> bool {
        matches!(self.nodes[self.root as usize], Node::Leaf(_))
    }
}

/// Smallest code length able to give `count` tokens distinct codes.
fn min_code_length(count: usize) -> u8 {
    let mut bits = 1u8;
    while bits < MAX_CODE_LENGTH_LIMIT && (1usize << bits) < count {
        bits += 1;
    }
    bits
}

/// Move every code longer than `bound` to `bound` or shorter, keeping the
/// number of codes and the Kraft sum. `histogram[l]` is the number of codes
/// of length `l`.
fn adjust_lengths(histogram: &mut Vec<usize>, bound: usize) -> Result<()> {
    let deepest = histogram.len() - 1;
    for length in (bound + 1..=deepest).rev() {
        while histogram[length] > 0 {
            let mut shorter = length - 2;
            while shorter > 0 && histogram[shorter] == 0 {
                shorter -= 1;
            }
            if shorter == 0 {
                return Err(Error::AlphabetTooLarge {
                    size: histogram.iter().sum(),
                    max: 1 << bound,
                });
            }
            histogram[length] -= 2;
            histogram[length - 1] += 1;
            histogram[shorter + 1] += 2;
            histogram[shorter] -= 1;
        }
    }
    histogram.truncate(bound + 1);
    Ok(())
}

/// Walk `code` from the root, creating internal nodes as needed, and hang
/// `leaf` at the end of the path.
fn insert_path<S: Symbol>(
    nodes: &mut Vec<Node<S>>,
    code: u32,
    length: u8,
    leaf: Leaf<S>,
) -> Result<()> {
    let mut current = 0u32;
    for depth in (0..length).rev() {
        let bit = (code >> depth) & 1;
        let last = depth == 0;

        let child = match &nodes[current as usize] {
            Node::Internal(node) => {
                if bit == 0 {
                    node.left
                } else {
                    node.right
                }
            }
            Node::Leaf(_) => UNSET,
        };

        let next = if child != UNSET {
            if last {
                return Err(Error::invalid_state("prefix-free code", "duplicate code path"));
            }
            child
        } else {
            let index = nodes.len() as u32;
            nodes.push(if last {
                Node::Leaf(leaf.clone())
            } else {
                Node::Internal(InternalNode {
                    left: UNSET,
                    right: UNSET,
                    weight: 0,
                })
            });
            match &mut nodes[current as usize] {
                Node::Internal(node) if bit == 0 => node.left = index,
                Node::Internal(node) => node.right = index,
                Node::Leaf(_) => {
                    return Err(Error::invalid_state("prefix-free code", "code passes a leaf"));
                }
            }
            index
        };
        current = next;
    }
    Ok(())
}
