// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-sibling-group prefix trie (§4.6.2, §4.6.3), represented per spec.md §9's design note
//! as an arena of nodes indexed by integer, with children kept as a sorted vector of
//! `(label, index)` pairs — deterministic iteration without a hash map allocation per node.
//!
//! Trie nodes are ephemeral: an arena is built, walked, and dropped once per sibling group
//! (§3, "TrieNodes live only for the duration of processing a single sibling group").

/// Index into a [`TrieArena`].
pub type TrieNodeId = usize;

struct TrieNodeData {
    /// The layer name this position represents; empty at the root.
    label: String,
    /// Sorted by label, for deterministic iteration.
    children: Vec<(String, TrieNodeId)>,
    /// Images whose relative layer sequence ends exactly at this node.
    images: Vec<String>,
}

/// An arena of [`TrieNodeId`]-addressed nodes forming one sibling group's prefix trie.
pub struct TrieArena {
    nodes: Vec<TrieNodeData>,
}

impl TrieArena {
    /// Creates a fresh arena containing just the root (representing the group's shared parent),
    /// and returns its id.
    pub fn new() -> (Self, TrieNodeId) {
        let arena = TrieArena {
            nodes: vec![TrieNodeData {
                label: String::new(),
                children: Vec::new(),
                images: Vec::new(),
            }],
        };
        (arena, 0)
    }

    /// Inserts `image_name` along `sequence`, creating intermediate nodes as needed, and records
    /// it as terminating at the node reached after consuming the whole sequence (§4.6.2 step 3).
    pub fn insert(&mut self, root: TrieNodeId, sequence: &[String], image_name: &str) {
        let mut current = root;
        for label in sequence {
            current = self.child_or_insert(current, label);
        }
        self.nodes[current].images.push(image_name.to_string());
    }

    fn child_or_insert(&mut self, node: TrieNodeId, label: &str) -> TrieNodeId {
        if let Ok(pos) = self.nodes[node]
            .children
            .binary_search_by(|(existing, _)| existing.as_str().cmp(label))
        {
            return self.nodes[node].children[pos].1;
        }
        let new_id = self.nodes.len();
        self.nodes.push(TrieNodeData {
            label: label.to_string(),
            children: Vec::new(),
            images: Vec::new(),
        });
        let pos = self.nodes[node]
            .children
            .binary_search_by(|(existing, _)| existing.as_str().cmp(label))
            .unwrap_err();
        self.nodes[node].children.insert(pos, (label.to_string(), new_id));
        new_id
    }

    pub fn label(&self, node: TrieNodeId) -> &str {
        &self.nodes[node].label
    }

    /// Children of `node`, sorted by edge label.
    pub fn children(&self, node: TrieNodeId) -> &[(String, TrieNodeId)] {
        &self.nodes[node].children
    }

    /// Images terminating exactly at `node`.
    pub fn images(&self, node: TrieNodeId) -> &[String] {
        &self.nodes[node].images
    }
}
