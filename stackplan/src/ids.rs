// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dense identifiers for layers and images.
//!
//! String names are interned into these the moment they cross from the string-keyed
//! [`crate::model::Configuration`]/[`crate::model::LayerMap`] boundary into the solvers; every
//! internal algorithm operates on the dense form so that graph operations are index arithmetic
//! rather than string hashing, and so the two id spaces can't be confused with each other.

use indexmap::IndexMap;
use petgraph::graph::IndexType;
use std::fmt;

/// Index type for the layer dependency graph. Used for newtype wrapping.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LayerIx(u32);

/// Index type for the image base-chain graph. Used for newtype wrapping.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ImageIx(u32);

macro_rules! graph_ix {
    ($ix_type: ident) => {
        impl fmt::Display for $ix_type {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        // From the docs for `IndexType`:
        //
        // > Marked `unsafe` because: the trait must faithfully preserve and convert index values.
        unsafe impl IndexType for $ix_type {
            #[inline(always)]
            fn new(x: usize) -> Self {
                $ix_type(x as u32)
            }
            #[inline(always)]
            fn index(&self) -> usize {
                self.0 as usize
            }
            #[inline(always)]
            fn max() -> Self {
                $ix_type(::std::u32::MAX)
            }
        }
    };
}

graph_ix!(LayerIx);
graph_ix!(ImageIx);

/// Node index into the layer dependency graph.
pub type LayerNode = petgraph::graph::NodeIndex<LayerIx>;
/// Node index into the image base-chain graph.
pub type ImageNode = petgraph::graph::NodeIndex<ImageIx>;

/// Interns string names into dense node indices for a single planning run.
///
/// Iteration order of `names()` matches insertion order (via `IndexMap`), which keeps id
/// assignment deterministic for a given insertion sequence; callers that need sorted output
/// still sort explicitly rather than relying on this order.
#[derive(Clone, Debug, Default)]
pub struct NameTable<N: IndexType> {
    to_node: IndexMap<String, petgraph::graph::NodeIndex<N>>,
    to_name: Vec<String>,
}

impl<N: IndexType> NameTable<N> {
    pub fn new() -> Self {
        Self {
            to_node: IndexMap::new(),
            to_name: Vec::new(),
        }
    }

    /// Interns `name`, returning its existing node if already known or assigning a fresh one.
    pub fn intern(&mut self, name: &str) -> petgraph::graph::NodeIndex<N> {
        if let Some(&node) = self.to_node.get(name) {
            return node;
        }
        let node = petgraph::graph::NodeIndex::new(self.to_name.len());
        self.to_name.push(name.to_string());
        self.to_node.insert(name.to_string(), node);
        node
    }

    /// Looks up a previously interned name without creating a new entry.
    pub fn get(&self, name: &str) -> Option<petgraph::graph::NodeIndex<N>> {
        self.to_node.get(name).copied()
    }

    /// Returns the name a node was interned from.
    pub fn name(&self, node: petgraph::graph::NodeIndex<N>) -> &str {
        &self.to_name[node.index()]
    }

    pub fn len(&self) -> usize {
        self.to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_name.is_empty()
    }
}
