// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The layer dependency graph and layer graph solver (§4.2).
//!
//! Edges are stored in the natural "needs" direction: an edge `a -> b` means layer `a` depends
//! on (needs) layer `b`. Topological emission order is therefore the *reverse* of a standard
//! Kahn's walk over this graph: a layer becomes "ready" once every layer it needs has already
//! been emitted, i.e. once its out-degree within the remaining closure has dropped to zero.

use crate::errors::{CycleError, Error};
use crate::ids::{LayerIx, LayerNode, NameTable};
use crate::model::LayerMap;
use petgraph::graph::Graph;
use petgraph::Direction::{Incoming, Outgoing};
use std::collections::{HashMap, HashSet};

/// The layer dependency graph, built once per planning run from a [`LayerMap`].
#[derive(Clone, Debug)]
pub struct LayerGraph {
    graph: Graph<(), (), petgraph::Directed, LayerIx>,
    names: NameTable<LayerIx>,
}

impl LayerGraph {
    /// Builds the graph from every layer in `layers`. Fails with [`Error::UnknownLayer`] if a
    /// `depends` entry names a layer that doesn't exist in the map.
    pub fn build(layers: &LayerMap) -> Result<Self, Error> {
        let mut names = NameTable::new();
        let mut graph = Graph::default();

        // Layers are iterated in `BTreeMap` (sorted) order, so node ids are assigned
        // deterministically for a given input regardless of the caller's insertion order.
        for name in layers.keys() {
            let node = names.intern(name);
            debug_assert_eq!(node.index(), graph.node_count());
            graph.add_node(());
        }

        for (name, layer) in layers.iter() {
            let from = names.get(name).expect("interned above");
            for dep in &layer.depends {
                let to = names
                    .get(dep)
                    .ok_or_else(|| Error::UnknownLayer {
                        name: dep.clone(),
                        context: name.clone(),
                    })?;
                graph.add_edge(from, to, ());
            }
        }

        Ok(Self { graph, names })
    }

    /// Looks up the node for a layer by name, if it exists in this graph.
    pub fn node(&self, name: &str) -> Option<LayerNode> {
        self.names.get(name)
    }

    /// The name a node was interned under.
    pub fn name(&self, node: LayerNode) -> &str {
        self.names.name(node)
    }

    /// The number of layers in this graph.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if this graph has no layers.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All layers this one directly depends on.
    pub fn direct_depends(&self, node: LayerNode) -> impl Iterator<Item = LayerNode> + '_ {
        self.graph.neighbors_directed(node, Outgoing)
    }

    /// All layers that directly depend on this one.
    pub fn direct_dependents(&self, node: LayerNode) -> impl Iterator<Item = LayerNode> + '_ {
        self.graph.neighbors_directed(node, Incoming)
    }

    /// Computes the transitive closure of `requested` under the `depends` relation, excluding
    /// anything already in `parent_provided` (and anything only reachable through an excluded
    /// node — §4.2: "excluding any layer already in `parent_provided`").
    ///
    /// Cycle detection uses a grey-set during the walk: when a grey (on-stack) node is
    /// re-entered, the current path plus that node is the reported cycle (§4.2).
    pub fn closure(
        &self,
        requested: impl IntoIterator<Item = LayerNode>,
        parent_provided: &HashSet<LayerNode>,
    ) -> Result<HashSet<LayerNode>, CycleError> {
        let mut included = HashSet::new();
        let mut black = HashSet::new();
        let mut grey_stack: Vec<LayerNode> = Vec::new();
        let mut grey_set: HashSet<LayerNode> = HashSet::new();

        for start in requested {
            if parent_provided.contains(&start) {
                continue;
            }
            self.visit(start, parent_provided, &mut included, &mut black, &mut grey_stack, &mut grey_set)?;
        }
        Ok(included)
    }

    #[allow(clippy::too_many_arguments)]
    fn visit(
        &self,
        node: LayerNode,
        parent_provided: &HashSet<LayerNode>,
        included: &mut HashSet<LayerNode>,
        black: &mut HashSet<LayerNode>,
        grey_stack: &mut Vec<LayerNode>,
        grey_set: &mut HashSet<LayerNode>,
    ) -> Result<(), CycleError> {
        if black.contains(&node) {
            return Ok(());
        }
        if grey_set.contains(&node) {
            let mut path: Vec<String> = grey_stack
                .iter()
                .skip_while(|&&n| n != node)
                .map(|&n| self.name(n).to_string())
                .collect();
            path.push(self.name(node).to_string());
            return Err(CycleError { graph: "layer", path });
        }

        grey_set.insert(node);
        grey_stack.push(node);
        included.insert(node);

        for dep in self.direct_depends(node) {
            if parent_provided.contains(&dep) {
                continue;
            }
            self.visit(dep, parent_provided, included, black, grey_stack, grey_set)?;
        }

        grey_stack.pop();
        grey_set.remove(&node);
        black.insert(node);
        Ok(())
    }

    /// Topologically sorts `nodes` (which must form an acyclic, self-contained set — every
    /// `depends` edge between two members of `nodes` is respected; edges leaving the set are
    /// ignored). Ties among ready nodes are broken by ascending name, for determinism (§4.2).
    pub fn toposort(&self, nodes: &HashSet<LayerNode>) -> Vec<LayerNode> {
        let mut remaining_needs: HashMap<LayerNode, usize> = nodes
            .iter()
            .map(|&n| {
                let count = self
                    .direct_depends(n)
                    .filter(|d| nodes.contains(d))
                    .count();
                (n, count)
            })
            .collect();

        let mut ready: Vec<LayerNode> = remaining_needs
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&n, _)| n)
            .collect();
        ready.sort_by_key(|&n| self.name(n).to_string());

        let mut order = Vec::with_capacity(nodes.len());
        while !ready.is_empty() {
            let node = ready.remove(0);
            order.push(node);

            let mut newly_ready = Vec::new();
            for dependent in self.direct_dependents(node) {
                if !nodes.contains(&dependent) {
                    continue;
                }
                if let Some(count) = remaining_needs.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        newly_ready.push(dependent);
                    }
                }
            }
            if !newly_ready.is_empty() {
                ready.extend(newly_ready);
                ready.sort_by_key(|&n| self.name(n).to_string());
            }
        }

        order
    }
}

/// Public operation (§4.2): computes the transitive closure of `requested` under `depends`,
/// excluding `parent_provided`, then returns it in deterministic topological order (ties broken
/// by ascending name).
pub fn resolve_layer_order(
    layer_graph: &LayerGraph,
    requested: &[String],
    parent_provided: &HashSet<String>,
) -> Result<Vec<String>, Error> {
    let mut requested_nodes = Vec::with_capacity(requested.len());
    for name in requested {
        let node = layer_graph
            .node(name)
            .ok_or_else(|| Error::UnknownLayer {
                name: name.clone(),
                context: "image layers".to_string(),
            })?;
        requested_nodes.push(node);
    }
    let parent_provided_nodes: HashSet<LayerNode> = parent_provided
        .iter()
        .filter_map(|name| layer_graph.node(name))
        .collect();

    let closure = layer_graph.closure(requested_nodes, &parent_provided_nodes)?;
    let order = layer_graph.toposort(&closure);
    Ok(order.into_iter().map(|n| layer_graph.name(n).to_string()).collect())
}
