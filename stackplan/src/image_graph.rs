// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The image base-chain graph, the image graph solver (§4.3), and `LayersProvidedByImage`
//! (§4.4).
//!
//! As in `layer_graph`, edges are stored in the "needs" direction: an edge `image -> base` means
//! `image` needs `base` built first (§4.3: "for each internal-base image, an edge from it to its
//! base"). A node becomes ready for emission once every image it needs is already emitted, i.e.
//! its remaining out-degree within the graph has dropped to zero — this yields a build order
//! with bases before the images built on them.

use crate::errors::{CycleError, Error};
use crate::ids::{ImageIx, ImageNode, LayerNode, NameTable};
use crate::layer_graph::LayerGraph;
use crate::model::ImageMap;
use petgraph::graph::Graph;
use petgraph::Direction::{Incoming, Outgoing};
use std::collections::{HashMap, HashSet};

struct ImageGraph {
    graph: Graph<(), (), petgraph::Directed, ImageIx>,
    names: NameTable<ImageIx>,
}

impl ImageGraph {
    fn build(images: &ImageMap) -> Self {
        let mut names = NameTable::new();
        let mut graph = Graph::default();

        // `images` is a `BTreeMap`, so iteration (and thus id assignment) order is
        // deterministic for a given key set.
        for name in images.keys() {
            let node = names.intern(name);
            debug_assert_eq!(node.index(), graph.node_count());
            graph.add_node(());
        }

        for (name, image) in images.iter() {
            if image.is_external_base {
                continue;
            }
            // The base may point at a name outside `images` only if `is_external_base` is
            // wrong; `resolve_all`/the synthesiser always keep the two in sync, so this is a
            // defensive skip rather than a spec'd error path.
            if let (Some(&from), Some(&to)) = (names.get(name), names.get(&image.base)) {
                graph.add_edge(from, to, ());
            }
        }

        Self { graph, names }
    }

    fn name(&self, node: ImageNode) -> &str {
        self.names.name(node)
    }

    fn node(&self, name: &str) -> Option<ImageNode> {
        self.names.get(name)
    }
}

/// Public operation (§4.3): computes the topological build order of `images` from their
/// base-chain references. Kahn's algorithm; ties among ready candidates (initially, and among
/// newly-freed dependents) are broken lexicographically by name.
pub fn resolve_image_order(images: &ImageMap) -> Result<Vec<String>, Error> {
    let image_graph = ImageGraph::build(images);
    let n = image_graph.names.len();

    let mut remaining_needs: HashMap<ImageNode, usize> = (0..n)
        .map(ImageNode::new)
        .map(|node| {
            let count = image_graph.graph.neighbors_directed(node, Outgoing).count();
            (node, count)
        })
        .collect();

    let mut ready: Vec<ImageNode> = remaining_needs
        .iter()
        .filter(|(_, &count)| count == 0)
        .map(|(&node, _)| node)
        .collect();
    ready.sort_by_key(|&n| image_graph.name(n).to_string());

    let mut order = Vec::with_capacity(n);
    while !ready.is_empty() {
        let node = ready.remove(0);
        order.push(node);

        let mut newly_ready = Vec::new();
        for dependent in image_graph.graph.neighbors_directed(node, Incoming) {
            if let Some(count) = remaining_needs.get_mut(&dependent) {
                *count -= 1;
                if *count == 0 {
                    newly_ready.push(dependent);
                }
            }
        }
        if !newly_ready.is_empty() {
            ready.extend(newly_ready);
            ready.sort_by_key(|&n| image_graph.name(n).to_string());
        }
    }

    if order.len() < n {
        let emitted: HashSet<ImageNode> = order.iter().copied().collect();
        let path = find_cycle(&image_graph, &emitted);
        return Err(Error::Cycle(path));
    }

    Ok(order.into_iter().map(|n| image_graph.name(n).to_string()).collect())
}

/// DFS over the remaining (non-emitted) nodes to extract one concrete cycle, for the error
/// reported when Kahn's algorithm stalls (§4.3).
fn find_cycle(image_graph: &ImageGraph, emitted: &HashSet<ImageNode>) -> CycleError {
    let mut stuck: Vec<ImageNode> = (0..image_graph.names.len())
        .map(ImageNode::new)
        .filter(|n| !emitted.contains(n))
        .collect();
    stuck.sort_by_key(|&n| image_graph.name(n).to_string());

    let mut grey_set = HashSet::new();
    let mut grey_stack = Vec::new();
    let mut black = HashSet::new();

    for &start in &stuck {
        if black.contains(&start) {
            continue;
        }
        if let Some(path) = dfs_find_cycle(
            image_graph,
            start,
            emitted,
            &mut grey_set,
            &mut grey_stack,
            &mut black,
        ) {
            return CycleError {
                graph: "image",
                path: path.into_iter().map(|n| image_graph.name(n).to_string()).collect(),
            };
        }
    }

    // Kahn's algorithm stalled, so a cycle must exist among `stuck`; this is unreachable in
    // practice but kept total rather than panicking.
    CycleError {
        graph: "image",
        path: stuck.into_iter().map(|n| image_graph.name(n).to_string()).collect(),
    }
}

fn dfs_find_cycle(
    image_graph: &ImageGraph,
    node: ImageNode,
    emitted: &HashSet<ImageNode>,
    grey_set: &mut HashSet<ImageNode>,
    grey_stack: &mut Vec<ImageNode>,
    black: &mut HashSet<ImageNode>,
) -> Option<Vec<ImageNode>> {
    if black.contains(&node) {
        return None;
    }
    if grey_set.contains(&node) {
        let mut path: Vec<ImageNode> = grey_stack
            .iter()
            .copied()
            .skip_while(|&n| n != node)
            .collect();
        path.push(node);
        return Some(path);
    }

    grey_set.insert(node);
    grey_stack.push(node);

    for next in image_graph.graph.neighbors_directed(node, Outgoing) {
        if emitted.contains(&next) {
            continue;
        }
        if let Some(path) = dfs_find_cycle(image_graph, next, emitted, grey_set, grey_stack, black) {
            return Some(path);
        }
    }

    grey_stack.pop();
    grey_set.remove(&node);
    black.insert(node);
    None
}

/// Public operation (§4.4): traverses `name`'s base chain upward (internal bases only),
/// accumulating the union of every image's own declared `layers` from `name` itself up through
/// its ancestors, stopping at the first external base.
///
/// Fails with [`Error::ImageNotFound`] if the chain references a name not in `images`. Callers
/// that can tolerate a missing/external parent (the synthesiser, per §4.6.2 step 1) check
/// `images.contains_key` themselves and treat that case as an empty set rather than calling this
/// function at all.
pub fn layers_provided_by_image(name: &str, images: &ImageMap) -> Result<HashSet<String>, Error> {
    let mut provided = HashSet::new();
    let mut visited = HashSet::new();
    let mut current = name.to_string();

    loop {
        if !visited.insert(current.clone()) {
            // The base chain invariant (§3) rules this out; break defensively rather than loop.
            break;
        }
        let image = images
            .get(&current)
            .ok_or_else(|| Error::ImageNotFound(current.clone()))?;
        provided.extend(image.layers.iter().cloned());
        if image.is_external_base {
            break;
        }
        current = image.base.clone();
    }

    Ok(provided)
}

/// `LayersProvidedByImage` (§4.4), transitively closed through `depends` (§4.5 step 1's "all
/// layers" set; also the "full layer set" used by the synthesiser, §4.6.2/§4.6.5). Layer names
/// that don't exist in `layer_graph` are a configuration error surfaced by the validator, not
/// here, so they're silently skipped rather than failing the closure.
pub fn full_layer_closure(
    name: &str,
    images: &ImageMap,
    layer_graph: &LayerGraph,
) -> Result<HashSet<LayerNode>, Error> {
    let provided = layers_provided_by_image(name, images)?;
    let mut nodes = Vec::with_capacity(provided.len());
    for layer_name in &provided {
        if let Some(node) = layer_graph.node(layer_name) {
            nodes.push(node);
        }
    }
    Ok(layer_graph.closure(nodes, &HashSet::new())?)
}
