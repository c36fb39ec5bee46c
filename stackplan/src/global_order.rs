// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The global layer orderer (§4.5): a single total order over every layer used by at least one
//! enabled image, respecting `depends` and breaking ties by descending popularity, then
//! ascending name.

use crate::errors::Error;
use crate::ids::LayerNode;
use crate::image_graph::full_layer_closure;
use crate::layer_graph::LayerGraph;
use crate::model::ImageMap;
use std::collections::{HashMap, HashSet};

/// Counts, per layer, how many distinct enabled images need it (§4.5 step 1, "popularity").
fn popularity(
    images: &ImageMap,
    layer_graph: &LayerGraph,
) -> Result<HashMap<LayerNode, usize>, Error> {
    let mut counts: HashMap<LayerNode, usize> = HashMap::new();
    for name in images.keys() {
        let closure = full_layer_closure(name, images, layer_graph)?;
        for node in closure {
            *counts.entry(node).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

/// Public operation (§4.5): the global layer order.
pub fn global_layer_order(images: &ImageMap, layer_graph: &LayerGraph) -> Result<Vec<String>, Error> {
    let popularity = popularity(images, layer_graph)?;
    let used: HashSet<LayerNode> = popularity.keys().copied().collect();

    // Induced graph: `depends` edges restricted to layers that are actually used (step 2).
    let mut remaining_needs: HashMap<LayerNode, usize> = used
        .iter()
        .map(|&node| {
            let count = layer_graph
                .direct_depends(node)
                .filter(|d| used.contains(d))
                .count();
            (node, count)
        })
        .collect();

    let pop_of = |node: LayerNode| *popularity.get(&node).unwrap_or(&0);
    let sort_key = |layer_graph: &LayerGraph, node: LayerNode| (std::cmp::Reverse(pop_of(node)), layer_graph.name(node).to_string());

    let mut ready: Vec<LayerNode> = remaining_needs
        .iter()
        .filter(|(_, &count)| count == 0)
        .map(|(&node, _)| node)
        .collect();
    ready.sort_by_key(|&n| sort_key(layer_graph, n));

    let mut order = Vec::with_capacity(used.len());
    while !ready.is_empty() {
        let node = ready.remove(0);
        order.push(node);

        let mut newly_ready = Vec::new();
        for dependent in layer_graph.direct_dependents(node) {
            if !used.contains(&dependent) {
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
            ready.sort_by_key(|&n| sort_key(layer_graph, n));
        }
    }

    if order.len() < used.len() {
        // Not reachable given the induced graph is a subgraph of the already-acyclic layer
        // graph (§4.5 step 4), but fail loudly rather than silently truncate.
        return Err(Error::Cycle(crate::errors::CycleError {
            graph: "global layer order",
            path: used
                .into_iter()
                .filter(|n| !order.contains(n))
                .map(|n| layer_graph.name(n).to_string())
                .collect(),
        }));
    }

    Ok(order.into_iter().map(|n| layer_graph.name(n).to_string()).collect())
}
