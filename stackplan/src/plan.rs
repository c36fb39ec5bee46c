// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The planner entry point (§4.8): composes the resolver, layer graph, global layer order, and
//! synthesiser into the one pipeline an external recipe serializer or CLI is expected to drive.

use crate::errors::Error;
use crate::global_order::global_layer_order;
use crate::image_graph::{full_layer_closure, resolve_image_order};
use crate::layer_graph::{resolve_layer_order, LayerGraph};
use crate::model::{Configuration, ImageMap, LayerMap};
use crate::resolve::resolve_all;
use crate::synth::synthesize;
use std::collections::{HashMap, HashSet};

/// The result of a full planning run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlanOutput {
    /// Every image in the plan, original and auto-synthesised alike, keyed by name.
    pub images: ImageMap,
    /// Per-image, the topologically ordered sequence of layers that image must install, already
    /// excluding anything its (possibly rewritten) base chain already provides.
    pub layer_orders: HashMap<String, Vec<String>>,
    /// The build order over `images` (§4.3), safe for a downstream recipe serializer to iterate
    /// without recomputing it.
    pub image_order: Vec<String>,
}

/// Public operation (§4.8): runs the full planning pipeline — resolve, order layers globally,
/// synthesise intermediates, then compute each final image's own install sequence and the
/// synthesised build order.
pub fn plan(configuration: &Configuration, layers: &LayerMap, tag: &str) -> Result<PlanOutput, Error> {
    let layer_graph = LayerGraph::build(layers)?;
    let resolved = resolve_all(configuration, tag);
    let global_order = global_layer_order(&resolved, &layer_graph)?;
    let images = synthesize(&resolved, configuration, &layer_graph, tag, &global_order)?;

    let mut layer_orders = HashMap::with_capacity(images.len());
    for (name, image) in images.iter() {
        let parent_provided: HashSet<String> = if image.is_external_base {
            HashSet::new()
        } else {
            full_layer_closure(&image.base, &images, &layer_graph)?
                .into_iter()
                .map(|node| layer_graph.name(node).to_string())
                .collect()
        };
        let order = resolve_layer_order(&layer_graph, &image.layers, &parent_provided)?;
        layer_orders.insert(name.clone(), order);
    }

    let image_order = resolve_image_order(&images)?;

    Ok(PlanOutput {
        images,
        layer_orders,
        image_order,
    })
}
