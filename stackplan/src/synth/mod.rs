// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The intermediate synthesiser (§4.6): for every group of sibling images sharing a direct
//! parent, factors out a shared prefix of layers into one or more auto-generated intermediate
//! images, so the same layers aren't installed redundantly in each sibling.
//!
//! The driver (§4.6.1) computes one sibling grouping up front, from each image's *originally
//! declared* base — synthesis never re-groups around a freshly-minted intermediate, since no
//! original image could have declared a base that didn't exist yet. Each group is processed
//! exactly once, via a prefix trie (`trie` submodule) built from every sibling's layer sequence
//! relative to the shared parent, then walked recursively (§4.6.3) to decide, at every shared
//! prefix boundary, whether to reuse a single user-authored image as the intermediate (Case A) or
//! mint a new auto-intermediate (Case B).

mod trie;

use crate::defaults;
use crate::errors::Error;
use crate::image_graph::{full_layer_closure, resolve_image_order};
use crate::layer_graph::LayerGraph;
use crate::model::{Configuration, ImageMap, PlatformSet, ResolvedImage};
use std::collections::{HashMap, HashSet};
use trie::{TrieArena, TrieNodeId};

/// Read-only context threaded through the whole synthesis run; `output` is the one thing that
/// changes as groups are processed.
struct SynthCtx<'a> {
    output: &'a mut ImageMap,
    configuration: &'a Configuration,
    layer_graph: &'a LayerGraph,
    tag: &'a str,
    global_order_index: &'a HashMap<String, usize>,
}

/// Public operation (§4.6): synthesises auto-intermediates on top of `images`, returning the
/// full image map (every original image, by identity, plus zero or more new ones).
pub fn synthesize(
    images: &ImageMap,
    configuration: &Configuration,
    layer_graph: &LayerGraph,
    tag: &str,
    global_order: &[String],
) -> Result<ImageMap, Error> {
    let mut output: ImageMap = images.clone();
    let global_order_index: HashMap<String, usize> = global_order
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect();

    // §4.6.1 step 3: image_order over the pre-synthesis map, fixed for the whole run.
    let image_order = resolve_image_order(&output)?;

    // The designated builder image is never grouped as a sibling (§4.6.1 step 4).
    let builder_name = configuration.defaults.builder.clone();

    let mut children_of: HashMap<String, Vec<String>> = HashMap::new();
    for (name, image) in images.iter() {
        if builder_name.as_deref() == Some(name.as_str()) {
            continue;
        }
        children_of.entry(image.base.clone()).or_default().push(name.clone());
    }
    for children in children_of.values_mut() {
        children.sort();
    }

    let mut ctx = SynthCtx {
        output: &mut output,
        configuration,
        layer_graph,
        tag,
        global_order_index: &global_order_index,
    };

    // Internal-parent groups first, in image_order, so the driver's processing order is
    // deterministic regardless of how many groups exist (§4.6.1 step 5).
    for parent in &image_order {
        if let Some(children) = children_of.get(parent) {
            if children.len() >= 2 {
                process_group(parent, children, &mut ctx)?;
            }
        }
    }

    // External-parent groups afterward, in a deterministic (sorted) order.
    let mut external_parents: Vec<String> = children_of
        .keys()
        .filter(|parent| !images.contains_key(parent.as_str()))
        .cloned()
        .collect();
    external_parents.sort();
    for parent in external_parents {
        let children = &children_of[&parent];
        if children.len() >= 2 {
            process_group(&parent, children, &mut ctx)?;
        }
    }

    Ok(output)
}

/// §4.6.2: processes one sibling group — computes `parent_provided`, each child's relative layer
/// sequence, builds the prefix trie, and walks it.
fn process_group(parent: &str, children: &[String], ctx: &mut SynthCtx<'_>) -> Result<(), Error> {
    let parent_provided: HashSet<String> = if ctx.output.contains_key(parent) {
        full_layer_closure(parent, ctx.output, ctx.layer_graph)?
            .into_iter()
            .map(|node| ctx.layer_graph.name(node).to_string())
            .collect()
    } else {
        HashSet::new()
    };

    let (mut arena, root) = TrieArena::new();
    for child in children {
        let sequence = relative_layer_sequence(child, &parent_provided, ctx)?;
        arena.insert(root, &sequence, child);
    }

    walk(&arena, root, parent, &parent_provided, ctx)
}

/// §4.6.2 step 2: the subsequence of `global_order` containing exactly the layers in `child`'s
/// full layer set (own layers plus its entire base chain, transitively closed through `depends`)
/// that aren't already in `parent_provided`.
fn relative_layer_sequence(
    child: &str,
    parent_provided: &HashSet<String>,
    ctx: &SynthCtx<'_>,
) -> Result<Vec<String>, Error> {
    let full_set = full_layer_closure(child, ctx.output, ctx.layer_graph)?;
    let mut names: Vec<String> = full_set
        .into_iter()
        .map(|node| ctx.layer_graph.name(node).to_string())
        .filter(|name| !parent_provided.contains(name))
        .collect();
    names.sort_by_key(|name| order_index(ctx, name));
    Ok(names)
}

fn order_index(ctx: &SynthCtx<'_>, name: &str) -> usize {
    *ctx.global_order_index.get(name).unwrap_or(&usize::MAX)
}

/// §4.6.3: the recursive trie walk. `node` is the position already reached in `arena` (the group
/// root on the first call); `current_parent` is the image name that anything terminating in
/// `node`'s subtree should ultimately be rebased onto.
fn walk(
    arena: &TrieArena,
    node: TrieNodeId,
    current_parent: &str,
    parent_provided: &HashSet<String>,
    ctx: &mut SynthCtx<'_>,
) -> Result<(), Error> {
    for &(_, child_id) in arena.children(node) {
        let mut path_layers = vec![arena.label(child_id).to_string()];
        let mut cur = child_id;

        // Collapse a linear run (no branch, nothing terminates) into one segment (§4.6.3 step 1).
        while arena.children(cur).len() == 1 && arena.images(cur).is_empty() {
            let (_, next_id) = arena.children(cur)[0].clone();
            path_layers.push(arena.label(next_id).to_string());
            cur = next_id;
        }

        let terminating = arena.images(cur);

        if arena.children(cur).is_empty() && terminating.len() <= 1 {
            // True leaf: at most one image's path ends here uniquely, with nothing downstream
            // to share it with. Rebase directly onto the current parent; there is nothing to
            // factor out (§4.6.3 step 3).
            for image_name in terminating {
                rebase(image_name, current_parent, ctx);
            }
            continue;
        }

        // Branch point: a node that either forks into multiple children, or has two or more
        // images ending at exactly the same position (identical relative sequences all the way
        // to their leaves — spec.md §9's open question, resolved here the way the source
        // resolves it: mint one shared intermediate rather than leaving the prefix
        // undeduplicated). Either way, exactly one user image reused as the intermediate
        // (Case A), or zero/multiple, which mints a fresh auto-intermediate (Case B) (§4.6.3
        // step 4).
        if terminating.len() == 1 {
            let reused = terminating[0].clone();
            walk(arena, cur, &reused, parent_provided, ctx)?;
        } else {
            let minted = mint_intermediate(current_parent, &path_layers, parent_provided, ctx)?;
            for image_name in terminating {
                rebase(image_name, &minted, ctx);
            }
            walk(arena, cur, &minted, parent_provided, ctx)?;
        }
    }
    Ok(())
}

fn rebase(image_name: &str, new_base: &str, ctx: &mut SynthCtx<'_>) {
    let is_external_base = !ctx.output.contains_key(new_base);
    if let Some(image) = ctx.output.get_mut(image_name) {
        image.base = new_base.to_string();
        image.is_external_base = is_external_base;
    }
}

/// §4.6.4 + §4.6.5 + §4.6.6 + §4.6.7: builds and inserts a new auto-intermediate whose base is
/// `current_parent` and whose own layers are the shared prefix represented by `path_layers`,
/// returning its chosen name.
fn mint_intermediate(
    current_parent: &str,
    path_layers: &[String],
    parent_provided: &HashSet<String>,
    ctx: &mut SynthCtx<'_>,
) -> Result<String, Error> {
    let own_layers = own_layers_for_intermediate(path_layers, parent_provided, ctx)?;
    let name = choose_intermediate_name(current_parent, path_layers, ctx);

    let defaults = &ctx.configuration.defaults;
    let registry = defaults.registry.clone().unwrap_or_else(|| defaults::DEFAULT_REGISTRY.to_string());
    let pkg = defaults.pkg.clone().unwrap_or_else(|| defaults::DEFAULT_PKG.to_string());
    let user = defaults.user.clone().unwrap_or_else(|| defaults::DEFAULT_USER.to_string());
    let uid = defaults.uid.unwrap_or(defaults::DEFAULT_UID);
    let gid = defaults.gid.unwrap_or(defaults::DEFAULT_GID);
    let merge = defaults.merge.unwrap_or(false);
    let builder = defaults.builder.clone();

    let platforms = inherited_platforms(current_parent, ctx);
    let is_external_base = !ctx.output.contains_key(current_parent);
    let home = ResolvedImage::home_for_user(&user);
    let full_tag = ResolvedImage::compute_full_tag(&registry, &name, ctx.tag);

    let image = ResolvedImage {
        name: name.clone(),
        base: current_parent.to_string(),
        is_external_base,
        layers: own_layers,
        platforms,
        tag: ctx.tag.to_string(),
        registry,
        pkg,
        user,
        uid,
        gid,
        ports: Vec::new(),
        aliases: Vec::new(),
        merge,
        builder,
        home,
        full_tag,
        auto: true,
    };
    ctx.output.insert(name.clone(), image);
    Ok(name)
}

/// §4.6.5: the new intermediate's own layers are `path_layers` plus their transitive `depends`
/// closure, excluding `parent_provided`, ordered by the global layer order; falls back to
/// `path_layers` as-is if that projection comes back empty.
fn own_layers_for_intermediate(
    path_layers: &[String],
    parent_provided: &HashSet<String>,
    ctx: &SynthCtx<'_>,
) -> Result<Vec<String>, Error> {
    let path_nodes: Vec<_> = path_layers
        .iter()
        .filter_map(|name| ctx.layer_graph.node(name))
        .collect();
    let provided_nodes: HashSet<_> = parent_provided
        .iter()
        .filter_map(|name| ctx.layer_graph.node(name))
        .collect();

    let closure = ctx.layer_graph.closure(path_nodes, &provided_nodes)?;
    let mut names: Vec<String> = closure.into_iter().map(|node| ctx.layer_graph.name(node).to_string()).collect();
    if names.is_empty() {
        return Ok(path_layers.to_vec());
    }
    names.sort_by_key(|name| order_index(ctx, name));
    Ok(names)
}

/// §4.6.6: auto-intermediates inherit platforms from the configuration defaults intersected with
/// the direct parent's platforms, falling back to the parent's platforms if the intersection is
/// empty. When the parent is external (no platform set of its own to intersect against), the
/// defaults themselves stand in for "the parent's platforms."
fn inherited_platforms(current_parent: &str, ctx: &SynthCtx<'_>) -> PlatformSet {
    let defaults_platforms = ctx
        .configuration
        .defaults
        .platforms
        .clone()
        .unwrap_or_else(defaults::default_platforms);
    let parent_platforms = ctx
        .output
        .get(current_parent)
        .map(|image| image.platforms.clone())
        .unwrap_or_else(|| defaults_platforms.clone());

    let intersection: PlatformSet = defaults_platforms.intersection(&parent_platforms).cloned().collect();
    if intersection.is_empty() {
        parent_platforms
    } else {
        intersection
    }
}

/// §4.6.4: `<short-parent-name>-<last-layer>`, disambiguated with a numeric suffix against every
/// name already present in the output map (original images and previously-minted intermediates
/// alike).
fn choose_intermediate_name(current_parent: &str, path_layers: &[String], ctx: &SynthCtx<'_>) -> String {
    let short_parent = short_name(current_parent);
    let last_layer = path_layers.last().expect("a stop node is reached via at least one edge");
    let desired = format!("{}-{}", short_parent, last_layer);

    if !ctx.output.contains_key(&desired) {
        return desired;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{}-{}", desired, suffix);
        if !ctx.output.contains_key(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Strips an optional `:tag` and any `registry/namespace/` prefix, so that e.g.
/// `quay.io/fedora/fedora:43` contributes just `fedora`.
fn short_name(full: &str) -> String {
    let without_tag = full.rsplit_once(':').map(|(left, _)| left).unwrap_or(full);
    without_tag.rsplit('/').next().unwrap_or(without_tag).to_string()
}
