// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The structural validator (§4.9): a battery of purely structural checks over a
//! [`Configuration`] and [`LayerMap`] that need no filesystem or registry access. Every issue
//! found is collected into one [`ValidationError`] rather than returned on the first failure.

use crate::errors::{Error, ValidationError, ValidationIssue};
use crate::image_graph::{layers_provided_by_image, resolve_image_order};
use crate::layer_graph::LayerGraph;
use crate::model::{Configuration, LayerMap};
use crate::resolve::resolve_all;
use std::collections::HashSet;

const NAME_PATTERN_CHARS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

fn matches_name_pattern(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    name.chars().all(|c| NAME_PATTERN_CHARS.contains(c))
}

/// Public operation (§4.9): runs every structural check, returning `Ok(())` if none fired or
/// `Err(ValidationError)` carrying the full batch otherwise.
pub fn validate(configuration: &Configuration, layers: &LayerMap) -> Result<(), ValidationError> {
    let mut issues = Vec::new();

    check_unknown_layers(configuration, layers, &mut issues);
    check_layer_capabilities(layers, &mut issues);
    check_ports(layers, &mut issues);
    check_volume_and_alias_names(layers, &mut issues);
    check_self_referential_builder(configuration, &mut issues);

    // The tag is irrelevant to every structural property checked here; any placeholder works.
    let resolved = resolve_all(configuration, "validate");

    check_pkg(&resolved, &mut issues);
    check_routes(&resolved, layers, &mut issues);
    check_layer_cycles(layers, &mut issues);
    check_image_cycles(&resolved, &mut issues);
    check_merge_needs_builder(&resolved, &mut issues);

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { issues })
    }
}

fn check_pkg(resolved: &crate::model::ImageMap, issues: &mut Vec<ValidationIssue>) {
    for (name, image) in resolved.iter() {
        if image.pkg != "rpm" && image.pkg != "deb" {
            issues.push(ValidationIssue::InvalidPkg {
                image: name.clone(),
                pkg: image.pkg.clone(),
            });
        }
    }
}

fn check_unknown_layers(configuration: &Configuration, layers: &LayerMap, issues: &mut Vec<ValidationIssue>) {
    for (layer_name, layer) in layers.iter() {
        for dep in &layer.depends {
            if !layers.contains_key(dep) {
                issues.push(ValidationIssue::UnknownLayer {
                    name: dep.clone(),
                    context: layer_name.clone(),
                });
            }
        }
    }
    for (image_name, decl) in configuration.images.iter() {
        for layer_name in &decl.layers {
            if !layers.contains_key(layer_name) {
                issues.push(ValidationIssue::UnknownLayer {
                    name: layer_name.clone(),
                    context: image_name.clone(),
                });
            }
        }
    }
}

fn check_layer_capabilities(layers: &LayerMap, issues: &mut Vec<ValidationIssue>) {
    for (name, layer) in layers.iter() {
        if layer.capabilities.is_empty() {
            issues.push(ValidationIssue::NoInstallCapability { layer: name.clone() });
        }
    }
}

fn check_ports(layers: &LayerMap, issues: &mut Vec<ValidationIssue>) {
    for (name, layer) in layers.iter() {
        for &port in &layer.port_values {
            if !(1..=65535).contains(&port) {
                issues.push(ValidationIssue::PortOutOfRange {
                    layer: name.clone(),
                    port,
                });
            }
        }
    }
}

fn check_volume_and_alias_names(layers: &LayerMap, issues: &mut Vec<ValidationIssue>) {
    for (layer_name, layer) in layers.iter() {
        let mut seen_volumes = HashSet::new();
        for volume in &layer.volume_values {
            if !matches_name_pattern(&volume.name) {
                issues.push(ValidationIssue::MalformedName {
                    layer: layer_name.clone(),
                    kind: "volume",
                    name: volume.name.clone(),
                });
            }
            if !seen_volumes.insert(volume.name.clone()) {
                issues.push(ValidationIssue::DuplicateName {
                    layer: layer_name.clone(),
                    kind: "volume",
                    name: volume.name.clone(),
                });
            }
        }

        let mut seen_aliases = HashSet::new();
        for alias in &layer.alias_values {
            if !matches_name_pattern(&alias.name) {
                issues.push(ValidationIssue::MalformedName {
                    layer: layer_name.clone(),
                    kind: "alias",
                    name: alias.name.clone(),
                });
            }
            if !seen_aliases.insert(alias.name.clone()) {
                issues.push(ValidationIssue::DuplicateName {
                    layer: layer_name.clone(),
                    kind: "alias",
                    name: alias.name.clone(),
                });
            }
        }
    }
}

fn check_routes(resolved: &crate::model::ImageMap, layers: &LayerMap, issues: &mut Vec<ValidationIssue>) {
    for name in resolved.keys() {
        let chain = match layers_provided_by_image(name, resolved) {
            Ok(chain) => chain,
            // Already reported as an unresolvable base chain elsewhere; skip here.
            Err(_) => continue,
        };
        let chain_layers: Vec<_> = chain.iter().filter_map(|layer_name| layers.get(layer_name)).collect();
        let has_route = chain_layers.iter().any(|layer| layer.route_value.is_some());
        let has_provider = chain_layers.iter().any(|layer| layer.capabilities.traefik_provider);
        if has_route && !has_provider {
            issues.push(ValidationIssue::RouteWithoutProvider { image: name.clone() });
        }
    }
}

fn check_layer_cycles(layers: &LayerMap, issues: &mut Vec<ValidationIssue>) {
    let layer_graph = match LayerGraph::build(layers) {
        Ok(graph) => graph,
        // An unbuildable graph means a dangling `depends`, already reported by
        // `check_unknown_layers`; there's nothing further to say about cycles here.
        Err(_) => return,
    };
    let all_nodes: Vec<_> = layers.keys().filter_map(|name| layer_graph.node(name)).collect();
    if let Err(cycle) = layer_graph.closure(all_nodes, &HashSet::new()) {
        issues.push(ValidationIssue::Cycle(cycle));
    }
}

fn check_image_cycles(resolved: &crate::model::ImageMap, issues: &mut Vec<ValidationIssue>) {
    if let Err(Error::Cycle(cycle)) = resolve_image_order(resolved) {
        issues.push(ValidationIssue::Cycle(cycle));
    }
}

fn check_self_referential_builder(configuration: &Configuration, issues: &mut Vec<ValidationIssue>) {
    for (name, decl) in configuration.images.iter() {
        if decl.builder.as_deref() == Some(name.as_str()) {
            issues.push(ValidationIssue::SelfReferentialBuilder { image: name.clone() });
        }
    }
}

/// §4.9/spec.md §7's "missing-builder-but-needed": an image with `merge` set needs a `builder`
/// that resolves to another image in the map; a missing or dangling `builder` leaves nothing to
/// merge from.
fn check_merge_needs_builder(resolved: &crate::model::ImageMap, issues: &mut Vec<ValidationIssue>) {
    for (name, image) in resolved.iter() {
        if !image.merge {
            continue;
        }
        let resolves = image.builder.as_deref().is_some_and(|builder| resolved.contains_key(builder));
        if !resolves {
            issues.push(ValidationIssue::MissingBuilder { image: name.clone() });
        }
    }
}
