// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test fixtures for `stackplan`.
//!
//! Hand-built `Configuration`/`LayerMap` pairs, one constructor per concrete scenario, plus a
//! couple of small builder helpers used to keep those constructors readable.

pub mod scenarios;

use stackplan::{Capabilities, Configuration, ImageDeclaration, Layer, LayerMap, PlatformSet};
use std::collections::BTreeMap;

/// Builds a layer with the given `depends`, flagged as a (harmless) root install so it never
/// trips the validator's "no install capability" check unless a scenario overrides it.
pub fn layer(name: &str, depends: &[&str]) -> Layer {
    Layer {
        name: name.to_string(),
        depends: depends.iter().map(|s| s.to_string()).collect(),
        capabilities: Capabilities {
            root_install: true,
            ..Capabilities::default()
        },
        port_values: Vec::new(),
        volume_values: Vec::new(),
        alias_values: Vec::new(),
        route_value: None,
    }
}

/// Builds an `ImageDeclaration` with an explicit base and layer list, every other field left
/// unset so it falls through to `defaults`/hard-coded fallbacks.
pub fn image(base: &str, layers: &[&str]) -> ImageDeclaration {
    ImageDeclaration {
        base: Some(base.to_string()),
        layers: layers.iter().map(|s| s.to_string()).collect(),
        ..ImageDeclaration::default()
    }
}

/// Builds an `ImageDeclaration` like [`image`], additionally pinning `platforms`.
pub fn image_with_platforms(base: &str, layers: &[&str], platforms: &[&str]) -> ImageDeclaration {
    ImageDeclaration {
        platforms: Some(platform_set(platforms)),
        ..image(base, layers)
    }
}

pub fn platform_set(platforms: &[&str]) -> PlatformSet {
    platforms.iter().map(|s| s.to_string()).collect()
}

/// Assembles a `Configuration` from `(name, declaration)` pairs, with empty defaults.
pub fn configuration(images: impl IntoIterator<Item = (&'static str, ImageDeclaration)>) -> Configuration {
    Configuration {
        defaults: ImageDeclaration::default(),
        images: images.into_iter().map(|(name, decl)| (name.to_string(), decl)).collect(),
    }
}

/// Assembles a `Configuration` with explicit `defaults`.
pub fn configuration_with_defaults(
    defaults: ImageDeclaration,
    images: impl IntoIterator<Item = (&'static str, ImageDeclaration)>,
) -> Configuration {
    Configuration {
        defaults,
        images: images.into_iter().map(|(name, decl)| (name.to_string(), decl)).collect(),
    }
}

/// Assembles a `LayerMap` from a list of layers.
pub fn layers(layers: impl IntoIterator<Item = Layer>) -> LayerMap {
    let mut map: BTreeMap<String, Layer> = BTreeMap::new();
    for layer in layers {
        map.insert(layer.name.clone(), layer);
    }
    map
}
