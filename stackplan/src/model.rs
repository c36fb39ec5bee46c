// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The declarative project model: layers, image declarations, and the configuration that ties
//! them together. These are the boundary types produced by the (external) model loader and
//! consumed by the resolver.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A set of platform tags, e.g. `linux/amd64`. Kept as a sorted set so that intersection
/// (§4.6.6) and equality checks are order-independent and deterministic to print.
pub type PlatformSet = std::collections::BTreeSet<String>;

/// A port declaration, checked by the validator to be in `1..=65535`.
pub type Port = i64;

/// A volume declaration: a name plus the container path it mounts at.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    pub path: String,
}

/// An alias declaration: a shorthand name plus the command it expands to.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    pub command: String,
}

/// A routing rule: the host this image should be reachable at, plus which port to route to.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub host: String,
    pub port: Port,
}

/// Capability flags carried by a [`Layer`]. The core only reads these as booleans (whether a
/// capability is present); the actual install-step content is opaque to it and belongs to the
/// (external) recipe serializer.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub root_install: bool,
    pub user_install: bool,
    pub pixi: bool,
    pub npm: bool,
    pub native_build: bool,
    pub service: bool,
    pub env: bool,
    pub ports: bool,
    pub route: bool,
    pub volumes: bool,
    pub aliases: bool,
    /// Whether this layer provides the traefik/routing capability that a `route` layer needs
    /// reachable somewhere in its image's resolved stack (§4.9).
    pub traefik_provider: bool,
}

impl Capabilities {
    /// True iff none of the capability flags are set — such a layer does nothing and is flagged
    /// by the validator (§4.9).
    pub fn is_empty(&self) -> bool {
        !(self.root_install
            || self.user_install
            || self.pixi
            || self.npm
            || self.native_build
            || self.service
            || self.env
            || self.ports
            || self.route
            || self.volumes
            || self.aliases
            || self.traefik_provider)
    }
}

/// A declarative, installable unit. Identified by `name`, matching
/// `[a-zA-Z0-9][a-zA-Z0-9._-]*` (§6).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    /// Other layers this one requires installed first, in declaration order (order doesn't
    /// affect the solved result, but is preserved for round-tripping).
    #[serde(default)]
    pub depends: Vec<String>,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub port_values: Vec<Port>,
    #[serde(default)]
    pub volume_values: Vec<Volume>,
    #[serde(default)]
    pub alias_values: Vec<Alias>,
    #[serde(default)]
    pub route_value: Option<Route>,
}

/// The full set of known layers, keyed by name.
pub type LayerMap = BTreeMap<String, Layer>;

/// `pkg` (package manager) — the only field with a closed, validated set of literal values.
pub type Pkg = String;

/// A user-authored image declaration, with tri-state `enabled` and every inheritable field left
/// `Option`-typed so the resolver's fallback cascade (image → defaults → hard-coded fallback,
/// §4.1) can tell "absent" from "explicitly set."
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImageDeclaration {
    /// Tri-state: absent means enabled, `Some(false)` means explicitly disabled.
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub layers: Vec<String>,
    #[serde(default)]
    pub platforms: Option<PlatformSet>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub registry: Option<String>,
    #[serde(default)]
    pub pkg: Option<Pkg>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub uid: Option<u32>,
    #[serde(default)]
    pub gid: Option<u32>,
    #[serde(default)]
    pub ports: Vec<Port>,
    #[serde(default)]
    pub aliases: Vec<Alias>,
    #[serde(default)]
    pub merge: Option<bool>,
    /// Opaque metadata passed through unchanged; honoured only by the (out-of-scope) recipe
    /// serializer and, for tie-breaking, the image ordering (§9 Open Question).
    #[serde(default)]
    pub builder: Option<String>,
}

impl ImageDeclaration {
    /// True unless explicitly disabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }
}

/// The top-level project model: defaults plus the image map.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub defaults: ImageDeclaration,
    pub images: BTreeMap<String, ImageDeclaration>,
}

/// An [`ImageDeclaration`] with every inheritable field resolved to a concrete value (§4.1).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResolvedImage {
    pub name: String,
    pub base: String,
    /// True iff `base` is not the name of another enabled internal image.
    pub is_external_base: bool,
    pub layers: Vec<String>,
    pub platforms: PlatformSet,
    pub tag: String,
    pub registry: String,
    pub pkg: Pkg,
    pub user: String,
    pub uid: u32,
    pub gid: u32,
    pub ports: Vec<Port>,
    pub aliases: Vec<Alias>,
    pub merge: bool,
    pub builder: Option<String>,
    /// `/root` when `user == "root"`, else `/home/<user>`.
    pub home: String,
    /// `registry/name:tag`, or `name:tag` if `registry` is empty.
    pub full_tag: String,
    /// True iff this image was synthesized by the intermediate synthesiser rather than
    /// user-authored.
    pub auto: bool,
}

impl ResolvedImage {
    /// Computes `home` from `user`, per §4.1.
    pub fn home_for_user(user: &str) -> String {
        if user == "root" {
            "/root".to_string()
        } else {
            format!("/home/{}", user)
        }
    }

    /// Computes `full_tag` from `registry`, `name`, and `tag`, per §4.1.
    pub fn compute_full_tag(registry: &str, name: &str, tag: &str) -> String {
        if registry.is_empty() {
            format!("{}:{}", name, tag)
        } else {
            format!("{}/{}:{}", registry, name, tag)
        }
    }
}

/// The synthesised image map: every original image (by identity) plus zero or more
/// auto-intermediates, keyed by name.
pub type ImageMap = BTreeMap<String, ResolvedImage>;
