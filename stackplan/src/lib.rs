// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plan the build order and layer composition of a set of layered container images.
//!
//! `stackplan` resolves a declarative set of image and layer definitions into a concrete,
//! deterministic build plan: which layers each image must install and in what order, which
//! images must be built before which others, and which common layer prefixes across sibling
//! images are worth factoring out into auto-generated intermediate images.
//!
//! # Optional features
//!
//! * `proptest1`: support for [property-based testing](https://altsysrq.github.io/proptest-book/intro.html)
//!   using the [`proptest`](https://docs.rs/proptest) framework, for fixtures that need to
//!   generate arbitrary configurations.
//!
//! # Examples
//!
//! Resolve and validate a configuration, then plan its build order:
//!
//! ```
//! use stackplan::{plan, validate, Configuration, LayerMap};
//!
//! let configuration: Configuration = serde_json::from_str("{\"defaults\":{},\"images\":{}}").unwrap();
//! let layers: LayerMap = Default::default();
//!
//! validate(&configuration, &layers).unwrap();
//! let output = plan(&configuration, &layers, "2024.1").unwrap();
//! assert!(output.images.is_empty());
//! ```

#![warn(missing_docs)]

mod defaults;
pub mod errors;
mod global_order;
mod ids;
mod image_graph;
mod layer_graph;
mod model;
mod plan;
mod resolve;
mod synth;
mod validate;

pub use errors::Error;
pub use global_order::global_layer_order;
pub use image_graph::{layers_provided_by_image, resolve_image_order};
pub use layer_graph::{resolve_layer_order, LayerGraph};
pub use model::{
    Alias, Capabilities, Configuration, ImageDeclaration, ImageMap, Layer, LayerMap, Pkg,
    PlatformSet, Port, ResolvedImage, Route, Volume,
};
pub use plan::{plan, PlanOutput};
pub use resolve::{resolve_all, resolve_image};
pub use synth::synthesize;
pub use validate::validate;

// Re-exported so downstream crates (the recipe serializer, the loader) can name the graph types
// this crate builds internally without duplicating the `petgraph` dependency pin themselves.
#[doc(no_inline)]
pub use petgraph::Direction;
