// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contains types that describe errors that `stackplan` methods can return.

use std::error;
use std::fmt;

use Error::*;

/// Error type describing the sorts of errors `stackplan` can return.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A requested image is absent from the configuration.
    ImageNotFound(String),
    /// A requested image exists but is explicitly disabled.
    ImageDisabled(String),
    /// A layer referenced from an image's `layers` or another layer's `depends` does not exist.
    UnknownLayer {
        /// The offending layer name.
        name: String,
        /// Where the reference came from, for the error message (an image or layer name).
        context: String,
    },
    /// A cycle was detected in the layer graph or the image graph.
    Cycle(CycleError),
    /// Aggregated structural problems found by [`crate::validate::validate`].
    Validation(ValidationError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageNotFound(name) => write!(f, "image not found: {}", name),
            ImageDisabled(name) => write!(f, "image is disabled: {}", name),
            UnknownLayer { name, context } => {
                write!(f, "unknown layer '{}' referenced from '{}'", name, context)
            }
            Cycle(err) => fmt::Display::fmt(err, f),
            Validation(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ImageNotFound(_) => None,
            ImageDisabled(_) => None,
            UnknownLayer { .. } => None,
            Cycle(err) => Some(err),
            Validation(err) => Some(err),
        }
    }
}

impl From<CycleError> for Error {
    fn from(err: CycleError) -> Self {
        Error::Cycle(err)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

/// A cycle detected in a dependency graph, carrying one concrete offending path.
///
/// `path` is a rotation of the cycle starting and ending at the node where the back edge was
/// observed, e.g. `[a, b, c, a]` for a three-node cycle `a -> b -> c -> a`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CycleError {
    /// Which graph the cycle was found in, for the error message.
    pub graph: &'static str,
    /// The offending cycle, as a sequence of names starting and ending at the same node.
    pub path: Vec<String>,
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycle detected in {} graph: {}",
            self.graph,
            self.path.join(" -> ")
        )
    }
}

impl error::Error for CycleError {}

/// One structural problem found by the validator.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ValidationIssue {
    /// `pkg` was neither `"rpm"` nor `"deb"`.
    InvalidPkg { image: String, pkg: String },
    /// A layer's `depends` (or an image's `layers`) named a layer that doesn't exist.
    UnknownLayer { name: String, context: String },
    /// A layer declares no install capability at all.
    NoInstallCapability { layer: String },
    /// A declared port was outside `1..=65535`.
    PortOutOfRange { layer: String, port: i64 },
    /// An image has a routing-rule layer but no traefik-provider layer in its resolved stack.
    RouteWithoutProvider { image: String },
    /// Two volumes (or two aliases) in the same layer share a name.
    DuplicateName {
        layer: String,
        kind: &'static str,
        name: String,
    },
    /// A volume/alias name did not match the layer-name pattern.
    MalformedName {
        layer: String,
        kind: &'static str,
        name: String,
    },
    /// A cycle was detected while validating (folded in rather than aborting early).
    Cycle(CycleError),
    /// An image's `builder` field names itself.
    SelfReferentialBuilder { image: String },
    /// An image has `merge` set but its `builder` doesn't resolve to an image in the map.
    MissingBuilder { image: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::InvalidPkg { image, pkg } => {
                write!(f, "image '{}' has invalid pkg '{}' (expected rpm or deb)", image, pkg)
            }
            ValidationIssue::UnknownLayer { name, context } => {
                write!(f, "unknown layer '{}' referenced from '{}'", name, context)
            }
            ValidationIssue::NoInstallCapability { layer } => {
                write!(f, "layer '{}' declares no install capability", layer)
            }
            ValidationIssue::PortOutOfRange { layer, port } => {
                write!(f, "layer '{}' declares out-of-range port {}", layer, port)
            }
            ValidationIssue::RouteWithoutProvider { image } => write!(
                f,
                "image '{}' has a routing-rule layer but no traefik-provider layer",
                image
            ),
            ValidationIssue::DuplicateName { layer, kind, name } => {
                write!(f, "layer '{}' declares duplicate {} name '{}'", layer, kind, name)
            }
            ValidationIssue::MalformedName { layer, kind, name } => write!(
                f,
                "layer '{}' declares malformed {} name '{}'",
                layer, kind, name
            ),
            ValidationIssue::Cycle(err) => fmt::Display::fmt(err, f),
            ValidationIssue::SelfReferentialBuilder { image } => {
                write!(f, "image '{}' names itself as its own builder", image)
            }
            ValidationIssue::MissingBuilder { image } => write!(
                f,
                "image '{}' has merge set but its builder does not resolve to an image",
                image
            ),
        }
    }
}

/// A batch of [`ValidationIssue`]s found in one validation pass.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationError {
    /// The issues found, in the order the validator discovered them.
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} validation issue(s) found:", self.issues.len())?;
        for issue in &self.issues {
            writeln!(f, "  - {}", issue)?;
        }
        Ok(())
    }
}

impl error::Error for ValidationError {}
