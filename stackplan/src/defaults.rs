// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hard-coded fallback constants used by the resolver (§4.1) when neither an image nor
//! `configuration.defaults` supplies a value. See SPEC_FULL.md §4.1.1 and DESIGN.md for why
//! these particular literals were chosen: the distilled spec names these fallbacks but leaves
//! their literal values undocumented.

/// Used when no image and no default supplies a `base`.
pub const DEFAULT_EXTERNAL_BASE: &str = "docker.io/library/fedora:latest";

/// Used when no image and no default supplies `platforms`.
pub fn default_platforms() -> crate::model::PlatformSet {
    ["linux/amd64", "linux/arm64"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub const DEFAULT_PKG: &str = "rpm";
pub const DEFAULT_USER: &str = "user";
pub const DEFAULT_UID: u32 = 1000;
pub const DEFAULT_GID: u32 = 1000;
pub const DEFAULT_TAG: &str = "auto";
pub const DEFAULT_REGISTRY: &str = "";
