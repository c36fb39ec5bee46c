// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The image resolver (§4.1): turns each [`ImageDeclaration`] into a [`ResolvedImage`] by
//! applying the image → defaults → hard-coded fallback cascade to every inheritable field.

use crate::defaults;
use crate::errors::Error;
use crate::model::{Configuration, ImageDeclaration, ImageMap, ResolvedImage};

/// Picks the first `Some` among an image's own value and the defaults' value, falling back to a
/// closure that produces the hard-coded default. This is the "tiny reusable resolve-with-
/// fallback-chain combinator" spec.md §9 asks for: every inheritable field in [`resolve_image`]
/// goes through this same three-step cascade.
fn cascade<T>(image_value: Option<T>, defaults_value: Option<T>, fallback: impl FnOnce() -> T) -> T {
    image_value.or(defaults_value).unwrap_or_else(fallback)
}

/// Resolves a single image by name against `configuration`, applying the defaults/inheritance
/// chain (§4.1).
///
/// Returns [`Error::ImageNotFound`] if `name` isn't in `configuration.images`, or
/// [`Error::ImageDisabled`] if it's explicitly disabled.
pub fn resolve_image(
    name: &str,
    configuration: &Configuration,
    tag: &str,
) -> Result<ResolvedImage, Error> {
    let decl = configuration
        .images
        .get(name)
        .ok_or_else(|| Error::ImageNotFound(name.to_string()))?;
    if !decl.is_enabled() {
        return Err(Error::ImageDisabled(name.to_string()));
    }
    Ok(resolve_declaration(name, decl, configuration, tag))
}

/// Resolves every enabled image in `configuration` into a [`ImageMap`]. Disabled images are
/// silently omitted, matching §6: "A disabled image is invisible to every core algorithm."
pub fn resolve_all(configuration: &Configuration, tag: &str) -> ImageMap {
    configuration
        .images
        .iter()
        .filter(|(_, decl)| decl.is_enabled())
        .map(|(name, decl)| {
            let resolved = resolve_declaration(name, decl, configuration, tag);
            (name.clone(), resolved)
        })
        .collect()
}

fn resolve_declaration(
    name: &str,
    decl: &ImageDeclaration,
    configuration: &Configuration,
    tag: &str,
) -> ResolvedImage {
    let defaults = &configuration.defaults;

    let base = cascade(decl.base.clone(), defaults.base.clone(), || {
        defaults::DEFAULT_EXTERNAL_BASE.to_string()
    });
    let is_external_base = !configuration
        .images
        .get(&base)
        .map(|b| b.is_enabled())
        .unwrap_or(false);

    let platforms = cascade(
        decl.platforms.clone(),
        defaults.platforms.clone(),
        defaults::default_platforms,
    );
    let registry = cascade(decl.registry.clone(), defaults.registry.clone(), || {
        defaults::DEFAULT_REGISTRY.to_string()
    });
    let pkg = cascade(decl.pkg.clone(), defaults.pkg.clone(), || {
        defaults::DEFAULT_PKG.to_string()
    });
    let user = cascade(decl.user.clone(), defaults.user.clone(), || {
        defaults::DEFAULT_USER.to_string()
    });
    let uid = cascade(decl.uid, defaults.uid, || defaults::DEFAULT_UID);
    let gid = cascade(decl.gid, defaults.gid, || defaults::DEFAULT_GID);
    let merge = cascade(decl.merge, defaults.merge, || false);
    let builder = decl.builder.clone().or_else(|| defaults.builder.clone());

    let raw_tag = cascade(decl.tag.clone(), defaults.tag.clone(), || {
        defaults::DEFAULT_TAG.to_string()
    });
    let resolved_tag = if raw_tag == "auto" {
        tag.to_string()
    } else {
        raw_tag
    };

    let ports = if !decl.ports.is_empty() {
        decl.ports.clone()
    } else {
        defaults.ports.clone()
    };
    let aliases = if !decl.aliases.is_empty() {
        decl.aliases.clone()
    } else {
        defaults.aliases.clone()
    };

    let home = ResolvedImage::home_for_user(&user);
    let full_tag = ResolvedImage::compute_full_tag(&registry, name, &resolved_tag);

    ResolvedImage {
        name: name.to_string(),
        base,
        is_external_base,
        layers: decl.layers.clone(),
        platforms,
        tag: resolved_tag,
        registry,
        pkg,
        user,
        uid,
        gid,
        ports,
        aliases,
        merge,
        builder,
        home,
        full_tag,
        auto: false,
    }
}
