// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invalid-input tests: one per [`ValidationIssue`] variant (via [`validate`]) and one per
//! [`Error`] variant, exercised directly rather than through a happy-path scenario.

use crate::errors::{Error, ValidationError, ValidationIssue};
use crate::image_graph::{layers_provided_by_image, resolve_image_order};
use crate::layer_graph::{resolve_layer_order, LayerGraph};
use crate::model::{Capabilities, ImageDeclaration, Layer};
use crate::resolve::{resolve_all, resolve_image};
use crate::validate::validate;
use pretty_assertions::assert_eq;
use std::collections::HashSet;

const TAG: &str = "2024.1";

fn issues_for(config: &crate::model::Configuration, layers: &crate::model::LayerMap) -> Vec<ValidationIssue> {
    validate(config, layers).unwrap_err().issues
}

#[test]
fn invalid_pkg_is_flagged() {
    let config = fixtures::configuration([("a", ImageDeclaration {
        pkg: Some("snap".to_string()),
        ..fixtures::image("fedora", &[])
    })]);
    let layers = fixtures::layers([]);
    let issues = issues_for(&config, &layers);
    assert!(issues.iter().any(|issue| matches!(
        issue,
        ValidationIssue::InvalidPkg { image, pkg } if image == "a" && pkg == "snap"
    )));
}

#[test]
fn unknown_layer_from_image_is_flagged() {
    let config = fixtures::configuration([("a", fixtures::image("fedora", &["ghost"]))]);
    let layers = fixtures::layers([]);
    let issues = issues_for(&config, &layers);
    assert!(issues.iter().any(|issue| matches!(
        issue,
        ValidationIssue::UnknownLayer { name, context } if name == "ghost" && context == "a"
    )));
}

#[test]
fn unknown_layer_from_depends_is_flagged() {
    let config = fixtures::configuration([("a", fixtures::image("fedora", &["python"]))]);
    let layers = fixtures::layers([fixtures::layer("python", &["ghost"])]);
    let issues = issues_for(&config, &layers);
    assert!(issues.iter().any(|issue| matches!(
        issue,
        ValidationIssue::UnknownLayer { name, context } if name == "ghost" && context == "python"
    )));
}

#[test]
fn no_install_capability_is_flagged() {
    let config = fixtures::configuration([("a", fixtures::image("fedora", &["noop"]))]);
    let layers = fixtures::layers([Layer {
        name: "noop".to_string(),
        capabilities: Capabilities::default(),
        ..Layer::default()
    }]);
    let issues = issues_for(&config, &layers);
    assert!(issues
        .iter()
        .any(|issue| matches!(issue, ValidationIssue::NoInstallCapability { layer } if layer == "noop")));
}

#[test]
fn port_out_of_range_is_flagged() {
    let config = fixtures::configuration([("a", fixtures::image("fedora", &["svc"]))]);
    let layers = fixtures::layers([Layer {
        port_values: vec![99999],
        ..fixtures::layer("svc", &[])
    }]);
    let issues = issues_for(&config, &layers);
    assert!(issues.iter().any(|issue| matches!(
        issue,
        ValidationIssue::PortOutOfRange { layer, port } if layer == "svc" && *port == 99999
    )));
}

#[test]
fn route_without_provider_is_flagged() {
    let config = fixtures::configuration([("a", fixtures::image("fedora", &["web"]))]);
    let layers = fixtures::layers([Layer {
        route_value: Some(crate::model::Route { host: "a.example.com".to_string(), port: 8080 }),
        ..fixtures::layer("web", &[])
    }]);
    let issues = issues_for(&config, &layers);
    assert!(issues
        .iter()
        .any(|issue| matches!(issue, ValidationIssue::RouteWithoutProvider { image } if image == "a")));
}

#[test]
fn duplicate_volume_name_is_flagged() {
    let config = fixtures::configuration([("a", fixtures::image("fedora", &["data"]))]);
    let volume = crate::model::Volume { name: "store".to_string(), path: "/data".to_string() };
    let layers = fixtures::layers([Layer {
        volume_values: vec![volume.clone(), volume],
        ..fixtures::layer("data", &[])
    }]);
    let issues = issues_for(&config, &layers);
    assert!(issues.iter().any(|issue| matches!(
        issue,
        ValidationIssue::DuplicateName { layer, kind, name }
            if layer == "data" && *kind == "volume" && name == "store"
    )));
}

#[test]
fn malformed_alias_name_is_flagged() {
    let config = fixtures::configuration([("a", fixtures::image("fedora", &["shell"]))]);
    let alias = crate::model::Alias { name: "!bad".to_string(), command: "echo hi".to_string() };
    let layers = fixtures::layers([Layer {
        alias_values: vec![alias],
        ..fixtures::layer("shell", &[])
    }]);
    let issues = issues_for(&config, &layers);
    assert!(issues.iter().any(|issue| matches!(
        issue,
        ValidationIssue::MalformedName { layer, kind, name }
            if layer == "shell" && *kind == "alias" && name == "!bad"
    )));
}

#[test]
fn self_referential_builder_is_flagged() {
    let config = fixtures::configuration([("a", ImageDeclaration {
        builder: Some("a".to_string()),
        ..fixtures::image("fedora", &[])
    })]);
    let layers = fixtures::layers([]);
    let issues = issues_for(&config, &layers);
    assert!(issues
        .iter()
        .any(|issue| matches!(issue, ValidationIssue::SelfReferentialBuilder { image } if image == "a")));
}

#[test]
fn missing_builder_is_flagged_when_absent() {
    let config = fixtures::configuration([("a", ImageDeclaration {
        merge: Some(true),
        ..fixtures::image("fedora", &[])
    })]);
    let layers = fixtures::layers([]);
    let issues = issues_for(&config, &layers);
    assert!(issues
        .iter()
        .any(|issue| matches!(issue, ValidationIssue::MissingBuilder { image } if image == "a")));
}

#[test]
fn missing_builder_is_flagged_when_unresolved() {
    let config = fixtures::configuration([("a", ImageDeclaration {
        merge: Some(true),
        builder: Some("ghost".to_string()),
        ..fixtures::image("fedora", &[])
    })]);
    let layers = fixtures::layers([]);
    let issues = issues_for(&config, &layers);
    assert!(issues
        .iter()
        .any(|issue| matches!(issue, ValidationIssue::MissingBuilder { image } if image == "a")));
}

#[test]
fn merge_with_resolvable_builder_is_not_flagged() {
    let config = fixtures::configuration([
        ("a", ImageDeclaration { merge: Some(true), builder: Some("b".to_string()), ..fixtures::image("fedora", &[]) }),
        ("b", fixtures::image("fedora", &[])),
    ]);
    let layers = fixtures::layers([]);
    assert!(validate(&config, &layers).is_ok());
}

#[test]
fn layer_cycle_is_flagged() {
    let config = fixtures::configuration([("a", fixtures::image("fedora", &["x"]))]);
    let layers = fixtures::layers([fixtures::layer("x", &["y"]), fixtures::layer("y", &["x"])]);
    let issues = issues_for(&config, &layers);
    assert!(issues.iter().any(|issue| matches!(
        issue,
        ValidationIssue::Cycle(cycle) if cycle.graph == "layer"
    )));
}

#[test]
fn image_cycle_is_flagged() {
    let config = fixtures::configuration([
        ("a", fixtures::image("b", &[])),
        ("b", fixtures::image("a", &[])),
    ]);
    let layers = fixtures::layers([]);
    let issues = issues_for(&config, &layers);
    assert!(issues.iter().any(|issue| matches!(
        issue,
        ValidationIssue::Cycle(cycle) if cycle.graph == "image"
    )));
}

#[test]
fn resolve_image_not_found() {
    let config = fixtures::configuration([]);
    let err = resolve_image("ghost", &config, TAG).unwrap_err();
    assert!(matches!(err, Error::ImageNotFound(name) if name == "ghost"));
}

#[test]
fn resolve_image_disabled() {
    let config = fixtures::configuration([("a", ImageDeclaration {
        enabled: Some(false),
        ..fixtures::image("fedora", &[])
    })]);
    let err = resolve_image("a", &config, TAG).unwrap_err();
    assert!(matches!(err, Error::ImageDisabled(name) if name == "a"));
}

#[test]
fn resolve_layer_order_unknown_layer() {
    let layers = fixtures::layers([]);
    let layer_graph = LayerGraph::build(&layers).unwrap();
    let err = resolve_layer_order(&layer_graph, &["ghost".to_string()], &HashSet::new()).unwrap_err();
    assert!(matches!(err, Error::UnknownLayer { name, .. } if name == "ghost"));
}

#[test]
fn layer_graph_build_unknown_layer() {
    let layers = fixtures::layers([fixtures::layer("python", &["ghost"])]);
    let err = LayerGraph::build(&layers).unwrap_err();
    assert!(matches!(err, Error::UnknownLayer { name, context } if name == "ghost" && context == "python"));
}

#[test]
fn image_order_cycle_error() {
    let config = fixtures::configuration([
        ("a", fixtures::image("b", &[])),
        ("b", fixtures::image("a", &[])),
    ]);
    let resolved = resolve_all(&config, TAG);
    let err = resolve_image_order(&resolved).unwrap_err();
    match err {
        Error::Cycle(cycle) => assert_eq!(cycle.graph, "image"),
        other => panic!("expected a cycle error, got {:?}", other),
    }
}

#[test]
fn layers_provided_by_image_not_found() {
    let config = fixtures::configuration([("a", fixtures::image("ghost-base", &[]))]);
    let mut resolved = resolve_all(&config, TAG);
    // Force an internal-looking base that isn't actually present in the map, the one case
    // `layers_provided_by_image` itself reports rather than the synthesiser preventing.
    resolved.get_mut("a").unwrap().is_external_base = false;
    let err = layers_provided_by_image("a", &resolved).unwrap_err();
    assert!(matches!(err, Error::ImageNotFound(name) if name == "ghost-base"));
}

#[test]
fn validation_error_wraps_into_error() {
    let validation = ValidationError {
        issues: vec![ValidationIssue::SelfReferentialBuilder { image: "a".to_string() }],
    };
    let err: Error = validation.into();
    match err {
        Error::Validation(inner) => assert_eq!(inner.issues.len(), 1),
        other => panic!("expected a validation error, got {:?}", other),
    }
}
