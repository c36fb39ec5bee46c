// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One test per concrete end-to-end scenario (§8's scenarios 1 through 6), each built from a
//! `fixtures` constructor and asserting the exact expected sequences.

use crate::errors::Error;
use crate::resolve::resolve_all;
use crate::{global_layer_order, plan, resolve_image_order, LayerGraph};
use pretty_assertions::assert_eq;

const TAG: &str = "2024.1";

#[test]
fn scenario_1_linear() {
    let (config, layers) = fixtures::scenarios::scenario_1_linear();
    let output = plan(&config, &layers, TAG).unwrap();
    assert_eq!(output.layer_orders["a"], vec!["pixi", "python"]);

    let layer_graph = LayerGraph::build(&layers).unwrap();
    let resolved = resolve_all(&config, TAG);
    let order = global_layer_order(&resolved, &layer_graph).unwrap();
    assert_eq!(order, vec!["pixi", "python"]);
}

#[test]
fn scenario_2_popularity() {
    let (config, layers) = fixtures::scenarios::scenario_2_popularity();
    let layer_graph = LayerGraph::build(&layers).unwrap();
    let resolved = resolve_all(&config, TAG);
    let order = global_layer_order(&resolved, &layer_graph).unwrap();

    let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
    assert!(pos("pixi") < pos("nodejs"));
    assert!(pos("pixi") < pos("python"));
    assert!(pos("python") < pos("testapi"));
}

#[test]
fn scenario_3_shared_prefix() {
    let (config, layers) = fixtures::scenarios::scenario_3_shared_prefix();
    let output = plan(&config, &layers, TAG).unwrap();

    assert!(output.images["fedora-test"].base != "fedora");
    assert!(output.images["openclaw"].base != "fedora");
    assert_eq!(output.images["fedora-test"].base, output.images["openclaw"].base);
    assert!(output.images.values().any(|image| image.auto));
}

#[test]
fn scenario_4_reused_branch_point() {
    let (config, layers) = fixtures::scenarios::scenario_4_reused_branch_point();
    let output = plan(&config, &layers, TAG).unwrap();

    assert_eq!(output.images["mid"].base, "base");
    assert!(!output.images["mid"].auto);
    assert_eq!(output.images["app1"].base, "mid");
    assert_eq!(output.images["app2"].base, "mid");

    let duplicate = output
        .images
        .values()
        .any(|image| image.auto && image.base == "base" && image.layers == vec!["b".to_string()]);
    assert!(!duplicate);
}

#[test]
fn scenario_5_platform_restriction() {
    let (config, layers) = fixtures::scenarios::scenario_5_platform_restriction();
    let output = plan(&config, &layers, TAG).unwrap();

    let under_nvidia: Vec<_> = output
        .images
        .values()
        .filter(|image| image.auto && image.base == "nvidia")
        .collect();
    assert!(!under_nvidia.is_empty());
    for image in under_nvidia {
        assert_eq!(image.platforms, fixtures::platform_set(&["linux/amd64"]));
    }

    let under_fedora: Vec<_> = output
        .images
        .values()
        .filter(|image| image.auto && image.base == "fedora")
        .collect();
    assert!(!under_fedora.is_empty());
    for image in under_fedora {
        assert_eq!(image.platforms, fixtures::platform_set(&["linux/amd64", "linux/arm64"]));
    }
}

/// spec.md §9's open question: two siblings with identical relative sequences all the way to
/// the leaves still share one auto-intermediate rather than each installing the chain on its
/// own. See `synth::walk`'s handling of a stop node that terminates two or more images
/// regardless of whether it also has children.
#[test]
fn identical_sibling_sequences() {
    let (config, layers) = fixtures::scenarios::scenario_identical_sibling_sequences();
    let output = plan(&config, &layers, TAG).unwrap();

    assert!(output.images["replica-a"].base != "fedora");
    assert_eq!(output.images["replica-a"].base, output.images["replica-b"].base);

    let shared_name = output.images["replica-a"].base.clone();
    let shared = &output.images[&shared_name];
    assert!(shared.auto);
    assert_eq!(shared.base, "fedora");
    assert_eq!(shared.layers, vec!["pixi".to_string(), "python".to_string()]);
}

#[test]
fn scenario_6_cycle() {
    let (config, layers) = fixtures::scenarios::scenario_6_cycle();
    let resolved = resolve_all(&config, TAG);
    let err = resolve_image_order(&resolved).unwrap_err();
    match err {
        Error::Cycle(cycle) => {
            assert_eq!(cycle.graph, "image");
            let mut names: Vec<&str> = cycle.path.iter().map(|s| s.as_str()).collect();
            names.sort();
            names.dedup();
            assert_eq!(names, vec!["a", "b", "c"]);
        }
        other => panic!("expected a cycle error, got {:?}", other),
    }
}
