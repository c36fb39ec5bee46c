// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property-style tests for §8's quantified invariants, run against the `fixtures` scenarios
//! rather than arbitrary generated configurations — varying the tag and the observation order
//! while holding the configuration fixed, the way this codebase's own proptest suites vary query
//! parameters over a fixed fixture graph rather than generating graphs from scratch.

use crate::image_graph::full_layer_closure;
use crate::{global_layer_order, plan, resolve_all, resolve_image_order, LayerGraph};
use proptest::prelude::*;

fn all_fixtures() -> Vec<(crate::Configuration, crate::LayerMap)> {
    vec![
        fixtures::scenarios::scenario_1_linear(),
        fixtures::scenarios::scenario_2_popularity(),
        fixtures::scenarios::scenario_3_shared_prefix(),
        fixtures::scenarios::scenario_4_reused_branch_point(),
        fixtures::scenarios::scenario_5_platform_restriction(),
        fixtures::scenarios::wide_fixture(),
    ]
}

proptest! {
    /// Property 4 — determinism: two `plan` calls with the same inputs produce identical output,
    /// regardless of what the tag happens to be.
    #[test]
    fn plan_is_deterministic(tag in "[a-z0-9.]{1,12}") {
        for (config, layers) in all_fixtures() {
            let first = plan(&config, &layers, &tag).unwrap();
            let second = plan(&config, &layers, &tag).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    /// Property 5 — order consistency: every per-image layer sequence is the restriction of
    /// `global_order` to that image's installed layers, in the same relative order.
    #[test]
    fn layer_orders_follow_global_order(tag in "[a-z0-9.]{1,12}") {
        for (config, layers) in all_fixtures() {
            let layer_graph = LayerGraph::build(&layers).unwrap();
            let resolved = resolve_all(&config, &tag);
            let global_order = global_layer_order(&resolved, &layer_graph).unwrap();
            let position: std::collections::HashMap<&str, usize> =
                global_order.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();

            let output = plan(&config, &layers, &tag).unwrap();
            for sequence in output.layer_orders.values() {
                let positions: Vec<usize> = sequence.iter().map(|name| position[name.as_str()]).collect();
                let mut sorted = positions.clone();
                sorted.sort_unstable();
                prop_assert_eq!(positions, sorted);
            }
        }
    }
}

/// Property 6 — popularity monotonicity, checked on scenario 2's hand-picked popularity gap
/// (this is easiest to state exactly on a fixed fixture rather than generated ones).
#[test]
fn popularity_monotonicity_on_scenario_2() {
    let (config, layers) = fixtures::scenarios::scenario_2_popularity();
    let layer_graph = LayerGraph::build(&layers).unwrap();
    let resolved = resolve_all(&config, "2024.1");
    let order = global_layer_order(&resolved, &layer_graph).unwrap();
    // `pixi` (popularity 2) has no dependency relation to `nodejs` (popularity 1); higher
    // popularity must precede lower popularity.
    let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
    assert!(pos("pixi") < pos("nodejs"));
}

/// Property 8 — platform restrictiveness: every auto-intermediate's platforms are a subset of
/// its direct parent's (when internal), over every fixture with an internal parent chain.
#[test]
fn platform_restrictiveness_across_fixtures() {
    for (config, layers) in all_fixtures() {
        let output = plan(&config, &layers, "2024.1").unwrap();
        for image in output.images.values().filter(|image| image.auto) {
            if let Some(parent) = output.images.get(&image.base) {
                assert!(
                    image.platforms.is_subset(&parent.platforms),
                    "auto-intermediate '{}' platforms {:?} not a subset of parent '{}' platforms {:?}",
                    image.name,
                    image.platforms,
                    parent.name,
                    parent.platforms
                );
            }
        }
    }
}

/// Property 1 — acyclic output: synthesis never introduces a cycle, over every fixture.
#[test]
fn acyclic_output_across_fixtures() {
    for (config, layers) in all_fixtures() {
        let output = plan(&config, &layers, "2024.1").unwrap();
        resolve_image_order(&output.images).unwrap();
    }
}

/// Property 2 — preservation: every name present before synthesis is present after, with every
/// field but `base`/`is_external_base` left untouched.
#[test]
fn preservation_across_fixtures() {
    for (config, layers) in all_fixtures() {
        let before = resolve_all(&config, "2024.1");
        let output = plan(&config, &layers, "2024.1").unwrap();
        for (name, original) in before.iter() {
            let after = output
                .images
                .get(name)
                .unwrap_or_else(|| panic!("'{}' missing from synthesised output", name));
            assert_eq!(after.name, original.name);
            assert_eq!(after.layers, original.layers);
            assert_eq!(after.platforms, original.platforms);
            assert_eq!(after.tag, original.tag);
            assert_eq!(after.registry, original.registry);
            assert_eq!(after.pkg, original.pkg);
            assert_eq!(after.user, original.user);
            assert_eq!(after.uid, original.uid);
            assert_eq!(after.gid, original.gid);
            assert_eq!(after.ports, original.ports);
            assert_eq!(after.aliases, original.aliases);
            assert_eq!(after.merge, original.merge);
            assert_eq!(after.builder, original.builder);
            assert_eq!(after.home, original.home);
            assert_eq!(after.full_tag, original.full_tag);
            assert!(!after.auto);
        }
    }
}

/// Property 3 — coverage: for every original image, its full installed-layer set (own layers
/// plus the transitive closure of its base chain) is unchanged by synthesis, even though the
/// base chain itself may have been rewritten to route through auto-intermediates.
#[test]
fn coverage_across_fixtures() {
    for (config, layers) in all_fixtures() {
        let layer_graph = LayerGraph::build(&layers).unwrap();
        let before = resolve_all(&config, "2024.1");
        let output = plan(&config, &layers, "2024.1").unwrap();

        for name in before.keys() {
            let before_set = full_layer_closure(name, &before, &layer_graph).unwrap();
            let after_set = full_layer_closure(name, &output.images, &layer_graph).unwrap();
            assert_eq!(
                before_set, after_set,
                "'{}' layer coverage changed across synthesis",
                name
            );
        }
    }
}
