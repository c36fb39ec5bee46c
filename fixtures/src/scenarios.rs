// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One constructor per concrete scenario from the planner's testable-properties section, plus a
//! couple of larger synthetic fixtures for property-style tests.

use crate::{configuration, configuration_with_defaults, image, image_with_platforms, layer, layers, platform_set};
use stackplan::{Configuration, ImageDeclaration, LayerMap};

/// Scenario 1 — linear dependency: a single image needing a two-layer chain.
pub fn scenario_1_linear() -> (Configuration, LayerMap) {
    let layers = layers([layer("pixi", &[]), layer("python", &["pixi"])]);
    let config = configuration([("a", image("docker.io/library/fedora:latest", &["python"]))]);
    (config, layers)
}

/// Scenario 2 — popularity tie-break: `pixi` is needed by two images, `nodejs` by one.
pub fn scenario_2_popularity() -> (Configuration, LayerMap) {
    let layers = layers([
        layer("pixi", &[]),
        layer("nodejs", &[]),
        layer("python", &["pixi"]),
        layer("testapi", &["python"]),
    ]);
    let config = configuration([
        ("a", image("docker.io/library/fedora:latest", &["pixi", "python", "testapi"])),
        ("b", image("docker.io/library/fedora:latest", &["pixi", "nodejs"])),
    ]);
    (config, layers)
}

/// Scenario 3 — intermediate synthesis with a shared prefix: `fedora-test` and `openclaw` both
/// need `supervisord` (itself needing `python` needing `pixi`), then diverge.
pub fn scenario_3_shared_prefix() -> (Configuration, LayerMap) {
    let layers = layers([
        layer("pixi", &[]),
        layer("python", &["pixi"]),
        layer("supervisord", &["python"]),
        layer("testapi", &["supervisord"]),
        layer("openclaw", &["supervisord"]),
    ]);
    let config = configuration([
        ("fedora", image("docker.io/library/fedora:latest", &[])),
        ("fedora-test", image("fedora", &["testapi"])),
        ("openclaw", image("fedora", &["openclaw"])),
    ]);
    (config, layers)
}

/// Scenario 4 — user image reused at a branch point: `mid` sits exactly where `app1` and `app2`'s
/// relative sequences part ways, so it is reused rather than shadowed by a fresh intermediate.
pub fn scenario_4_reused_branch_point() -> (Configuration, LayerMap) {
    let layers = layers([
        layer("a", &[]),
        layer("b", &["a"]),
        layer("c", &["b"]),
        layer("d", &["b"]),
    ]);
    let config = configuration([
        ("base", image("docker.io/library/fedora:latest", &[])),
        ("mid", image("base", &["b"])),
        ("app1", image("base", &["c"])),
        ("app2", image("base", &["d"])),
    ]);
    (config, layers)
}

/// Scenario 5 — platform restriction propagation: `nvidia` and its descendants are pinned to
/// `amd64` only; a sibling group under plain `fedora` keeps the unrestricted default set.
pub fn scenario_5_platform_restriction() -> (Configuration, LayerMap) {
    let layers = layers([
        layer("x", &[]),
        layer("y", &["x"]),
        layer("z1", &["y"]),
        layer("z2", &["y"]),
        layer("p", &[]),
        layer("q", &["p"]),
        layer("r1", &["q"]),
        layer("r2", &["q"]),
    ]);
    let defaults = ImageDeclaration {
        platforms: Some(platform_set(&["linux/amd64", "linux/arm64"])),
        ..ImageDeclaration::default()
    };
    let config = configuration_with_defaults(
        defaults,
        [
            ("fedora", image("docker.io/library/fedora:latest", &[])),
            ("tools-a", image("fedora", &["z1"])),
            ("tools-b", image("fedora", &["z2"])),
            ("nvidia", image_with_platforms("fedora", &[], &["linux/amd64"])),
            ("app-a", image_with_platforms("nvidia", &["r1"], &["linux/amd64"])),
            ("app-b", image_with_platforms("nvidia", &["r2"], &["linux/amd64"])),
        ],
    );
    (config, layers)
}

/// Scenario 6 — cycle detection: three internal images whose bases form a cycle.
pub fn scenario_6_cycle() -> (Configuration, LayerMap) {
    let layers = layers([]);
    let config = configuration([
        ("a", image("b", &[])),
        ("b", image("c", &[])),
        ("c", image("a", &[])),
    ]);
    (config, layers)
}

/// A larger synthetic fixture with multiple sibling groups nested two levels deep, used by
/// property-style tests that don't need a named scenario of their own.
pub fn wide_fixture() -> (Configuration, LayerMap) {
    let layers = layers([
        layer("base-tools", &[]),
        layer("runtime", &["base-tools"]),
        layer("web", &["runtime"]),
        layer("worker", &["runtime"]),
        layer("web-extra", &["web"]),
        layer("worker-extra", &["worker"]),
    ]);
    let config = configuration([
        ("os", image("docker.io/library/fedora:latest", &[])),
        ("svc-a", image("os", &["web"])),
        ("svc-b", image("os", &["worker"])),
        ("svc-c", image("os", &["web", "web-extra"])),
        ("svc-d", image("os", &["worker", "worker-extra"])),
    ]);
    (config, layers)
}

/// Two siblings whose relative layer sequences are identical all the way to their leaves:
/// `replica-a` and `replica-b` both need exactly `[pixi, python]`, with no divergence at all
/// (spec.md §9's open question). Their shared chain should still be factored into one
/// auto-intermediate rather than left duplicated.
pub fn scenario_identical_sibling_sequences() -> (Configuration, LayerMap) {
    let layers = layers([layer("pixi", &[]), layer("python", &["pixi"])]);
    let config = configuration([
        ("fedora", image("docker.io/library/fedora:latest", &[])),
        ("replica-a", image("fedora", &["python"])),
        ("replica-b", image("fedora", &["python"])),
    ]);
    (config, layers)
}
