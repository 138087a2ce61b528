//! Controller benchmarks for tactics_core.
//!
//! Run with: `cargo bench -p tactics_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use tactics_core::config::ControllerConfig;
use tactics_core::controller::TacticalController;
use tactics_core::placement::{find_placement, SiteRequest};
use tactics_core::threat;
use tactics_core::unit_kind::UnitKind;
use tactics_test_utils::fixtures;

/// One full tick against the mid-game fixture, production pass included.
pub fn controller_benchmark(c: &mut Criterion) {
    let world = fixtures::mid_game_world();

    c.bench_function("step_mid_game", |b| {
        b.iter_batched(
            || TacticalController::new(ControllerConfig::default()),
            |mut controller| black_box(controller.step(black_box(&world))),
            BatchSize::SmallInput,
        )
    });

    let config = ControllerConfig::default();
    c.bench_function("assess_mid_game", |b| {
        b.iter(|| black_box(threat::assess(black_box(&world), &config.threat)))
    });

    let p = &config.placement;
    let request = SiteRequest::new(UnitKind::Barracks, fixtures::home(), p.production_clearance, p.production_radius)
        .with_addon();
    c.bench_function("place_barracks_mid_game", |b| {
        b.iter_batched(
            || StdRng::seed_from_u64(7),
            |mut rng| black_box(find_placement(&world, &request, p, &mut rng)),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, controller_benchmark);
criterion_main!(benches);
