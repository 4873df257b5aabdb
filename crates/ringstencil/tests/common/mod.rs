//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use rand::prelude::*;
use ringstencil::prelude::*;
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once; `RUST_LOG=ringstencil=debug` shows launches.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Runtime with write tracking and a handful of concurrent groups.
pub fn tracking_runtime() -> Arc<CpuRuntime> {
    init_tracing();
    let config = RuntimeConfig::new()
        .with_max_concurrent_groups(4)
        .with_write_tracking(true);
    Arc::new(CpuRuntime::new(config).expect("Failed to create runtime"))
}

/// Every catalogue variant plus edge-case parameterizations.
pub fn all_variants() -> Vec<Variant> {
    let mut variants = Variant::catalogue();
    variants.extend([
        Variant::Strip {
            strip_x: 1,
            strip_y: 1,
        },
        Variant::Strip {
            strip_x: 3,
            strip_y: 2,
        },
        Variant::SlidingFlat {
            windows_y: 1,
            axis: SweepAxis::Rows,
        },
        Variant::SlidingFlat {
            windows_y: 3,
            axis: SweepAxis::Columns,
        },
        Variant::SlidingFlat {
            windows_y: 100,
            axis: SweepAxis::Rows,
        },
        Variant::SlidingPow2 { windows_y: 1 },
        Variant::SlidingPow2 { windows_y: 9 },
        Variant::VirtualBigTile { physical_groups: 1 },
        Variant::VirtualBigTile {
            physical_groups: 40,
        },
        Variant::VirtualStrip {
            strip_x: 3,
            strip_y: 2,
            physical_groups: 1,
        },
    ]);
    variants
}

pub fn random_i32(width: i64, height: i64, seed: u64) -> GridBuffer<i32> {
    let mut rng = StdRng::seed_from_u64(seed);
    GridBuffer::from_fn(width, height, |_, _| rng.gen_range(-1000..1000))
        .expect("Failed to build grid")
}

pub fn random_f32(width: i64, height: i64, seed: u64) -> GridBuffer<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    GridBuffer::from_fn(width, height, |_, _| rng.gen_range(-100.0..100.0))
        .expect("Failed to build grid")
}

pub fn random_f64(width: i64, height: i64, seed: u64) -> GridBuffer<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    GridBuffer::from_fn(width, height, |_, _| rng.gen_range(-1.0e6..1.0e6))
        .expect("Failed to build grid")
}

/// Run every variant over `grid` and compare against the sequential
/// reference, bit for bit.
pub fn assert_all_match<T, W, G>(stencil: &BoxStencil<W, G>, grid: &GridBuffer<T>)
where
    T: Element,
    W: Window,
    G: GroupShape,
{
    let expected: Vec<u64> = stencil
        .reference(grid)
        .iter()
        .map(|v| Element::to_bits(*v))
        .collect();
    let lens = grid.lens();
    for variant in all_variants() {
        let actual: Vec<u64> = stencil
            .run(variant, grid)
            .unwrap_or_else(|e| panic!("{variant} failed on {}x{}: {e}", lens.x, lens.y))
            .iter()
            .map(|v| Element::to_bits(*v))
            .collect();
        assert_eq!(actual.len(), expected.len(), "{variant}: output length");
        if let Some(i) = (0..expected.len()).find(|&i| actual[i] != expected[i]) {
            panic!(
                "{variant} differs from reference on {}x{} at ({}, {})",
                lens.x,
                lens.y,
                i as i64 % lens.x,
                i as i64 / lens.x
            );
        }
    }
}
