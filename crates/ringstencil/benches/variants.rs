//! Variant throughput benchmarks.
//!
//! Runs every strategy over the same grids so data-movement costs can be
//! compared directly. Numbers reflect the CPU execution engine (one OS
//! thread per lane), not GPU behavior.

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;

use ringstencil::prelude::*;

type Blur3 = BoxStencil<Rect<-1, -1, 1, 1>, Group<16, 4>>;
type Blur5 = BoxStencil<Rect<-2, -2, 2, 2>, Group<16, 4>>;

fn runtime() -> Arc<CpuRuntime> {
    Arc::new(CpuRuntime::with_defaults().expect("Failed to create runtime"))
}

fn random_grid(width: i64, height: i64) -> GridBuffer<f32> {
    let mut rng = StdRng::seed_from_u64(42);
    GridBuffer::from_fn(width, height, |_, _| rng.gen_range(0.0..1.0))
        .expect("Failed to build grid")
}

// =============================================================================
// All variants, 3x3 window
// =============================================================================

fn bench_variants_3x3(c: &mut Criterion) {
    let mut group = c.benchmark_group("variants_3x3");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(5));

    let stencil = Blur3::new(runtime());
    for (width, height) in [(64, 64), (256, 128)] {
        let grid = random_grid(width, height);
        group.throughput(Throughput::Elements((width * height) as u64));

        for variant in Variant::catalogue() {
            group.bench_with_input(
                BenchmarkId::new(variant.to_string(), format!("{width}x{height}")),
                &grid,
                |b, grid| b.iter(|| black_box(stencil.run(variant, grid).expect("run failed"))),
            );
        }
    }

    group.finish();
}

// =============================================================================
// Tiled variants, 5x5 window
// =============================================================================

fn bench_variants_5x5(c: &mut Criterion) {
    let mut group = c.benchmark_group("variants_5x5");
    group.sample_size(10);

    let stencil = Blur5::new(runtime());
    let grid = random_grid(128, 128);
    group.throughput(Throughput::Elements(128 * 128));

    for variant in Variant::catalogue().into_iter().filter(Variant::uses_scratch) {
        group.bench_with_input(BenchmarkId::from_parameter(variant), &grid, |b, grid| {
            b.iter(|| black_box(stencil.run(variant, grid).expect("run failed")))
        });
    }

    group.finish();
}

// =============================================================================
// Sequential reference
// =============================================================================

fn bench_reference(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference");

    let stencil = Blur3::new(runtime());
    for size in [64i64, 256] {
        let grid = random_grid(size, size);
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &grid, |b, grid| {
            b.iter(|| black_box(stencil.reference(grid)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_variants_3x3, bench_variants_5x5, bench_reference);
criterion_main!(benches);
