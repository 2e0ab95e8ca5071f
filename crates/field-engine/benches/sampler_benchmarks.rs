//! Benchmarks for field sampling and frame composition.
//!
//! Run with: cargo bench --package field-engine --bench sampler_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use field_common::{GeoBounds, Observation};
use field_engine::{
    EngineConfig, FieldFrame, FieldStyle, InterpolationParams, RasterSampler, RasterSize,
    SpatialField,
};
use rand::Rng;

const SWEDEN: GeoBounds = GeoBounds::new(55.0, 10.5, 69.5, 24.5);

/// Randomly scattered stations with a north-south temperature gradient.
fn generate_stations(count: usize) -> Vec<Observation> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let lat = rng.gen_range(SWEDEN.south..SWEDEN.north);
            let lon = rng.gen_range(SWEDEN.west..SWEDEN.east);
            let value = 15.0 - (lat - SWEDEN.south) * 2.5 + rng.gen_range(-3.0..3.0);
            Observation::new(format!("bench-{}", i), lat, lon, value)
        })
        .collect()
}

// =============================================================================
// POINT ESTIMATES
// =============================================================================

fn bench_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate");
    let config = EngineConfig::default();

    for count in [100usize, 800, 3000] {
        let field = SpatialField::new(&generate_stations(count), 1, &config.index);
        group.bench_with_input(BenchmarkId::new("stations", count), &field, |b, field| {
            b.iter(|| black_box(field.estimate(black_box(62.3), black_box(16.1), &config.idw)))
        });
    }

    group.finish();
}

// =============================================================================
// RASTER SAMPLING
// =============================================================================

fn bench_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample");
    let config = EngineConfig::default();
    let field = SpatialField::new(&generate_stations(800), 1, &config.index);
    let sampler = RasterSampler::from_config(&config);

    for (width, height, step) in [(400usize, 300usize, 6u32), (800, 600, 6), (800, 600, 5)] {
        let cells = width.div_ceil(step as usize) * height.div_ceil(step as usize);
        group.throughput(Throughput::Elements(cells as u64));
        group.bench_with_input(
            BenchmarkId::new("grid", format!("{}x{}_step{}", width, height, step)),
            &(width, height, step),
            |b, &(w, h, s)| {
                b.iter(|| {
                    black_box(sampler.sample(
                        &field,
                        SWEDEN,
                        RasterSize::new(w, h),
                        s,
                        &InterpolationParams::default(),
                    ))
                })
            },
        );
    }

    group.finish();
}

// =============================================================================
// FRAME COMPOSITION
// =============================================================================

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    let config = EngineConfig::default();
    let field = SpatialField::new(&generate_stations(800), 1, &config.index);
    let grid = RasterSampler::from_config(&config).sample(
        &field,
        SWEDEN,
        RasterSize::new(800, 600),
        6,
        &config.idw,
    );
    let style = FieldStyle::from_config(&config);

    group.bench_function("colorize_800x600", |b| {
        b.iter(|| black_box(FieldFrame::from_grid(&grid, &style)))
    });

    let frame = FieldFrame::from_grid(&grid, &style);
    group.bench_function("png_800x600", |b| b.iter(|| black_box(frame.to_png())));
    group.bench_function("soften_800x600", |b| {
        b.iter(|| black_box(frame.soften(black_box(7.5), 0.92)))
    });

    group.finish();
}

criterion_group!(benches, bench_estimate, bench_sample, bench_frame);
criterion_main!(benches);
