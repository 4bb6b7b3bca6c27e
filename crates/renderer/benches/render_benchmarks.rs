//! Benchmarks for classification, resampling and PNG encoding.
//!
//! Run with: cargo bench --package renderer --bench render_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dispersion_common::{GridSlice, GridSpec};
use renderer::png::create_png_indexed;
use renderer::render::{classify_field, display_palette};
use renderer::{resample_slice, ColorMap, ColorScheme};
use test_utils::{create_plume_grid, fixtures::schemes};

fn pm25_scheme() -> ColorScheme {
    ColorMap::from_hex(&schemes::PM25_HEX)
        .unwrap()
        .with_levels(&schemes::PM25_LEVELS)
        .unwrap()
}

fn plume_slice(cols: usize, rows: usize) -> GridSlice {
    let spec = GridSpec {
        nx: cols,
        ny: rows,
        dx: 0.04,
        dy: -0.04,
        first_x: -125.0,
        first_y: 50.0,
    };
    GridSlice::new(spec, create_plume_grid(cols, rows, 400.0))
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    let scheme = pm25_scheme();

    for size in [128usize, 512, 1024] {
        let field = resample_slice(&plume_slice(size, size), 1).unwrap();
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &field, |b, field| {
            b.iter(|| classify_field(black_box(field), &scheme))
        });
    }
    group.finish();
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");
    let slice = plume_slice(200, 150);

    for scale in [1usize, 2, 4] {
        group.bench_with_input(BenchmarkId::new("scale", scale), &scale, |b, &scale| {
            b.iter(|| resample_slice(black_box(&slice), scale).unwrap())
        });
    }
    group.finish();
}

fn bench_indexed_png(c: &mut Criterion) {
    let scheme = pm25_scheme();
    let field = resample_slice(&plume_slice(200, 150), 4).unwrap();
    let bins = classify_field(&field, &scheme);
    let (palette, indices) = display_palette(&bins, &scheme);
    let indices: Vec<u8> = indices.into_iter().map(|i| i as u8).collect();

    c.bench_function("png_indexed_800x600", |b| {
        b.iter(|| create_png_indexed(field.width, field.height, &palette, black_box(&indices)).unwrap())
    });
}

criterion_group!(benches, bench_classify, bench_resample, bench_indexed_png);
criterion_main!(benches);
