//! Benchmarks for the built-in kernels.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pixkern::prelude::*;

fn gradient(width: u32, height: u32) -> RgbaBuffer {
    RgbaBuffer::from_fn(width, height, |x, y| {
        [(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255]
    })
}

fn outputs_for(entry: &EntryPoint, source: &RgbaBuffer) -> Vec<RgbaBuffer> {
    let (w, h) = entry
        .output_extent()
        .apply(source.width(), source.height());
    entry
        .outputs()
        .iter()
        .map(|_| RgbaBuffer::new(w as u32, h as u32))
        .collect()
}

/// Benchmark each entry point with its own schedule.
fn bench_entry_points(c: &mut Criterion) {
    let registry = KernelRegistry::with_builtins();
    let engine = ExecutionEngine::new();
    let mut group = c.benchmark_group("entry_points");

    for size in [64u32, 256].iter() {
        let source = gradient(*size, *size);
        group.throughput(Throughput::Elements((*size * *size) as u64));

        for name in registry.names() {
            let Ok(entry) = registry.create(name) else {
                continue;
            };
            let params = entry
                .default_params()
                .with("width", source.width())
                .with("height", source.height());
            let mut outputs = outputs_for(&entry, &source);

            group.bench_with_input(BenchmarkId::new(name, size), &source, |b, src| {
                b.iter(|| {
                    engine
                        .invoke(&entry, black_box(src), &params, &mut outputs)
                        .ok()
                })
            });
        }
    }

    group.finish();
}

/// Compare a scheduled run against the sequential reference.
fn bench_schedule(c: &mut Criterion) {
    let engine = ExecutionEngine::new();
    let mut group = c.benchmark_group("grayscale_schedule");

    let source = gradient(512, 512);
    let Ok(entry) = pixkern::kernels::export_grayscale() else {
        return;
    };
    let params = entry.default_params().with("width", 512).with("height", 512);
    let mut outputs = outputs_for(&entry, &source);
    group.throughput(Throughput::Elements(512 * 512));

    group.bench_function("scheduled", |b| {
        b.iter(|| engine.invoke(&entry, black_box(&source), &params, &mut outputs).ok())
    });

    group.bench_function("sequential", |b| {
        b.iter(|| {
            engine
                .realize_sequential(&entry, black_box(&source), &params, &mut outputs)
                .ok()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_entry_points, bench_schedule);
criterion_main!(benches);
