//! Criterion benchmarks for the rate hot path.
//!
//! Benchmarks:
//! 1. Primitive `get_rate` per strategy
//! 2. Composite `get_rate` (mix fan-out, sequence stage lookup)
//! 3. Resolution of a nested spec tree

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use loadshape_core::{Distribution, DistributionSpec, Registry, Resolver};

// ── Helpers ──────────────────────────────────────────────────────────

fn spec(value: serde_json::Value) -> DistributionSpec {
    serde_json::from_value(value).unwrap()
}

fn resolve(registry: &Registry, value: serde_json::Value) -> Box<dyn Distribution> {
    Resolver::new(registry).resolve(&spec(value)).unwrap()
}

fn mix_of(n: usize) -> serde_json::Value {
    let components: Vec<_> = (0..n)
        .map(|i| {
            json!({"weight": 1 + i, "distribution": {"name": "sine", "config": {"period": 30 + i}}})
        })
        .collect();
    json!({"name": "mix", "config": {"components": components}})
}

fn sequence_of(n: usize) -> serde_json::Value {
    let stages: Vec<_> = (0..n)
        .map(|i| {
            json!({"duration_seconds": 10, "distribution": {"name": "constant", "config": {"rps": 1 + i}}})
        })
        .collect();
    json!({"name": "sequence", "config": {"post_behavior": "repeat", "stages": stages}})
}

// ── 1. Primitives ────────────────────────────────────────────────────

fn bench_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitive_get_rate");
    let registry = Registry::with_builtins();

    let cases = [
        ("constant", json!({"name": "constant"})),
        ("linear", json!({"name": "linear", "config": {"ramp_rate": 2}})),
        (
            "step",
            json!({"name": "step", "config": {"thresholds": [[0, 1], [60, 2], [120, 3], [180, 4]]}}),
        ),
        ("sine", json!({"name": "sine", "config": {"period": 60}})),
        ("poisson", json!({"name": "poisson", "config": {"seed": 1}})),
    ];

    for (name, value) in cases {
        let d = resolve(&registry, value);
        group.bench_function(name, |b| {
            let mut t = 0.0;
            b.iter(|| {
                t += 0.01;
                black_box(d.get_rate(black_box(t), black_box(100.0)))
            });
        });
    }

    group.finish();
}

// ── 2. Composites ────────────────────────────────────────────────────

fn bench_composites(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite_get_rate");
    let registry = Registry::with_builtins();

    for &n in &[2usize, 8, 32] {
        let mix = resolve(&registry, mix_of(n));
        group.bench_with_input(BenchmarkId::new("mix", n), &n, |b, _| {
            b.iter(|| black_box(mix.get_rate(black_box(17.5), 100.0)));
        });

        let sequence = resolve(&registry, sequence_of(n));
        group.bench_with_input(BenchmarkId::new("sequence", n), &n, |b, _| {
            let mut t = 0.0;
            b.iter(|| {
                t += 0.37;
                black_box(sequence.get_rate(black_box(t), 100.0))
            });
        });
    }

    group.finish();
}

// ── 3. Resolution ────────────────────────────────────────────────────

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let registry = Registry::with_builtins();
    let tree = spec(json!({"name": "sequence", "config": {"stages": [
        {"duration_seconds": 60, "distribution": {"name": "linear", "config": {"ramp_duration": 60}}},
        {"duration_seconds": 600, "distribution": mix_of(4)},
        {"duration_seconds": 60, "distribution": sequence_of(4)}
    ]}}));

    group.bench_function("nested_tree", |b| {
        let resolver = Resolver::new(&registry);
        b.iter(|| resolver.resolve(black_box(&tree)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_primitives, bench_composites, bench_resolve);
criterion_main!(benches);
