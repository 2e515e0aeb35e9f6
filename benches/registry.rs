//! Registry Performance Benchmarks
//!
//! Measures load-order resolution over a layered dependency graph.

use std::collections::BTreeMap;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use adapterhub::dependency_order;

/// `layers` layers of `width` plugin names, each depending on the whole layer below
fn layered_names(layers: usize, width: usize) -> Vec<(String, Vec<String>)> {
    (0..layers)
        .flat_map(|layer| {
            (0..width).map(move |i| {
                let deps = if layer == 0 {
                    Vec::new()
                } else {
                    (0..width).map(|j| format!("plugin_{}_{j}", layer - 1)).collect()
                };
                (format!("plugin_{layer}_{i}"), deps)
            })
        })
        .collect()
}

fn bench_dependency_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("dependency_order");

    for (layers, width) in [(4, 4), (10, 10), (20, 25)] {
        let names = layered_names(layers, width);
        let graph: BTreeMap<&str, Vec<&str>> = names
            .iter()
            .map(|(name, deps)| (name.as_str(), deps.iter().map(String::as_str).collect()))
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{layers}x{width}")),
            &graph,
            |b, graph| b.iter(|| dependency_order(graph).expect("acyclic")),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_dependency_order);
criterion_main!(benches);
