use criterion::{criterion_group, criterion_main, Criterion};

use slimy::{Annulus, CpuSearcher, SearchConfig, Searcher};

/// Benchmarks a search over a square region of the given side length,
/// same mask and seed each time.
fn bench_region(c: &mut Criterion, name: &str, side: i32) {
    let searcher = CpuSearcher::new(SearchConfig::default());
    let mask = Annulus::new(1, 8);

    c.bench_function(name, |b| {
        b.iter(|| searcher.search(0, 0, side, side, 37, 1, &mask).unwrap());
    });
}

fn benchmark_search_100(c: &mut Criterion) {
    bench_region(c, "search_100", 100);
}

fn benchmark_search_1k(c: &mut Criterion) {
    bench_region(c, "search_1k", 1_000);
}

fn benchmark_search_5k(c: &mut Criterion) {
    bench_region(c, "search_5k", 5_000);
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_search_100, benchmark_search_1k, benchmark_search_5k
}
criterion_main!(benches);
