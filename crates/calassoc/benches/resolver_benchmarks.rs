//! Resolution performance benchmarks.
//!
//! Measures resolving many science frames that share calibration groups,
//! the common case for a night of observations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use calassoc::{CalibrationStore, DependencyGraph, Match, Resolver};

/// Lookup answering every science frame with one of a few flat/arc/bias sets.
fn night_lookup(file: &str, cal_type: &str) -> Result<Vec<Match>, String> {
    let set = file.bytes().map(usize::from).sum::<usize>() % 4;
    let matches: Vec<Match> = match cal_type {
        "bias" => (0..5).map(|i| Match::new(format!("bias{}_{}.fits", set, i), None)).collect(),
        "specphot" => vec![Match::new("std1.fits", Some("c0ffee"))],
        other => vec![Match::new(format!("{}{}.fits", other, set), None)],
    };
    Ok(matches)
}

fn science_frames(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("S20120827S{:04}.fits", i)).collect()
}

/// Benchmark a cold resolution pass over nights of various sizes.
fn bench_resolve_cold(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_cold");
    let graph = DependencyGraph::gmos_spectroscopy();

    for frames in [10, 100, 1_000].iter() {
        let files = science_frames(*frames);

        group.throughput(Throughput::Elements(*frames as u64));
        group.bench_with_input(BenchmarkId::new("frames", frames), &files, |b, files| {
            b.iter(|| {
                let mut store = CalibrationStore::new();
                let mut resolver = Resolver::new(&graph, night_lookup);
                resolver.resolve_all(&mut store, files, "target").unwrap();
                black_box(store)
            });
        });
    }

    group.finish();
}

/// Benchmark re-running against a fully populated cache.
fn bench_resolve_cached(c: &mut Criterion) {
    let graph = DependencyGraph::gmos_spectroscopy();
    let files = science_frames(1_000);

    let mut populated = CalibrationStore::new();
    Resolver::new(&graph, night_lookup)
        .resolve_all(&mut populated, &files, "target")
        .unwrap();

    c.bench_function("resolve_cached_1000", |b| {
        b.iter_with_setup(
            || populated.clone(),
            |mut store| {
                let mut resolver = Resolver::new(&graph, night_lookup);
                resolver.resolve_all(&mut store, &files, "target").unwrap();
                black_box(resolver.into_report())
            },
        );
    });
}

/// Benchmark canonical serialization of a populated cache.
fn bench_serialize(c: &mut Criterion) {
    let graph = DependencyGraph::gmos_spectroscopy();
    let mut store = CalibrationStore::new();
    Resolver::new(&graph, night_lookup)
        .resolve_all(&mut store, science_frames(1_000), "target")
        .unwrap();

    c.bench_function("to_json_string_1000", |b| {
        b.iter(|| black_box(store.to_json_string().unwrap()));
    });
}

criterion_group!(
    benches,
    bench_resolve_cold,
    bench_resolve_cached,
    bench_serialize
);
criterion_main!(benches);
