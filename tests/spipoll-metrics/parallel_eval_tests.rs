#![cfg(feature = "cpu")]
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use spipoll_metrics::prelude::*;

fn random_table(n: usize, seed: u64) -> RecordTable {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let lat: Vec<Option<f64>> = (0..n)
        .map(|i| {
            if i % 97 == 0 {
                None
            } else {
                Some(rng.gen_range(42.5..51.0))
            }
        })
        .collect();
    let lon: Vec<f64> = (0..n).map(|_| rng.gen_range(-4.5..8.0)).collect();
    let species: Vec<String> = (0..n)
        .map(|_| format!("sp{}", rng.gen_range(0..150)))
        .collect();
    let sites: Vec<i64> = (0..n).map(|i| (i / 8) as i64).collect();

    RecordTable::new()
        .with_column("latitude", lat)
        .unwrap()
        .with_column("longitude", lon)
        .unwrap()
        .with_column("insecte_fr", species)
        .unwrap()
        .with_column("collection_id", sites)
        .unwrap()
}

fn run(table: &RecordTable, parallel: bool, metric: DistanceMetric, chunk: usize) -> MetricsResult {
    Metrics::new()
        .radius(0.4)
        .distance_metric(metric)
        .adapter(Batch)
        .parallel(parallel)
        .chunk_size(chunk)
        .build()
        .unwrap()
        .compute(table)
        .unwrap()
}

#[test] // Parallel and sequential passes must agree cell for cell
fn test_parallel_matches_sequential() {
    let table = random_table(5_000, 7);
    for metric in [DistanceMetric::Euclidean, DistanceMetric::Chebyshev] {
        let seq = run(&table, false, metric, 4096);
        let par = run(&table, true, metric, 4096);
        assert_eq!(seq.table, par.table);
        assert_eq!(seq.summary, par.summary);
    }
}

#[test]
fn test_parallel_small_chunks() {
    let table = random_table(2_000, 11);
    let reference = run(&table, false, DistanceMetric::Euclidean, 4096);
    for chunk in [1, 63, 500] {
        let par = run(&table, true, DistanceMetric::Euclidean, chunk);
        assert_eq!(reference.table, par.table, "chunk size {chunk}");
    }
}

#[test]
fn test_parallel_index_build_above_threshold() {
    // Large enough for the index build to split across threads.
    let table = random_table(20_000, 3);
    let seq = run(&table, false, DistanceMetric::Euclidean, 4096);
    let par = run(&table, true, DistanceMetric::Euclidean, 4096);
    assert_eq!(
        seq.metric(Metric::Density).unwrap(),
        par.metric(Metric::Density).unwrap()
    );
    assert_eq!(seq.summary.n_malformed, 20_000_usize.div_ceil(97));
}
