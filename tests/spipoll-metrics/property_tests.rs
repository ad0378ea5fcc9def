use std::collections::HashSet;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use spipoll_metrics::prelude::*;

struct Sample {
    lat: Vec<f64>,
    lon: Vec<f64>,
    species: Vec<Option<String>>,
    sites: Vec<i64>,
}

impl Sample {
    fn random(n: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let lat = (0..n).map(|_| rng.gen_range(0.0..10.0)).collect();
        let lon = (0..n).map(|_| rng.gen_range(0.0..10.0)).collect();
        let species = (0..n)
            .map(|_| {
                if rng.gen_bool(0.05) {
                    None
                } else {
                    Some(format!("sp{}", rng.gen_range(0..25)))
                }
            })
            .collect();
        let sites = (0..n).map(|_| rng.gen_range(0..40)).collect();
        Self {
            lat,
            lon,
            species,
            sites,
        }
    }

    fn table(&self) -> RecordTable {
        RecordTable::new()
            .with_column("latitude", self.lat.clone())
            .unwrap()
            .with_column("longitude", self.lon.clone())
            .unwrap()
            .with_column("insecte_fr", self.species.clone())
            .unwrap()
            .with_column("collection_id", self.sites.clone())
            .unwrap()
    }

    /// All-pairs reference for one record.
    fn brute_force(&self, i: usize, radius: f64, metric: DistanceMetric) -> [f64; 4] {
        let here = [self.lat[i], self.lon[i]];
        let neighbors: Vec<usize> = (0..self.lat.len())
            .filter(|&j| metric.within(&here, &[self.lat[j], self.lon[j]], radius))
            .collect();
        let species: HashSet<&str> = neighbors
            .iter()
            .filter_map(|&j| self.species[j].as_deref())
            .collect();
        let sites: HashSet<i64> = neighbors.iter().map(|&j| self.sites[j]).collect();
        [
            species.len() as f64,
            neighbors.len() as f64,
            sites.len() as f64,
            species.len() as f64 / sites.len() as f64,
        ]
    }
}

fn compute(table: &RecordTable, radius: f64, metric: DistanceMetric) -> MetricsResult {
    Metrics::new()
        .radius(radius)
        .distance_metric(metric)
        .adapter(Batch)
        .build()
        .unwrap()
        .compute(table)
        .unwrap()
}

fn values(result: &MetricsResult, metric: Metric) -> Vec<f64> {
    result
        .metric(metric)
        .unwrap()
        .iter()
        .map(|v| v.unwrap())
        .collect()
}

#[test]
fn test_matches_all_pairs_reference() {
    let sample = Sample::random(400, 1);
    for metric in [DistanceMetric::Euclidean, DistanceMetric::Chebyshev] {
        for radius in [0.3, 1.0, 2.5] {
            let res = compute(&sample.table(), radius, metric);
            for i in 0..400 {
                let expected = sample.brute_force(i, radius, metric);
                for (k, m) in Metric::ALL.iter().enumerate() {
                    let got = res.metric(*m).unwrap()[i].unwrap();
                    assert_abs_diff_eq!(got, expected[k], epsilon = 1e-12);
                }
            }
        }
    }
}

#[test]
fn test_metric_bounds() {
    let sample = Sample::random(600, 2);
    let res = compute(&sample.table(), 0.8, DistanceMetric::Euclidean);

    let richness = values(&res, Metric::SpecificRichness);
    let density = values(&res, Metric::Density);
    let sites = values(&res, Metric::CollectionIdDensity);
    let weighted = values(&res, Metric::WeightedSpecificRichness);

    for i in 0..600 {
        assert!(density[i] >= 1.0);
        assert!(sites[i] >= 1.0);
        assert!(richness[i] <= density[i]);
        assert!(sites[i] <= density[i]);
        assert!(weighted[i] <= richness[i]);
        assert!(weighted[i] >= 0.0);
    }
}

#[test]
fn test_permutation_invariance() {
    let sample = Sample::random(500, 3);
    let table = sample.table();
    let mut order: Vec<usize> = (0..500).collect();
    order.shuffle(&mut ChaCha8Rng::seed_from_u64(99));
    let shuffled = table.take(&order);

    let base = compute(&table, 1.2, DistanceMetric::Euclidean);
    let perm = compute(&shuffled, 1.2, DistanceMetric::Euclidean);

    for m in Metric::ALL {
        let a = base.metric(m).unwrap();
        let b = perm.metric(m).unwrap();
        for (pos, &row) in order.iter().enumerate() {
            assert_eq!(b[pos], a[row], "{m} at row {row}");
        }
    }
}

#[test]
fn test_counts_monotone_in_radius() {
    let sample = Sample::random(300, 4);
    let table = sample.table();
    let counts = [
        Metric::Density,
        Metric::SpecificRichness,
        Metric::CollectionIdDensity,
    ];
    let mut previous = vec![vec![0.0; 300]; counts.len()];
    for radius in [0.1, 0.5, 1.0, 2.0, 4.0, 20.0] {
        let res = compute(&table, radius, DistanceMetric::Euclidean);
        for (k, metric) in counts.iter().enumerate() {
            let now = values(&res, *metric);
            for (row, (a, b)) in now.iter().zip(&previous[k]).enumerate() {
                assert!(a >= b, "{metric} shrank at row {row}, radius {radius}");
            }
            previous[k] = now;
        }
    }
    // Radius covering the whole square reaches everyone.
    assert!(previous[0].iter().all(|&d| d == 300.0));
    let all_sites: HashSet<i64> = sample.sites.iter().copied().collect();
    assert!(previous[2].iter().all(|&s| s == all_sites.len() as f64));
}

#[test]
fn test_square_contains_circle() {
    let sample = Sample::random(300, 5);
    let table = sample.table();
    let circle = values(&compute(&table, 1.0, DistanceMetric::Euclidean), Metric::Density);
    let square = values(&compute(&table, 1.0, DistanceMetric::Chebyshev), Metric::Density);
    for (c, s) in circle.iter().zip(&square) {
        assert!(c <= s);
    }
}

#[test]
fn test_duplicate_points_share_neighborhoods() {
    let table = RecordTable::new()
        .with_column("latitude", vec![5.0; 6])
        .unwrap()
        .with_column("longitude", vec![5.0; 6])
        .unwrap()
        .with_column("insecte_fr", vec!["A", "A", "B", "B", "C", "C"])
        .unwrap()
        .with_column("collection_id", vec![1_i64, 1, 1, 2, 2, 2])
        .unwrap();
    let res = compute(&table, 0.01, DistanceMetric::Euclidean);
    assert_eq!(values(&res, Metric::Density), vec![6.0; 6]);
    assert_eq!(values(&res, Metric::SpecificRichness), vec![3.0; 6]);
    assert_eq!(values(&res, Metric::WeightedSpecificRichness), vec![1.5; 6]);
}

#[test]
fn test_cancelled_run_returns_no_table() {
    let sample = Sample::random(1_000, 6);
    let token = CancellationToken::new();
    token.cancel();
    let err = Metrics::new()
        .radius(1.0)
        .adapter(Batch)
        .chunk_size(100)
        .cancellation(token)
        .build()
        .unwrap()
        .compute(&sample.table())
        .unwrap_err();
    assert_eq!(
        err,
        MetricsError::Cancelled {
            processed: 0,
            total: 1_000
        }
    );
    assert!(err.is_interrupted());
}

#[test]
fn test_expired_deadline() {
    let sample = Sample::random(200, 8);
    let token = CancellationToken::with_timeout(Duration::ZERO);
    std::thread::sleep(Duration::from_millis(2));
    let err = Metrics::new()
        .radius(1.0)
        .adapter(Batch)
        .cancellation(token)
        .build()
        .unwrap()
        .compute(&sample.table())
        .unwrap_err();
    assert!(matches!(err, MetricsError::DeadlineExceeded { .. }));
}

#[test]
fn test_uncancelled_token_is_harmless() {
    let sample = Sample::random(200, 9);
    let table = sample.table();
    let with_token = Metrics::new()
        .radius(1.0)
        .adapter(Batch)
        .chunk_size(7)
        .cancellation(CancellationToken::with_timeout(Duration::from_secs(3600)))
        .build()
        .unwrap()
        .compute(&table)
        .unwrap();
    assert_eq!(with_token.table, compute(&table, 1.0, DistanceMetric::Euclidean).table);
}
