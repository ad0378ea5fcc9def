use approx::assert_abs_diff_eq;
use spipoll_metrics::prelude::*;
use tracing_subscriber::EnvFilter;

/// Route library logs to the test harness; set `RUST_LOG=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn observations() -> RecordTable {
    RecordTable::new()
        .with_column("latitude", vec![0.0, 1.0, 2.0, 3.0, 3.0])
        .unwrap()
        .with_column("longitude", vec![0.0, 1.0, 2.0, 3.0, 0.0])
        .unwrap()
        .with_column("insecte_fr", vec!["A", "B", "C", "A", "A"])
        .unwrap()
        .with_column("collection_id", vec![1_i64, 2, 1, 2, 3])
        .unwrap()
}

fn run(table: &RecordTable, radius: f64, metric: DistanceMetric) -> MetricsResult {
    Metrics::new()
        .radius(radius)
        .distance_metric(metric)
        .adapter(Batch)
        .parallel(false)
        .build()
        .unwrap()
        .compute(table)
        .unwrap()
}

fn column(result: &MetricsResult, metric: Metric) -> Vec<f64> {
    result
        .metric(metric)
        .unwrap()
        .iter()
        .map(|v| v.unwrap())
        .collect()
}

#[test]
fn test_square_neighborhood_unit_radius() {
    init_tracing();
    let res = run(&observations(), 1.0, DistanceMetric::Chebyshev);

    let density = column(&res, Metric::Density);
    let richness = column(&res, Metric::SpecificRichness);
    let sites = column(&res, Metric::CollectionIdDensity);
    let weighted = column(&res, Metric::WeightedSpecificRichness);

    assert_eq!(density[0], 2.0);
    assert_eq!(density[2], 3.0);
    assert_eq!(sites[2], 2.0);
    assert_eq!(richness[2], 3.0);
    assert_abs_diff_eq!(weighted[2], 1.5, epsilon = 1e-12);

    // Record 4 is alone.
    assert_eq!(density[4], 1.0);
    assert_eq!(richness[4], 1.0);
    assert_eq!(sites[4], 1.0);
    assert_eq!(weighted[4], 1.0);
}

#[test]
fn test_circular_neighborhood() {
    let res = run(&observations(), 1.5, DistanceMetric::Euclidean);

    assert_eq!(column(&res, Metric::Density), vec![2.0, 3.0, 3.0, 2.0, 1.0]);
    assert_eq!(
        column(&res, Metric::SpecificRichness),
        vec![2.0, 3.0, 3.0, 2.0, 1.0]
    );
    assert_eq!(
        column(&res, Metric::CollectionIdDensity),
        vec![2.0, 2.0, 2.0, 2.0, 1.0]
    );
    let weighted = column(&res, Metric::WeightedSpecificRichness);
    for (got, want) in weighted.iter().zip([1.0, 1.5, 1.5, 1.0, 1.0]) {
        assert_abs_diff_eq!(*got, want, epsilon = 1e-12);
    }
}

#[test]
fn test_diagonal_outside_unit_circle() {
    let res = run(&observations(), 1.0, DistanceMetric::Euclidean);
    assert_eq!(column(&res, Metric::Density), vec![1.0; 5]);
}

#[test]
fn test_boundary_is_inclusive() {
    let table = RecordTable::new()
        .with_column("latitude", vec![0.0, 0.0])
        .unwrap()
        .with_column("longitude", vec![0.0, 1.0])
        .unwrap();
    let res = Metrics::new()
        .radius(1.0)
        .metrics(&[Metric::Density])
        .adapter(Batch)
        .build()
        .unwrap()
        .compute(&table)
        .unwrap();
    assert_eq!(column(&res, Metric::Density), vec![2.0, 2.0]);
}

#[test]
fn test_input_columns_preserved_and_metrics_appended() {
    let table = observations();
    let res = run(&table, 1.5, DistanceMetric::Euclidean);

    let names: Vec<&str> = res.table.column_names().collect();
    assert_eq!(
        names,
        vec![
            "latitude",
            "longitude",
            "insecte_fr",
            "collection_id",
            "specific_richness",
            "density",
            "collection_id_density",
            "weighted_specific_richness",
        ]
    );
    assert_eq!(res.table.n_rows(), table.n_rows());
    assert_eq!(res.table.get("insecte_fr"), table.get("insecte_fr"));
    // Input untouched
    assert_eq!(table.n_columns(), 4);
}

#[test]
fn test_recompute_is_idempotent() {
    let first = run(&observations(), 1.5, DistanceMetric::Euclidean);
    let second = run(&first.table, 1.5, DistanceMetric::Euclidean);
    assert_eq!(first.table, second.table);
}

#[test]
fn test_malformed_coordinates_yield_undefined_metrics() {
    init_tracing();
    let table = RecordTable::new()
        .with_column("latitude", vec![Some(0.0), None, Some(0.5), Some(f64::INFINITY)])
        .unwrap()
        .with_column("longitude", vec![Some(0.0), Some(0.0), Some(0.0), Some(0.0)])
        .unwrap()
        .with_column("insecte_fr", vec!["A", "A", "B", "B"])
        .unwrap()
        .with_column("collection_id", vec![1_i64, 1, 2, 2])
        .unwrap();

    let res = run(&table, 1.0, DistanceMetric::Euclidean);

    assert_eq!(
        res.metric(Metric::Density).unwrap(),
        &[Some(2.0), None, Some(2.0), None]
    );
    assert_eq!(res.metric(Metric::WeightedSpecificRichness).unwrap()[1], None);
    assert_eq!(res.summary.n_rows, 4);
    assert_eq!(res.summary.n_indexed, 2);
    assert_eq!(res.summary.n_malformed, 2);
    assert_eq!(res.summary.mean_density, Some(2.0));
}

#[test]
fn test_missing_species_not_counted() {
    let table = RecordTable::new()
        .with_column("latitude", vec![0.0, 0.0, 0.0])
        .unwrap()
        .with_column("longitude", vec![0.0, 0.1, 0.2])
        .unwrap()
        .with_column("insecte_fr", vec![Some("A"), None, Some("  ")])
        .unwrap()
        .with_column("collection_id", vec![1_i64, 1, 1])
        .unwrap();

    let res = run(&table, 1.0, DistanceMetric::Euclidean);
    assert_eq!(column(&res, Metric::Density), vec![3.0; 3]);
    assert_eq!(column(&res, Metric::SpecificRichness), vec![1.0; 3]);
    assert_eq!(column(&res, Metric::WeightedSpecificRichness), vec![1.0; 3]);
}

#[test]
fn test_dataframe_style_missing_labels() {
    // Object species column and float64 id column, both with NaN gaps
    let species = vec![
        Some(Label::Text("A".into())),
        Some(Label::Float(f64::NAN)),
        Some(Label::Text("B".into())),
    ];
    let sites = vec![
        Some(Label::Float(1.0)),
        Some(Label::Float(1.0)),
        Some(Label::Float(2.0)),
    ];
    let table = RecordTable::new()
        .with_column("latitude", vec![0.0, 0.0, 0.0])
        .unwrap()
        .with_column("longitude", vec![0.0, 0.1, 0.2])
        .unwrap()
        .with_column("insecte_fr", species)
        .unwrap()
        .with_column("collection_id", sites)
        .unwrap();

    let res = run(&table, 1.0, DistanceMetric::Euclidean);
    assert_eq!(column(&res, Metric::SpecificRichness), vec![2.0; 3]);
    assert_eq!(column(&res, Metric::CollectionIdDensity), vec![2.0; 3]);
    assert_eq!(column(&res, Metric::WeightedSpecificRichness), vec![1.0; 3]);
}

#[test]
fn test_text_site_ids() {
    let mut table = observations();
    table
        .insert_column("collection_id", vec!["c1", "c2", "c1", "c2", "c3"])
        .unwrap();
    let res = run(&table, 1.5, DistanceMetric::Euclidean);
    assert_eq!(
        column(&res, Metric::CollectionIdDensity),
        vec![2.0, 2.0, 2.0, 2.0, 1.0]
    );
}

#[test]
fn test_custom_column_names_and_metric_names() {
    let mut table = observations();
    let species = table.drop_column("insecte_fr").unwrap();
    table.insert_column("taxon", species).unwrap();

    let res = Metrics::new()
        .radius(1.5)
        .metric_names(&["specific_richness", "weighted_specific_richness"])
        .species_column("taxon")
        .adapter(Batch)
        .build()
        .unwrap()
        .compute(&table)
        .unwrap();

    assert!(res.table.contains("specific_richness"));
    assert!(res.table.contains("weighted_specific_richness"));
    assert!(!res.table.contains("density"));
    assert_eq!(res.summary.mean_density, None);
}

#[test]
fn test_one_call_helper() {
    let out = compute_metrics(
        &observations(),
        1.5,
        &[Metric::Density],
        "insecte_fr",
        "collection_id",
    )
    .unwrap();
    assert_eq!(
        out.float_column("density").unwrap(),
        &[Some(2.0), Some(3.0), Some(3.0), Some(2.0), Some(1.0)]
    );
}

#[test]
fn test_empty_table() {
    let table = RecordTable::new()
        .with_column("latitude", Vec::<f64>::new())
        .unwrap()
        .with_column("longitude", Vec::<f64>::new())
        .unwrap()
        .with_column("insecte_fr", Vec::<String>::new())
        .unwrap()
        .with_column("collection_id", Vec::<i64>::new())
        .unwrap();
    let res = run(&table, 1.0, DistanceMetric::Euclidean);
    assert_eq!(res.table.n_rows(), 0);
    assert_eq!(res.summary.mean_density, None);
}

#[test]
fn test_coordinates_only_input() {
    let lat = vec![45.0, 45.0005, 46.0];
    let lon = vec![2.0, 2.0, 2.0];
    let table = RecordTable::from_coordinates(&lat, &lon).unwrap();
    let res = Metrics::new()
        .radius(0.001)
        .metrics(&[Metric::Density])
        .adapter(Batch)
        .build()
        .unwrap()
        .compute(&table)
        .unwrap();
    assert_eq!(column(&res, Metric::Density), vec![2.0, 2.0, 1.0]);
}

#[cfg(feature = "cpu")]
#[test]
fn test_ndarray_integration() {
    use ndarray::Array1;

    let lat = Array1::from_vec(vec![0.0, 1.0, 2.0, 3.0, 3.0]);
    let lon = Array1::from_vec(vec![0.0, 1.0, 2.0, 3.0, 0.0]);
    let table = RecordTable::from_coordinates(&lat, &lon).unwrap();

    let res = Metrics::new()
        .radius(1.5)
        .metrics(&[Metric::Density])
        .adapter(Batch)
        .parallel(true)
        .build()
        .unwrap()
        .compute(&table)
        .unwrap();
    assert_eq!(column(&res, Metric::Density), vec![2.0, 3.0, 3.0, 2.0, 1.0]);
}

#[test]
fn test_filter_then_compute() {
    let table = RecordTable::new()
        .with_column("latitude", vec![48.85, 48.851, 16.25, 43.3])
        .unwrap()
        .with_column("longitude", vec![2.35, 2.351, -61.58, 5.37])
        .unwrap()
        .with_column("insecte_fr", vec!["A", "B", "A", "C"])
        .unwrap()
        .with_column("collection_id", vec![1_i64, 1, 2, 3])
        .unwrap()
        .with_column("code_postal", vec!["75004", "75004", "97110", "13001"])
        .unwrap();

    let filter = AllOf::new()
        .with(PostalCodeAllowlist::new(["75004", "13001", "97110"]))
        .with(BoundingBox::METROPOLITAN_FRANCE);
    let kept = retain_sites(&table, &filter, "collection_id");
    assert_eq!(kept.n_rows(), 3);

    let res = run(&kept, 0.01, DistanceMetric::Euclidean);
    assert_eq!(column(&res, Metric::Density), vec![2.0, 2.0, 1.0]);
    assert_eq!(column(&res, Metric::SpecificRichness), vec![2.0, 2.0, 1.0]);
    assert_eq!(
        column(&res, Metric::WeightedSpecificRichness),
        vec![2.0, 2.0, 1.0]
    );
}

#[test]
fn test_error_handling() {
    let table = observations();

    // Invalid radius
    for radius in [0.0, -1.0, f64::NAN] {
        let err = Metrics::new().radius(radius).adapter(Batch).build().unwrap_err();
        assert!(err.is_configuration());
    }

    // Unknown names
    assert_eq!(
        "manhattan".parse::<DistanceMetric>().unwrap_err(),
        MetricsError::UnknownDistanceMetric("manhattan".into())
    );
    assert!(Metrics::new()
        .radius(1.0)
        .metric_names(&["abundance"])
        .adapter(Batch)
        .build()
        .is_err());

    // Wrong column kind
    let err = Metrics::new()
        .radius(1.0)
        .latitude_column("insecte_fr")
        .adapter(Batch)
        .build()
        .unwrap()
        .compute(&table)
        .unwrap_err();
    assert!(matches!(err, MetricsError::ColumnType { .. }));

    // Missing coordinate column
    let err = Metrics::new()
        .radius(1.0)
        .longitude_column("lng")
        .adapter(Batch)
        .build()
        .unwrap()
        .compute(&table)
        .unwrap_err();
    assert_eq!(err, MetricsError::MissingColumn("lng".into()));
}

#[test]
fn test_missing_site_id_reports_division_by_zero() {
    let table = RecordTable::new()
        .with_column("latitude", vec![0.0, 10.0])
        .unwrap()
        .with_column("longitude", vec![0.0, 10.0])
        .unwrap()
        .with_column("insecte_fr", vec!["A", "B"])
        .unwrap()
        .with_column("collection_id", vec![Some(1_i64), None])
        .unwrap();

    let err = Metrics::new()
        .radius(1.0)
        .adapter(Batch)
        .parallel(false)
        .build()
        .unwrap()
        .compute(&table)
        .unwrap_err();
    assert_eq!(err, MetricsError::DivisionByZero { row: 1 });

    // Without weighted richness the same table is fine.
    let res = Metrics::new()
        .radius(1.0)
        .metrics(&[Metric::CollectionIdDensity])
        .adapter(Batch)
        .build()
        .unwrap()
        .compute(&table)
        .unwrap();
    assert_eq!(
        res.metric(Metric::CollectionIdDensity).unwrap(),
        &[Some(1.0), Some(0.0)]
    );
}
