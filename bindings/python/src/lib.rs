//! Python bindings for spipoll-metrics.
//!
//! Provides Python access to the spipoll-metrics Rust library via PyO3.

#![deny(missing_docs)]

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::fmt::Display;

use ::spipoll_metrics::internals::algorithms::metrics::MetricSelection;
use ::spipoll_metrics::prelude::{
    Adapter, Column, DistanceMetric, Label, Metric, Metrics, MetricsResult, RecordTable,
};

const SPECIES_COLUMN: &str = "species";
const SITE_COLUMN: &str = "site_id";

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert a MetricsError to a PyErr
fn to_py_error(e: impl Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Parse distance metric from string
fn parse_distance_metric(name: &str) -> PyResult<DistanceMetric> {
    name.parse().map_err(to_py_error)
}

/// Parse metric names; `None` selects every metric
fn parse_metrics(names: Option<Vec<String>>) -> PyResult<Vec<Metric>> {
    match names {
        None => Ok(Metric::ALL.to_vec()),
        Some(names) => {
            let selection = MetricSelection::parse(&names).map_err(to_py_error)?;
            Ok(selection.iter().collect())
        }
    }
}

/// One categorical label as passed from Python. Float NaN (pandas' missing
/// value) and `None` are both treated as missing.
#[derive(FromPyObject)]
enum PyLabel {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<PyLabel> for Label {
    fn from(label: PyLabel) -> Self {
        match label {
            PyLabel::Int(i) => Label::Int(i),
            PyLabel::Float(x) => Label::Float(x),
            PyLabel::Text(s) => Label::Text(s),
        }
    }
}

/// Build a label column from per-item Python values
fn to_label_column(labels: Vec<Option<PyLabel>>) -> Column {
    let labels: Vec<Option<Label>> = labels.into_iter().map(|l| l.map(Label::from)).collect();
    Column::from(labels)
}

/// Metric columns as a `dict[str, ndarray]`, NaN for undefined cells
fn to_py_dict<'py>(py: Python<'py>, result: &MetricsResult) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    for metric in result.summary.emitted.iter() {
        if let Some(values) = result.metric(metric) {
            let values: Vec<f64> = values.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
            dict.set_item(metric.column_name(), PyArray1::from_vec(py, values))?;
        }
    }
    Ok(dict)
}

// ============================================================================
// Main Function
// ============================================================================

/// Compute radius-based biodiversity metrics for every observation.
///
/// Parameters
/// ----------
/// latitude, longitude : array_like
///     Observation coordinates. NaN marks a record that cannot be located.
/// species : list of str, int or float
///     Species label per observation. None, NaN or blank is not counted.
/// site_id : list of int, float or str
///     Collection (site) id per observation. None or NaN is missing.
/// radius : float
///     Neighborhood radius in coordinate units.
/// metrics : list of str, optional
///     Metrics to return. Defaults to all four.
/// distance_metric : str
///     "euclidean" (circle) or "chebyshev" (square).
/// keep_intermediate : bool
///     Also return counts weighted richness is derived from.
/// parallel : bool
///     Use all CPU cores.
///
/// Returns
/// -------
/// dict[str, numpy.ndarray]
///     One float array per metric, NaN where undefined.
#[pyfunction]
#[pyo3(signature = (
    latitude, longitude, species, site_id,
    radius,
    metrics=None,
    distance_metric="euclidean",
    keep_intermediate=false,
    parallel=true
))]
#[allow(clippy::too_many_arguments)]
fn compute_metrics<'py>(
    py: Python<'py>,
    latitude: PyReadonlyArray1<'py, f64>,
    longitude: PyReadonlyArray1<'py, f64>,
    species: Vec<Option<PyLabel>>,
    site_id: Vec<Option<PyLabel>>,
    radius: f64,
    metrics: Option<Vec<String>>,
    distance_metric: &str,
    keep_intermediate: bool,
    parallel: bool,
) -> PyResult<Bound<'py, PyDict>> {
    let lat_slice = latitude.as_slice().map_err(to_py_error)?;
    let lon_slice = longitude.as_slice().map_err(to_py_error)?;

    let dm = parse_distance_metric(distance_metric)?;
    let selected = parse_metrics(metrics)?;

    let table = RecordTable::from_coordinates(lat_slice, lon_slice)
        .and_then(|t| t.with_column(SPECIES_COLUMN, to_label_column(species)))
        .and_then(|t| t.with_column(SITE_COLUMN, to_label_column(site_id)))
        .map_err(to_py_error)?;

    let processor = Metrics::new()
        .radius(radius)
        .metrics(&selected)
        .distance_metric(dm)
        .species_column(SPECIES_COLUMN)
        .site_column(SITE_COLUMN)
        .keep_intermediate(keep_intermediate)
        .adapter(Adapter::Batch)
        .parallel(parallel)
        .build()
        .map_err(to_py_error)?;

    let result = py
        .allow_threads(|| processor.compute(&table))
        .map_err(to_py_error)?;

    to_py_dict(py, &result)
}

// ============================================================================
// Module Registration
// ============================================================================

/// spipoll: radius-based biodiversity metrics for pollinator observations.
#[pymodule]
fn spipoll(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(compute_metrics, m)?)?;
    Ok(())
}
