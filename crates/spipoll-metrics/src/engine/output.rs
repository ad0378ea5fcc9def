//! Output assembly.
//!
//! Per-record [`MetricSet`]s are gathered into one column per emitted metric
//! and appended to a copy of the input table. The input table itself is
//! never modified.

use crate::algorithms::metrics::{Metric, MetricSelection, MetricSet};
use crate::math::distance::DistanceMetric;
use crate::primitives::errors::MetricsError;
use crate::primitives::table::{Column, RecordTable};

/// Figures describing one completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Rows in the input table
    pub n_rows: usize,
    /// Rows that entered the spatial index
    pub n_indexed: usize,
    /// Rows skipped for missing or non-finite coordinates
    pub n_malformed: usize,
    /// Neighborhood radius, in coordinate units
    pub radius: f64,
    /// Neighborhood shape
    pub distance_metric: DistanceMetric,
    /// Columns appended to the table
    pub emitted: MetricSelection,
    /// Mean neighborhood size over indexed rows, when density was computed
    pub mean_density: Option<f64>,
}

/// Augmented table plus run summary.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsResult {
    /// Input table with one appended column per emitted metric
    pub table: RecordTable,
    /// Run figures
    pub summary: RunSummary,
}

impl MetricsResult {
    /// Values of an emitted metric column, `None` for undefined cells.
    pub fn metric(&self, metric: Metric) -> Option<&[Option<f64>]> {
        self.table.get(metric.column_name())?.as_float()
    }
}

/// Mean neighborhood size over rows that produced a result.
pub fn mean_density(sets: &[Option<MetricSet>]) -> Option<f64> {
    let (sum, count) = sets
        .iter()
        .flatten()
        .filter_map(|s| s.get(Metric::Density))
        .fold((0.0, 0usize), |(sum, n), d| (sum + d, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Copy `table` and append (or replace) one column per metric in `emit`.
pub fn assemble(
    table: &RecordTable,
    sets: &[Option<MetricSet>],
    emit: MetricSelection,
) -> Result<RecordTable, MetricsError> {
    let mut out = table.clone();
    for metric in emit.iter() {
        let values: Vec<Option<f64>> = sets
            .iter()
            .map(|set| set.as_ref().and_then(|s| s.get(metric)))
            .collect();
        out.insert_column(metric.column_name(), Column::Float(values))?;
    }
    Ok(out)
}
