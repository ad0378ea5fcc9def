//! High-level API for neighborhood metrics.
//!
//! ## Purpose
//!
//! This module provides the primary user-facing entry point. It implements a
//! fluent builder for the run parameters (radius, metrics, distance policy,
//! column names) and a choice of execution adapter.
//!
//! ## Design notes
//!
//! * **Ergonomic**: Fluent builder with sensible defaults for everything but the radius.
//! * **Polymorphic**: Uses marker types to transition to specialized adapter builders.
//! * **Validated**: Parameters are validated when `.build()` is called on the adapter,
//!   before any data is touched.
//!
//! ## Key concepts
//!
//! ### Configuration Flow
//!
//! 1. Create a [`MetricsBuilder`] via `Metrics::new()`.
//! 2. Chain configuration methods (`.radius()`, `.metrics()`, etc.).
//! 3. Select an adapter via `.adapter(Batch)` to get an execution builder.
//! 4. `.build()` validates; `.compute(&table)` runs.
//!
//! ```
//! use spipoll_metrics::prelude::*;
//!
//! let table = RecordTable::new()
//!     .with_column("latitude", vec![0.0, 1.0, 3.0])?
//!     .with_column("longitude", vec![0.0, 1.0, 0.0])?
//!     .with_column("insecte_fr", vec!["A", "B", "A"])?
//!     .with_column("collection_id", vec![1_i64, 2, 3])?;
//!
//! let result = Metrics::new()
//!     .radius(1.5)
//!     .adapter(Batch)
//!     .build()?
//!     .compute(&table)?;
//!
//! let density = result.metric(Metric::Density).unwrap();
//! assert_eq!(density, &[Some(2.0), Some(2.0), Some(1.0)]);
//! # Ok::<(), MetricsError>(())
//! ```

use crate::adapters::batch::BatchMetricsBuilder;
use crate::algorithms::metrics::{Metric, MetricSelection};
use crate::math::distance::DistanceMetric;
use crate::primitives::errors::MetricsError;
use crate::primitives::table::RecordTable;

/// Default latitude column.
pub const DEFAULT_LATITUDE_COLUMN: &str = "latitude";
/// Default longitude column.
pub const DEFAULT_LONGITUDE_COLUMN: &str = "longitude";
/// Default species column (insect label in the SPIPOLL export).
pub const DEFAULT_SPECIES_COLUMN: &str = "insecte_fr";
/// Default site column (collection id in the SPIPOLL export).
pub const DEFAULT_SITE_COLUMN: &str = "collection_id";

// ============================================================================
// Adapter Module
// ============================================================================

/// Adapter selection namespace.
#[allow(non_snake_case)]
pub mod Adapter {
    pub use super::Batch;
}

/// Conversion from the shared builder into an adapter-specific builder.
pub trait MetricsAdapter {
    /// Adapter-specific builder.
    type Output;

    /// Wrap the shared configuration.
    fn convert(builder: MetricsBuilder) -> Self::Output;
}

/// Marker for in-memory batch processing of a whole table.
#[derive(Debug, Clone, Copy)]
pub struct Batch;

impl MetricsAdapter for Batch {
    type Output = BatchMetricsBuilder;

    fn convert(builder: MetricsBuilder) -> Self::Output {
        BatchMetricsBuilder::from_base(builder)
    }
}

// ============================================================================
// Shared Builder
// ============================================================================

/// Entry point: `Metrics::new()` starts a [`MetricsBuilder`].
#[derive(Debug, Clone, Copy)]
pub struct Metrics;

impl Metrics {
    /// Start configuring a run with default parameters.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> MetricsBuilder {
        MetricsBuilder::default()
    }
}

/// Shared run configuration.
#[derive(Debug, Clone)]
pub struct MetricsBuilder {
    /// Neighborhood radius in coordinate units (required)
    pub radius: Option<f64>,
    /// Metrics to append
    pub metrics: MetricSelection,
    /// Neighborhood shape
    pub distance_metric: DistanceMetric,
    /// Latitude column name
    pub latitude_column: String,
    /// Longitude column name
    pub longitude_column: String,
    /// Species column name
    pub species_column: String,
    /// Site (collection) column name
    pub site_column: String,
    /// Also append the counts weighted richness is derived from
    pub keep_intermediate: bool,
    /// Parallel execution; adapters pick their own default when unset
    pub parallel: Option<bool>,
    /// Error raised while parsing names, reported at build time
    pub deferred_error: Option<MetricsError>,
}

impl Default for MetricsBuilder {
    fn default() -> Self {
        Self {
            radius: None,
            metrics: MetricSelection::all(),
            distance_metric: DistanceMetric::default(),
            latitude_column: DEFAULT_LATITUDE_COLUMN.to_owned(),
            longitude_column: DEFAULT_LONGITUDE_COLUMN.to_owned(),
            species_column: DEFAULT_SPECIES_COLUMN.to_owned(),
            site_column: DEFAULT_SITE_COLUMN.to_owned(),
            keep_intermediate: false,
            parallel: None,
            deferred_error: None,
        }
    }
}

impl MetricsBuilder {
    /// Set the neighborhood radius.
    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Set the metrics to compute.
    pub fn metrics(mut self, metrics: &[Metric]) -> Self {
        self.metrics = MetricSelection::from_metrics(metrics);
        self
    }

    /// Set the metrics to compute by name. Unknown names fail at build time.
    pub fn metric_names<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        match MetricSelection::parse(names) {
            Ok(selection) => self.metrics = selection,
            Err(err) => self.deferred_error = Some(err),
        }
        self
    }

    /// Set the distance policy.
    pub fn distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.distance_metric = metric;
        self
    }

    /// Set the latitude column name.
    pub fn latitude_column(mut self, name: impl Into<String>) -> Self {
        self.latitude_column = name.into();
        self
    }

    /// Set the longitude column name.
    pub fn longitude_column(mut self, name: impl Into<String>) -> Self {
        self.longitude_column = name.into();
        self
    }

    /// Set the species column name.
    pub fn species_column(mut self, name: impl Into<String>) -> Self {
        self.species_column = name.into();
        self
    }

    /// Set the site (collection) column name.
    pub fn site_column(mut self, name: impl Into<String>) -> Self {
        self.site_column = name.into();
        self
    }

    /// Also append `specific_richness` and `collection_id_density` when they
    /// were only computed as inputs to weighted richness.
    pub fn keep_intermediate(mut self, keep: bool) -> Self {
        self.keep_intermediate = keep;
        self
    }

    /// Set parallel execution mode.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    /// Select an execution adapter.
    pub fn adapter<A: MetricsAdapter>(self, _adapter: A) -> A::Output {
        A::convert(self)
    }

    /// Check everything that can be checked without data.
    pub fn validate(&self) -> Result<(), MetricsError> {
        if let Some(err) = &self.deferred_error {
            return Err(err.clone());
        }
        match self.radius {
            Some(r) if r.is_finite() && r > 0.0 => {}
            Some(r) => return Err(MetricsError::InvalidRadius(r)),
            None => return Err(MetricsError::InvalidRadius(f64::NAN)),
        }
        if self.metrics.is_empty() {
            return Err(MetricsError::EmptyMetrics);
        }
        Ok(())
    }
}

/// One-call form: append `metrics` to `table` using a circular neighborhood
/// of `radius`, in parallel where available.
pub fn compute_metrics(
    table: &RecordTable,
    radius: f64,
    metrics: &[Metric],
    species_column: &str,
    site_column: &str,
) -> Result<RecordTable, MetricsError> {
    Metrics::new()
        .radius(radius)
        .metrics(metrics)
        .species_column(species_column)
        .site_column(site_column)
        .adapter(Batch)
        .build()?
        .compute(table)
        .map(|result| result.table)
}
