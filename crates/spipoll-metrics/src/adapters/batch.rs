//! Batch adapter for whole-table metric computation.
//!
//! ## Purpose
//!
//! This module provides the batch execution adapter. It takes a complete
//! table in memory, builds the spatial index once, runs the metrics pass
//! and returns a new table with the metric columns appended.
//!
//! ## Design notes
//!
//! * **Processing**: Processes the entire table in a single pass after one index build.
//! * **Delegation**: Delegates per-record work to the execution engine.
//! * **Parallelism**: Parallel by default via `rayon`.
//! * **Skipping**: Only the columns the requested metrics need are read;
//!   a density-only run never touches species or sites.
//!
//! ## Key concepts
//!
//! * **Batch Processing**: Validates, executes, and returns results.
//! * **Builder Pattern**: Fluent API for configuration with sensible defaults.
//! * **Snapshot**: The input table is borrowed immutably; output goes to a copy.
//!
//! ## Invariants
//!
//! * Output has one row per input row, in input order.
//! * Malformed rows are present in the output with undefined metric cells.
//! * Computing twice on the same table yields identical output.
//!
//! ## Non-goals
//!
//! * This adapter does not read or write files.
//! * This adapter does not filter records geographically (see `filters`).

use std::time::Instant;
use tracing::{debug, info, warn};

use crate::algorithms::metrics::{Metric, MetricSelection};
use crate::algorithms::reducer::MetricReducer;
use crate::api::MetricsBuilder;
use crate::engine::executor::{metrics_pass, PassContext, DEFAULT_CHUNK_SIZE};
use crate::engine::output::{assemble, mean_density, MetricsResult, RunSummary};
use crate::engine::resolver::{NeighborhoodResolver, PointSet};
use crate::math::distance::DistanceMetric;
use crate::primitives::cancel::CancellationToken;
use crate::primitives::errors::MetricsError;
use crate::primitives::table::{Factorized, RecordTable};

// ============================================================================
// Batch Builder
// ============================================================================

/// Builder for the batch processor.
#[derive(Debug, Clone)]
pub struct BatchMetricsBuilder {
    /// Shared configuration
    pub base: MetricsBuilder,
    /// Rows between cancellation checks
    pub chunk_size: usize,
    /// Optional cancellation token
    pub cancellation: Option<CancellationToken>,
}

impl Default for BatchMetricsBuilder {
    fn default() -> Self {
        Self::from_base(MetricsBuilder::default())
    }
}

impl BatchMetricsBuilder {
    /// Wrap a shared builder. Parallel defaults to on for batch runs.
    pub(crate) fn from_base(mut base: MetricsBuilder) -> Self {
        base.parallel = Some(base.parallel.unwrap_or(true));
        Self {
            base,
            chunk_size: DEFAULT_CHUNK_SIZE,
            cancellation: None,
        }
    }

    /// Set parallel execution mode.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.base.parallel = Some(parallel);
        self
    }

    /// Set the number of rows between cancellation checks.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Attach a cancellation token.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    // ========================================================================
    // Shared Setters
    // ========================================================================

    /// Set the neighborhood radius.
    pub fn radius(mut self, radius: f64) -> Self {
        self.base = self.base.radius(radius);
        self
    }

    /// Set the metrics to compute.
    pub fn metrics(mut self, metrics: &[Metric]) -> Self {
        self.base = self.base.metrics(metrics);
        self
    }

    /// Set the distance policy.
    pub fn distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.base = self.base.distance_metric(metric);
        self
    }

    /// Set the metrics to compute by name. Unknown names fail at build time.
    pub fn metric_names<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.base = self.base.metric_names(names);
        self
    }

    /// Also append intermediate counts.
    pub fn keep_intermediate(mut self, keep: bool) -> Self {
        self.base = self.base.keep_intermediate(keep);
        self
    }

    /// Set the latitude column name.
    pub fn latitude_column(mut self, name: impl Into<String>) -> Self {
        self.base = self.base.latitude_column(name);
        self
    }

    /// Set the longitude column name.
    pub fn longitude_column(mut self, name: impl Into<String>) -> Self {
        self.base = self.base.longitude_column(name);
        self
    }

    /// Set the species column name.
    pub fn species_column(mut self, name: impl Into<String>) -> Self {
        self.base = self.base.species_column(name);
        self
    }

    /// Set the site (collection) column name.
    pub fn site_column(mut self, name: impl Into<String>) -> Self {
        self.base = self.base.site_column(name);
        self
    }

    // ========================================================================
    // Build Method
    // ========================================================================

    /// Validate the configuration and build the processor.
    pub fn build(self) -> Result<BatchMetrics, MetricsError> {
        self.base.validate()?;
        if self.chunk_size == 0 {
            return Err(MetricsError::InvalidChunkSize(0));
        }
        Ok(BatchMetrics { config: self })
    }
}

// ============================================================================
// Batch Processor
// ============================================================================

/// Validated batch processor. Reusable across tables.
#[derive(Debug, Clone)]
pub struct BatchMetrics {
    config: BatchMetricsBuilder,
}

impl BatchMetrics {
    /// Neighborhood radius.
    pub fn radius(&self) -> f64 {
        self.config.base.radius.unwrap_or(f64::NAN)
    }

    /// Requested metrics.
    pub fn metrics(&self) -> MetricSelection {
        self.config.base.metrics
    }

    /// Distance policy.
    pub fn distance_metric(&self) -> DistanceMetric {
        self.config.base.distance_metric
    }

    /// Whether the pass runs in parallel.
    pub fn is_parallel(&self) -> bool {
        self.config.base.parallel.unwrap_or(true)
    }

    /// Columns appended by [`compute`](Self::compute).
    pub fn emitted(&self) -> MetricSelection {
        let requested = self.config.base.metrics;
        if self.config.base.keep_intermediate {
            requested.with_dependencies()
        } else {
            requested
        }
    }

    /// Compute the configured metrics for every row of `table`.
    pub fn compute(&self, table: &RecordTable) -> Result<MetricsResult, MetricsError> {
        let base = &self.config.base;
        let radius = self.radius();
        let selection = base.metrics;
        let parallel = self.is_parallel();
        let started = Instant::now();

        info!(
            rows = table.n_rows(),
            radius,
            distance_metric = %base.distance_metric,
            metrics = selection.len(),
            parallel,
            "computing neighborhood metrics"
        );

        let latitude = table.float_column(&base.latitude_column)?;
        let longitude = table.float_column(&base.longitude_column)?;
        let species = factorize_if(selection.needs_species(), table, &base.species_column)?;
        let sites = factorize_if(selection.needs_sites(), table, &base.site_column)?;

        let points = PointSet::from_columns(latitude, longitude);
        if points.n_malformed() > 0 {
            warn!(
                malformed = points.n_malformed(),
                "skipping records with missing or non-finite coordinates"
            );
        }

        let index = points.build_index(parallel);
        debug!(
            indexed = index.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "spatial index built"
        );

        let ctx = PassContext {
            resolver: NeighborhoodResolver::new(&index, &points, radius, base.distance_metric),
            reducer: MetricReducer::new(selection, species.as_ref(), sites.as_ref())?,
            chunk_size: self.config.chunk_size,
            cancellation: self.config.cancellation.as_ref(),
        };
        let sets = metrics_pass(&ctx, points.len(), parallel)?;

        let emitted = self.emitted();
        let out = assemble(table, &sets, emitted)?;
        let summary = RunSummary {
            n_rows: points.len(),
            n_indexed: points.n_valid(),
            n_malformed: points.n_malformed(),
            radius,
            distance_metric: base.distance_metric,
            emitted,
            mean_density: mean_density(&sets),
        };

        info!(
            rows = summary.n_rows,
            indexed = summary.n_indexed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "neighborhood metrics done"
        );

        Ok(MetricsResult {
            table: out,
            summary,
        })
    }
}

fn factorize_if(
    needed: bool,
    table: &RecordTable,
    column: &str,
) -> Result<Option<Factorized>, MetricsError> {
    if !needed {
        return Ok(None);
    }
    Ok(Some(table.column(column)?.factorize()))
}
