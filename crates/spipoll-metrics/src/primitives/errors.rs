//! Error types for metric computation.
//!
//! ## Purpose
//!
//! This module defines the single error enum returned by every fallible
//! operation in the crate.
//!
//! ## Key concepts
//!
//! * **Configuration errors**: Detected at `build()`, before any computation.
//! * **Table errors**: Missing columns, wrong column kinds, ragged columns.
//! * **Invariant violations**: `DivisionByZero` should be unreachable for
//!   well-formed input and is surfaced rather than turned into NaN.
//! * **Interruption**: `Cancelled` and `DeadlineExceeded` abort a run
//!   without producing partial output.

/// Errors that can occur while configuring or running a metrics computation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    /// Radius must be finite and strictly positive.
    #[error("Invalid radius: {0} (must be finite and > 0)")]
    InvalidRadius(f64),

    /// No metric was requested.
    #[error("No metrics requested: at least one metric must be selected")]
    EmptyMetrics,

    /// A metric name did not match any known metric.
    #[error("Unknown metric: {0}. Valid options: specific_richness, density, collection_id_density, weighted_specific_richness")]
    UnknownMetric(String),

    /// A distance metric name did not match any known policy.
    #[error("Unknown distance metric: {0}. Valid options: euclidean, chebyshev")]
    UnknownDistanceMetric(String),

    /// Chunk size must be at least 1.
    #[error("Invalid chunk size: {0} (must be >= 1)")]
    InvalidChunkSize(usize),

    /// A required column is absent from the table.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A column exists but holds the wrong kind of values.
    #[error("Column '{column}' has kind {got}, expected {expected}")]
    ColumnType {
        /// Column name
        column: String,
        /// Accepted kind(s)
        expected: &'static str,
        /// Actual kind
        got: &'static str,
    },

    /// A column's length differs from the table's row count.
    #[error("Column '{column}' has {got} rows, table has {expected}")]
    MismatchedColumnLength {
        /// Column name
        column: String,
        /// Table row count
        expected: usize,
        /// Column row count
        got: usize,
    },

    /// A column with the same name was already added.
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// `collection_id_density` was zero while computing weighted richness.
    ///
    /// A record always counts its own site, so this indicates records with a
    /// missing site id or an upstream bug.
    #[error("Division by zero in weighted_specific_richness at row {row}: collection_id_density is 0")]
    DivisionByZero {
        /// Row whose neighborhood had no site
        row: usize,
    },

    /// The run was cancelled through its token.
    #[error("Computation cancelled after {processed} of {total} rows")]
    Cancelled {
        /// Rows completed before cancellation was observed
        processed: usize,
        /// Total rows in the run
        total: usize,
    },

    /// The run's deadline passed.
    #[error("Deadline exceeded after {processed} of {total} rows")]
    DeadlineExceeded {
        /// Rows completed before the deadline was observed
        processed: usize,
        /// Total rows in the run
        total: usize,
    },

    /// A region passed to a geographic filter is degenerate.
    #[error("Invalid region: {0}")]
    InvalidRegion(String),
}

impl MetricsError {
    /// Whether the error was raised by configuration validation.
    #[inline]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidRadius(_)
                | Self::EmptyMetrics
                | Self::UnknownMetric(_)
                | Self::UnknownDistanceMetric(_)
                | Self::InvalidChunkSize(_)
        )
    }

    /// Whether the run was interrupted and may simply be re-run.
    #[inline]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::DeadlineExceeded { .. })
    }
}
