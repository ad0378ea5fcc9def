//! # spipoll-metrics
//!
//! Radius-based biodiversity metrics over georeferenced pollinator
//! observations.
//!
//! For every observation, the crate collects the observations within a fixed
//! radius (the observation itself included) and derives local indicators
//! from that neighborhood:
//!
//! * `specific_richness`: distinct species in the neighborhood.
//! * `density`: observations in the neighborhood.
//! * `collection_id_density`: distinct sites (collections) in the neighborhood.
//! * `weighted_specific_richness`: richness divided by site density.
//!
//! Neighborhoods are answered by a KD-tree built once per run, so a run costs
//! one index build plus one radius query per record. With the `cpu` feature
//! (on by default) the index build and the per-record pass run on `rayon`.
//!
//! ## Quick start
//!
//! ```
//! use spipoll_metrics::prelude::*;
//!
//! let table = RecordTable::new()
//!     .with_column("latitude", vec![0.0, 1.0, 2.0, 3.0, 3.0])?
//!     .with_column("longitude", vec![0.0, 1.0, 2.0, 3.0, 0.0])?
//!     .with_column("insecte_fr", vec!["A", "B", "C", "A", "A"])?
//!     .with_column("collection_id", vec![1_i64, 2, 1, 2, 3])?;
//!
//! let result = Metrics::new()
//!     .radius(1.5)
//!     .adapter(Adapter::Batch)
//!     .build()?
//!     .compute(&table)?;
//!
//! let weighted = result.metric(Metric::WeightedSpecificRichness).unwrap();
//! assert_eq!(weighted[2], Some(1.5));
//! assert_eq!(result.summary.n_indexed, 5);
//! # Ok::<(), MetricsError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Layer 6: API         builder, adapter selection, one-call helper
//! Layer 5: Adapters    batch execution over a whole table
//! Layer 4: Engine      point extraction, neighborhood resolution, chunked pass
//! Layer 3: Algorithms  metric catalogue and neighborhood reduction
//! Layer 2: Math        distance policies, KD-tree
//! Layer 1: Primitives  record table, errors, cancellation
//! ```
//!
//! Record filters (`filters`) sit beside the layers and are applied to a
//! table before a run.

#![deny(missing_docs)]

// Layer 1: Primitives
mod primitives;

// Layer 2: Math
mod math;

// Layer 3: Algorithms
mod algorithms;

// Layer 4: Engine
mod engine;

// Layer 5: Adapters
mod adapters;

// Layer 6: API
mod api;

// Input abstractions
mod input;

// Upstream record filters
mod filters;

/// Standard imports for typical use.
pub mod prelude {
    pub use crate::adapters::batch::{BatchMetrics, BatchMetricsBuilder};
    pub use crate::algorithms::metrics::{Metric, MetricSelection, MetricSet};
    pub use crate::api::{compute_metrics, Adapter, Batch, Metrics, MetricsBuilder};
    pub use crate::engine::output::{MetricsResult, RunSummary};
    pub use crate::filters::postal::PostalCodeAllowlist;
    pub use crate::filters::region::{BoundingBox, Polygon};
    pub use crate::filters::{filter_rows, retain_sites, AllOf, RecordFilter};
    pub use crate::input::CoordinateInput;
    pub use crate::math::distance::DistanceMetric;
    pub use crate::primitives::cancel::CancellationToken;
    pub use crate::primitives::errors::MetricsError;
    pub use crate::primitives::table::{Column, Label, RecordTable, RowView};
}

/// Layer-by-layer access for bindings, benchmarks and advanced callers.
///
/// Items here follow the crate's layering and may change between minor
/// versions.
pub mod internals {
    /// Layer 1: record table, errors, cancellation.
    pub mod primitives {
        pub use crate::primitives::*;
    }

    /// Layer 2: distance policies and the KD-tree.
    pub mod math {
        pub use crate::math::*;
    }

    /// Layer 3: metric catalogue and reducer.
    pub mod algorithms {
        pub use crate::algorithms::*;
    }

    /// Layer 4: resolver, executor, output assembly.
    pub mod engine {
        pub use crate::engine::*;
    }

    /// Layer 5: execution adapters.
    pub mod adapters {
        pub use crate::adapters::*;
    }

    /// Layer 6: builder and column-name defaults.
    pub mod api {
        pub use crate::api::*;
        pub use crate::filters::postal::DEFAULT_POSTAL_CODE_COLUMN;
        pub use crate::math::distance::DistanceMetric;
    }

    /// Record filters.
    pub mod filters {
        pub use crate::filters::*;
    }
}
