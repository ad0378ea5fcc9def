//! Parallel execution engine for neighborhood metrics.
//!
//! ## Purpose
//!
//! This module runs the per-record work: query the index for the record's
//! neighborhood, reduce it to a [`MetricSet`], and gather the results in
//! input order. Records are independent, so the pass fans out across CPU
//! cores with `rayon`.
//!
//! ## Design notes
//!
//! * **Implementation**: One pass over all rows, after the index is built.
//!   No row is ever compared against every other row.
//! * **Parallelism**: Uses `rayon` for data-parallel execution across CPU cores.
//! * **Optimization**: Reuses neighbor and distinct-count buffers per thread
//!   to minimize allocations.
//! * **Cancellation**: Rows are processed in chunks; the cancellation token
//!   is checked before each chunk.
//!
//! ## Key concepts
//!
//! * **Order-preserving gather**: Results are collected by row, so output
//!   position never depends on scheduling.
//! * **Snapshot reads**: Workers read only the immutable index and codes;
//!   each writes only its own output slot.
//!
//! ## Invariants
//!
//! * Parallel and sequential passes return identical results.
//! * The output has exactly one entry per input row.
//! * Malformed rows yield `None`.
//!
//! ## Non-goals
//!
//! * This module does not build the index or factorize columns (handled by the adapter).
//! * This module does not validate configuration (handled by the builder).

// Feature-gated imports
#[cfg(feature = "cpu")]
use rayon::prelude::*;

use tracing::trace;

use crate::algorithms::metrics::MetricSet;
use crate::algorithms::reducer::{MetricReducer, ReducerBuffer};
use crate::engine::resolver::NeighborhoodResolver;
use crate::primitives::cancel::{CancellationToken, Interrupt};
use crate::primitives::errors::MetricsError;

/// Default number of rows between cancellation checks.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Smallest number of rows a rayon task is split down to.
#[cfg(feature = "cpu")]
const MIN_ROWS_PER_TASK: usize = 64;

/// Everything a metrics pass needs, borrowed from the caller.
#[derive(Debug, Clone, Copy)]
pub struct PassContext<'a> {
    /// Index bound to the run's radius and distance policy
    pub resolver: NeighborhoodResolver<'a>,
    /// Reducer for the run's metric selection
    pub reducer: MetricReducer<'a>,
    /// Rows between cancellation checks
    pub chunk_size: usize,
    /// Optional cancellation token
    pub cancellation: Option<&'a CancellationToken>,
}

impl PassContext<'_> {
    fn checkpoint(&self, processed: usize, total: usize) -> Result<(), MetricsError> {
        match self.cancellation.and_then(CancellationToken::check) {
            None => Ok(()),
            Some(Interrupt::Cancelled) => Err(MetricsError::Cancelled { processed, total }),
            Some(Interrupt::DeadlineExceeded) => {
                Err(MetricsError::DeadlineExceeded { processed, total })
            }
        }
    }

    #[inline]
    fn process_row(
        &self,
        row: usize,
        neighbors: &mut Vec<usize>,
        buffer: &mut ReducerBuffer,
    ) -> Result<Option<MetricSet>, MetricsError> {
        if self.resolver.query_into(row, neighbors) {
            self.reducer.reduce(row, neighbors, buffer).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Compute metrics for rows `0..n_rows` on the current thread.
pub fn metrics_pass_sequential(
    ctx: &PassContext<'_>,
    n_rows: usize,
) -> Result<Vec<Option<MetricSet>>, MetricsError> {
    let chunk_size = ctx.chunk_size.max(1);
    let mut neighbors = Vec::new();
    let mut buffer = ctx.reducer.buffer();
    let mut results = Vec::with_capacity(n_rows);

    for start in (0..n_rows).step_by(chunk_size) {
        ctx.checkpoint(start, n_rows)?;
        let end = (start + chunk_size).min(n_rows);
        for row in start..end {
            results.push(ctx.process_row(row, &mut neighbors, &mut buffer)?);
        }
        trace!(processed = end, total = n_rows, "metrics chunk done");
    }

    Ok(results)
}

/// Compute metrics for rows `0..n_rows` across the rayon thread pool.
///
/// Produces exactly what [`metrics_pass_sequential`] produces.
#[cfg(feature = "cpu")]
pub fn metrics_pass_parallel(
    ctx: &PassContext<'_>,
    n_rows: usize,
) -> Result<Vec<Option<MetricSet>>, MetricsError> {
    let chunk_size = ctx.chunk_size.max(1);
    let mut results = Vec::with_capacity(n_rows);

    for start in (0..n_rows).step_by(chunk_size) {
        ctx.checkpoint(start, n_rows)?;
        let end = (start + chunk_size).min(n_rows);

        let chunk: Vec<Option<MetricSet>> = (start..end)
            .into_par_iter()
            .with_min_len(MIN_ROWS_PER_TASK)
            .map_init(
                || {
                    // Thread-local buffers
                    (Vec::new(), ctx.reducer.buffer())
                },
                |(neighbors, buffer), row| ctx.process_row(row, neighbors, buffer),
            )
            .collect::<Result<_, _>>()?;

        results.extend(chunk);
        trace!(processed = end, total = n_rows, "metrics chunk done");
    }

    Ok(results)
}

/// Run the pass in parallel when requested and available, sequentially otherwise.
pub fn metrics_pass(
    ctx: &PassContext<'_>,
    n_rows: usize,
    parallel: bool,
) -> Result<Vec<Option<MetricSet>>, MetricsError> {
    #[cfg(feature = "cpu")]
    {
        if parallel {
            return metrics_pass_parallel(ctx, n_rows);
        }
    }
    #[cfg(not(feature = "cpu"))]
    let _ = parallel;
    metrics_pass_sequential(ctx, n_rows)
}
