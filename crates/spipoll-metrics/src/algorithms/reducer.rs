//! Neighborhood reduction.
//!
//! ## Purpose
//!
//! This module reduces one neighborhood to a [`MetricSet`]. It is the only
//! place the metric definitions live.
//!
//! ## Design notes
//!
//! * **Read-only inputs**: The reducer borrows factorized species and site
//!   codes for the whole table and never writes to them, so one record's
//!   reduction cannot observe another record's output.
//! * **Epoch marks**: Distinct counts use one mark slot per category,
//!   stamped with a per-query epoch. Nothing is cleared between queries and
//!   nothing is hashed in the hot loop.
//! * **Buffer reuse**: [`ReducerBuffer`] is scratch space meant to live for
//!   one worker thread. It affects speed only, never results.
//!
//! ## Key concepts
//!
//! * `specific_richness` = distinct non-missing species codes.
//! * `density` = neighborhood size.
//! * `collection_id_density` = distinct non-missing site codes.
//! * `weighted_specific_richness` = richness / site density.
//!
//! ## Invariants
//!
//! * The same neighborhood always reduces to the same [`MetricSet`].
//! * Only metrics in the selection (plus their dependencies) are computed.
//! * A zero site density under weighted richness is an error, never NaN.

use crate::algorithms::metrics::{Metric, MetricSelection, MetricSet};
use crate::primitives::errors::MetricsError;
use crate::primitives::table::Factorized;

/// Per-thread scratch space for distinct counting.
#[derive(Debug, Clone)]
pub struct ReducerBuffer {
    species_marks: Vec<u32>,
    site_marks: Vec<u32>,
    epoch: u32,
}

impl ReducerBuffer {
    /// Allocate marks for the given category counts.
    pub fn new(species_cardinality: usize, site_cardinality: usize) -> Self {
        Self {
            species_marks: vec![0; species_cardinality],
            site_marks: vec![0; site_cardinality],
            epoch: 0,
        }
    }

    fn next_epoch(&mut self) -> u32 {
        if self.epoch == u32::MAX {
            self.species_marks.fill(0);
            self.site_marks.fill(0);
            self.epoch = 0;
        }
        self.epoch += 1;
        self.epoch
    }
}

fn count_distinct(codes: &[Option<u32>], neighbors: &[usize], marks: &mut [u32], epoch: u32) -> u32 {
    let mut distinct = 0;
    for &i in neighbors {
        if let Some(code) = codes[i] {
            let mark = &mut marks[code as usize];
            if *mark != epoch {
                *mark = epoch;
                distinct += 1;
            }
        }
    }
    distinct
}

/// Computes a configured subset of metrics for one neighborhood at a time.
#[derive(Debug, Clone, Copy)]
pub struct MetricReducer<'a> {
    compute: MetricSelection,
    species: Option<&'a Factorized>,
    sites: Option<&'a Factorized>,
}

impl<'a> MetricReducer<'a> {
    /// Create a reducer for `selection`.
    ///
    /// `species` is required when the selection needs richness and `sites`
    /// when it needs site density; pass `None` otherwise and that work is
    /// skipped entirely.
    pub fn new(
        selection: MetricSelection,
        species: Option<&'a Factorized>,
        sites: Option<&'a Factorized>,
    ) -> Result<Self, MetricsError> {
        if selection.is_empty() {
            return Err(MetricsError::EmptyMetrics);
        }
        let compute = selection.with_dependencies();
        if compute.needs_species() && species.is_none() {
            return Err(MetricsError::MissingColumn("species".to_owned()));
        }
        if compute.needs_sites() && sites.is_none() {
            return Err(MetricsError::MissingColumn("site".to_owned()));
        }
        Ok(Self {
            compute,
            species: species.filter(|_| compute.needs_species()),
            sites: sites.filter(|_| compute.needs_sites()),
        })
    }

    /// Metrics this reducer computes, dependencies included.
    pub fn computes(&self) -> MetricSelection {
        self.compute
    }

    /// Scratch buffer sized for this reducer's categories.
    pub fn buffer(&self) -> ReducerBuffer {
        ReducerBuffer::new(
            self.species.map_or(0, |f| f.cardinality),
            self.sites.map_or(0, |f| f.cardinality),
        )
    }

    /// Reduce the neighborhood of record `row`.
    ///
    /// `neighbors` must hold distinct row indices. `row` is only used to
    /// label a [`MetricsError::DivisionByZero`].
    pub fn reduce(
        &self,
        row: usize,
        neighbors: &[usize],
        buffer: &mut ReducerBuffer,
    ) -> Result<MetricSet, MetricsError> {
        let mut set = MetricSet::default();
        let epoch = buffer.next_epoch();

        if self.compute.contains(Metric::Density) {
            set.set(Metric::Density, neighbors.len() as f64);
        }

        let richness = self
            .species
            .map(|f| count_distinct(&f.codes, neighbors, &mut buffer.species_marks, epoch));
        if let Some(r) = richness {
            set.set(Metric::SpecificRichness, f64::from(r));
        }

        let site_density = self
            .sites
            .map(|f| count_distinct(&f.codes, neighbors, &mut buffer.site_marks, epoch));
        if let Some(s) = site_density {
            set.set(Metric::CollectionIdDensity, f64::from(s));
        }

        if self.compute.contains(Metric::WeightedSpecificRichness) {
            let sites = site_density.unwrap_or(0);
            if sites == 0 {
                return Err(MetricsError::DivisionByZero { row });
            }
            let richness = richness.unwrap_or(0);
            set.set(
                Metric::WeightedSpecificRichness,
                f64::from(richness) / f64::from(sites),
            );
        }

        Ok(set)
    }

    /// Allocating convenience for one-off reductions.
    pub fn reduce_once(&self, row: usize, neighbors: &[usize]) -> Result<MetricSet, MetricsError> {
        self.reduce(row, neighbors, &mut self.buffer())
    }
}
