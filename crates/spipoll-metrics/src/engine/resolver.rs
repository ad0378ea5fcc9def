//! Neighborhood resolution.
//!
//! ## Purpose
//!
//! This module binds a built [`KdTree`] to a radius and distance policy and
//! answers "which records are neighbors of record `i`?". It also owns the
//! step that turns raw coordinate columns into indexable points, which is
//! where malformed records are set aside.
//!
//! ## Invariants
//!
//! * A well-formed record's neighborhood always contains the record itself.
//! * Malformed records (missing, NaN or infinite coordinates) are never
//!   indexed and never queried; their neighborhood is `None`.
//! * Neighbor sets carry no ordering guarantee.

use crate::math::distance::DistanceMetric;
use crate::math::neighborhood::{KdNode, KdTree};

/// Coordinates of every record, `None` for records that cannot be indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    points: Vec<Option<[f64; 2]>>,
    n_valid: usize,
}

impl PointSet {
    /// Pair latitude and longitude cells row by row.
    ///
    /// # Panics
    ///
    /// Panics if the two columns differ in length.
    pub fn from_columns(latitude: &[Option<f64>], longitude: &[Option<f64>]) -> Self {
        assert_eq!(latitude.len(), longitude.len(), "coordinate columns differ in length");
        let points: Vec<Option<[f64; 2]>> = latitude
            .iter()
            .zip(longitude)
            .map(|(lat, lon)| match (lat, lon) {
                (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some([*lat, *lon]),
                _ => None,
            })
            .collect();
        let n_valid = points.iter().filter(|p| p.is_some()).count();
        Self { points, n_valid }
    }

    /// Number of records, malformed ones included.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of indexable records.
    pub fn n_valid(&self) -> usize {
        self.n_valid
    }

    /// Number of malformed records.
    pub fn n_malformed(&self) -> usize {
        self.points.len() - self.n_valid
    }

    /// Point of record `row`, if it is well-formed.
    #[inline]
    pub fn get(&self, row: usize) -> Option<&[f64; 2]> {
        self.points[row].as_ref()
    }

    /// Tree nodes for every well-formed record.
    pub fn nodes(&self) -> Vec<KdNode<f64>> {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(index, p)| p.map(|point| KdNode { point, index }))
            .collect()
    }

    /// Build the spatial index over well-formed records.
    pub fn build_index(&self, parallel: bool) -> KdTree<f64> {
        let nodes = self.nodes();
        #[cfg(feature = "cpu")]
        {
            if parallel {
                return KdTree::from_nodes_parallel(nodes);
            }
        }
        #[cfg(not(feature = "cpu"))]
        let _ = parallel;
        KdTree::from_nodes(nodes)
    }
}

/// Radius queries against a fixed index.
#[derive(Debug, Clone, Copy)]
pub struct NeighborhoodResolver<'a> {
    index: &'a KdTree<f64>,
    points: &'a PointSet,
    radius: f64,
    metric: DistanceMetric,
}

impl<'a> NeighborhoodResolver<'a> {
    /// Bind an index built from `points` to a radius and distance policy.
    pub fn new(
        index: &'a KdTree<f64>,
        points: &'a PointSet,
        radius: f64,
        metric: DistanceMetric,
    ) -> Self {
        Self {
            index,
            points,
            radius,
            metric,
        }
    }

    /// Write the neighbors of record `row` into `out`, replacing its contents.
    ///
    /// Returns `false` (leaving `out` empty) for a malformed record.
    pub fn query_into(&self, row: usize, out: &mut Vec<usize>) -> bool {
        out.clear();
        match self.points.get(row) {
            Some(point) => {
                self.index.query_radius(point, self.radius, self.metric, out);
                true
            }
            None => false,
        }
    }

    /// Neighbors of record `row`, or `None` for a malformed record.
    pub fn query(&self, row: usize) -> Option<Vec<usize>> {
        let mut out = Vec::new();
        self.query_into(row, &mut out).then_some(out)
    }

    /// Neighborhood of every record, in input order.
    ///
    /// Materializes all neighbor sets at once; the engine streams them
    /// instead, so prefer [`query_into`](Self::query_into) for large tables.
    pub fn resolve(&self) -> Vec<(usize, Option<Vec<usize>>)> {
        (0..self.points.len()).map(|row| (row, self.query(row))).collect()
    }
}
