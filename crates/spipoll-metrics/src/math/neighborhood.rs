//! 2-D KD-tree with inclusive radius queries.
//!
//! ## Purpose
//!
//! This module provides the spatial index the engine builds once per dataset
//! snapshot and queries once per record. Construction is parallelized at the
//! top levels of recursion for large datasets.
//!
//! ## Design notes
//!
//! * **Implicit layout**: The tree is a single array. Each subtree occupies a
//!   contiguous range whose median sits in the middle slot, so no child
//!   pointers are stored and the two halves of a range can be built on
//!   separate threads through `split_at_mut`.
//! * **Recursive Parallelism**: Uses `rayon::join` above 1024 points.
//! * **Median Splitting**: Balanced construction via `select_nth_unstable_by`,
//!   alternating latitude and longitude.
//!
//! ## Key concepts
//!
//! * **Radius query**: Collects every indexed point within `radius` of the
//!   query under a [`DistanceMetric`], pruning subtrees whose splitting plane
//!   is farther than `radius` from the query.
//! * **Original indices**: Nodes carry the record index they were built from,
//!   so queries answer in terms of table rows, not tree slots.
//!
//! ## Invariants
//!
//! * Parallel construction produces an identical tree to sequential construction.
//! * Queries on an empty tree return nothing and never fault.
//! * A query at an indexed point returns that point's own index.
//!
//! ## Non-goals
//!
//! * This module does not support insertion or removal after construction.
//! * This module does not implement k-nearest-neighbor search.

use num_traits::Float;
use std::cmp::Ordering;

// Feature-gated imports
#[cfg(feature = "cpu")]
use rayon::join;

use crate::math::distance::DistanceMetric;

/// Ranges larger than this are split across threads during construction.
#[cfg(feature = "cpu")]
const PARALLEL_BUILD_THRESHOLD: usize = 1024;

/// A point stored in the tree together with its record index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdNode<T> {
    /// (latitude, longitude)
    pub point: [T; 2],
    /// Row of the record this point came from
    pub index: usize,
}

/// Balanced 2-D KD-tree in implicit median layout.
#[derive(Debug, Clone)]
pub struct KdTree<T> {
    nodes: Vec<KdNode<T>>,
}

impl<T: Float> KdTree<T> {
    /// Build a tree over `points`, labelling each with its position.
    pub fn new(points: &[[T; 2]]) -> Self {
        Self::from_nodes(index_points(points))
    }

    /// Build a tree over pre-labelled nodes.
    pub fn from_nodes(mut nodes: Vec<KdNode<T>>) -> Self {
        build_recursive_sequential(&mut nodes, 0);
        Self { nodes }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree indexes no points.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in tree layout order.
    pub fn nodes(&self) -> &[KdNode<T>] {
        &self.nodes
    }

    /// Append the record index of every point within `radius` of `query` to `out`.
    ///
    /// `out` is not cleared, so callers can reuse one buffer across queries.
    /// Results come in tree order; treat them as a set.
    pub fn query_radius(
        &self,
        query: &[T; 2],
        radius: T,
        metric: DistanceMetric,
        out: &mut Vec<usize>,
    ) {
        if radius < T::zero() || radius.is_nan() {
            return;
        }
        self.search(0, self.nodes.len(), 0, query, radius, metric, out);
    }

    /// Allocating variant of [`query_radius`](Self::query_radius).
    pub fn query_radius_vec(&self, query: &[T; 2], radius: T, metric: DistanceMetric) -> Vec<usize> {
        let mut out = Vec::new();
        self.query_radius(query, radius, metric, &mut out);
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn search(
        &self,
        lo: usize,
        hi: usize,
        depth: usize,
        query: &[T; 2],
        radius: T,
        metric: DistanceMetric,
        out: &mut Vec<usize>,
    ) {
        if lo >= hi {
            return;
        }

        let mid = lo + (hi - lo) / 2;
        let node = &self.nodes[mid];
        if metric.within(query, &node.point, radius) {
            out.push(node.index);
        }

        // Left half holds values <= the split, right half values >= it.
        let axis = depth % 2;
        let diff = query[axis] - node.point[axis];
        if diff <= radius {
            self.search(lo, mid, depth + 1, query, radius, metric, out);
        }
        if diff >= -radius {
            self.search(mid + 1, hi, depth + 1, query, radius, metric, out);
        }
    }
}

#[cfg(feature = "cpu")]
impl<T: Float + Send + Sync> KdTree<T> {
    /// Build a tree over pre-labelled nodes using Rayon.
    ///
    /// Produces the same layout as [`KdTree::from_nodes`].
    pub fn from_nodes_parallel(mut nodes: Vec<KdNode<T>>) -> Self {
        build_recursive_parallel(&mut nodes, 0);
        Self { nodes }
    }

    /// Parallel variant of [`KdTree::new`].
    pub fn new_parallel(points: &[[T; 2]]) -> Self {
        Self::from_nodes_parallel(index_points(points))
    }
}

fn index_points<T: Float>(points: &[[T; 2]]) -> Vec<KdNode<T>> {
    points
        .iter()
        .enumerate()
        .map(|(index, &point)| KdNode { point, index })
        .collect()
}

/// Partition `nodes` around the median on this depth's axis and return the
/// median's position.
fn partition_median<T: Float>(nodes: &mut [KdNode<T>], depth: usize) -> usize {
    let axis = depth % 2;
    let mid = nodes.len() / 2;
    nodes.select_nth_unstable_by(mid, |a, b| {
        a.point[axis]
            .partial_cmp(&b.point[axis])
            .unwrap_or(Ordering::Equal)
    });
    mid
}

fn build_recursive_sequential<T: Float>(nodes: &mut [KdNode<T>], depth: usize) {
    if nodes.len() <= 1 {
        return;
    }

    let mid = partition_median(nodes, depth);
    let (left, right_with_mid) = nodes.split_at_mut(mid);
    let right = &mut right_with_mid[1..];

    build_recursive_sequential(left, depth + 1);
    build_recursive_sequential(right, depth + 1);
}

#[cfg(feature = "cpu")]
fn build_recursive_parallel<T: Float + Send + Sync>(nodes: &mut [KdNode<T>], depth: usize) {
    if nodes.len() <= PARALLEL_BUILD_THRESHOLD {
        build_recursive_sequential(nodes, depth);
        return;
    }

    let mid = partition_median(nodes, depth);
    let (left, right_with_mid) = nodes.split_at_mut(mid);
    let right = &mut right_with_mid[1..];

    join(
        || build_recursive_parallel(left, depth + 1),
        || build_recursive_parallel(right, depth + 1),
    );
}
