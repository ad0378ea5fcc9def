//! Distance policy for neighborhood membership.
//!
//! ## Purpose
//!
//! This module fixes what it means for two observations to be neighbors.
//! Coordinates are treated as points in the projected (latitude, longitude)
//! plane, which is an acceptable approximation at country scale.
//!
//! ## Key concepts
//!
//! * **Euclidean**: circular neighborhood, `dlat² + dlon² ≤ r²`.
//! * **Chebyshev**: axis-aligned square neighborhood,
//!   `|dlat| ≤ r` and `|dlon| ≤ r`.
//!
//! ## Invariants
//!
//! * The boundary is inclusive for both policies: a point at exactly `r`
//!   is a neighbor.
//! * A point is always within any non-negative radius of itself.
//! * For both policies the per-axis difference is a lower bound on the
//!   distance, which is what lets the KD-tree prune subtrees.

use num_traits::Float;
use std::fmt;
use std::str::FromStr;

use crate::primitives::errors::MetricsError;

/// How the distance between two (lat, lon) points is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DistanceMetric {
    /// Circular neighborhood (L2).
    #[default]
    Euclidean,
    /// Square neighborhood (L∞): both coordinates within the radius.
    Chebyshev,
}

impl DistanceMetric {
    /// Whether `b` lies within `radius` of `a` (inclusive).
    #[inline]
    pub fn within<T: Float>(self, a: &[T; 2], b: &[T; 2], radius: T) -> bool {
        let d0 = a[0] - b[0];
        let d1 = a[1] - b[1];
        match self {
            DistanceMetric::Euclidean => d0 * d0 + d1 * d1 <= radius * radius,
            DistanceMetric::Chebyshev => d0.abs() <= radius && d1.abs() <= radius,
        }
    }

    /// Distance between `a` and `b` under this policy.
    #[inline]
    pub fn distance<T: Float>(self, a: &[T; 2], b: &[T; 2]) -> T {
        let d0 = (a[0] - b[0]).abs();
        let d1 = (a[1] - b[1]).abs();
        match self {
            DistanceMetric::Euclidean => d0.hypot(d1),
            DistanceMetric::Chebyshev => d0.max(d1),
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Chebyshev => "chebyshev",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "euclidean" | "l2" | "circle" | "circular" => Ok(DistanceMetric::Euclidean),
            "chebyshev" | "linf" | "square" | "axis_aligned" => Ok(DistanceMetric::Chebyshev),
            _ => Err(MetricsError::UnknownDistanceMetric(s.to_owned())),
        }
    }
}
