//! Metric vocabulary.
//!
//! ## Key concepts
//!
//! * **Metric**: One of the four recognized neighborhood statistics, each
//!   with a fixed output column name.
//! * **MetricSelection**: A set of metrics. Weighted richness depends on
//!   richness and site density, so a selection can be expanded to the set
//!   that actually has to be computed.
//! * **MetricSet**: The values computed for one record.

use std::fmt;
use std::str::FromStr;

use crate::primitives::errors::MetricsError;

/// A neighborhood statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    /// Distinct non-missing species in the neighborhood.
    SpecificRichness,
    /// Number of observations in the neighborhood.
    Density,
    /// Distinct site (collection) ids in the neighborhood.
    CollectionIdDensity,
    /// `specific_richness / collection_id_density`.
    WeightedSpecificRichness,
}

impl Metric {
    /// All metrics in output column order.
    pub const ALL: [Metric; 4] = [
        Metric::SpecificRichness,
        Metric::Density,
        Metric::CollectionIdDensity,
        Metric::WeightedSpecificRichness,
    ];

    /// Name of the output column.
    pub fn column_name(self) -> &'static str {
        match self {
            Metric::SpecificRichness => "specific_richness",
            Metric::Density => "density",
            Metric::CollectionIdDensity => "collection_id_density",
            Metric::WeightedSpecificRichness => "weighted_specific_richness",
        }
    }

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }

    #[inline]
    fn bit(self) -> u8 {
        1 << self.slot()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Metric {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "specific_richness" | "richness" => Ok(Metric::SpecificRichness),
            "density" => Ok(Metric::Density),
            "collection_id_density" | "site_density" => Ok(Metric::CollectionIdDensity),
            "weighted_specific_richness" | "weighted_richness" => {
                Ok(Metric::WeightedSpecificRichness)
            }
            _ => Err(MetricsError::UnknownMetric(s.to_owned())),
        }
    }
}

// ============================================================================
// MetricSelection
// ============================================================================

/// A set of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MetricSelection(u8);

impl MetricSelection {
    /// The empty selection.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every metric.
    pub fn all() -> Self {
        Self::from_metrics(&Metric::ALL)
    }

    /// Selection containing exactly `metrics` (duplicates ignored).
    pub fn from_metrics(metrics: &[Metric]) -> Self {
        Self(metrics.iter().fold(0, |acc, m| acc | m.bit()))
    }

    /// Parse metric names, failing on the first unknown name.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, MetricsError> {
        names.iter().map(|n| n.as_ref().parse::<Metric>()).collect()
    }

    /// Whether `metric` is in the selection.
    #[inline]
    pub fn contains(self, metric: Metric) -> bool {
        self.0 & metric.bit() != 0
    }

    /// Add `metric` to the selection.
    pub fn insert(&mut self, metric: Metric) {
        self.0 |= metric.bit();
    }

    /// Whether the selection is empty.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of metrics selected.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Union of two selections.
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Selected metrics in output column order.
    pub fn iter(self) -> impl Iterator<Item = Metric> {
        Metric::ALL.into_iter().filter(move |m| self.contains(*m))
    }

    /// The selection plus every metric it depends on.
    pub fn with_dependencies(self) -> Self {
        if self.contains(Metric::WeightedSpecificRichness) {
            self.union(Self::from_metrics(&[
                Metric::SpecificRichness,
                Metric::CollectionIdDensity,
            ]))
        } else {
            self
        }
    }

    /// Whether computing this selection needs the species column.
    pub fn needs_species(self) -> bool {
        self.with_dependencies().contains(Metric::SpecificRichness)
    }

    /// Whether computing this selection needs the site column.
    pub fn needs_sites(self) -> bool {
        self.with_dependencies().contains(Metric::CollectionIdDensity)
    }
}

impl FromIterator<Metric> for MetricSelection {
    fn from_iter<I: IntoIterator<Item = Metric>>(iter: I) -> Self {
        let mut selection = Self::empty();
        for metric in iter {
            selection.insert(metric);
        }
        selection
    }
}

// ============================================================================
// MetricSet
// ============================================================================

/// Metric values for one record. Unset metrics were not computed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricSet {
    values: [Option<f64>; 4],
}

impl MetricSet {
    /// Value of `metric`, if it was computed.
    #[inline]
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values[metric.slot()]
    }

    /// Record the value of `metric`.
    #[inline]
    pub fn set(&mut self, metric: Metric, value: f64) {
        self.values[metric.slot()] = Some(value);
    }

    /// Computed metrics and their values, in output column order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL
            .into_iter()
            .filter_map(move |m| self.get(m).map(|v| (m, v)))
    }
}
