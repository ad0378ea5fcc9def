//! Geographic region filters over latitude/longitude columns.

use std::borrow::Cow;

use crate::api::{DEFAULT_LATITUDE_COLUMN, DEFAULT_LONGITUDE_COLUMN};
use crate::filters::RecordFilter;
use crate::primitives::errors::MetricsError;
use crate::primitives::table::RowView;

// ============================================================================
// BoundingBox
// ============================================================================

/// Open latitude/longitude rectangle. Points on the edge are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    latitude: (f64, f64),
    longitude: (f64, f64),
    latitude_column: Cow<'static, str>,
    longitude_column: Cow<'static, str>,
}

impl BoundingBox {
    /// Metropolitan France, Corsica included.
    pub const METROPOLITAN_FRANCE: BoundingBox = BoundingBox {
        latitude: (42.19, 51.065),
        longitude: (-5.15, 9.325),
        latitude_column: Cow::Borrowed(DEFAULT_LATITUDE_COLUMN),
        longitude_column: Cow::Borrowed(DEFAULT_LONGITUDE_COLUMN),
    };

    /// Box from `(min, max)` latitude and longitude bounds.
    pub fn new(latitude: (f64, f64), longitude: (f64, f64)) -> Result<Self, MetricsError> {
        for (axis, (lo, hi)) in [("latitude", latitude), ("longitude", longitude)] {
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(MetricsError::InvalidRegion(format!(
                    "{axis} bounds ({lo}, {hi}) are not an increasing finite pair"
                )));
            }
        }
        Ok(Self {
            latitude,
            longitude,
            latitude_column: Cow::Borrowed(DEFAULT_LATITUDE_COLUMN),
            longitude_column: Cow::Borrowed(DEFAULT_LONGITUDE_COLUMN),
        })
    }

    /// Read coordinates from other columns.
    pub fn with_columns(
        mut self,
        latitude: impl Into<Cow<'static, str>>,
        longitude: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.latitude_column = latitude.into();
        self.longitude_column = longitude.into();
        self
    }

    /// Whether `(lat, lon)` lies strictly inside.
    #[inline]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.latitude.0 < lat
            && lat < self.latitude.1
            && self.longitude.0 < lon
            && lon < self.longitude.1
    }
}

impl RecordFilter for BoundingBox {
    fn accept(&self, row: RowView<'_>) -> bool {
        match (row.float(&self.latitude_column), row.float(&self.longitude_column)) {
            (Some(lat), Some(lon)) => self.contains(lat, lon),
            _ => false,
        }
    }
}

// ============================================================================
// Polygon
// ============================================================================

/// Simple polygon over `[lat, lon]` vertices, tested by ray casting.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<[f64; 2]>,
    bounds: ([f64; 2], [f64; 2]),
    latitude_column: Cow<'static, str>,
    longitude_column: Cow<'static, str>,
}

impl Polygon {
    /// Polygon from at least three finite vertices. The ring closes implicitly.
    pub fn new(vertices: Vec<[f64; 2]>) -> Result<Self, MetricsError> {
        if vertices.len() < 3 {
            return Err(MetricsError::InvalidRegion(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if vertices.iter().flatten().any(|c| !c.is_finite()) {
            return Err(MetricsError::InvalidRegion(
                "polygon vertices must be finite".to_owned(),
            ));
        }

        let mut min = vertices[0];
        let mut max = vertices[0];
        for v in &vertices[1..] {
            for d in 0..2 {
                min[d] = min[d].min(v[d]);
                max[d] = max[d].max(v[d]);
            }
        }

        Ok(Self {
            vertices,
            bounds: (min, max),
            latitude_column: Cow::Borrowed(DEFAULT_LATITUDE_COLUMN),
            longitude_column: Cow::Borrowed(DEFAULT_LONGITUDE_COLUMN),
        })
    }

    /// Read coordinates from other columns.
    pub fn with_columns(
        mut self,
        latitude: impl Into<Cow<'static, str>>,
        longitude: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.latitude_column = latitude.into();
        self.longitude_column = longitude.into();
        self
    }

    /// Vertices as given.
    pub fn vertices(&self) -> &[[f64; 2]] {
        &self.vertices
    }

    /// Whether `(lat, lon)` lies inside. Boundary points may fall either way.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        let (min, max) = self.bounds;
        if lat < min[0] || lat > max[0] || lon < min[1] || lon > max[1] {
            return false;
        }

        let mut inside = false;
        let mut j = self.vertices.len() - 1;
        for i in 0..self.vertices.len() {
            let [yi, xi] = self.vertices[i];
            let [yj, xj] = self.vertices[j];
            if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

impl RecordFilter for Polygon {
    fn accept(&self, row: RowView<'_>) -> bool {
        match (row.float(&self.latitude_column), row.float(&self.longitude_column)) {
            (Some(lat), Some(lon)) => self.contains(lat, lon),
            _ => false,
        }
    }
}
