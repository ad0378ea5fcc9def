//! Input abstractions for coordinate columns.
//!
//! ## Purpose
//!
//! This module lets callers hand coordinates over as slices, vectors or
//! `ndarray` arrays and get a [`RecordTable`] ready for the engine.
//!
//! ## Design notes
//!
//! * **Zero-copy where possible**: Provides direct slice access to underlying data buffers.
//! * **Interoperability**: Bridges standard Rust collections with `ndarray`.
//! * **Fail-fast validation**: Rejects non-contiguous arrays and ragged inputs.
//!
//! ## Invariants
//!
//! * NaN coordinates become missing cells, never `0.0`.
//!
//! ## Non-goals
//!
//! * This module does not parse files or split combined "lat, lon" strings.

// Feature-gated imports
#[cfg(feature = "cpu")]
use ndarray::{ArrayBase, Data, Ix1};

use crate::api::{DEFAULT_LATITUDE_COLUMN, DEFAULT_LONGITUDE_COLUMN};
use crate::primitives::errors::MetricsError;
use crate::primitives::table::{Column, RecordTable};

/// Types that can supply one coordinate column.
pub trait CoordinateInput {
    /// Contiguous view of the values.
    fn as_coordinate_slice(&self) -> Result<&[f64], MetricsError>;
}

impl CoordinateInput for [f64] {
    fn as_coordinate_slice(&self) -> Result<&[f64], MetricsError> {
        Ok(self)
    }
}

impl CoordinateInput for Vec<f64> {
    fn as_coordinate_slice(&self) -> Result<&[f64], MetricsError> {
        Ok(self.as_slice())
    }
}

#[cfg(feature = "cpu")]
impl<S> CoordinateInput for ArrayBase<S, Ix1>
where
    S: Data<Elem = f64>,
{
    fn as_coordinate_slice(&self) -> Result<&[f64], MetricsError> {
        self.as_slice().ok_or_else(|| MetricsError::ColumnType {
            column: "coordinates".to_owned(),
            expected: "contiguous array",
            got: "strided array",
        })
    }
}

impl RecordTable {
    /// Table with `latitude` and `longitude` float columns.
    pub fn from_coordinates<A, B>(latitude: &A, longitude: &B) -> Result<Self, MetricsError>
    where
        A: CoordinateInput + ?Sized,
        B: CoordinateInput + ?Sized,
    {
        let lat = latitude.as_coordinate_slice()?;
        let lon = longitude.as_coordinate_slice()?;
        RecordTable::new()
            .with_column(DEFAULT_LATITUDE_COLUMN, Column::from(lat.to_vec()))?
            .with_column(DEFAULT_LONGITUDE_COLUMN, Column::from(lon.to_vec()))
    }
}
