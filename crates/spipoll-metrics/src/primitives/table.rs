//! Columnar record table.
//!
//! ## Purpose
//!
//! This module provides the in-memory table the engine reads observations
//! from and appends metric columns to. It is a small named-column store:
//! every column has the same number of rows and a missing cell is `None`.
//!
//! ## Design notes
//!
//! * **Column order is preserved**: appended columns land after existing ones.
//! * **Replace on insert**: [`RecordTable::insert_column`] overwrites a column
//!   with the same name, so recomputing metrics on an augmented table yields
//!   the same table again.
//! * **Factorization**: categorical columns (species, site) are mapped to
//!   dense integer codes once, so distinct counts never hash strings inside
//!   the per-record loop.
//!
//! ## Invariants
//!
//! * All columns have exactly `n_rows` cells.
//! * Column names are unique.
//! * Text cells that are empty or whitespace-only are missing for
//!   factorization purposes.

use rustc_hash::FxHashMap;
use std::borrow::Cow;

use crate::primitives::errors::MetricsError;

// ============================================================================
// Column
// ============================================================================

/// A single typed column. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Floating point values (coordinates, metric outputs).
    Float(Vec<Option<f64>>),
    /// Integer values (site ids, postal codes).
    Int(Vec<Option<i64>>),
    /// Text values (species labels, postal codes).
    Text(Vec<Option<String>>),
}

impl Column {
    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    /// Whether the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Column::Float(_) => "float",
            Column::Int(_) => "int",
            Column::Text(_) => "text",
        }
    }

    /// Borrow as a float column.
    pub fn as_float(&self) -> Option<&[Option<f64>]> {
        match self {
            Column::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as an integer column.
    pub fn as_int(&self) -> Option<&[Option<i64>]> {
        match self {
            Column::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as a text column.
    pub fn as_text(&self) -> Option<&[Option<String>]> {
        match self {
            Column::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Whether the cell at `row` is missing.
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Float(v) => v[row].map_or(true, f64::is_nan),
            Column::Int(v) => v[row].is_none(),
            Column::Text(v) => v[row].as_deref().map_or(true, is_blank),
        }
    }

    fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Float(v) => Column::Float(rows.iter().map(|&r| v[r]).collect()),
            Column::Int(v) => Column::Int(rows.iter().map(|&r| v[r]).collect()),
            Column::Text(v) => Column::Text(rows.iter().map(|&r| v[r].clone()).collect()),
        }
    }

    /// Map each non-missing cell to a dense code in `0..cardinality`.
    ///
    /// Equal values share a code. Codes are assigned in order of first
    /// appearance, so they depend on row order; counts of distinct codes
    /// do not.
    pub fn factorize(&self) -> Factorized {
        match self {
            Column::Text(v) => factorize_by(v.iter().map(|c| {
                c.as_deref()
                    .filter(|s| !is_blank(s))
                    .map(str::trim)
            })),
            Column::Int(v) => factorize_by(v.iter().copied()),
            Column::Float(v) => factorize_by(
                v.iter()
                    .map(|c| c.filter(|x| !x.is_nan()).map(canonical_bits)),
            ),
        }
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

// -0.0 and 0.0 must share a code.
fn canonical_bits(x: f64) -> u64 {
    if x == 0.0 {
        0
    } else {
        x.to_bits()
    }
}

fn factorize_by<K, I>(values: I) -> Factorized
where
    K: std::hash::Hash + Eq,
    I: Iterator<Item = Option<K>>,
{
    let mut lookup: FxHashMap<K, u32> = FxHashMap::default();
    let codes = values
        .map(|value| {
            value.map(|key| {
                let next = lookup.len() as u32;
                *lookup.entry(key).or_insert(next)
            })
        })
        .collect();
    Factorized {
        codes,
        cardinality: lookup.len(),
    }
}

/// Dense integer encoding of a categorical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Factorized {
    /// One code per row, `None` for missing cells.
    pub codes: Vec<Option<u32>>,
    /// Number of distinct non-missing values.
    pub cardinality: usize,
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Column::Float(
            values
                .into_iter()
                .map(|x| if x.is_nan() { None } else { Some(x) })
                .collect(),
        )
    }
}

impl From<Vec<Option<f64>>> for Column {
    fn from(values: Vec<Option<f64>>) -> Self {
        Column::Float(values)
    }
}

impl From<Vec<i64>> for Column {
    fn from(values: Vec<i64>) -> Self {
        Column::Int(values.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<i64>>> for Column {
    fn from(values: Vec<Option<i64>>) -> Self {
        Column::Int(values)
    }
}

impl From<Vec<String>> for Column {
    fn from(values: Vec<String>) -> Self {
        Column::Text(values.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<String>>> for Column {
    fn from(values: Vec<Option<String>>) -> Self {
        Column::Text(values)
    }
}

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Column::Text(values.into_iter().map(|s| Some(s.to_owned())).collect())
    }
}

impl From<Vec<Option<&str>>> for Column {
    fn from(values: Vec<Option<&str>>) -> Self {
        Column::Text(values.into_iter().map(|s| s.map(str::to_owned)).collect())
    }
}

/// One loosely typed cell, as found in dataframe object columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Label {
    /// Integer label
    Int(i64),
    /// Float label; NaN marks a missing cell
    Float(f64),
    /// Text label
    Text(String),
}

/// Narrowest column that holds every label: text if any cell is text, float
/// if any cell is a float, integer otherwise. NaN becomes a missing cell.
impl From<Vec<Option<Label>>> for Column {
    fn from(values: Vec<Option<Label>>) -> Self {
        let values: Vec<Option<Label>> = values
            .into_iter()
            .map(|v| v.filter(|l| !matches!(l, Label::Float(x) if x.is_nan())))
            .collect();
        let any_text = values.iter().flatten().any(|l| matches!(l, Label::Text(_)));
        let any_float = values.iter().flatten().any(|l| matches!(l, Label::Float(_)));

        if any_text {
            Column::Text(
                values
                    .into_iter()
                    .map(|v| {
                        v.map(|l| match l {
                            Label::Int(i) => i.to_string(),
                            Label::Float(x) => x.to_string(),
                            Label::Text(s) => s,
                        })
                    })
                    .collect(),
            )
        } else if any_float {
            Column::Float(
                values
                    .into_iter()
                    .map(|v| {
                        v.map(|l| match l {
                            Label::Int(i) => i as f64,
                            Label::Float(x) => x,
                            Label::Text(_) => f64::NAN,
                        })
                    })
                    .collect(),
            )
        } else {
            Column::Int(
                values
                    .into_iter()
                    .map(|v| v.and_then(|l| if let Label::Int(i) = l { Some(i) } else { None }))
                    .collect(),
            )
        }
    }
}

// ============================================================================
// RecordTable
// ============================================================================

/// Named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    n_rows: usize,
    names: Vec<String>,
    columns: Vec<Column>,
}

impl RecordTable {
    /// Create an empty table with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, builder style. Fails on a duplicate name or a length
    /// mismatch.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        column: impl Into<Column>,
    ) -> Result<Self, MetricsError> {
        let name = name.into();
        if self.position(&name).is_some() {
            return Err(MetricsError::DuplicateColumn(name));
        }
        self.insert_column(name, column)?;
        Ok(self)
    }

    /// Insert a column, replacing any column with the same name in place.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        column: impl Into<Column>,
    ) -> Result<(), MetricsError> {
        let name = name.into();
        let column = column.into();

        if self.columns.is_empty() {
            self.n_rows = column.len();
        } else if column.len() != self.n_rows {
            return Err(MetricsError::MismatchedColumnLength {
                column: name,
                expected: self.n_rows,
                got: column.len(),
            });
        }

        match self.position(&name) {
            Some(pos) => self.columns[pos] = column,
            None => {
                self.names.push(name);
                self.columns.push(column);
            }
        }
        Ok(())
    }

    /// Remove a column and return it.
    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let pos = self.position(name)?;
        self.names.remove(pos);
        let column = self.columns.remove(pos);
        if self.columns.is_empty() {
            self.n_rows = 0;
        }
        Some(column)
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Column names in table order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Whether a column named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Look up a column by name.
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|pos| &self.columns[pos])
    }

    /// Look up a column by name, failing with [`MetricsError::MissingColumn`].
    pub fn column(&self, name: &str) -> Result<&Column, MetricsError> {
        self.get(name)
            .ok_or_else(|| MetricsError::MissingColumn(name.to_owned()))
    }

    /// Look up a float column by name.
    pub fn float_column(&self, name: &str) -> Result<&[Option<f64>], MetricsError> {
        let column = self.column(name)?;
        column.as_float().ok_or_else(|| MetricsError::ColumnType {
            column: name.to_owned(),
            expected: "float",
            got: column.kind(),
        })
    }

    /// Build a new table from the given rows, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if any index is `>= n_rows`.
    pub fn take(&self, rows: &[usize]) -> RecordTable {
        RecordTable {
            n_rows: if self.columns.is_empty() { 0 } else { rows.len() },
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
        }
    }

    /// Borrow a single row.
    ///
    /// # Panics
    ///
    /// Panics if `row >= n_rows`.
    pub fn row(&self, row: usize) -> RowView<'_> {
        assert!(row < self.n_rows, "row {row} out of bounds ({})", self.n_rows);
        RowView { table: self, row }
    }

    /// Iterate over all rows.
    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> {
        (0..self.n_rows).map(move |row| RowView { table: self, row })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

// ============================================================================
// RowView
// ============================================================================

/// Borrowed view of one row, used by record filters.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a RecordTable,
    row: usize,
}

impl<'a> RowView<'a> {
    /// Row index in the owning table.
    pub fn index(&self) -> usize {
        self.row
    }

    /// Float cell; integer cells are widened. `None` if missing, NaN or absent.
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.table.get(name)? {
            Column::Float(v) => v[self.row].filter(|x| !x.is_nan()),
            Column::Int(v) => v[self.row].map(|x| x as f64),
            Column::Text(_) => None,
        }
    }

    /// Integer cell. `None` if missing, absent or not an integer column.
    pub fn int(&self, name: &str) -> Option<i64> {
        self.table.get(name)?.as_int()?[self.row]
    }

    /// Text cell. `None` if missing, absent or not a text column.
    pub fn text(&self, name: &str) -> Option<&'a str> {
        self.table.get(name)?.as_text()?[self.row].as_deref()
    }

    /// Cell rendered as a string key: text as-is (trimmed), integers in
    /// decimal. Used for identifier-like columns stored either way.
    pub fn key(&self, name: &str) -> Option<Cow<'a, str>> {
        match self.table.get(name)? {
            Column::Text(v) => v[self.row]
                .as_deref()
                .filter(|s| !is_blank(s))
                .map(|s| Cow::Borrowed(s.trim())),
            Column::Int(v) => v[self.row].map(|x| Cow::Owned(x.to_string())),
            Column::Float(_) => None,
        }
    }
}
