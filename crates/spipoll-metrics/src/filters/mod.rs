//! Record filters applied before metric computation.
//!
//! ## Purpose
//!
//! This module restricts a table to the records that belong to the study
//! area before the neighborhood pass runs. Filters look at one row at a
//! time through [`RowView`] and either accept or reject it.
//!
//! ## Design notes
//!
//! * **Composable**: Every filter implements [`RecordFilter`]; [`AllOf`]
//!   chains them.
//! * **Per-site decisions**: [`retain_sites`] judges each site by its first
//!   record and keeps or drops all of that site's records together, so a
//!   collection is never split across the boundary.
//!
//! ## Invariants
//!
//! * Filtering preserves the relative order of the kept rows.
//! * Rows with a missing site id are judged individually by [`retain_sites`].
//!
//! ## Non-goals
//!
//! * This module does not geocode addresses or look up postal codes.

pub mod postal;
pub mod region;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::primitives::table::{RecordTable, RowView};

/// Row-level accept/reject predicate.
pub trait RecordFilter {
    /// Whether the row is kept.
    fn accept(&self, row: RowView<'_>) -> bool;
}

impl<F: RecordFilter + ?Sized> RecordFilter for &F {
    fn accept(&self, row: RowView<'_>) -> bool {
        (**self).accept(row)
    }
}

impl<F: RecordFilter + ?Sized> RecordFilter for Box<F> {
    fn accept(&self, row: RowView<'_>) -> bool {
        (**self).accept(row)
    }
}

/// Accepts a row only if every inner filter does.
#[derive(Default)]
pub struct AllOf {
    filters: Vec<Box<dyn RecordFilter + Send + Sync>>,
}

impl AllOf {
    /// Empty conjunction; accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter.
    pub fn with<F>(mut self, filter: F) -> Self
    where
        F: RecordFilter + Send + Sync + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// Number of inner filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether there are no inner filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl std::fmt::Debug for AllOf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllOf")
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl RecordFilter for AllOf {
    fn accept(&self, row: RowView<'_>) -> bool {
        self.filters.iter().all(|f| f.accept(row))
    }
}

/// Rows of `table` accepted by `filter`, in input order.
pub fn filter_rows<F: RecordFilter + ?Sized>(table: &RecordTable, filter: &F) -> RecordTable {
    let kept: Vec<usize> = table
        .rows()
        .filter(|row| filter.accept(*row))
        .map(|row| row.index())
        .collect();
    debug!(
        kept = kept.len(),
        dropped = table.n_rows() - kept.len(),
        "record filter applied"
    );
    table.take(&kept)
}

/// Keep or drop whole sites.
///
/// The first record of each site (by row order) decides for the site. A
/// missing `site_column` means every row is its own site.
pub fn retain_sites<F: RecordFilter + ?Sized>(
    table: &RecordTable,
    filter: &F,
    site_column: &str,
) -> RecordTable {
    let mut decisions: FxHashMap<String, bool> = FxHashMap::default();
    let mut kept = Vec::new();

    for row in table.rows() {
        let keep = match row.key(site_column) {
            Some(site) => match decisions.get(site.as_ref()) {
                Some(&decision) => decision,
                None => {
                    let decision = filter.accept(row);
                    decisions.insert(site.into_owned(), decision);
                    decision
                }
            },
            None => filter.accept(row),
        };
        if keep {
            kept.push(row.index());
        }
    }

    debug!(
        sites = decisions.len(),
        sites_kept = decisions.values().filter(|&&d| d).count(),
        rows_kept = kept.len(),
        "site filter applied"
    );
    table.take(&kept)
}
