//! Postal code allowlist filter.
//!
//! A record is kept when its postal code is a member of a reference list.
//! Codes starting with an excluded prefix (by default the overseas `97` and
//! `98` ranges) are removed from the list up front, so those records are
//! always rejected.

use rustc_hash::FxHashSet;

use crate::filters::RecordFilter;
use crate::primitives::table::RowView;

/// Default postal code column.
pub const DEFAULT_POSTAL_CODE_COLUMN: &str = "code_postal";

/// Prefixes of postal codes outside metropolitan France.
pub const OVERSEAS_PREFIXES: [&str; 2] = ["97", "98"];

/// Membership test against a set of postal codes.
#[derive(Debug, Clone)]
pub struct PostalCodeAllowlist {
    codes: FxHashSet<String>,
    column: String,
}

impl PostalCodeAllowlist {
    /// Allowlist from reference codes, minus overseas prefixes.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_excluded_prefixes(codes, &OVERSEAS_PREFIXES)
    }

    /// Allowlist from reference codes, minus any code starting with one of
    /// `excluded`.
    pub fn with_excluded_prefixes<I, S>(codes: I, excluded: &[&str]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes = codes
            .into_iter()
            .map(|c| c.as_ref().trim().to_owned())
            .filter(|c| !c.is_empty() && !excluded.iter().any(|p| c.starts_with(p)))
            .collect();
        Self {
            codes,
            column: DEFAULT_POSTAL_CODE_COLUMN.to_owned(),
        }
    }

    /// Read codes from another column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Number of allowed codes.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether no code is allowed.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Whether `code` is allowed.
    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code.trim())
    }
}

impl RecordFilter for PostalCodeAllowlist {
    fn accept(&self, row: RowView<'_>) -> bool {
        row.key(&self.column)
            .is_some_and(|code| self.codes.contains(code.as_ref()))
    }
}
