//! Loading a delimiter-separated table into memory.
//!
//! Deliberately thin: field typing, quoting edge cases and the like are the
//! `csv` crate's job, not ours. A table is just rows of raw string cells,
//! compared as raw strings with no type inference, per the data model.

use color_eyre::eyre::{bail, Context, Result};
use std::path::Path;

/// An in-memory relational table: `n_rows` rows over `n_attrs` attributes,
/// loaded once and never mutated.
#[derive(Debug, Clone)]
pub struct Table {
    rows: Vec<Vec<String>>,
    n_attrs: usize,
}

impl Table {
    /// Reads a delimiter-separated file with no header row. Every row must
    /// have the same number of fields; a ragged row is a fatal error.
    pub fn from_path<P: AsRef<Path>>(path: P, separator: u8) -> Result<Self> {
        let path = path.as_ref();
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(separator)
            .has_headers(false)
            .flexible(false)
            .from_path(path)
            .with_context(|| format!("could not open input table at {}", path.display()))?;

        let mut rows = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record
                .with_context(|| format!("malformed row {i} in {}", path.display()))?;
            rows.push(record.iter().map(str::to_owned).collect::<Vec<_>>());
        }

        Self::from_rows(rows)
    }

    /// Builds a table directly from already-split rows (used by tests and by
    /// anything that already has in-memory data rather than a file).
    pub fn from_rows(rows: Vec<Vec<String>>) -> Result<Self> {
        if rows.is_empty() {
            bail!("input table has no rows");
        }
        let n_attrs = rows[0].len();
        if n_attrs == 0 {
            bail!("input table has no attributes");
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_attrs {
                bail!(
                    "row {i} has {} fields, expected {n_attrs} (ragged table)",
                    row.len()
                );
            }
        }
        Ok(Table { rows, n_attrs })
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_attrs(&self) -> usize {
        self.n_attrs
    }

    /// The value of attribute `att` in row `r`.
    pub fn cell(&self, r: usize, att: usize) -> &str {
        &self.rows[r][att]
    }

    /// Attribute `att` as a column of values, row-id order.
    pub fn column(&self, att: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[att].as_str())
    }
}
