//! Per-shard result cursors.

use thiserror::Error;

use crate::value::Datum;

#[derive(Debug, Error)]
pub enum Error {
    /// The shard's backend reported an error mid-stream.
    #[error("backend error: {0}")]
    Backend(String),

    #[error("column {0} out of bounds")]
    ColumnOutOfBounds(usize),

    /// Value access before the first `advance()`, or after
    /// exhaustion.
    #[error("no current row")]
    NoCurrentRow,
}

/// A forward-only result cursor from one shard.
///
/// The merge engine never rewinds one of these and never knows
/// the row count ahead of time. A cursor that blocks on first
/// `advance()` is fine; each shard's cursor is pulled
/// independently. NULL columns read as [`Datum::Null`].
pub trait QueryResult {
    /// Move to the next row. `false` means exhausted.
    fn advance(&mut self) -> Result<bool, Error>;

    /// Value at a projection index of the current row.
    fn value(&self, column: usize) -> Result<&Datum, Error>;

    /// Projection width.
    fn columns(&self) -> usize;
}

/// Clone the cursor's current row.
pub(super) fn fetch_row(result: &dyn QueryResult) -> Result<Vec<Datum>, Error> {
    (0..result.columns())
        .map(|column| result.value(column).cloned())
        .collect()
}

/// In-memory cursor over materialized rows. The memory merge
/// exposes its output through one of these; tests use it as a
/// shard fixture.
#[derive(Debug, Clone, Default)]
pub struct Rows {
    rows: Vec<Vec<Datum>>,
    columns: usize,
    current: Option<usize>,
}

impl Rows {
    pub fn new(rows: Vec<Vec<Datum>>) -> Self {
        let columns = rows.first().map(|row| row.len()).unwrap_or(0);
        Self {
            rows,
            columns,
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl QueryResult for Rows {
    fn advance(&mut self) -> Result<bool, Error> {
        let next = match self.current {
            Some(current) => current + 1,
            None => 0,
        };
        if next < self.rows.len() {
            self.current = Some(next);
            Ok(true)
        } else {
            self.current = Some(self.rows.len());
            Ok(false)
        }
    }

    fn value(&self, column: usize) -> Result<&Datum, Error> {
        let row = self
            .current
            .and_then(|current| self.rows.get(current))
            .ok_or(Error::NoCurrentRow)?;
        row.get(column).ok_or(Error::ColumnOutOfBounds(column))
    }

    fn columns(&self) -> usize {
        self.columns
    }
}
