//! LIMIT/OFFSET and ROWNUM-style pagination.

/// A pagination bound. `open` means the bound value itself
/// is excluded, e.g. `ROWNUM > 5` vs `ROWNUM >= 5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounded {
    pub value: i64,
    pub open: bool,
}

impl Bounded {
    pub fn closed(value: i64) -> Self {
        Self { value, open: false }
    }

    pub fn open(value: i64) -> Self {
        Self { value, open: true }
    }
}

/// How the statement expressed pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LimitKind {
    /// LIMIT/OFFSET: offset counts rows to discard.
    #[default]
    Offset,
    /// Vendor pseudo-column: bounds address 1-based row numbers.
    RowNumber,
}

/// Pagination clause. A missing `row_count` (or a negative one)
/// means no limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limit {
    pub offset: Option<Bounded>,
    pub row_count: Option<Bounded>,
    pub kind: LimitKind,
}

impl Limit {
    /// Plain `LIMIT count OFFSET offset`.
    pub fn offset_count(offset: i64, row_count: i64) -> Self {
        Self {
            offset: Some(Bounded::closed(offset)),
            row_count: Some(Bounded::closed(row_count)),
            kind: LimitKind::Offset,
        }
    }

    /// Rows to discard before the first returned row.
    ///
    /// For `Offset`, the bound counts discarded rows. For
    /// `RowNumber`, it addresses a 1-based rank: `ROWNUM >= 2`
    /// (closed) keeps rank 2 and discards one row, `ROWNUM > 2`
    /// (open) discards two.
    pub fn skip(&self) -> usize {
        let Some(offset) = self.offset else {
            return 0;
        };
        match self.kind {
            // An open bound excludes the boundary row as well.
            LimitKind::Offset => (offset.value.max(0) + offset.open as i64) as usize,
            LimitKind::RowNumber => (offset.value - 1 + offset.open as i64).max(0) as usize,
        }
    }

    /// Maximum rows to return, None when unlimited.
    pub fn count(&self) -> Option<usize> {
        match self.row_count {
            Some(count) if count.value >= 0 => {
                Some((count.value - count.open as i64).max(0) as usize)
            }
            _ => None,
        }
    }
}
