//! Row-number decorator, for dialects that paginate through a
//! 1-based pseudo-column instead of LIMIT/OFFSET.

use super::super::{Error, MergedResult};
use crate::statement::Limit;
use crate::value::Datum;

/// Same skip/limit mechanics as the LIMIT decorator, but the
/// bounds address synthetic 1-based row numbers: a closed
/// offset bound is the first rank to return (`ROWNUM >= 2`
/// keeps rank 2), an open one starts past it, and the
/// row-count bound is the last rank to return, subject to its
/// own open/closed flag.
pub struct RowNumberMergedResult {
    inner: Box<dyn MergedResult>,
    skip_all: bool,
    rank: i64,
    last_rank: Option<i64>,
}

impl RowNumberMergedResult {
    pub fn new(mut inner: Box<dyn MergedResult>, limit: &Limit) -> Result<Self, Error> {
        let skip = limit.skip();
        let mut skip_all = false;
        for _ in 0..skip {
            if !inner.advance()? {
                skip_all = true;
                break;
            }
        }

        let last_rank = match limit.row_count {
            Some(bound) if bound.value >= 0 => Some(bound.value - bound.open as i64),
            _ => None,
        };

        Ok(Self {
            inner,
            skip_all,
            rank: skip as i64,
            last_rank,
        })
    }
}

impl MergedResult for RowNumberMergedResult {
    fn advance(&mut self) -> Result<bool, Error> {
        if self.skip_all {
            return Ok(false);
        }
        if let Some(last) = self.last_rank {
            if self.rank >= last {
                return Ok(false);
            }
        }
        let advanced = self.inner.advance()?;
        if advanced {
            self.rank += 1;
        }
        Ok(advanced)
    }

    fn value(&self, column: usize) -> Result<&Datum, Error> {
        self.inner.value(column)
    }
}
