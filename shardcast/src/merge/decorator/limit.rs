//! LIMIT/OFFSET decorator.

use tracing::trace;

use super::super::{Error, MergedResult};
use crate::statement::Limit;
use crate::value::Datum;

/// Skips `offset` rows eagerly on construction, then lets at
/// most `row_count` rows through. When the inner result runs
/// out during the skip, every later `advance()` is false
/// ("skip-all").
pub struct LimitMergedResult {
    inner: Box<dyn MergedResult>,
    skip_all: bool,
    remaining: Option<usize>,
}

impl LimitMergedResult {
    pub fn new(mut inner: Box<dyn MergedResult>, limit: &Limit) -> Result<Self, Error> {
        let mut skip_all = false;
        for skipped in 0..limit.skip() {
            if !inner.advance()? {
                trace!(skipped, "offset past the end of the result");
                skip_all = true;
                break;
            }
        }

        Ok(Self {
            inner,
            skip_all,
            remaining: limit.count(),
        })
    }
}

impl MergedResult for LimitMergedResult {
    fn advance(&mut self) -> Result<bool, Error> {
        if self.skip_all || self.remaining == Some(0) {
            return Ok(false);
        }
        let advanced = self.inner.advance()?;
        if advanced {
            if let Some(remaining) = &mut self.remaining {
                *remaining -= 1;
            }
        }
        Ok(advanced)
    }

    fn value(&self, column: usize) -> Result<&Datum, Error> {
        self.inner.value(column)
    }
}
