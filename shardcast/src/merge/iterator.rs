//! Iterator merge: concatenate shard cursors in route-unit
//! order. O(1) memory beyond the active cursor.

use super::cursor::QueryResult;
use super::{Error, MergedResult};
use crate::value::Datum;

pub struct IteratorMergedResult {
    results: Vec<Box<dyn QueryResult>>,
    current: usize,
}

impl IteratorMergedResult {
    pub fn new(results: Vec<Box<dyn QueryResult>>) -> Self {
        Self {
            results,
            current: 0,
        }
    }
}

impl MergedResult for IteratorMergedResult {
    fn advance(&mut self) -> Result<bool, Error> {
        while let Some(result) = self.results.get_mut(self.current) {
            let advanced = result
                .advance()
                .map_err(|source| Error::source(self.current, source))?;
            if advanced {
                return Ok(true);
            }
            // Exhausted; move to the next shard.
            self.current += 1;
        }
        Ok(false)
    }

    fn value(&self, column: usize) -> Result<&Datum, Error> {
        let result = self
            .results
            .get(self.current)
            .ok_or(super::cursor::Error::NoCurrentRow)?;
        result
            .value(column)
            .map_err(|source| Error::source(self.current, source))
    }
}
