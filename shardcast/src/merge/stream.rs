//! Stream merge: interleave pre-sorted shard cursors with a
//! min-heap, one buffered row per shard. Memory stays O(shards)
//! no matter how many rows flow through.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use super::comparator::compare_rows;
use super::cursor::{fetch_row, QueryResult};
use super::{Error, MergedResult};
use crate::statement::OrderBy;
use crate::value::Datum;

/// One shard's buffered head row.
struct Entry {
    row: Vec<Datum>,
    shard: usize,
    order_by: Arc<[OrderBy]>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse for min-first. Shard
        // index breaks exact ties so interleaving is stable.
        compare_rows(&self.row, &other.row, &self.order_by)
            .then(self.shard.cmp(&other.shard))
            .reverse()
    }
}

pub struct StreamMergedResult {
    results: Vec<Box<dyn QueryResult>>,
    heap: BinaryHeap<Entry>,
    current: Option<Vec<Datum>>,
    order_by: Arc<[OrderBy]>,
}

impl StreamMergedResult {
    pub fn new(
        results: Vec<Box<dyn QueryResult>>,
        order_by: Arc<[OrderBy]>,
    ) -> Result<Self, Error> {
        let mut merged = Self {
            results,
            heap: BinaryHeap::new(),
            current: None,
            order_by,
        };

        for shard in 0..merged.results.len() {
            merged.buffer(shard)?;
        }

        Ok(merged)
    }

    /// Pull the next row from a shard's cursor into the heap.
    fn buffer(&mut self, shard: usize) -> Result<(), Error> {
        let result = &mut self.results[shard];
        let advanced = result
            .advance()
            .map_err(|source| Error::source(shard, source))?;
        if !advanced {
            return Ok(());
        }

        let row = fetch_row(result.as_ref()).map_err(|source| Error::source(shard, source))?;
        self.heap.push(Entry {
            row,
            shard,
            order_by: self.order_by.clone(),
        });
        Ok(())
    }
}

impl MergedResult for StreamMergedResult {
    fn advance(&mut self) -> Result<bool, Error> {
        let entry = match self.heap.pop() {
            Some(entry) => entry,
            None => {
                self.current = None;
                return Ok(false);
            }
        };

        let shard = entry.shard;
        self.current = Some(entry.row);
        self.buffer(shard)?;

        // The shard promised sorted output; its new head must
        // not sort before the row we just took from it.
        if let (Some(current), Some(head)) = (&self.current, self.heap.peek()) {
            if head.shard == shard
                && compare_rows(&head.row, current, &self.order_by) == Ordering::Less
            {
                return Err(Error::incompatible(format!(
                    "shard {shard} result is not sorted"
                )));
            }
        }

        Ok(true)
    }

    fn value(&self, column: usize) -> Result<&Datum, Error> {
        let row = self
            .current
            .as_ref()
            .ok_or(super::cursor::Error::NoCurrentRow)?;
        Ok(row
            .get(column)
            .ok_or(super::cursor::Error::ColumnOutOfBounds(column))?)
    }
}
