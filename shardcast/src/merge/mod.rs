//! Result merging.
//!
//! Reassembles per-shard result cursors into one logical cursor.
//! Strategy is a pure function of statement shape, picked once:
//! iterator for plain concatenation, stream for ORDER BY over
//! pre-sorted shards, memory for anything that has to buffer.
//! Pagination decorators wrap the chosen strategy.

pub mod comparator;
pub mod cursor;
pub mod decorator;
pub mod error;
pub mod iterator;
pub mod memory;
pub mod stream;

pub use cursor::{QueryResult, Rows};
pub use decorator::{LimitMergedResult, RowNumberMergedResult};
pub use error::Error;
pub use iterator::IteratorMergedResult;
pub use memory::MemoryMergedResult;
pub use stream::StreamMergedResult;

use tracing::debug;

use crate::statement::{LimitKind, Statement};
use crate::value::Datum;

/// The unified logical cursor. Same shape as [`QueryResult`],
/// driven by one logical thread of control at a time; dropping
/// it is cancellation.
pub trait MergedResult {
    /// Move to the next logical row. `false` means exhausted.
    fn advance(&mut self) -> Result<bool, Error>;

    /// Value at a projection index of the current row.
    fn value(&self, column: usize) -> Result<&Datum, Error>;
}

/// Strategy selection and decorator chaining.
pub struct MergeEngine;

impl MergeEngine {
    /// Merge one cursor per route unit, in route-unit order.
    pub fn merge(
        results: Vec<Box<dyn QueryResult>>,
        statement: &Statement,
    ) -> Result<Box<dyn MergedResult>, Error> {
        let mut merged: Box<dyn MergedResult> = if statement.needs_memory_merge() {
            debug!("memory merge");
            Box::new(MemoryMergedResult::new(results, statement)?)
        } else if !statement.order_by().is_empty() {
            debug!("stream merge");
            Box::new(StreamMergedResult::new(
                results,
                statement.order_by().into(),
            )?)
        } else {
            debug!("iterator merge");
            Box::new(IteratorMergedResult::new(results))
        };

        if let Some(limit) = statement.limit() {
            merged = match limit.kind {
                LimitKind::Offset => Box::new(LimitMergedResult::new(merged, limit)?),
                LimitKind::RowNumber => Box::new(RowNumberMergedResult::new(merged, limit)?),
            };
        }

        Ok(merged)
    }
}
