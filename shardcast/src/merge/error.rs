//! Merge errors.

use thiserror::Error;

use super::cursor;

#[derive(Debug, Error)]
pub enum Error {
    /// A per-shard cursor failed while being pulled. Wrapped and
    /// rethrown immediately; the logical statement is canceled,
    /// never partially answered.
    #[error("shard {shard} result failed: {source}")]
    SourceFailed {
        shard: usize,
        #[source]
        source: cursor::Error,
    },

    /// Statement shape and merge strategy don't line up: unsorted
    /// input fed to the stream merge, or an aggregation the memory
    /// merge can't reassemble. Unreachable when strategy selection
    /// is correct.
    #[error("incompatible result shape: {reason}")]
    IncompatibleShape { reason: String },

    #[error("{0}")]
    Cursor(#[from] cursor::Error),
}

impl Error {
    pub(super) fn incompatible(reason: impl Into<String>) -> Self {
        Self::IncompatibleShape {
            reason: reason.into(),
        }
    }

    pub(super) fn source(shard: usize, source: cursor::Error) -> Self {
        Self::SourceFailed { shard, source }
    }
}
