//! Routing and merging core of a database sharding middleware.
//!
//! Takes a bound SQL statement plus its parameters, decides which
//! physical shards it must execute on ([`router`]), and reassembles
//! the per-shard result cursors into one logical cursor ([`merge`]).
//!
//! SQL parsing, query rewriting and shard execution live outside
//! this crate. It consumes an already-bound [`statement::Statement`]
//! and ready [`merge::QueryResult`] cursors.

pub mod merge;
pub mod router;
pub mod statement;
pub mod value;

pub use merge::{MergeEngine, MergedResult};
pub use router::{RouteContext, Router};
pub use value::Datum;
