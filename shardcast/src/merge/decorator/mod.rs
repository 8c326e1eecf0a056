//! Decorators over merged results.
//!
//! Each wraps an inner [`MergedResult`](super::MergedResult) and
//! delegates after applying its own policy; decorators compose.

pub mod limit;
pub mod row_number;

pub use limit::LimitMergedResult;
pub use row_number::RowNumberMergedResult;
