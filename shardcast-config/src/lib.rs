//! Sharding rule configuration.
//!
//! Declares the logical-to-physical mapping the router works from:
//! sharded tables with their data nodes, sharding algorithms,
//! broadcast tables and binding table groups.

pub mod core;
pub mod error;
pub mod sharding;

pub use crate::core::Config;
pub use error::Error;
pub use sharding::*;
