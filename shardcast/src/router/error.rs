//! Routing errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A sharded table's routing computation produced no candidate
    /// shard. Indicates a rule or algorithm misconfiguration, not
    /// absent data.
    #[error("no route target found for sharded table \"{table}\"")]
    NoTargetFound { table: String },

    #[error("unicast routing requested for multiple sharded tables: {tables:?}")]
    UnsupportedMultiTableUnicast { tables: Vec<String> },

    #[error("sharded table \"{table}\" references unknown algorithm \"{algorithm}\"")]
    NoSuchAlgorithm { table: String, algorithm: String },

    #[error("cannot determine sharding value for column \"{column}\" of table \"{table}\"")]
    Condition { table: String, column: String },

    #[error("missing parameter: ${0}")]
    MissingParameter(usize),

    #[error("no data sources configured")]
    NoDataSources,

    #[error("{0}")]
    Config(#[from] shardcast_config::Error),
}
