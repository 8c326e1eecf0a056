//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Toml(#[from] toml::de::Error),

    #[error("data node \"{0}\" is not in \"data_source.table\" form")]
    MalformedDataNode(String),

    #[error("sharded table \"{0}\" has no data nodes")]
    NoDataNodes(String),

    #[error("sharded table \"{table}\" references unknown algorithm \"{algorithm}\"")]
    UnknownAlgorithm { table: String, algorithm: String },

    #[error("data node \"{node}\" references unknown data source \"{data_source}\"")]
    UnknownDataSource { node: String, data_source: String },

    #[error("algorithm \"{0}\" is declared more than once")]
    DuplicateAlgorithm(String),

    #[error("algorithm \"{0}\" needs a positive shard count")]
    NoShards(String),
}
