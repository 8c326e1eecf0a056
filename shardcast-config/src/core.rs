//! Top-level config file.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use super::error::Error;
use super::sharding::{Algorithm, AlgorithmKind, BindingGroup, ShardedTable};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Config {
    /// All configured data sources (physical databases).
    #[serde(default)]
    pub data_sources: Vec<String>,
    /// Where statements touching no sharded table go.
    /// Defaults to the first data source.
    #[serde(default)]
    pub default_data_source: Option<String>,
    #[serde(default)]
    pub sharded_tables: Vec<ShardedTable>,
    /// Tables replicated identically to every shard.
    #[serde(default)]
    pub broadcast_tables: Vec<String>,
    #[serde(default)]
    pub binding_tables: Vec<BindingGroup>,
    #[serde(default)]
    pub algorithms: Vec<Algorithm>,
}

impl Config {
    /// Load config from a toml file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let config = Self::from_str(&std::fs::read_to_string(path)?)?;
        info!(
            "loaded {} sharded tables from \"{}\"",
            config.sharded_tables.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse config from a toml string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(s)?;
        config.check()?;
        Ok(config)
    }

    /// Validate cross-references between tables, algorithms
    /// and data sources.
    pub fn check(&self) -> Result<(), Error> {
        let mut algorithms = HashSet::new();
        for algorithm in &self.algorithms {
            if !algorithms.insert(algorithm.name.as_str()) {
                return Err(Error::DuplicateAlgorithm(algorithm.name.clone()));
            }
            match algorithm.kind {
                AlgorithmKind::Modulo | AlgorithmKind::Hash => {
                    if algorithm.shards == 0 {
                        return Err(Error::NoShards(algorithm.name.clone()));
                    }
                }
                AlgorithmKind::Range | AlgorithmKind::List => (),
            }
        }

        let data_sources: HashSet<_> = self.data_sources.iter().map(|s| s.as_str()).collect();
        for table in &self.sharded_tables {
            if table.data_nodes.is_empty() {
                return Err(Error::NoDataNodes(table.name.clone()));
            }
            if !algorithms.contains(table.algorithm.as_str()) {
                return Err(Error::UnknownAlgorithm {
                    table: table.name.clone(),
                    algorithm: table.algorithm.clone(),
                });
            }
            for node in &table.data_nodes {
                if !data_sources.contains(node.data_source.as_str()) {
                    return Err(Error::UnknownDataSource {
                        node: node.to_string(),
                        data_source: node.data_source.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Default data source, for statements that touch nothing sharded.
    pub fn default_data_source(&self) -> Option<&str> {
        self.default_data_source
            .as_deref()
            .or_else(|| self.data_sources.first().map(|s| s.as_str()))
    }
}
