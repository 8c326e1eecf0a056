//! Runtime view of the sharding rules.

use std::collections::HashSet;

use shardcast_config::{Config, DataNode, KeyGeneratorKind};

use super::error::Error;

/// One sharded table's rule.
#[derive(Debug, Clone)]
pub struct TableRule {
    name: String,
    column: String,
    algorithm: String,
    data_nodes: Vec<DataNode>,
    key_generator: Option<KeyGeneratorKind>,
}

impl TableRule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Physical locations, ordered by shard number.
    pub fn data_nodes(&self) -> &[DataNode] {
        &self.data_nodes
    }

    pub fn key_generator(&self) -> Option<KeyGeneratorKind> {
        self.key_generator
    }
}

/// Processed sharding rules: tables, data sources, broadcast
/// tables and binding groups, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ShardingSchema {
    tables: Vec<TableRule>,
    data_sources: Vec<String>,
    default_data_source: String,
    broadcast: HashSet<String>,
    binding: Vec<Vec<String>>,
}

impl ShardingSchema {
    pub fn new(config: &Config) -> Result<Self, Error> {
        config.check()?;

        let default_data_source = config
            .default_data_source()
            .ok_or(Error::NoDataSources)?
            .to_string();

        let tables = config
            .sharded_tables
            .iter()
            .map(|table| TableRule {
                name: table.name.clone(),
                column: table.column.clone(),
                algorithm: table.algorithm.clone(),
                data_nodes: table.data_nodes.clone(),
                key_generator: table.key_generator,
            })
            .collect();

        Ok(Self {
            tables,
            data_sources: config.data_sources.clone(),
            default_data_source,
            broadcast: config.broadcast_tables.iter().cloned().collect(),
            binding: config
                .binding_tables
                .iter()
                .map(|group| group.tables.clone())
                .collect(),
        })
    }

    pub fn table(&self, name: &str) -> Option<&TableRule> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn is_sharded(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    pub fn is_broadcast(&self, name: &str) -> bool {
        self.broadcast.contains(name)
    }

    /// Rules for the sharded subset of the given tables,
    /// in statement order.
    pub fn sharded_rules<'a>(&'a self, tables: &[String]) -> Vec<&'a TableRule> {
        tables.iter().filter_map(|name| self.table(name)).collect()
    }

    pub fn data_sources(&self) -> &[String] {
        &self.data_sources
    }

    pub fn default_data_source(&self) -> &str {
        &self.default_data_source
    }

    /// All the given tables belong to one binding group,
    /// so their shards are chosen together.
    pub fn same_binding_group(&self, tables: &[&TableRule]) -> bool {
        if tables.len() < 2 {
            return true;
        }
        self.binding.iter().any(|group| {
            tables
                .iter()
                .all(|table| group.iter().any(|name| name == table.name()))
        })
    }
}
