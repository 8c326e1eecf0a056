//! Sharded table and algorithm declarations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::Error;

/// Sharded table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ShardedTable {
    /// Logical table name as written in SQL.
    pub name: String,
    /// Table sharded on this column.
    pub column: String,
    /// Name of the sharding algorithm, declared in `[[algorithms]]`.
    pub algorithm: String,
    /// Physical locations, ordered by shard number.
    #[serde(default)]
    pub data_nodes: Vec<DataNode>,
    /// Key generator for INSERTs that omit the sharding column.
    #[serde(default)]
    pub key_generator: Option<KeyGeneratorKind>,
}

/// One physical location of a logical table, written as
/// `"data_source.table"` in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataNode {
    pub data_source: String,
    pub table: String,
}

impl FromStr for DataNode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, '.');
        match (parts.next(), parts.next()) {
            (Some(data_source), Some(table)) if !data_source.is_empty() && !table.is_empty() => {
                Ok(Self {
                    data_source: data_source.to_string(),
                    table: table.to_string(),
                })
            }
            _ => Err(Error::MalformedDataNode(s.to_string())),
        }
    }
}

impl fmt::Display for DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.data_source, self.table)
    }
}

impl Serialize for DataNode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DataNode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyGeneratorKind {
    #[default]
    Sequence,
    Uuid,
}

/// Sharding algorithm declaration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Algorithm {
    pub name: String,
    pub kind: AlgorithmKind,
    /// Shard count for `modulo` and `hash`.
    #[serde(default)]
    pub shards: usize,
    /// Partition intervals for `range`, start inclusive, end exclusive.
    #[serde(default)]
    pub ranges: Vec<RangeMapping>,
    /// Value lists for `list`.
    #[serde(default)]
    pub lists: Vec<ListMapping>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    #[default]
    Modulo,
    Hash,
    Range,
    List,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct RangeMapping {
    #[serde(default)]
    pub start: Option<FlexibleType>,
    #[serde(default)]
    pub end: Option<FlexibleType>,
    pub shard: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ListMapping {
    pub values: Vec<FlexibleType>,
    pub shard: usize,
}

/// Config values that can be integers, UUIDs or strings,
/// depending on the sharding column's type.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Eq, Hash)]
#[serde(untagged)]
pub enum FlexibleType {
    Integer(i64),
    Uuid(uuid::Uuid),
    String(String),
}

impl From<i64> for FlexibleType {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<uuid::Uuid> for FlexibleType {
    fn from(value: uuid::Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<&str> for FlexibleType {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Logical tables that must route together,
/// e.g. orders and order_items sharded identically.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct BindingGroup {
    pub tables: Vec<String>,
}
