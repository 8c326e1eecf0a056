//! Route context: the concrete execution targets of a statement.

use indexmap::IndexSet;
use std::fmt;

/// Logical-to-actual name mapping, for a data source or a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteMapper {
    pub logical: String,
    pub actual: String,
}

impl RouteMapper {
    pub fn new(logical: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            logical: logical.into(),
            actual: actual.into(),
        }
    }

    /// Mapper for a name that isn't renamed between
    /// logical and physical, e.g. a data source.
    pub fn same(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            logical: name.clone(),
            actual: name,
        }
    }
}

impl fmt::Display for RouteMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.logical, self.actual)
    }
}

/// One execution target: a data source plus the physical
/// tables the statement's logical tables map to there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteUnit {
    data_source: RouteMapper,
    tables: Vec<RouteMapper>,
}

impl RouteUnit {
    pub fn new(data_source: RouteMapper, tables: Vec<RouteMapper>) -> Self {
        Self {
            data_source,
            tables,
        }
    }

    pub fn data_source(&self) -> &RouteMapper {
        &self.data_source
    }

    pub fn tables(&self) -> &[RouteMapper] {
        &self.tables
    }

    /// Actual table name for a logical table, if this unit carries it.
    pub fn actual_table(&self, logical: &str) -> Option<&str> {
        self.tables
            .iter()
            .find(|mapper| mapper.logical == logical)
            .map(|mapper| mapper.actual.as_str())
    }
}

impl fmt::Display for RouteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self
            .tables
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}[{}]", self.data_source.actual, tables)
    }
}

/// Write-once set of route units. Engines only append;
/// duplicate units from different engines collapse.
#[derive(Debug, Clone, Default)]
pub struct RouteContext {
    units: IndexSet<RouteUnit>,
    federated: bool,
    degraded: bool,
}

impl RouteContext {
    pub fn push(&mut self, unit: RouteUnit) {
        self.units.insert(unit);
    }

    pub fn units(&self) -> impl Iterator<Item = &RouteUnit> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Result correctness depends on an external federation
    /// engine joining across shards.
    pub fn is_federated(&self) -> bool {
        self.federated
    }

    pub(crate) fn set_federated(&mut self) {
        self.federated = true;
    }

    /// Produced by the complex engine's cartesian fallback:
    /// shard affinity could not be matched.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub(crate) fn set_degraded(&mut self) {
        self.degraded = true;
    }

    /// Data sources touched, deduplicated, in unit order.
    pub fn data_sources(&self) -> IndexSet<&str> {
        self.units
            .iter()
            .map(|unit| unit.data_source.actual.as_str())
            .collect()
    }
}

/// Set equality: unit order is routing-engine internals,
/// not part of the contract.
impl PartialEq for RouteContext {
    fn eq(&self, other: &Self) -> bool {
        self.units == other.units
            && self.federated == other.federated
            && self.degraded == other.degraded
    }
}

impl Eq for RouteContext {}
