//! Bound statement model.
//!
//! This is the narrow interface to the (external) SQL front end:
//! a statement that has been parsed and bound, reduced to the parts
//! routing and merging care about.

pub mod aggregate;
pub mod limit;
pub mod order_by;
pub mod predicate;

pub use aggregate::{Aggregate, AggregateFunction, AggregateTarget};
pub use limit::{Bounded, Limit, LimitKind};
pub use order_by::{Direction, NullsOrder, OrderBy};
pub use predicate::{Comparison, Operand, Operator, Predicate};

use crate::value::Datum;

/// Statement category, decided by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementKind {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
    /// Schema changes; fan out everywhere.
    Ddl,
    /// Administrative/introspection, e.g. `SHOW TABLES`.
    Dal,
    /// Transaction control.
    Tcl,
}

impl StatementKind {
    pub fn is_dml(&self) -> bool {
        matches!(
            self,
            StatementKind::Select
                | StatementKind::Insert
                | StatementKind::Update
                | StatementKind::Delete
        )
    }
}

/// VALUES clause of an INSERT.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Insert {
    /// Column names, in tuple order.
    pub columns: Vec<String>,
    /// One entry per inserted row.
    pub tuples: Vec<Vec<Operand>>,
}

/// DISTINCT handling requested by the statement.
#[derive(Debug, Clone, PartialEq)]
pub enum DistinctBy {
    /// SELECT DISTINCT: the whole row.
    Row,
    /// DISTINCT ON: specific columns.
    Columns(Vec<usize>),
}

/// A parsed and bound statement.
#[derive(Debug, Clone, Default, derive_builder::Builder)]
#[builder(default)]
pub struct Statement {
    kind: StatementKind,
    /// Logical tables, in source order.
    tables: Vec<String>,
    where_clause: Option<Predicate>,
    insert: Option<Insert>,
    order_by: Vec<OrderBy>,
    aggregate: Aggregate,
    distinct: Option<DistinctBy>,
    limit: Option<Limit>,
    /// Set by the binder for patterns that need the external
    /// federation engine, e.g. binding tables configured without
    /// an aligned sharding key.
    federation_required: bool,
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn where_clause(&self) -> Option<&Predicate> {
        self.where_clause.as_ref()
    }

    pub fn insert(&self) -> Option<&Insert> {
        self.insert.as_ref()
    }

    pub fn order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    pub fn distinct(&self) -> Option<&DistinctBy> {
        self.distinct.as_ref()
    }

    pub fn limit(&self) -> Option<&Limit> {
        self.limit.as_ref()
    }

    pub fn federation_required(&self) -> bool {
        self.federation_required
    }

    /// Merging this statement requires buffering rows
    /// instead of streaming them through.
    pub fn needs_memory_merge(&self) -> bool {
        !self.aggregate.is_empty() || !self.aggregate.group_by().is_empty() || self.distinct.is_some()
    }
}

/// Bound parameter list, addressed by zero-based index.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    values: Vec<Datum>,
}

impl Parameters {
    pub fn new(values: impl Into<Vec<Datum>>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Datum> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Datum>> for Parameters {
    fn from(values: Vec<Datum>) -> Self {
        Self::new(values)
    }
}
