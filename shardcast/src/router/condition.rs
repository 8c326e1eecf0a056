//! Sharding conditions extracted from a statement.

use crate::value::Datum;

/// One side of a range condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Unbounded,
    Included(Datum),
    Excluded(Datum),
}

impl Bound {
    pub fn value(&self) -> Option<&Datum> {
        match self {
            Bound::Unbounded => None,
            Bound::Included(value) | Bound::Excluded(value) => Some(value),
        }
    }
}

/// Column constraint usable for routing, built from a single
/// predicate or tuple slot. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    /// `=` or `IN`: an enumerated value set.
    List {
        table: String,
        column: String,
        values: Vec<Datum>,
    },
    /// `<`, `<=`, `>`, `>=`, `BETWEEN`: an interval.
    Range {
        table: String,
        column: String,
        lower: Bound,
        upper: Bound,
    },
}

impl ConditionValue {
    pub fn list(table: impl Into<String>, column: impl Into<String>, values: Vec<Datum>) -> Self {
        Self::List {
            table: table.into(),
            column: column.into(),
            values,
        }
    }

    pub fn range(
        table: impl Into<String>,
        column: impl Into<String>,
        lower: Bound,
        upper: Bound,
    ) -> Self {
        Self::Range {
            table: table.into(),
            column: column.into(),
            lower,
            upper,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Self::List { table, .. } | Self::Range { table, .. } => table,
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Self::List { column, .. } | Self::Range { column, .. } => column,
        }
    }
}

/// Condition values belonging to one row-producing clause:
/// the WHERE clause, or one INSERT tuple.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShardingCondition {
    values: Vec<ConditionValue>,
}

impl ShardingCondition {
    pub fn push(&mut self, value: ConditionValue) {
        self.values.push(value);
    }

    pub fn values(&self) -> &[ConditionValue] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<ConditionValue>> for ShardingCondition {
    fn from(values: Vec<ConditionValue>) -> Self {
        Self { values }
    }
}
