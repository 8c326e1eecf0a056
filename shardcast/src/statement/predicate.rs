//! WHERE clause of a SELECT/UPDATE/DELETE.

use crate::value::Datum;

/// Predicate tree, already bound to the statement's tables.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Comparison(Comparison),
    /// Anything the extractor can't see through: subqueries,
    /// function calls, NOT, etc.
    Opaque,
}

/// One column comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Table qualifier, when the SQL wrote one.
    pub table: Option<String>,
    pub column: String,
    pub operator: Operator,
    /// One operand for binary operators, N for IN,
    /// two for BETWEEN.
    pub operands: Vec<Operand>,
}

impl Comparison {
    pub fn eq(column: impl Into<String>, operand: Operand) -> Self {
        Self {
            table: None,
            column: column.into(),
            operator: Operator::Eq,
            operands: vec![operand],
        }
    }

    pub fn in_list(column: impl Into<String>, operands: Vec<Operand>) -> Self {
        Self {
            table: None,
            column: column.into(),
            operator: Operator::In,
            operands,
        }
    }

    pub fn between(column: impl Into<String>, lower: Operand, upper: Operand) -> Self {
        Self {
            table: None,
            column: column.into(),
            operator: Operator::Between,
            operands: vec![lower, upper],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    In,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Between,
}

/// Right-hand side of a comparison, or one slot of
/// an INSERT tuple.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Placeholder bound at execution time.
    Parameter(usize),
    /// Literal from the query text.
    Value(Datum),
}

impl From<Datum> for Operand {
    fn from(value: Datum) -> Self {
        Operand::Value(value)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Value(Datum::Bigint(value))
    }
}
