//! Sharding value extraction.
//!
//! Walks the statement for constraints on sharding key columns
//! and turns them into [`ShardingCondition`]s. Only conjunctive
//! predicates are safe to extract: anything under an `OR` (or a
//! predicate we can't see through) is skipped, which fans the
//! statement out rather than misroute it.

use tracing::{debug, trace};

use super::condition::{Bound, ConditionValue, ShardingCondition};
use super::error::Error;
use super::generated_key::GeneratedKey;
use super::schema::ShardingSchema;
use crate::statement::{Insert, Operand, Operator, Parameters, Predicate, Statement};
use crate::value::Datum;

/// Extract sharding conditions from a bound statement.
///
/// SELECT/UPDATE/DELETE produce at most one condition, from the
/// WHERE clause. INSERT produces one condition per tuple, since
/// each inserted row routes independently.
pub fn extract(
    statement: &Statement,
    parameters: &Parameters,
    schema: &ShardingSchema,
    generated: Option<&GeneratedKey>,
) -> Result<Vec<ShardingCondition>, Error> {
    if let Some(insert) = statement.insert() {
        return extract_insert(statement, insert, parameters, schema, generated);
    }

    let mut condition = ShardingCondition::default();
    if let Some(predicate) = statement.where_clause() {
        extract_predicate(predicate, statement, parameters, schema, &mut condition)?;
    }

    if condition.is_empty() {
        trace!("no sharding conditions in statement");
        Ok(vec![])
    } else {
        Ok(vec![condition])
    }
}

fn extract_insert(
    statement: &Statement,
    insert: &Insert,
    parameters: &Parameters,
    schema: &ShardingSchema,
    generated: Option<&GeneratedKey>,
) -> Result<Vec<ShardingCondition>, Error> {
    let table = match statement.tables().first() {
        Some(table) => table.as_str(),
        None => return Ok(vec![]),
    };
    let rule = match schema.table(table) {
        Some(rule) => rule,
        None => return Ok(vec![]),
    };

    let key_slot = insert
        .columns
        .iter()
        .position(|column| column == rule.column());

    let mut conditions = Vec::with_capacity(insert.tuples.len());
    for (index, tuple) in insert.tuples.iter().enumerate() {
        let value = match key_slot {
            Some(slot) => {
                let operand = tuple.get(slot).ok_or_else(|| Error::Condition {
                    table: table.to_string(),
                    column: rule.column().to_string(),
                })?;
                resolve(operand, parameters)?
            }
            // Column omitted: a generated key fills the slot.
            None => generated
                .and_then(|key| key.value(index))
                .cloned()
                .ok_or_else(|| Error::Condition {
                    table: table.to_string(),
                    column: rule.column().to_string(),
                })?,
        };

        conditions.push(
            vec![ConditionValue::list(table, rule.column(), vec![value])].into(),
        );
    }

    Ok(conditions)
}

fn extract_predicate(
    predicate: &Predicate,
    statement: &Statement,
    parameters: &Parameters,
    schema: &ShardingSchema,
    condition: &mut ShardingCondition,
) -> Result<(), Error> {
    match predicate {
        Predicate::And(children) => {
            for child in children {
                extract_predicate(child, statement, parameters, schema, condition)?;
            }
        }

        Predicate::Comparison(comparison) => {
            // Match the column against every sharded table in the
            // statement; an explicit qualifier narrows the match.
            for rule in schema.sharded_rules(statement.tables()) {
                if comparison.column != rule.column() {
                    continue;
                }
                if let Some(qualifier) = &comparison.table {
                    if qualifier != rule.name() {
                        continue;
                    }
                }

                match comparison.operator {
                    Operator::Eq | Operator::In => {
                        let values = comparison
                            .operands
                            .iter()
                            .map(|operand| resolve(operand, parameters))
                            .collect::<Result<Vec<_>, _>>()?;
                        condition.push(ConditionValue::list(rule.name(), rule.column(), values));
                    }

                    Operator::Between => {
                        let lower = comparison.operands.first().ok_or_else(|| {
                            Error::Condition {
                                table: rule.name().to_string(),
                                column: rule.column().to_string(),
                            }
                        })?;
                        let upper = comparison.operands.get(1).ok_or_else(|| {
                            Error::Condition {
                                table: rule.name().to_string(),
                                column: rule.column().to_string(),
                            }
                        })?;
                        condition.push(ConditionValue::range(
                            rule.name(),
                            rule.column(),
                            Bound::Included(resolve(lower, parameters)?),
                            Bound::Included(resolve(upper, parameters)?),
                        ));
                    }

                    Operator::Lt | Operator::LtEq | Operator::Gt | Operator::GtEq => {
                        let operand = comparison.operands.first().ok_or_else(|| {
                            Error::Condition {
                                table: rule.name().to_string(),
                                column: rule.column().to_string(),
                            }
                        })?;
                        let value = resolve(operand, parameters)?;
                        let (lower, upper) = match comparison.operator {
                            Operator::Lt => (Bound::Unbounded, Bound::Excluded(value)),
                            Operator::LtEq => (Bound::Unbounded, Bound::Included(value)),
                            Operator::Gt => (Bound::Excluded(value), Bound::Unbounded),
                            _ => (Bound::Included(value), Bound::Unbounded),
                        };
                        condition.push(ConditionValue::range(
                            rule.name(),
                            rule.column(),
                            lower,
                            upper,
                        ));
                    }
                }
            }
        }

        // OR branches don't constrain the route: any shard could
        // satisfy the other branch.
        Predicate::Or(_) => {
            debug!("OR predicate, not extracting sharding values");
        }

        Predicate::Opaque => {
            trace!("opaque predicate, not extracting sharding values");
        }
    }

    Ok(())
}

fn resolve(operand: &Operand, parameters: &Parameters) -> Result<Datum, Error> {
    match operand {
        Operand::Value(value) => Ok(value.clone()),
        Operand::Parameter(index) => parameters
            .get(*index)
            .cloned()
            .ok_or(Error::MissingParameter(*index)),
    }
}
