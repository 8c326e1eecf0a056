//! Standard routing: one sharded table, or a binding group
//! whose shards move together.

use indexmap::IndexSet;
use tracing::{debug, trace};

use super::super::algorithm::Algorithms;
use super::super::condition::{ConditionValue, ShardingCondition};
use super::super::context::{RouteContext, RouteMapper, RouteUnit};
use super::super::error::Error;
use super::super::schema::TableRule;

/// Route a binding group by its primary (first) table. Every
/// table in the group maps to the same shard number.
pub(super) fn route(
    tables: &[&TableRule],
    conditions: &[ShardingCondition],
    algorithms: &Algorithms,
) -> Result<RouteContext, Error> {
    let primary = tables.first().ok_or(Error::NoDataSources)?;
    let routed = shards(tables, conditions, algorithms)?;

    let mut context = RouteContext::default();
    for shard in routed {
        let node = &primary.data_nodes()[shard];
        let mut mappers = Vec::with_capacity(tables.len());
        for table in tables {
            match table.data_nodes().get(shard) {
                Some(node) => mappers.push(RouteMapper::new(table.name(), &node.table)),
                None => {
                    debug!(
                        table = table.name(),
                        shard, "binding table has no node for shard"
                    );
                }
            }
        }
        context.push(RouteUnit::new(
            RouteMapper::same(&node.data_source),
            mappers,
        ));
    }

    Ok(context)
}

/// Shard numbers for a sharded table (or binding group) under
/// the given conditions. The first rule supplies the algorithm
/// and node count; a condition value on any group member's
/// sharding column narrows the whole group, since binding
/// tables shard identically.
///
/// Within a condition, matching values intersect (they're
/// ANDed); across conditions, shard sets union (each condition
/// is an independent row clause). No conditions constraining
/// the group means a full table route.
pub(super) fn shards(
    group: &[&TableRule],
    conditions: &[ShardingCondition],
    algorithms: &Algorithms,
) -> Result<IndexSet<usize>, Error> {
    let primary = group.first().ok_or(Error::NoDataSources)?;
    let algorithm = algorithms
        .get(primary.algorithm())
        .ok_or_else(|| Error::NoSuchAlgorithm {
            table: primary.name().to_string(),
            algorithm: primary.algorithm().to_string(),
        })?;
    let total = primary.data_nodes().len();

    if conditions.is_empty() {
        trace!(table = primary.name(), "no conditions, full table route");
        return Ok((0..total).collect());
    }

    let mut routed = IndexSet::new();
    for condition in conditions {
        let mut narrowed: Option<IndexSet<usize>> = None;

        for value in condition.values() {
            let constrains = group
                .iter()
                .any(|rule| value.table() == rule.name() && value.column() == rule.column());
            if !constrains {
                continue;
            }

            let candidates: IndexSet<usize> = match value {
                ConditionValue::List { values, .. } => values
                    .iter()
                    .flat_map(|value| algorithm.shard(value).indexes(total))
                    .collect(),
                ConditionValue::Range { lower, upper, .. } => {
                    algorithm.shard_range(lower, upper).indexes(total).into_iter().collect()
                }
            };

            narrowed = Some(match narrowed {
                Some(previous) => previous.intersection(&candidates).copied().collect(),
                None => candidates,
            });
        }

        match narrowed {
            Some(candidates) => routed.extend(candidates),
            // Condition doesn't constrain this table; fan out.
            None => routed.extend(0..total),
        }
    }

    if routed.is_empty() {
        return Err(Error::NoTargetFound {
            table: primary.name().to_string(),
        });
    }

    Ok(routed)
}
