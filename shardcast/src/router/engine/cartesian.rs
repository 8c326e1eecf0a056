//! Cartesian routing: cross product of each table's candidate
//! shards, for statements that need the external federation
//! engine to join across shards.

use tracing::debug;

use shardcast_config::DataNode;

use super::super::algorithm::Algorithms;
use super::super::condition::ShardingCondition;
use super::super::context::{RouteContext, RouteMapper, RouteUnit};
use super::super::error::Error;
use super::super::schema::{ShardingSchema, TableRule};
use super::standard;

pub(super) fn route(
    schema: &ShardingSchema,
    tables: &[&TableRule],
    conditions: &[ShardingCondition],
    algorithms: &Algorithms,
) -> Result<RouteContext, Error> {
    let routed = routed_nodes(tables, conditions, algorithms)?;

    let mut context = RouteContext::default();
    for unit in cross(schema, &routed) {
        context.push(unit);
    }
    context.set_federated();

    if context.is_empty() {
        // No data source hosts every table; nothing executable.
        return Err(Error::NoTargetFound {
            table: tables
                .first()
                .map(|rule| rule.name().to_string())
                .unwrap_or_default(),
        });
    }

    Ok(context)
}

/// Candidate data nodes per table, narrowed by the conditions.
pub(super) fn routed_nodes<'a>(
    tables: &[&'a TableRule],
    conditions: &[ShardingCondition],
    algorithms: &Algorithms,
) -> Result<Vec<(&'a TableRule, Vec<&'a DataNode>)>, Error> {
    tables
        .iter()
        .map(|rule| {
            let shards = standard::shards(std::slice::from_ref(rule), conditions, algorithms)?;
            let nodes = shards
                .into_iter()
                .map(|shard| &rule.data_nodes()[shard])
                .collect();
            Ok((*rule, nodes))
        })
        .collect()
}

/// Every combination of one actual table per logical table,
/// grouped by data source. Data sources missing a table
/// contribute nothing.
pub(super) fn cross(
    schema: &ShardingSchema,
    routed: &[(&TableRule, Vec<&DataNode>)],
) -> Vec<RouteUnit> {
    let mut units = vec![];

    for data_source in schema.data_sources() {
        let groups: Vec<(&str, Vec<&str>)> = routed
            .iter()
            .map(|(rule, nodes)| {
                let actuals = nodes
                    .iter()
                    .filter(|node| &node.data_source == data_source)
                    .map(|node| node.table.as_str())
                    .collect::<Vec<_>>();
                (rule.name(), actuals)
            })
            .collect();

        if groups.iter().any(|(_, actuals)| actuals.is_empty()) {
            debug!(%data_source, "data source doesn't host every table, skipping");
            continue;
        }

        let mut combinations: Vec<Vec<RouteMapper>> = vec![vec![]];
        for (logical, actuals) in &groups {
            let mut expanded = Vec::with_capacity(combinations.len() * actuals.len());
            for combination in &combinations {
                for actual in actuals {
                    let mut next = combination.clone();
                    next.push(RouteMapper::new(*logical, *actual));
                    expanded.push(next);
                }
            }
            combinations = expanded;
        }

        for mappers in combinations {
            units.push(RouteUnit::new(RouteMapper::same(data_source), mappers));
        }
    }

    units
}
