//! Unicast routing: one arbitrarily chosen shard.

use rand::Rng;
use tracing::trace;

use super::super::context::{RouteContext, RouteMapper, RouteUnit};
use super::super::error::Error;
use super::super::schema::ShardingSchema;

/// Route to one uniform-randomly chosen shard. The pick is
/// deliberately non-deterministic across calls.
pub(super) fn route(schema: &ShardingSchema, tables: &[String]) -> Result<RouteContext, Error> {
    let sharded = schema.sharded_rules(tables);
    let mut context = RouteContext::default();

    match sharded.first() {
        Some(rule) => {
            let nodes = rule.data_nodes();
            if nodes.is_empty() {
                return Err(Error::NoTargetFound {
                    table: rule.name().to_string(),
                });
            }
            let node = &nodes[rand::rng().random_range(0..nodes.len())];
            trace!(table = rule.name(), node = %node, "unicast pick");

            let mappers = tables
                .iter()
                .map(|table| {
                    if table == rule.name() {
                        RouteMapper::new(table, &node.table)
                    } else {
                        RouteMapper::same(table)
                    }
                })
                .collect();
            context.push(RouteUnit::new(
                RouteMapper::same(&node.data_source),
                mappers,
            ));
        }

        // Table-agnostic, or only broadcast tables: any data
        // source will do.
        None => {
            let sources = schema.data_sources();
            if sources.is_empty() {
                return Err(Error::NoDataSources);
            }
            let source = &sources[rand::rng().random_range(0..sources.len())];
            trace!(data_source = %source, "unicast pick");

            context.push(RouteUnit::new(
                RouteMapper::same(source),
                tables.iter().map(RouteMapper::same).collect(),
            ));
        }
    }

    Ok(context)
}
