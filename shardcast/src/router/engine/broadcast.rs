//! Broadcast routing: every data source.
//!
//! DDL on a sharded table fans out to every actual table;
//! broadcast-marked and plain tables keep their name on every
//! shard.

use super::super::context::{RouteContext, RouteMapper, RouteUnit};
use super::super::schema::ShardingSchema;

pub(super) fn route(schema: &ShardingSchema, tables: &[String]) -> RouteContext {
    let mut context = RouteContext::default();

    for data_source in schema.data_sources() {
        let mut mappers = vec![];
        for table in tables {
            match schema.table(table) {
                Some(rule) => {
                    for node in rule.data_nodes() {
                        if &node.data_source == data_source {
                            mappers.push(RouteMapper::new(table, &node.table));
                        }
                    }
                }
                None => mappers.push(RouteMapper::same(table)),
            }
        }
        context.push(RouteUnit::new(RouteMapper::same(data_source), mappers));
    }

    context
}
