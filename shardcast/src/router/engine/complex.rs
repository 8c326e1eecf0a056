//! Complex routing: multiple independently sharded tables in
//! one statement.
//!
//! Each table routes standard on its own, then the results are
//! matched by data-source affinity: a unit combines the tables'
//! actual names wherever one data source hosts candidates for
//! every table. When no data source does, the engine degrades
//! to one unit per table and flags the context, so the caller
//! can tell a clean route from a guess.

use tracing::warn;

use super::super::algorithm::Algorithms;
use super::super::condition::ShardingCondition;
use super::super::context::{RouteContext, RouteMapper, RouteUnit};
use super::super::error::Error;
use super::super::schema::{ShardingSchema, TableRule};
use super::cartesian;

pub(super) fn route(
    schema: &ShardingSchema,
    tables: &[&TableRule],
    conditions: &[ShardingCondition],
    algorithms: &Algorithms,
) -> Result<RouteContext, Error> {
    let routed = cartesian::routed_nodes(tables, conditions, algorithms)?;

    let mut context = RouteContext::default();
    for unit in cartesian::cross(schema, &routed) {
        context.push(unit);
    }
    if !context.is_empty() {
        return Ok(context);
    }

    // No data source hosts every table. Route each table to its
    // own candidates; join correctness is now the caller's
    // problem.
    warn!("no data source affinity between sharded tables, degrading to per-table routes");
    for (rule, nodes) in &routed {
        for node in nodes {
            context.push(RouteUnit::new(
                RouteMapper::same(&node.data_source),
                vec![RouteMapper::new(rule.name(), &node.table)],
            ));
        }
    }
    context.set_degraded();

    if context.is_empty() {
        return Err(Error::NoTargetFound {
            table: tables
                .first()
                .map(|rule| rule.name().to_string())
                .unwrap_or_default(),
        });
    }

    Ok(context)
}

#[cfg(test)]
mod test {
    use super::super::super::condition::ConditionValue;
    use super::*;
    use crate::value::Datum;
    use shardcast_config::Config;

    fn fixtures(user_nodes: &str) -> (ShardingSchema, Algorithms) {
        let config = Config::from_str(&format!(
            r#"
data_sources = ["ds_0", "ds_1"]

[[sharded_tables]]
name = "t_order"
column = "order_id"
algorithm = "mod2"
data_nodes = ["ds_0.t_order_0", "ds_1.t_order_1"]

[[sharded_tables]]
name = "t_user"
column = "user_id"
algorithm = "mod2"
data_nodes = [{user_nodes}]

[[algorithms]]
name = "mod2"
kind = "modulo"
shards = 2
"#
        ))
        .unwrap();
        let algorithms = Algorithms::from_config(&config);
        (ShardingSchema::new(&config).unwrap(), algorithms)
    }

    #[test]
    fn test_matching_data_sources_combine() {
        let (schema, algorithms) = fixtures(r#""ds_0.t_user_0", "ds_1.t_user_1""#);
        let order = schema.table("t_order").unwrap();
        let user = schema.table("t_user").unwrap();

        // Both tables route to shard 0, hosted on ds_0.
        let condition: ShardingCondition = vec![
            ConditionValue::list("t_order", "order_id", vec![Datum::Bigint(4)]),
            ConditionValue::list("t_user", "user_id", vec![Datum::Bigint(2)]),
        ]
        .into();

        let context = route(&schema, &[order, user], &[condition], &algorithms).unwrap();
        assert!(!context.is_degraded());
        assert_eq!(context.len(), 1);

        let unit = context.units().next().unwrap();
        assert_eq!(unit.data_source().actual, "ds_0");
        assert_eq!(unit.actual_table("t_order"), Some("t_order_0"));
        assert_eq!(unit.actual_table("t_user"), Some("t_user_0"));
    }

    // Shard numbers disagree across the tables' node lists, but
    // the data sources still line up; that's a clean route, not
    // a degraded one.
    #[test]
    fn test_cross_source_node_order_is_not_degraded() {
        let (schema, algorithms) = fixtures(r#""ds_1.t_user_0", "ds_0.t_user_1""#);
        let order = schema.table("t_order").unwrap();
        let user = schema.table("t_user").unwrap();

        let context = route(&schema, &[order, user], &[], &algorithms).unwrap();
        assert!(!context.is_degraded());
        assert_eq!(context.len(), 2);

        for unit in context.units() {
            assert!(unit.actual_table("t_order").is_some());
            assert!(unit.actual_table("t_user").is_some());
        }
    }

    #[test]
    fn test_no_shared_data_source_degrades_to_per_table_units() {
        let (schema, algorithms) = fixtures(r#""ds_0.t_user_0", "ds_1.t_user_1""#);
        let order = schema.table("t_order").unwrap();
        let user = schema.table("t_user").unwrap();

        // t_order routes to shard 0 (ds_0), t_user to shard 1
        // (ds_1). No data source hosts both.
        let condition: ShardingCondition = vec![
            ConditionValue::list("t_order", "order_id", vec![Datum::Bigint(4)]),
            ConditionValue::list("t_user", "user_id", vec![Datum::Bigint(3)]),
        ]
        .into();

        let context = route(&schema, &[order, user], &[condition], &algorithms).unwrap();
        assert!(context.is_degraded());
        assert_eq!(context.len(), 2);

        let units: Vec<_> = context.units().collect();
        assert_eq!(units[0].actual_table("t_order"), Some("t_order_0"));
        assert_eq!(units[0].data_source().actual, "ds_0");
        assert_eq!(units[1].actual_table("t_user"), Some("t_user_1"));
        assert_eq!(units[1].data_source().actual, "ds_1");
    }

    #[test]
    fn test_unconstrained_multi_table_combines_per_source() {
        let (schema, algorithms) = fixtures(r#""ds_0.t_user_0", "ds_1.t_user_1""#);
        let order = schema.table("t_order").unwrap();
        let user = schema.table("t_user").unwrap();

        let context = route(&schema, &[order, user], &[], &algorithms).unwrap();
        assert!(!context.is_degraded());
        assert_eq!(context.len(), 2);
    }
}
