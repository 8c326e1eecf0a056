//! Statement routing.
//!
//! Turns a bound statement plus its parameters into a
//! [`RouteContext`]: the set of (data source, actual table)
//! targets to execute against. The rewriter that turns a route
//! context into per-shard SQL lives outside this crate.

pub mod algorithm;
pub mod condition;
pub mod context;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod generated_key;
pub mod schema;

pub use algorithm::{Algorithms, Shard, ShardingAlgorithm};
pub use condition::{Bound, ConditionValue, ShardingCondition};
pub use context::{RouteContext, RouteMapper, RouteUnit};
pub use error::Error;
pub use generated_key::{GeneratedKey, KeyGenerator, Keygen};
pub use schema::{ShardingSchema, TableRule};

use tracing::debug;

use shardcast_config::Config;

use crate::statement::{Parameters, Statement, StatementKind};

/// A routed statement: the execution targets, plus any keys
/// generated for an INSERT that omitted its sharding column.
/// The caller splices generated keys into the statement it
/// forwards.
#[derive(Debug)]
pub struct Route {
    context: RouteContext,
    generated_key: Option<GeneratedKey>,
}

impl Route {
    pub fn context(&self) -> &RouteContext {
        &self.context
    }

    pub fn generated_key(&self) -> Option<&GeneratedKey> {
        self.generated_key.as_ref()
    }

    pub fn into_context(self) -> RouteContext {
        self.context
    }
}

/// The routing facade: sharding rules, algorithm registry and
/// key generators, built once from config and shared.
#[derive(Debug, Clone)]
pub struct Router {
    schema: ShardingSchema,
    algorithms: Algorithms,
    keygen: Keygen,
}

impl Router {
    pub fn new(config: &Config) -> Result<Self, Error> {
        Ok(Self {
            schema: ShardingSchema::new(config)?,
            algorithms: Algorithms::from_config(config),
            keygen: Keygen::new(),
        })
    }

    pub fn schema(&self) -> &ShardingSchema {
        &self.schema
    }

    /// Route one statement.
    pub fn route(&self, statement: &Statement, parameters: &Parameters) -> Result<Route, Error> {
        let generated_key = self.generate_key(statement, parameters);

        let conditions =
            extractor::extract(statement, parameters, &self.schema, generated_key.as_ref())?;
        debug!(conditions = conditions.len(), "sharding conditions extracted");

        let engine = engine::RouteEngine::select(statement, &self.schema)?;
        let context = engine.route(&self.schema, &conditions, &self.algorithms)?;
        debug!(
            engine = engine.name(),
            units = context.len(),
            "statement routed"
        );

        Ok(Route {
            context,
            generated_key,
        })
    }

    /// Synthesize sharding keys for an INSERT that doesn't
    /// carry its sharding column.
    fn generate_key(&self, statement: &Statement, parameters: &Parameters) -> Option<GeneratedKey> {
        if statement.kind() != StatementKind::Insert {
            return None;
        }
        let insert = statement.insert()?;
        let table = statement.tables().first()?;
        let rule = self.schema.table(table)?;

        if insert.columns.iter().any(|column| column == rule.column()) {
            return None;
        }
        let kind = rule.key_generator()?;

        Some(self.keygen.generate(
            kind,
            rule.column(),
            parameters.len(),
            insert.tuples.len(),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::statement::{Comparison, Insert, Operand, Predicate, StatementBuilder};
    use crate::value::Datum;

    fn router() -> Router {
        let config = Config::from_str(
            r#"
data_sources = ["ds_0", "ds_1"]

[[sharded_tables]]
name = "t_order"
column = "order_id"
algorithm = "mod2"
data_nodes = ["ds_0.t_order_0", "ds_1.t_order_1"]
key_generator = "sequence"

[[algorithms]]
name = "mod2"
kind = "modulo"
shards = 2
"#,
        )
        .unwrap();
        Router::new(&config).unwrap()
    }

    #[test]
    fn test_select_routes_by_equality() {
        let router = router();
        let statement = StatementBuilder::default()
            .tables(vec!["t_order".into()])
            .where_clause(Some(Predicate::Comparison(Comparison::eq(
                "order_id",
                Operand::Parameter(0),
            ))))
            .build()
            .unwrap();

        let route = router
            .route(&statement, &vec![Datum::Bigint(5)].into())
            .unwrap();
        assert_eq!(route.context().len(), 1);
        let unit = route.context().units().next().unwrap();
        assert_eq!(unit.data_source().actual, "ds_1");
        assert_eq!(unit.actual_table("t_order"), Some("t_order_1"));
    }

    #[test]
    fn test_insert_without_key_generates_one() {
        let router = router();
        let statement = StatementBuilder::default()
            .kind(StatementKind::Insert)
            .tables(vec!["t_order".into()])
            .insert(Some(Insert {
                columns: vec!["status".into()],
                tuples: vec![
                    vec![Operand::Value(Datum::from("new"))],
                    vec![Operand::Value(Datum::from("new"))],
                ],
            }))
            .build()
            .unwrap();

        let route = router.route(&statement, &Parameters::default()).unwrap();
        let key = route.generated_key().unwrap();
        assert_eq!(key.column(), "order_id");
        assert_eq!(key.values().len(), 2);
        assert!(!route.context().is_empty());
    }

    #[test]
    fn test_routing_is_idempotent() {
        let router = router();
        let statement = StatementBuilder::default()
            .tables(vec!["t_order".into()])
            .where_clause(Some(Predicate::Comparison(Comparison::in_list(
                "order_id",
                vec![1.into(), 2.into(), 3.into()],
            ))))
            .build()
            .unwrap();

        let first = router.route(&statement, &Parameters::default()).unwrap();
        let second = router.route(&statement, &Parameters::default()).unwrap();
        assert_eq!(first.into_context(), second.into_context());
    }
}
