//! Routing engine family.
//!
//! A closed set of routing strategies, selected once per statement
//! by a decision table and dispatched exhaustively. Engines only
//! append route units; the context they build is write-once.

pub mod broadcast;
pub mod cartesian;
pub mod complex;
pub mod standard;
pub mod unicast;

use tracing::debug;

use super::algorithm::Algorithms;
use super::condition::ShardingCondition;
use super::context::{RouteContext, RouteMapper, RouteUnit};
use super::error::Error;
use super::schema::{ShardingSchema, TableRule};
use crate::statement::{Statement, StatementKind};

/// One routing strategy, bound to the tables it routes.
#[derive(Debug)]
pub enum RouteEngine<'a> {
    /// Statement touches nothing sharded; address the default
    /// data source.
    Ignore { tables: Vec<String> },
    /// One arbitrarily chosen shard.
    Unicast { tables: Vec<String> },
    /// Every data source.
    Broadcast { tables: Vec<String> },
    /// One sharded table, or a binding group routed together.
    /// The first rule is the primary.
    Standard { tables: Vec<&'a TableRule> },
    /// Multiple independently sharded tables.
    Complex { tables: Vec<&'a TableRule> },
    /// Federation-required cross product.
    Cartesian { tables: Vec<&'a TableRule> },
}

impl<'a> RouteEngine<'a> {
    /// Decision table, evaluated once per statement.
    pub fn select(statement: &Statement, schema: &'a ShardingSchema) -> Result<Self, Error> {
        let tables = statement.tables().to_vec();
        let sharded = schema.sharded_rules(statement.tables());

        let engine = match statement.kind() {
            StatementKind::Tcl => Self::Ignore { tables },

            StatementKind::Ddl => {
                if sharded.is_empty() && !tables.iter().any(|table| schema.is_broadcast(table)) {
                    Self::Ignore { tables }
                } else {
                    Self::Broadcast { tables }
                }
            }

            StatementKind::Dal => {
                if sharded.len() > 1 {
                    return Err(Error::UnsupportedMultiTableUnicast {
                        tables: sharded.iter().map(|rule| rule.name().to_string()).collect(),
                    });
                }
                Self::Unicast { tables }
            }

            StatementKind::Select
            | StatementKind::Insert
            | StatementKind::Update
            | StatementKind::Delete => {
                let all_broadcast = !tables.is_empty()
                    && tables.iter().all(|table| schema.is_broadcast(table));

                if all_broadcast {
                    // Broadcast tables are identical everywhere, so a
                    // read can go to any one shard; writes fan out.
                    if statement.kind() == StatementKind::Select {
                        Self::Unicast { tables }
                    } else {
                        Self::Broadcast { tables }
                    }
                } else if tables.iter().any(|table| schema.is_broadcast(table))
                    && sharded.is_empty()
                {
                    // Mixed broadcast and plain tables; writes still
                    // have to reach every replica.
                    if statement.kind() == StatementKind::Select {
                        Self::Ignore { tables }
                    } else {
                        Self::Broadcast { tables }
                    }
                } else if sharded.is_empty() {
                    Self::Ignore { tables }
                } else if statement.federation_required() {
                    Self::Cartesian { tables: sharded }
                } else if sharded.len() == 1 || schema.same_binding_group(&sharded) {
                    Self::Standard { tables: sharded }
                } else {
                    Self::Complex { tables: sharded }
                }
            }
        };

        debug!(engine = engine.name(), "routing engine selected");
        Ok(engine)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ignore { .. } => "ignore",
            Self::Unicast { .. } => "unicast",
            Self::Broadcast { .. } => "broadcast",
            Self::Standard { .. } => "standard",
            Self::Complex { .. } => "complex",
            Self::Cartesian { .. } => "cartesian",
        }
    }

    /// Compute the route context.
    pub fn route(
        &self,
        schema: &ShardingSchema,
        conditions: &[ShardingCondition],
        algorithms: &Algorithms,
    ) -> Result<RouteContext, Error> {
        match self {
            Self::Ignore { tables } => Ok(ignore(schema, tables)),
            Self::Unicast { tables } => unicast::route(schema, tables),
            Self::Broadcast { tables } => Ok(broadcast::route(schema, tables)),
            Self::Standard { tables } => standard::route(tables, conditions, algorithms),
            Self::Complex { tables } => complex::route(schema, tables, conditions, algorithms),
            Self::Cartesian { tables } => {
                cartesian::route(schema, tables, conditions, algorithms)
            }
        }
    }
}

/// Pass-through: one unit at the default data source, nothing
/// renamed.
fn ignore(schema: &ShardingSchema, tables: &[String]) -> RouteContext {
    let mut context = RouteContext::default();
    context.push(RouteUnit::new(
        RouteMapper::same(schema.default_data_source()),
        tables.iter().map(RouteMapper::same).collect(),
    ));
    context
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::statement::StatementBuilder;
    use shardcast_config::Config;

    fn schema() -> ShardingSchema {
        let config = Config::from_str(
            r#"
data_sources = ["ds_0", "ds_1"]
broadcast_tables = ["t_config", "t_dict"]

[[sharded_tables]]
name = "t_order"
column = "order_id"
algorithm = "mod2"
data_nodes = ["ds_0.t_order_0", "ds_1.t_order_1"]

[[sharded_tables]]
name = "t_order_item"
column = "order_id"
algorithm = "mod2"
data_nodes = ["ds_0.t_order_item_0", "ds_1.t_order_item_1"]

[[sharded_tables]]
name = "t_user"
column = "user_id"
algorithm = "mod2"
data_nodes = ["ds_0.t_user_0", "ds_1.t_user_1"]

[[algorithms]]
name = "mod2"
kind = "modulo"
shards = 2

[[binding_tables]]
tables = ["t_order", "t_order_item"]
"#,
        )
        .unwrap();
        ShardingSchema::new(&config).unwrap()
    }

    fn statement(kind: StatementKind, tables: &[&str]) -> Statement {
        StatementBuilder::default()
            .kind(kind)
            .tables(tables.iter().map(|t| t.to_string()).collect())
            .build()
            .unwrap()
    }

    #[test]
    fn test_decision_table() {
        let schema = schema();

        let engine =
            RouteEngine::select(&statement(StatementKind::Tcl, &[]), &schema).unwrap();
        assert!(matches!(engine, RouteEngine::Ignore { .. }));

        let engine =
            RouteEngine::select(&statement(StatementKind::Ddl, &["t_order"]), &schema).unwrap();
        assert!(matches!(engine, RouteEngine::Broadcast { .. }));

        let engine =
            RouteEngine::select(&statement(StatementKind::Dal, &["t_order"]), &schema).unwrap();
        assert!(matches!(engine, RouteEngine::Unicast { .. }));

        let engine =
            RouteEngine::select(&statement(StatementKind::Select, &["t_plain"]), &schema)
                .unwrap();
        assert!(matches!(engine, RouteEngine::Ignore { .. }));

        let engine =
            RouteEngine::select(&statement(StatementKind::Select, &["t_order"]), &schema)
                .unwrap();
        assert!(matches!(engine, RouteEngine::Standard { .. }));

        let engine = RouteEngine::select(
            &statement(StatementKind::Select, &["t_order", "t_order_item"]),
            &schema,
        )
        .unwrap();
        assert!(matches!(engine, RouteEngine::Standard { tables } if tables.len() == 2));

        let engine = RouteEngine::select(
            &statement(StatementKind::Select, &["t_order", "t_user"]),
            &schema,
        )
        .unwrap();
        assert!(matches!(engine, RouteEngine::Complex { .. }));
    }

    #[test]
    fn test_broadcast_only_select_goes_unicast() {
        let schema = schema();
        let engine = RouteEngine::select(
            &statement(StatementKind::Select, &["t_config", "t_dict"]),
            &schema,
        )
        .unwrap();
        assert!(matches!(engine, RouteEngine::Unicast { .. }));

        let engine = RouteEngine::select(
            &statement(StatementKind::Update, &["t_config"]),
            &schema,
        )
        .unwrap();
        assert!(matches!(engine, RouteEngine::Broadcast { .. }));
    }

    #[test]
    fn test_multi_table_unicast_is_an_error() {
        let schema = schema();
        let result = RouteEngine::select(
            &statement(StatementKind::Dal, &["t_order", "t_user"]),
            &schema,
        );
        assert!(matches!(
            result,
            Err(Error::UnsupportedMultiTableUnicast { tables }) if tables.len() == 2
        ));
    }

    #[test]
    fn test_federation_goes_cartesian() {
        let schema = schema();
        let stmt = StatementBuilder::default()
            .tables(vec!["t_order".into(), "t_user".into()])
            .federation_required(true)
            .build()
            .unwrap();
        let engine = RouteEngine::select(&stmt, &schema).unwrap();
        assert!(matches!(engine, RouteEngine::Cartesian { .. }));
    }

    #[test]
    fn test_ignore_routes_to_default() {
        let schema = schema();
        let engine =
            RouteEngine::select(&statement(StatementKind::Tcl, &[]), &schema).unwrap();
        let context = engine
            .route(&schema, &[], &Algorithms::default())
            .unwrap();
        assert_eq!(context.len(), 1);
        assert_eq!(context.data_sources().first().copied(), Some("ds_0"));
    }
}
