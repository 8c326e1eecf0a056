//! End-to-end checks of the routing and merging contracts,
//! driven through the public API.

use shardcast::merge::{Error as MergeError, MergeEngine, MergedResult, QueryResult, Rows};
use shardcast::router::RouteContext;
use shardcast::statement::{
    Comparison, Limit, Operand, OrderBy, Predicate, StatementBuilder, StatementKind,
};
use shardcast::{Datum, Router};
use shardcast_config::Config;

fn router(shards: usize) -> Router {
    let data_sources: Vec<String> = (0..shards).map(|i| format!("\"ds_{i}\"")).collect();
    let data_nodes: Vec<String> = (0..shards)
        .map(|i| format!("\"ds_{i}.t_order_{i}\""))
        .collect();
    let config = Config::from_str(&format!(
        r#"
data_sources = [{}]

[[sharded_tables]]
name = "t_order"
column = "order_id"
algorithm = "by_mod"
data_nodes = [{}]

[[algorithms]]
name = "by_mod"
kind = "modulo"
shards = {}
"#,
        data_sources.join(", "),
        data_nodes.join(", "),
        shards,
    ))
    .unwrap();
    Router::new(&config).unwrap()
}

fn in_list(values: &[i64]) -> shardcast::statement::Statement {
    StatementBuilder::default()
        .tables(vec!["t_order".into()])
        .where_clause(Some(Predicate::Comparison(Comparison::in_list(
            "order_id",
            values.iter().map(|v| Operand::from(*v)).collect(),
        ))))
        .build()
        .unwrap()
}

fn shard(values: &[i64]) -> Box<dyn QueryResult> {
    Box::new(Rows::new(
        values.iter().map(|v| vec![Datum::Bigint(*v)]).collect(),
    ))
}

fn drain(mut merged: Box<dyn MergedResult>) -> Vec<i64> {
    let mut out = vec![];
    while merged.advance().unwrap() {
        match merged.value(0).unwrap() {
            Datum::Bigint(v) => out.push(*v),
            other => panic!("unexpected value {other}"),
        }
    }
    out
}

// Equality routing reaches exactly {v mod K : v in values},
// nothing more.
#[test]
fn modulo_routing_is_deterministic() {
    let router = router(4);
    let values = [3, 7, 11, 14];

    let route = router.route(&in_list(&values), &Default::default()).unwrap();
    let mut expected: Vec<String> = values
        .iter()
        .map(|v| format!("t_order_{}", v.rem_euclid(4)))
        .collect();
    expected.sort();
    expected.dedup();

    let mut actual: Vec<String> = route
        .context()
        .units()
        .map(|unit| unit.actual_table("t_order").unwrap().to_string())
        .collect();
    actual.sort();
    assert_eq!(actual, expected);
}

// A sharded table never routes to an empty context silently.
#[test]
fn routing_is_total() {
    let router = router(2);

    // Contradictory equality conditions have no target shard.
    let statement = StatementBuilder::default()
        .tables(vec!["t_order".into()])
        .where_clause(Some(Predicate::And(vec![
            Predicate::Comparison(Comparison::eq("order_id", 0.into())),
            Predicate::Comparison(Comparison::eq("order_id", 1.into())),
        ])))
        .build()
        .unwrap();

    let result = router.route(&statement, &Default::default());
    assert!(matches!(
        result,
        Err(shardcast::router::Error::NoTargetFound { table }) if table == "t_order"
    ));
}

#[test]
fn repeated_routing_is_set_equal() {
    let router = router(3);
    let statement = in_list(&[1, 2, 3, 4, 5]);

    let contexts: Vec<RouteContext> = (0..5)
        .map(|_| {
            router
                .route(&statement, &Default::default())
                .unwrap()
                .into_context()
        })
        .collect();
    for context in &contexts[1..] {
        assert_eq!(context, &contexts[0]);
    }
}

#[test]
fn unicast_always_lands_on_a_configured_node() {
    let router = router(3);
    let statement = StatementBuilder::default()
        .kind(StatementKind::Dal)
        .tables(vec!["t_order".into()])
        .build()
        .unwrap();

    for _ in 0..50 {
        let route = router.route(&statement, &Default::default()).unwrap();
        assert_eq!(route.context().len(), 1);
        let unit = route.context().units().next().unwrap();
        let table = unit.actual_table("t_order").unwrap();
        assert!(["t_order_0", "t_order_1", "t_order_2"].contains(&table));
    }
}

// Stream merge produces a non-decreasing sequence and keeps
// every input row, for 1, 2 and 5 shards, duplicates included.
#[test]
fn stream_merge_preserves_order_and_count() {
    let inputs: Vec<Vec<Vec<i64>>> = vec![
        vec![vec![1, 2, 2, 9]],
        vec![vec![1, 4, 7], vec![2, 4, 5]],
        vec![
            vec![1, 6],
            vec![2, 2, 7],
            vec![],
            vec![3, 3, 3],
            vec![5, 8, 8],
        ],
    ];
    let statement = StatementBuilder::default()
        .order_by(vec![OrderBy::asc(0)])
        .build()
        .unwrap();

    for shards in inputs {
        let total: usize = shards.iter().map(|s| s.len()).sum();
        let results = shards.iter().map(|s| shard(s)).collect();

        let merged = MergeEngine::merge(results, &statement).unwrap();
        let out = drain(merged);

        assert_eq!(out.len(), total);
        assert!(out.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}

// 3 shards × rows [1..5], offset 6 count 4 => ranks 7..10 of
// the ordered sequence; an offset past the end yields nothing.
#[test]
fn pagination_returns_the_requested_window() {
    let rows = [1, 2, 3, 4, 5];
    let statement = StatementBuilder::default()
        .order_by(vec![OrderBy::asc(0)])
        .limit(Some(Limit::offset_count(6, 4)))
        .build()
        .unwrap();

    let merged = MergeEngine::merge(
        vec![shard(&rows), shard(&rows), shard(&rows)],
        &statement,
    )
    .unwrap();
    // Ordered: 1,1,1,2,2,2,3,3,3,4,4,4,5,5,5 — ranks 7..10.
    assert_eq!(drain(merged), vec![3, 3, 3, 4]);

    let statement = StatementBuilder::default()
        .order_by(vec![OrderBy::asc(0)])
        .limit(Some(Limit::offset_count(20, 5)))
        .build()
        .unwrap();
    let merged = MergeEngine::merge(
        vec![shard(&rows), shard(&rows), shard(&rows)],
        &statement,
    )
    .unwrap();
    assert_eq!(drain(merged), Vec::<i64>::new());
}

// Group-by reassembly is independent of which shard delivered
// which rows.
#[test]
fn group_by_sum_is_interleaving_independent() {
    use shardcast::statement::Aggregate;

    let splits: Vec<Vec<Vec<(&str, i64)>>> = vec![
        vec![vec![("A", 1), ("B", 2)], vec![("A", 3)]],
        vec![vec![("A", 3)], vec![("B", 2), ("A", 1)]],
        vec![vec![("B", 2)], vec![("A", 1), ("A", 3)]],
    ];
    let statement = StatementBuilder::default()
        .aggregate(Aggregate::new_sum_group_by(1, &[0]))
        .build()
        .unwrap();

    for split in splits {
        let results: Vec<Box<dyn QueryResult>> = split
            .into_iter()
            .map(|rows| {
                Box::new(Rows::new(
                    rows.into_iter()
                        .map(|(g, v)| vec![Datum::from(g), Datum::Bigint(v)])
                        .collect(),
                )) as Box<dyn QueryResult>
            })
            .collect();

        let mut merged = MergeEngine::merge(results, &statement).unwrap();
        let mut sums = std::collections::HashMap::new();
        while merged.advance().unwrap() {
            let group = merged.value(0).unwrap().to_string();
            let sum = match merged.value(1).unwrap() {
                Datum::Bigint(v) => *v,
                other => panic!("unexpected value {other}"),
            };
            sums.insert(group, sum);
        }

        assert_eq!(sums.len(), 2);
        assert_eq!(sums["A"], 4);
        assert_eq!(sums["B"], 2);
    }
}

/// Cursor that fails mid-stream, like a shard connection drop.
struct FailingResult {
    inner: Rows,
    rows_before_failure: usize,
    delivered: usize,
}

impl QueryResult for FailingResult {
    fn advance(&mut self) -> Result<bool, shardcast::merge::cursor::Error> {
        if self.delivered >= self.rows_before_failure {
            return Err(shardcast::merge::cursor::Error::Backend(
                "connection reset".into(),
            ));
        }
        self.delivered += 1;
        self.inner.advance()
    }

    fn value(&self, column: usize) -> Result<&Datum, shardcast::merge::cursor::Error> {
        self.inner.value(column)
    }

    fn columns(&self) -> usize {
        self.inner.columns()
    }
}

#[test]
fn failing_shard_cancels_the_merge() {
    let failing = FailingResult {
        inner: Rows::new(vec![vec![Datum::Bigint(1)], vec![Datum::Bigint(2)]]),
        rows_before_failure: 1,
        delivered: 0,
    };
    let results: Vec<Box<dyn QueryResult>> = vec![shard(&[5, 6]), Box::new(failing)];
    let statement = StatementBuilder::default().build().unwrap();

    let mut merged = MergeEngine::merge(results, &statement).unwrap();
    let mut result = Ok(true);
    while matches!(result, Ok(true)) {
        result = merged.advance();
    }
    assert!(matches!(
        result,
        Err(MergeError::SourceFailed { shard: 1, .. })
    ));
}
