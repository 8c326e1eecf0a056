//! Memory merge: drain every shard up front, regroup partial
//! aggregates, dedupe, sort. The only strategy with O(rows)
//! memory, deliberately the fallback.
//!
//! Input rows carry per-shard partials: a COUNT column holds
//! each shard's partial count, AVG arrives as an (avg, count)
//! pair with the count pushed into a helper column by the
//! rewriter.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use super::comparator::compare_rows;
use super::cursor::{fetch_row, QueryResult, Rows};
use super::{Error, MergedResult};
use crate::statement::{AggregateFunction, AggregateTarget, DistinctBy, Statement};
use crate::value::Datum;

pub struct MemoryMergedResult {
    rows: Rows,
}

impl MemoryMergedResult {
    pub fn new(results: Vec<Box<dyn QueryResult>>, statement: &Statement) -> Result<Self, Error> {
        let aggregate = statement.aggregate();
        for target in aggregate.targets() {
            if *target.function() == AggregateFunction::Avg && target.count_column().is_none() {
                return Err(Error::incompatible(
                    "AVG needs a pushed-down count helper column",
                ));
            }
        }

        let mut rows = drain(results)?;

        if !aggregate.is_empty() || !aggregate.group_by().is_empty() {
            rows = group(rows, aggregate.targets(), aggregate.group_by());
        }

        if let Some(distinct) = statement.distinct() {
            rows = dedupe(rows, distinct);
        }

        if !statement.order_by().is_empty() {
            rows.sort_by(|a, b| compare_rows(a, b, statement.order_by()));
        }

        debug!(rows = rows.len(), "memory merge materialized");
        Ok(Self {
            rows: Rows::new(rows),
        })
    }
}

impl MergedResult for MemoryMergedResult {
    fn advance(&mut self) -> Result<bool, Error> {
        Ok(self.rows.advance()?)
    }

    fn value(&self, column: usize) -> Result<&Datum, Error> {
        Ok(self.rows.value(column)?)
    }
}

fn drain(mut results: Vec<Box<dyn QueryResult>>) -> Result<Vec<Vec<Datum>>, Error> {
    let mut rows = vec![];
    for (shard, result) in results.iter_mut().enumerate() {
        loop {
            let advanced = result
                .advance()
                .map_err(|source| Error::source(shard, source))?;
            if !advanced {
                break;
            }
            rows.push(fetch_row(result.as_ref()).map_err(|source| Error::source(shard, source))?);
        }
    }
    Ok(rows)
}

/// Regroup per-shard partials. Groups keep first-seen order and
/// first-seen values for non-aggregated columns.
fn group(
    rows: Vec<Vec<Datum>>,
    targets: &[AggregateTarget],
    group_by: &[usize],
) -> Vec<Vec<Datum>> {
    let mut groups: IndexMap<Vec<Datum>, (Vec<Datum>, Vec<Accumulator>)> = IndexMap::new();

    for row in rows {
        let key: Vec<Datum> = group_by
            .iter()
            .map(|column| row.get(*column).cloned().unwrap_or_default())
            .collect();

        let (_, accumulators) = groups.entry(key).or_insert_with(|| {
            let accumulators = targets.iter().map(Accumulator::new).collect();
            (row.clone(), accumulators)
        });

        for (accumulator, target) in accumulators.iter_mut().zip(targets) {
            accumulator.accumulate(&row, target);
        }
    }

    groups
        .into_values()
        .map(|(mut row, accumulators)| {
            for (accumulator, target) in accumulators.into_iter().zip(targets) {
                if let Some(slot) = row.get_mut(target.column()) {
                    *slot = accumulator.finalize();
                }
            }
            row
        })
        .collect()
}

fn dedupe(rows: Vec<Vec<Datum>>, distinct: &DistinctBy) -> Vec<Vec<Datum>> {
    let mut seen = IndexSet::new();
    rows.into_iter()
        .filter(|row| {
            let key: Vec<Datum> = match distinct {
                DistinctBy::Row => row.clone(),
                DistinctBy::Columns(columns) => columns
                    .iter()
                    .map(|column| row.get(*column).cloned().unwrap_or_default())
                    .collect(),
            };
            seen.insert(key)
        })
        .collect()
}

/// Running state of one aggregate target across shard partials.
#[derive(Debug)]
enum Accumulator {
    Count(Datum),
    Sum(Datum),
    Min(Option<Datum>),
    Max(Option<Datum>),
    Avg(AvgState),
}

impl Accumulator {
    fn new(target: &AggregateTarget) -> Self {
        match target.function() {
            AggregateFunction::Count => Self::Count(Datum::Null),
            AggregateFunction::Sum => Self::Sum(Datum::Null),
            AggregateFunction::Min => Self::Min(None),
            AggregateFunction::Max => Self::Max(None),
            AggregateFunction::Avg => Self::Avg(AvgState::default()),
        }
    }

    fn accumulate(&mut self, row: &[Datum], target: &AggregateTarget) {
        let value = row.get(target.column()).cloned().unwrap_or_default();
        match self {
            Self::Count(total) | Self::Sum(total) => {
                *total = std::mem::take(total) + value;
            }
            Self::Min(smallest) => {
                if !value.is_null() && smallest.as_ref().map(|s| value < *s).unwrap_or(true) {
                    *smallest = Some(value);
                }
            }
            Self::Max(largest) => {
                if !value.is_null() && largest.as_ref().map(|l| value > *l).unwrap_or(true) {
                    *largest = Some(value);
                }
            }
            Self::Avg(state) => {
                let count = target
                    .count_column()
                    .and_then(|column| row.get(column))
                    .cloned()
                    .unwrap_or_default();
                state.accumulate(&value, &count);
            }
        }
    }

    fn finalize(self) -> Datum {
        match self {
            Self::Count(Datum::Null) => Datum::Bigint(0),
            Self::Count(total) | Self::Sum(total) => total,
            Self::Min(value) | Self::Max(value) => value.unwrap_or_default(),
            Self::Avg(state) => state.finalize(),
        }
    }
}

/// AVG reassembly: per-shard (avg, count) pairs accumulate as a
/// weighted sum, divided once at the end.
#[derive(Debug, Default)]
struct AvgState {
    weighted: Datum,
    count: Datum,
}

impl AvgState {
    fn accumulate(&mut self, avg: &Datum, count: &Datum) {
        if avg.is_null() || count.is_null() {
            return;
        }
        if let Some(product) = avg.multiply(count) {
            self.weighted = std::mem::take(&mut self.weighted) + product;
            self.count = std::mem::take(&mut self.count) + count.clone();
        }
    }

    fn finalize(self) -> Datum {
        self.weighted.divide(&self.count).unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::statement::{Aggregate, StatementBuilder};
    use rust_decimal::Decimal;

    fn results(shards: Vec<Vec<Vec<Datum>>>) -> Vec<Box<dyn QueryResult>> {
        shards
            .into_iter()
            .map(|rows| Box::new(Rows::new(rows)) as Box<dyn QueryResult>)
            .collect()
    }

    fn drain_merged(mut merged: MemoryMergedResult, columns: usize) -> Vec<Vec<Datum>> {
        let mut out = vec![];
        while merged.advance().unwrap() {
            out.push(
                (0..columns)
                    .map(|c| merged.value(c).unwrap().clone())
                    .collect(),
            );
        }
        out
    }

    #[test]
    fn test_group_by_sum() {
        // (group, value) split across two shards.
        let shards = results(vec![
            vec![
                vec![Datum::from("A"), Datum::Bigint(1)],
                vec![Datum::from("B"), Datum::Bigint(2)],
            ],
            vec![vec![Datum::from("A"), Datum::Bigint(3)]],
        ]);
        let statement = StatementBuilder::default()
            .aggregate(Aggregate::new_sum_group_by(1, &[0]))
            .build()
            .unwrap();

        let merged = MemoryMergedResult::new(shards, &statement).unwrap();
        let rows = drain_merged(merged, 2);
        assert_eq!(rows.len(), 2);
        assert!(rows.contains(&vec![Datum::from("A"), Datum::Bigint(4)]));
        assert!(rows.contains(&vec![Datum::from("B"), Datum::Bigint(2)]));
    }

    #[test]
    fn test_count_partials_sum_up() {
        let shards = results(vec![
            vec![vec![Datum::Bigint(10)]],
            vec![vec![Datum::Bigint(5)]],
        ]);
        let statement = StatementBuilder::default()
            .aggregate(Aggregate::new_count(0))
            .build()
            .unwrap();

        let merged = MemoryMergedResult::new(shards, &statement).unwrap();
        let rows = drain_merged(merged, 1);
        assert_eq!(rows, vec![vec![Datum::Bigint(15)]]);
    }

    #[test]
    fn test_avg_weighted_by_shard_counts() {
        // Shard A: avg 2 over 4 rows. Shard B: avg 5 over 2 rows.
        // Global avg: (8 + 10) / 6 = 3.
        let shards = results(vec![
            vec![vec![Datum::Bigint(2), Datum::Bigint(4)]],
            vec![vec![Datum::Bigint(5), Datum::Bigint(2)]],
        ]);
        let statement = StatementBuilder::default()
            .aggregate(Aggregate::new(
                vec![AggregateTarget::avg(0, 1)],
                vec![],
            ))
            .build()
            .unwrap();

        let merged = MemoryMergedResult::new(shards, &statement).unwrap();
        let rows = drain_merged(merged, 1);
        assert_eq!(rows[0][0], Datum::Numeric(Decimal::from(3)));
    }

    #[test]
    fn test_avg_without_count_column_is_rejected() {
        let shards = results(vec![vec![vec![Datum::Bigint(2)]]]);
        let statement = StatementBuilder::default()
            .aggregate(Aggregate::new(
                vec![AggregateTarget::new(0, AggregateFunction::Avg)],
                vec![],
            ))
            .build()
            .unwrap();

        let result = MemoryMergedResult::new(shards, &statement);
        assert!(matches!(result, Err(Error::IncompatibleShape { .. })));
    }

    #[test]
    fn test_distinct_rows() {
        let shards = results(vec![
            vec![vec![Datum::Bigint(1)], vec![Datum::Bigint(2)]],
            vec![vec![Datum::Bigint(2)], vec![Datum::Bigint(3)]],
        ]);
        let statement = StatementBuilder::default()
            .distinct(Some(DistinctBy::Row))
            .build()
            .unwrap();

        let merged = MemoryMergedResult::new(shards, &statement).unwrap();
        let rows = drain_merged(merged, 1);
        assert_eq!(
            rows,
            vec![
                vec![Datum::Bigint(1)],
                vec![Datum::Bigint(2)],
                vec![Datum::Bigint(3)]
            ]
        );
    }
}
