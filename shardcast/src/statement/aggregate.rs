//! Aggregate functions present in the projection.

/// Distributed aggregate functions the merge engine
/// can reassemble from per-shard partials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Avg => "avg",
        }
    }
}

/// One aggregate in the projection.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTarget {
    column: usize,
    function: AggregateFunction,
    /// AVG is reassembled from per-shard (avg, count) pairs.
    /// The rewriter pushes the COUNT into this helper column.
    count_column: Option<usize>,
}

impl AggregateTarget {
    pub fn new(column: usize, function: AggregateFunction) -> Self {
        Self {
            column,
            function,
            count_column: None,
        }
    }

    pub fn avg(column: usize, count_column: usize) -> Self {
        Self {
            column,
            function: AggregateFunction::Avg,
            count_column: Some(count_column),
        }
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn function(&self) -> &AggregateFunction {
        &self.function
    }

    pub fn count_column(&self) -> Option<usize> {
        self.count_column
    }
}

/// Aggregation shape of a statement: its aggregate
/// targets and GROUP BY columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregate {
    targets: Vec<AggregateTarget>,
    group_by: Vec<usize>,
}

impl Aggregate {
    pub fn new(targets: Vec<AggregateTarget>, group_by: Vec<usize>) -> Self {
        Self { targets, group_by }
    }

    pub fn targets(&self) -> &[AggregateTarget] {
        &self.targets
    }

    pub fn group_by(&self) -> &[usize] {
        &self.group_by
    }

    pub fn new_count(column: usize) -> Self {
        Self {
            targets: vec![AggregateTarget::new(column, AggregateFunction::Count)],
            group_by: vec![],
        }
    }

    pub fn new_sum_group_by(column: usize, group_by: &[usize]) -> Self {
        Self {
            targets: vec![AggregateTarget::new(column, AggregateFunction::Sum)],
            group_by: group_by.to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }
}
