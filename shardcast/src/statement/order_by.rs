//! ORDER BY items, shared by all merge strategies.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullsOrder {
    First,
    #[default]
    Last,
}

/// ORDER BY <column> [ASC|DESC] [NULLS FIRST|LAST],
/// column resolved to a projection index by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: usize,
    pub direction: Direction,
    pub nulls: NullsOrder,
}

impl OrderBy {
    pub fn asc(column: usize) -> Self {
        Self {
            column,
            direction: Direction::Asc,
            nulls: NullsOrder::default(),
        }
    }

    pub fn desc(column: usize) -> Self {
        Self {
            column,
            direction: Direction::Desc,
            nulls: NullsOrder::default(),
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullsOrder::First;
        self
    }

    pub fn is_asc(&self) -> bool {
        self.direction == Direction::Asc
    }
}
