//! Row comparator shared by the stream and memory merges.

use std::cmp::Ordering;

use crate::statement::{NullsOrder, OrderBy};
use crate::value::Datum;

/// Compare two rows by the statement's ORDER BY items. Ties on
/// one item fall through to the next. NULL placement follows the
/// item's nulls ordering and isn't flipped by direction,
/// matching SQL `NULLS FIRST`/`NULLS LAST`.
pub fn compare_rows(left: &[Datum], right: &[Datum], order_by: &[OrderBy]) -> Ordering {
    for item in order_by {
        let a = left.get(item.column).unwrap_or(&Datum::Null);
        let b = right.get(item.column).unwrap_or(&Datum::Null);

        let ordering = match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => match item.nulls {
                NullsOrder::First => Ordering::Less,
                NullsOrder::Last => Ordering::Greater,
            },
            (false, true) => match item.nulls {
                NullsOrder::First => Ordering::Greater,
                NullsOrder::Last => Ordering::Less,
            },
            (false, false) => {
                let ordering = a.cmp(b);
                if item.is_asc() {
                    ordering
                } else {
                    ordering.reverse()
                }
            }
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}
