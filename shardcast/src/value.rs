//! Scalar values flowing through routing and merging.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Add;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use shardcast_config::FlexibleType;
use uuid::Uuid;

/// Wrapper for f64 that implements Ord,
/// with NaN greater than all other values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Double(pub f64);

impl PartialOrd for Double {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Double {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.is_nan(), other.0.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal),
        }
    }
}

impl Eq for Double {}

impl Hash for Double {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// A column value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Datum {
    #[default]
    Null,
    Boolean(bool),
    Bigint(i64),
    Double(Double),
    Numeric(Decimal),
    Text(String),
    Uuid(Uuid),
}

impl Datum {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Numeric view of the value, if it has one.
    pub fn decimal(&self) -> Option<Decimal> {
        match self {
            Datum::Bigint(i) => Some(Decimal::from(*i)),
            Datum::Double(d) => Decimal::from_f64(d.0),
            Datum::Numeric(d) => Some(*d),
            _ => None,
        }
    }

    /// Integer view of the value, used by the modulo algorithm.
    pub fn integer(&self) -> Option<i64> {
        match self {
            Datum::Bigint(i) => Some(*i),
            Datum::Numeric(d) => d.to_i64(),
            _ => None,
        }
    }

    /// Canonical bytes for hash sharding. Stable across
    /// text/binary origins of the same value.
    pub fn canonical_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Datum::Bigint(i) => Some(i.to_be_bytes().to_vec()),
            Datum::Uuid(u) => Some(u.as_bytes().to_vec()),
            Datum::Text(s) => Some(s.as_bytes().to_vec()),
            Datum::Numeric(d) => Some(d.to_string().into_bytes()),
            _ => None,
        }
    }

    /// Product of two numeric values, used to reconstruct
    /// a distributed AVG from per-shard (avg, count) pairs.
    pub fn multiply(&self, other: &Datum) -> Option<Datum> {
        let (left, right) = (self.decimal()?, other.decimal()?);
        Some(Datum::Numeric(left * right))
    }

    /// Quotient of two numeric values. None when the divisor
    /// is zero or either side isn't numeric.
    pub fn divide(&self, other: &Datum) -> Option<Datum> {
        let (left, right) = (self.decimal()?, other.decimal()?);
        if right.is_zero() {
            return None;
        }
        Some(Datum::Numeric(left / right))
    }

    fn rank(&self) -> u8 {
        match self {
            Datum::Null => 0,
            Datum::Boolean(_) => 1,
            Datum::Bigint(_) | Datum::Double(_) | Datum::Numeric(_) => 2,
            Datum::Text(_) => 3,
            Datum::Uuid(_) => 4,
        }
    }
}

impl PartialOrd for Datum {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Datum {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Datum::Boolean(a), Datum::Boolean(b)) => a.cmp(b),
            (Datum::Bigint(a), Datum::Bigint(b)) => a.cmp(b),
            (Datum::Double(a), Datum::Double(b)) => a.cmp(b),
            (Datum::Numeric(a), Datum::Numeric(b)) => a.cmp(b),
            (Datum::Text(a), Datum::Text(b)) => a.cmp(b),
            (Datum::Uuid(a), Datum::Uuid(b)) => a.cmp(b),
            // Mixed numeric comparisons go through Decimal.
            (a, b) if a.rank() == 2 && b.rank() == 2 => match (a.decimal(), b.decimal()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => Ordering::Equal,
            },
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

/// Numeric addition with promotion; used by the
/// aggregate accumulators. NULL is the identity.
impl Add for Datum {
    type Output = Datum;

    fn add(self, other: Datum) -> Datum {
        match (self, other) {
            (Datum::Null, other) => other,
            (s, Datum::Null) => s,
            (Datum::Bigint(a), Datum::Bigint(b)) => Datum::Bigint(a.wrapping_add(b)),
            (Datum::Double(a), Datum::Double(b)) => Datum::Double(Double(a.0 + b.0)),
            (a, b) => match (a.decimal(), b.decimal()) {
                (Some(a), Some(b)) => Datum::Numeric(a + b),
                _ => Datum::Null,
            },
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => write!(f, "NULL"),
            Datum::Boolean(b) => write!(f, "{}", b),
            Datum::Bigint(i) => write!(f, "{}", i),
            Datum::Double(d) => write!(f, "{}", d.0),
            Datum::Numeric(d) => write!(f, "{}", d),
            Datum::Text(s) => write!(f, "{}", s),
            Datum::Uuid(u) => write!(f, "{}", u),
        }
    }
}

impl From<i64> for Datum {
    fn from(value: i64) -> Self {
        Datum::Bigint(value)
    }
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Datum::Double(Double(value))
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Datum::Text(value.to_string())
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Datum::Text(value)
    }
}

impl From<Uuid> for Datum {
    fn from(value: Uuid) -> Self {
        Datum::Uuid(value)
    }
}

impl From<Decimal> for Datum {
    fn from(value: Decimal) -> Self {
        Datum::Numeric(value)
    }
}

impl From<bool> for Datum {
    fn from(value: bool) -> Self {
        Datum::Boolean(value)
    }
}

impl From<&FlexibleType> for Datum {
    fn from(value: &FlexibleType) -> Self {
        match value {
            FlexibleType::Integer(i) => Datum::Bigint(*i),
            FlexibleType::Uuid(u) => Datum::Uuid(*u),
            FlexibleType::String(s) => Datum::Text(s.clone()),
        }
    }
}
