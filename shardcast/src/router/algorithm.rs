//! Sharding algorithms.
//!
//! Algorithms live in an explicit [`Algorithms`] registry handed to
//! the router at construction, so tests can substitute fixtures
//! without process-wide state.

use fnv::FnvHasher;
use std::collections::HashMap;
use std::hash::Hasher;
use tracing::{debug, trace};

use shardcast_config::{self as config, AlgorithmKind};

use super::condition::Bound;
use crate::value::Datum;

/// Candidate shards for one sharding value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shard {
    /// Direct-to-shard number.
    Direct(usize),
    /// Multiple shards, enumerated.
    Multi(Vec<usize>),
    /// All shards.
    All,
}

impl Shard {
    pub fn is_all(&self) -> bool {
        matches!(self, Shard::All)
    }

    /// Concrete shard numbers, bounded by the table's node count.
    pub fn indexes(&self, total: usize) -> Vec<usize> {
        match self {
            Shard::Direct(shard) => vec![*shard].into_iter().filter(|s| *s < total).collect(),
            Shard::Multi(shards) => shards.iter().copied().filter(|s| *s < total).collect(),
            Shard::All => (0..total).collect(),
        }
    }
}

/// A sharding algorithm bound to its configuration.
#[derive(Debug, Clone)]
pub enum ShardingAlgorithm {
    /// Shard number is the value modulo the shard count.
    Modulo { shards: usize },
    /// FNV hash of the value's canonical bytes, modulo shard count.
    Hash { shards: usize },
    /// Explicit intervals, start inclusive, end exclusive.
    Range(RangeShards),
    /// Explicit value lists.
    List(ListShards),
}

impl ShardingAlgorithm {
    /// Candidate shards for a point value.
    pub fn shard(&self, value: &Datum) -> Shard {
        match self {
            Self::Modulo { shards } => {
                trace!("sharding by modulo");
                match value.integer() {
                    Some(integer) => Shard::Direct(integer.rem_euclid(*shards as i64) as usize),
                    None => {
                        debug!("modulo sharding value isn't an integer, fanning out");
                        Shard::All
                    }
                }
            }

            Self::Hash { shards } => {
                trace!("sharding by hash");
                match value.canonical_bytes() {
                    Some(bytes) => {
                        let mut hasher = FnvHasher::default();
                        hasher.write(&bytes);
                        Shard::Direct(hasher.finish() as usize % shards)
                    }
                    None => Shard::All,
                }
            }

            Self::Range(ranges) => {
                trace!("sharding by range");
                ranges.shard(value)
            }

            Self::List(lists) => {
                trace!("sharding by list");
                lists.shard(value)
            }
        }
    }

    /// Candidate shards for an interval condition. Hash-family
    /// algorithms can't bound an interval and fan out.
    pub fn shard_range(&self, lower: &Bound, upper: &Bound) -> Shard {
        match self {
            Self::Modulo { .. } | Self::Hash { .. } | Self::List(_) => Shard::All,
            Self::Range(ranges) => ranges.intersecting(lower, upper),
        }
    }

    pub fn from_config(algorithm: &config::Algorithm) -> Self {
        match algorithm.kind {
            AlgorithmKind::Modulo => Self::Modulo {
                shards: algorithm.shards,
            },
            AlgorithmKind::Hash => Self::Hash {
                shards: algorithm.shards,
            },
            AlgorithmKind::Range => Self::Range(RangeShards::new(&algorithm.ranges)),
            AlgorithmKind::List => Self::List(ListShards::new(&algorithm.lists)),
        }
    }
}

/// Interval-to-shard mapping.
#[derive(Debug, Clone, Default)]
pub struct RangeShards {
    ranges: Vec<RangeMapping>,
}

#[derive(Debug, Clone)]
struct RangeMapping {
    start: Option<Datum>,
    end: Option<Datum>,
    shard: usize,
}

impl RangeShards {
    pub fn new(mappings: &[config::RangeMapping]) -> Self {
        let ranges = mappings
            .iter()
            .map(|mapping| RangeMapping {
                start: mapping.start.as_ref().map(Datum::from),
                end: mapping.end.as_ref().map(Datum::from),
                shard: mapping.shard,
            })
            .collect();
        Self { ranges }
    }

    fn shard(&self, value: &Datum) -> Shard {
        for mapping in &self.ranges {
            if mapping.contains(value) {
                return Shard::Direct(mapping.shard);
            }
        }
        debug!("range sharding value outside all partitions, fanning out");
        Shard::All
    }

    /// Every shard whose partition interval intersects
    /// [lower, upper]. No intersection means no targets.
    fn intersecting(&self, lower: &Bound, upper: &Bound) -> Shard {
        let shards: Vec<usize> = self
            .ranges
            .iter()
            .filter(|mapping| mapping.intersects(lower, upper))
            .map(|mapping| mapping.shard)
            .collect();
        Shard::Multi(shards)
    }
}

impl RangeMapping {
    fn contains(&self, value: &Datum) -> bool {
        let after_start = match &self.start {
            Some(start) => value >= start,
            None => true,
        };
        let before_end = match &self.end {
            Some(end) => value < end,
            None => true,
        };
        after_start && before_end
    }

    /// Partition [start, end) intersects the condition interval
    /// unless one ends before the other starts.
    fn intersects(&self, lower: &Bound, upper: &Bound) -> bool {
        // Condition entirely above the partition.
        if let (Some(end), Some(value)) = (&self.end, lower.value()) {
            if value >= end {
                return false;
            }
        }
        // Condition entirely below the partition.
        if let (Some(start), Some(value)) = (&self.start, upper.value()) {
            match upper {
                Bound::Excluded(_) if value <= start => return false,
                Bound::Included(_) if value < start => return false,
                _ => (),
            }
        }
        true
    }
}

/// Value-list-to-shard mapping.
#[derive(Debug, Clone, Default)]
pub struct ListShards {
    mapping: HashMap<Datum, usize>,
}

impl ListShards {
    pub fn new(mappings: &[config::ListMapping]) -> Self {
        let mut mapping = HashMap::new();
        for map in mappings {
            for value in &map.values {
                mapping.insert(Datum::from(value), map.shard);
            }
        }
        Self { mapping }
    }

    fn shard(&self, value: &Datum) -> Shard {
        match self.mapping.get(value) {
            Some(shard) => Shard::Direct(*shard),
            None => {
                debug!("list sharding value not mapped, fanning out");
                Shard::All
            }
        }
    }
}

/// Algorithm registry, keyed by the name sharded tables
/// reference in their rules.
#[derive(Debug, Clone, Default)]
pub struct Algorithms {
    algorithms: HashMap<String, ShardingAlgorithm>,
}

impl Algorithms {
    pub fn from_config(config: &config::Config) -> Self {
        let mut registry = Self::default();
        for algorithm in &config.algorithms {
            registry.insert(&algorithm.name, ShardingAlgorithm::from_config(algorithm));
        }
        registry
    }

    pub fn insert(&mut self, name: impl Into<String>, algorithm: ShardingAlgorithm) {
        self.algorithms.insert(name.into(), algorithm);
    }

    pub fn get(&self, name: &str) -> Option<&ShardingAlgorithm> {
        self.algorithms.get(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_modulo() {
        let algorithm = ShardingAlgorithm::Modulo { shards: 4 };
        assert_eq!(algorithm.shard(&Datum::Bigint(10)), Shard::Direct(2));
        assert_eq!(algorithm.shard(&Datum::Bigint(-1)), Shard::Direct(3));
        assert_eq!(algorithm.shard(&Datum::from("abc")), Shard::All);
        assert_eq!(
            algorithm.shard_range(&Bound::Included(Datum::Bigint(0)), &Bound::Unbounded),
            Shard::All
        );
    }

    #[test]
    fn test_hash_is_stable() {
        let algorithm = ShardingAlgorithm::Hash { shards: 8 };
        let first = algorithm.shard(&Datum::from("user@test.com"));
        let second = algorithm.shard(&Datum::from("user@test.com"));
        assert_eq!(first, second);
        assert!(matches!(first, Shard::Direct(shard) if shard < 8));
    }

    #[test]
    fn test_range_point_and_interval() {
        let ranges = RangeShards::new(&[
            config::RangeMapping {
                start: None,
                end: Some(100.into()),
                shard: 0,
            },
            config::RangeMapping {
                start: Some(100.into()),
                end: Some(200.into()),
                shard: 1,
            },
            config::RangeMapping {
                start: Some(200.into()),
                end: None,
                shard: 2,
            },
        ]);
        let algorithm = ShardingAlgorithm::Range(ranges);

        assert_eq!(algorithm.shard(&Datum::Bigint(99)), Shard::Direct(0));
        assert_eq!(algorithm.shard(&Datum::Bigint(100)), Shard::Direct(1));
        assert_eq!(algorithm.shard(&Datum::Bigint(500)), Shard::Direct(2));

        // 150 <= x < 250 intersects partitions 1 and 2.
        let shard = algorithm.shard_range(
            &Bound::Included(Datum::Bigint(150)),
            &Bound::Excluded(Datum::Bigint(250)),
        );
        assert_eq!(shard, Shard::Multi(vec![1, 2]));

        // x < 50 only touches the first partition.
        let shard =
            algorithm.shard_range(&Bound::Unbounded, &Bound::Excluded(Datum::Bigint(50)));
        assert_eq!(shard, Shard::Multi(vec![0]));

        // x BETWEEN 100 AND 100: exactly the partition boundary.
        let shard = algorithm.shard_range(
            &Bound::Included(Datum::Bigint(100)),
            &Bound::Included(Datum::Bigint(100)),
        );
        assert_eq!(shard, Shard::Multi(vec![1]));
    }

    #[test]
    fn test_list() {
        let lists = ListShards::new(&[
            config::ListMapping {
                values: vec!["eu".into(), "uk".into()],
                shard: 0,
            },
            config::ListMapping {
                values: vec!["us".into()],
                shard: 1,
            },
        ]);
        let algorithm = ShardingAlgorithm::List(lists);

        assert_eq!(algorithm.shard(&Datum::from("eu")), Shard::Direct(0));
        assert_eq!(algorithm.shard(&Datum::from("us")), Shard::Direct(1));
        assert_eq!(algorithm.shard(&Datum::from("jp")), Shard::All);
    }
}
