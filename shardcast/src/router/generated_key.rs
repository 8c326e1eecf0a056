//! Distributed key generation for INSERTs that omit the
//! sharding key column.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use shardcast_config::KeyGeneratorKind;

use crate::value::Datum;

/// Keys generated for one INSERT, one value per tuple, in
/// tuple order. The caller splices them back into the
/// statement it forwards.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedKey {
    column: String,
    /// Where the key values splice into the statement's
    /// parameter list: right after the bound parameters.
    parameter_index: usize,
    values: Vec<Datum>,
}

impl GeneratedKey {
    pub fn new(column: impl Into<String>, parameter_index: usize, values: Vec<Datum>) -> Self {
        Self {
            column: column.into(),
            parameter_index,
            values,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn parameter_index(&self) -> usize {
        self.parameter_index
    }

    pub fn values(&self) -> &[Datum] {
        &self.values
    }

    pub fn value(&self, tuple: usize) -> Option<&Datum> {
        self.values.get(tuple)
    }
}

/// Source of generated key values.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self) -> Datum;
}

/// Monotonic in-process sequence.
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    next: AtomicI64,
}

impl SequenceGenerator {
    pub fn starting_at(start: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
        }
    }
}

impl KeyGenerator for SequenceGenerator {
    fn generate(&self) -> Datum {
        Datum::Bigint(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Random v4 UUIDs.
#[derive(Debug, Default)]
pub struct UuidGenerator;

impl KeyGenerator for UuidGenerator {
    fn generate(&self) -> Datum {
        Datum::Uuid(Uuid::new_v4())
    }
}

/// Generator registry, one instance per kind so sequences
/// are shared across statements.
#[derive(Clone, Default)]
pub struct Keygen {
    generators: HashMap<KeyGeneratorKind, Arc<dyn KeyGenerator>>,
}

impl Keygen {
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.insert(
            KeyGeneratorKind::Sequence,
            Arc::new(SequenceGenerator::default()),
        );
        registry.insert(KeyGeneratorKind::Uuid, Arc::new(UuidGenerator));
        registry
    }

    pub fn insert(&mut self, kind: KeyGeneratorKind, generator: Arc<dyn KeyGenerator>) {
        self.generators.insert(kind, generator);
    }

    /// Generate one key per tuple for an INSERT missing its
    /// sharding key column.
    pub fn generate(
        &self,
        kind: KeyGeneratorKind,
        column: &str,
        parameter_index: usize,
        tuples: usize,
    ) -> GeneratedKey {
        debug!(column, tuples, "generating distributed keys");
        let generator = self.generators.get(&kind);
        let values = (0..tuples)
            .map(|_| match generator {
                Some(generator) => generator.generate(),
                None => Datum::Null,
            })
            .collect();
        GeneratedKey::new(column, parameter_index, values)
    }
}

impl std::fmt::Debug for Keygen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keygen")
            .field("kinds", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}
