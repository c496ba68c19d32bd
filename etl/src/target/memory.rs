use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::EtlResult;
use crate::target::{
    ConflictPolicy, Dimension, DimensionRepository, DimensionRow, Fact, FactRepository,
};

#[derive(Debug)]
struct DimensionInner<E> {
    rows: BTreeMap<i64, DimensionRow<E>>,
    by_natural_key: HashMap<String, i64>,
    last_id: i64,
}

/// In-memory [`DimensionRepository`], surrogate ids start at 1.
#[derive(Debug, Clone)]
pub struct MemoryDimensionRepository<E> {
    inner: Arc<Mutex<DimensionInner<E>>>,
}

impl<E: Dimension> MemoryDimensionRepository<E> {
    pub fn new() -> Self {
        let inner = DimensionInner {
            rows: BTreeMap::new(),
            by_natural_key: HashMap::new(),
            last_id: 0,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Returns all rows ordered by surrogate id.
    pub async fn rows(&self) -> Vec<DimensionRow<E>> {
        let inner = self.inner.lock().await;

        inner.rows.values().cloned().collect()
    }
}

impl<E: Dimension> Default for MemoryDimensionRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Dimension> DimensionRepository<E> for MemoryDimensionRepository<E> {
    async fn upsert(&self, entity: &E) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;

        if let Some(surrogate_id) = inner.by_natural_key.get(entity.natural_key()).copied() {
            if E::CONFLICT_POLICY == ConflictPolicy::Update
                && let Some(row) = inner.rows.get_mut(&surrogate_id)
            {
                row.entity = entity.clone();
            }

            return Ok(());
        }

        inner.last_id += 1;
        let surrogate_id = inner.last_id;
        inner
            .by_natural_key
            .insert(entity.natural_key().to_owned(), surrogate_id);
        inner.rows.insert(
            surrogate_id,
            DimensionRow {
                surrogate_id,
                entity: entity.clone(),
            },
        );

        Ok(())
    }

    async fn get_by_natural_key(&self, natural_key: &str) -> EtlResult<Option<DimensionRow<E>>> {
        let inner = self.inner.lock().await;

        Ok(inner
            .by_natural_key
            .get(natural_key)
            .and_then(|surrogate_id| inner.rows.get(surrogate_id))
            .cloned())
    }
}

/// In-memory [`FactRepository`].
///
/// Referential integrity is not checked, loaders only write facts whose
/// references they resolved.
#[derive(Debug, Clone)]
pub struct MemoryFactRepository<F> {
    facts: Arc<Mutex<BTreeMap<i64, F>>>,
}

impl<F: Fact> MemoryFactRepository<F> {
    pub fn new() -> Self {
        Self {
            facts: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Returns all facts ordered by key.
    pub async fn facts(&self) -> Vec<F> {
        let facts = self.facts.lock().await;

        facts.values().cloned().collect()
    }
}

impl<F: Fact> Default for MemoryFactRepository<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Fact> FactRepository<F> for MemoryFactRepository<F> {
    async fn upsert(&self, fact: &F) -> EtlResult<()> {
        let mut facts = self.facts.lock().await;
        facts.insert(fact.key(), fact.clone());

        Ok(())
    }

    async fn get(&self, key: i64) -> EtlResult<Option<F>> {
        let facts = self.facts.lock().await;

        Ok(facts.get(&key).cloned())
    }
}
