use std::future::Future;

use crate::error::EtlResult;
use crate::types::StagedRecord;

/// What happens when a dimension row with the same natural key already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Keep the existing row, the incoming entity is dropped.
    Ignore,
    /// Overwrite the attributes of the existing row, keeping its surrogate id.
    Update,
}

/// A descriptive entity deduplicated by a natural key.
pub trait Dimension: Clone + Send + Sync + 'static {
    /// Name used in logs.
    const NAME: &'static str;

    const CONFLICT_POLICY: ConflictPolicy;

    /// Builds the entity from a staged payload.
    ///
    /// Missing or mistyped fields fail with [`crate::error::ErrorKind::InvalidPayload`].
    fn parse(record: &StagedRecord) -> EtlResult<Self>;

    fn natural_key(&self) -> &str;
}

/// A stored dimension entity together with its warehouse-assigned surrogate id.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionRow<E> {
    pub surrogate_id: i64,
    pub entity: E,
}

/// Storage of one dimension.
///
/// Implementations guarantee at most one row per natural key and resolve
/// conflicts according to [`Dimension::CONFLICT_POLICY`].
pub trait DimensionRepository<E: Dimension> {
    fn upsert(&self, entity: &E) -> impl Future<Output = EtlResult<()>> + Send;

    fn get_by_natural_key(
        &self,
        natural_key: &str,
    ) -> impl Future<Output = EtlResult<Option<DimensionRow<E>>>> + Send;
}

/// A measurable event keyed by the surrogate id of one dimension row.
pub trait Fact: Clone + Send + Sync + 'static {
    const NAME: &'static str;

    /// Surrogate id the fact is keyed by.
    fn key(&self) -> i64;
}

/// Storage of one fact table, last write wins on every measure.
pub trait FactRepository<F: Fact> {
    fn upsert(&self, fact: &F) -> impl Future<Output = EtlResult<()>> + Send;

    fn get(&self, key: i64) -> impl Future<Output = EtlResult<Option<F>>> + Send;
}
