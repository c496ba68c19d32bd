use std::marker::PhantomData;

use tracing::debug;

use crate::error::EtlResult;
use crate::loaders::incremental::{ApplyOutcome, IncrementalLoader, LoadReport, RecordApplier};
use crate::staging::StagedReader;
use crate::store::watermark::WatermarkStore;
use crate::target::{Dimension, DimensionRepository};
use crate::types::{StagedRecord, Stream};

/// Loads a dimension: parse every staged record and upsert it by natural key.
#[derive(Debug, Clone)]
pub struct DimensionLoader<E, W, S, R> {
    incremental: IncrementalLoader<W, S>,
    repository: R,
    phantom: PhantomData<fn() -> E>,
}

impl<E, W, S, R> DimensionLoader<E, W, S, R>
where
    E: Dimension,
    W: WatermarkStore,
    S: StagedReader,
    R: DimensionRepository<E> + Sync,
{
    pub fn new(watermarks: W, staging: S, repository: R) -> Self {
        Self {
            incremental: IncrementalLoader::new(watermarks, staging),
            repository,
            phantom: PhantomData,
        }
    }

    pub async fn load(&self, stream: &Stream) -> EtlResult<LoadReport> {
        let applier = UpsertDimension {
            repository: &self.repository,
            phantom: PhantomData::<fn() -> E>,
        };

        self.incremental.run(stream, &applier).await
    }
}

struct UpsertDimension<'a, E, R> {
    repository: &'a R,
    phantom: PhantomData<fn() -> E>,
}

impl<E, R> RecordApplier for UpsertDimension<'_, E, R>
where
    E: Dimension,
    R: DimensionRepository<E> + Sync,
{
    async fn apply(&self, record: &StagedRecord) -> EtlResult<ApplyOutcome> {
        let entity = E::parse(record)?;
        self.repository.upsert(&entity).await?;

        debug!(
            entity = E::NAME,
            natural_key = entity.natural_key(),
            record_id = record.id,
            "dimension row upserted"
        );

        Ok(ApplyOutcome::Applied)
    }
}
