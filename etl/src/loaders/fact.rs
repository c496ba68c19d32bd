use std::future::Future;

use tracing::debug;

use crate::error::EtlResult;
use crate::loaders::incremental::{
    ApplyOutcome, IncrementalLoader, LoadReport, MissingDependency, RecordApplier,
};
use crate::staging::StagedReader;
use crate::store::watermark::WatermarkStore;
use crate::target::{Fact, FactRepository};
use crate::types::{StagedRecord, Stream};

/// Result of resolving the dimension references of a staged fact.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<F> {
    Resolved(F),
    Missing(MissingDependency),
}

/// Turns a staged record into a fact, looking up the surrogate ids of every
/// dimension it references.
pub trait FactResolver {
    type Fact: Fact;

    fn resolve(
        &self,
        record: &StagedRecord,
    ) -> impl Future<Output = EtlResult<Resolution<Self::Fact>>> + Send;
}

/// Loads a fact table.
///
/// A fact is written only once every dimension it references exists. The first
/// record with a missing reference halts the run, later records wait behind it
/// even if their own references resolve, so facts are applied strictly in
/// staging order.
#[derive(Debug, Clone)]
pub struct FactLoader<W, S, V, R> {
    incremental: IncrementalLoader<W, S>,
    resolver: V,
    repository: R,
}

impl<W, S, V, R> FactLoader<W, S, V, R>
where
    W: WatermarkStore,
    S: StagedReader,
    V: FactResolver + Sync,
    R: FactRepository<V::Fact> + Sync,
{
    pub fn new(watermarks: W, staging: S, resolver: V, repository: R) -> Self {
        Self {
            incremental: IncrementalLoader::new(watermarks, staging),
            resolver,
            repository,
        }
    }

    pub async fn load(&self, stream: &Stream) -> EtlResult<LoadReport> {
        let applier = ResolveAndUpsertFact {
            resolver: &self.resolver,
            repository: &self.repository,
        };

        self.incremental.run(stream, &applier).await
    }
}

struct ResolveAndUpsertFact<'a, V, R> {
    resolver: &'a V,
    repository: &'a R,
}

impl<V, R> RecordApplier for ResolveAndUpsertFact<'_, V, R>
where
    V: FactResolver + Sync,
    R: FactRepository<V::Fact> + Sync,
{
    async fn apply(&self, record: &StagedRecord) -> EtlResult<ApplyOutcome> {
        let fact = match self.resolver.resolve(record).await? {
            Resolution::Resolved(fact) => fact,
            Resolution::Missing(missing) => return Ok(ApplyOutcome::Halt(missing)),
        };

        self.repository.upsert(&fact).await?;

        debug!(
            fact = <V::Fact as Fact>::NAME,
            key = fact.key(),
            record_id = record.id,
            "fact row upserted"
        );

        Ok(ApplyOutcome::Applied)
    }
}
