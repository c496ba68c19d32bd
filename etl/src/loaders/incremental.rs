use std::fmt;
use std::future::Future;

use tracing::{debug, info, warn};

use crate::error::EtlResult;
#[cfg(feature = "failpoints")]
use crate::failpoints::{APPLY_RECORD__BEFORE_WATERMARK_SAVE, etl_fail_point};
use crate::staging::StagedReader;
use crate::store::watermark::WatermarkStore;
use crate::types::{StagedRecord, Stream, WatermarkState};

/// A record references a dimension row that doesn't exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDependency {
    /// [`crate::target::Dimension::NAME`] of the missing entity.
    pub entity: &'static str,
    pub natural_key: String,
}

impl fmt::Display for MissingDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.entity, self.natural_key)
    }
}

/// Result of applying one staged record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The record was written, its id may be checkpointed.
    Applied,
    /// The record can't be applied yet, the run stops before it.
    Halt(MissingDependency),
}

/// The staged record a run stopped at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaltedRecord {
    pub record_id: i64,
    pub missing: MissingDependency,
}

/// Outcome of one loader run.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    /// Watermark as saved at the end of the run.
    pub watermark: WatermarkState,
    /// Records above the starting watermark.
    pub fetched: usize,
    pub applied: usize,
    /// Set when the run stopped early on a missing dependency.
    pub halted: Option<HaltedRecord>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.halted.is_none()
    }
}

/// Applies one staged record to the target.
pub trait RecordApplier {
    /// Writes `record`, which must be idempotent: a record may be applied
    /// again after a crash that happened before its checkpoint.
    fn apply(
        &self,
        record: &StagedRecord,
    ) -> impl Future<Output = EtlResult<ApplyOutcome>> + Send;
}

/// The watermark driven load protocol shared by all loaders.
#[derive(Debug, Clone)]
pub struct IncrementalLoader<W, S> {
    watermarks: W,
    staging: S,
}

impl<W, S> IncrementalLoader<W, S>
where
    W: WatermarkStore,
    S: StagedReader,
{
    pub fn new(watermarks: W, staging: S) -> Self {
        Self {
            watermarks,
            staging,
        }
    }

    /// Runs `stream` once, applying every record staged since its watermark.
    ///
    /// The watermark is saved after each applied record, an error leaves it at
    /// the last applied record and is returned as is. A halt is not an error:
    /// the run ends with [`LoadReport::halted`] set and the halting record is
    /// the first one fetched by the next run.
    pub async fn run<A>(&self, stream: &Stream, applier: &A) -> EtlResult<LoadReport>
    where
        A: RecordApplier,
    {
        let mut watermark = self
            .watermarks
            .get(&stream.workflow_key)
            .await?
            .unwrap_or_else(|| WatermarkState::initial(stream.workflow_key.clone()));
        let since_id = watermark.last_loaded_id()?;

        let mut records = self.staging.fetch(&stream.source, since_id).await?;
        records.sort_by_key(|record| record.id);

        let fetched = records.len();
        info!(
            workflow_key = %stream.workflow_key,
            source = %stream.source,
            since_id,
            fetched,
            "loading staged records"
        );

        let mut applied = 0;
        for record in &records {
            match applier.apply(record).await? {
                ApplyOutcome::Applied => {
                    #[cfg(feature = "failpoints")]
                    etl_fail_point(APPLY_RECORD__BEFORE_WATERMARK_SAVE)?;

                    if watermark.advance(record.id)? {
                        self.watermarks.save(&watermark).await?;
                    }
                    applied += 1;

                    debug!(
                        workflow_key = %stream.workflow_key,
                        record_id = record.id,
                        "staged record applied"
                    );
                }
                ApplyOutcome::Halt(missing) => {
                    warn!(
                        workflow_key = %stream.workflow_key,
                        record_id = record.id,
                        %missing,
                        applied,
                        "load halted on a missing dependency, the stream waits at this record"
                    );

                    return Ok(LoadReport {
                        watermark,
                        fetched,
                        applied,
                        halted: Some(HaltedRecord {
                            record_id: record.id,
                            missing,
                        }),
                    });
                }
            }
        }

        info!(
            workflow_key = %stream.workflow_key,
            applied,
            last_loaded_id = watermark.last_loaded_id()?,
            "load finished"
        );

        Ok(LoadReport {
            watermark,
            fetched,
            applied,
            halted: None,
        })
    }
}
