use postgres::watermark::{get_workflow_settings, upsert_workflow_settings};
use sqlx::PgPool;
use tracing::debug;

use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::store::watermark::WatermarkStore;
use crate::types::WatermarkState;

/// [`WatermarkStore`] backed by the `dds.srv_wf_settings` table.
///
/// Every call goes to the database, there is no cache: a loader reads the
/// state once per run and writes it once per record.
#[derive(Debug, Clone)]
pub struct PostgresWatermarkStore {
    pool: PgPool,
}

impl PostgresWatermarkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl WatermarkStore for PostgresWatermarkStore {
    async fn get(&self, workflow_key: &str) -> EtlResult<Option<WatermarkState>> {
        let row = get_workflow_settings(&self.pool, workflow_key).await?;

        Ok(row.map(|row| WatermarkState {
            workflow_key: row.workflow_key,
            progress: row.workflow_settings.0,
        }))
    }

    async fn save(&self, state: &WatermarkState) -> EtlResult<()> {
        debug!(workflow_key = %state.workflow_key, "saving watermark");

        upsert_workflow_settings(&self.pool, &state.workflow_key, &state.progress)
            .await
            .map_err(|err| {
                etl_error!(
                    ErrorKind::WatermarkStoreFailed,
                    "Watermark could not be saved",
                    format!(
                        "Failed to save the watermark of `{}`: {err}",
                        state.workflow_key
                    ),
                    source: err
                )
            })
    }
}
