use chrono::NaiveDateTime;
use postgres::staging::{create_staging_table, get_staged_objects_since, insert_staged_object};
use serde_json::Value;
use sqlx::PgPool;

use crate::error::EtlResult;
use crate::staging::{StagedReader, StagingWriter};
use crate::types::{StagedRecord, TableName};

/// Staging area stored in Postgres tables, one table per upstream collection.
#[derive(Debug, Clone)]
pub struct PostgresStaging {
    pool: PgPool,
}

impl PostgresStaging {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl StagedReader for PostgresStaging {
    async fn fetch(&self, table: &TableName, since_id: i64) -> EtlResult<Vec<StagedRecord>> {
        let rows = get_staged_objects_since(&self.pool, table, since_id).await?;

        Ok(rows
            .into_iter()
            .map(|row| StagedRecord {
                id: row.id,
                natural_key: row.object_id,
                payload: row.object_value.0,
                loaded_at: row.update_ts,
            })
            .collect())
    }
}

impl StagingWriter for PostgresStaging {
    async fn init_table(&self, table: &TableName) -> EtlResult<()> {
        create_staging_table(&self.pool, table).await?;

        Ok(())
    }

    async fn append(
        &self,
        table: &TableName,
        natural_key: &str,
        loaded_at: NaiveDateTime,
        payload: &Value,
    ) -> EtlResult<i64> {
        let id = insert_staged_object(&self.pool, table, natural_key, loaded_at, payload).await?;

        Ok(id)
    }
}
