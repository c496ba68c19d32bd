use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::staging::{StagedReader, StagingWriter};
use crate::types::{StagedRecord, TableName};

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<TableName, Vec<StagedRecord>>,
    /// Ids are shared by all tables, like a single identity sequence would be.
    last_id: i64,
}

/// In-memory staging area implementing both [`StagedReader`] and [`StagingWriter`].
///
/// Reading from a table that was never initialized fails, mirroring a missing
/// relation in Postgres.
#[derive(Debug, Clone, Default)]
pub struct MemoryStaging {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every record staged in `table`, in id order.
    pub async fn records(&self, table: &TableName) -> Vec<StagedRecord> {
        let inner = self.inner.lock().await;

        inner.tables.get(table).cloned().unwrap_or_default()
    }
}

impl StagedReader for MemoryStaging {
    async fn fetch(&self, table: &TableName, since_id: i64) -> EtlResult<Vec<StagedRecord>> {
        let inner = self.inner.lock().await;

        let Some(records) = inner.tables.get(table) else {
            bail!(
                ErrorKind::StoreQueryFailed,
                "Staging table does not exist",
                format!("Staging table {table} was never initialized")
            );
        };

        Ok(records
            .iter()
            .filter(|record| record.id > since_id)
            .cloned()
            .collect())
    }
}

impl StagingWriter for MemoryStaging {
    async fn init_table(&self, table: &TableName) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;
        inner.tables.entry(table.clone()).or_default();

        Ok(())
    }

    async fn append(
        &self,
        table: &TableName,
        natural_key: &str,
        loaded_at: NaiveDateTime,
        payload: &Value,
    ) -> EtlResult<i64> {
        let mut inner = self.inner.lock().await;

        if !inner.tables.contains_key(table) {
            bail!(
                ErrorKind::StoreQueryFailed,
                "Staging table does not exist",
                format!("Staging table {table} was never initialized")
            );
        }

        inner.last_id += 1;
        let record = StagedRecord {
            id: inner.last_id,
            natural_key: natural_key.to_owned(),
            payload: payload.clone(),
            loaded_at,
        };
        let id = record.id;
        inner.tables.entry(table.clone()).or_default().push(record);

        Ok(id)
    }
}
