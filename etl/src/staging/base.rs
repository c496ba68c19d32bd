use std::future::Future;

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::error::EtlResult;
use crate::types::{StagedRecord, TableName};

/// Read side of the staging area.
pub trait StagedReader {
    /// Returns the records of `table` with an id strictly greater than
    /// `since_id`, in ascending id order.
    fn fetch(
        &self,
        table: &TableName,
        since_id: i64,
    ) -> impl Future<Output = EtlResult<Vec<StagedRecord>>> + Send;
}

/// Write side of the staging area.
///
/// Writes are append-only: every call to [`StagingWriter::append`] creates a
/// new record with a fresh id, even if a record with the same natural key is
/// already staged.
pub trait StagingWriter {
    /// Creates `table` if it doesn't exist.
    fn init_table(&self, table: &TableName) -> impl Future<Output = EtlResult<()>> + Send;

    /// Appends one document to `table` and returns the id assigned to it.
    fn append(
        &self,
        table: &TableName,
        natural_key: &str,
        loaded_at: NaiveDateTime,
        payload: &Value,
    ) -> impl Future<Output = EtlResult<i64>> + Send;
}
