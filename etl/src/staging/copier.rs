use chrono::Utc;
use serde_json::Value;
use tracing::info;

use crate::error::{ErrorKind, EtlResult};
#[cfg(feature = "failpoints")]
use crate::failpoints::{STAGING_COPY__BEFORE_WRITE, etl_fail_point};
use crate::staging::StagingWriter;
use crate::staging::normalize::{normalize_document, normalize_value};
use crate::staging::upstream::{PageRequest, SortDirection, TimeWindow, UpstreamProvider};
use crate::types::{Document, TableName};
use crate::{bail, etl_error};

/// Number of staged documents between two progress log lines.
const LOG_THRESHOLD: usize = 100;

/// What to copy from the upstream provider and where to stage it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub collection: String,
    /// Field the pages are sorted by, also the natural key of staged records.
    pub sort_field: String,
    pub sort_direction: SortDirection,
    /// Sent unchanged with every page of the copy.
    pub window: TimeWindow,
    pub page_size: usize,
    pub target: TableName,
}

/// Copies a whole upstream collection into a staging table.
///
/// The copier does not track progress: every run reads every page the provider
/// returns and appends all of it. Deduplication happens downstream, where
/// loaders upsert by natural key.
#[derive(Debug, Clone)]
pub struct StagingCopier<U, W> {
    upstream: U,
    writer: W,
}

impl<U, W> StagingCopier<U, W>
where
    U: UpstreamProvider,
    W: StagingWriter,
{
    pub fn new(upstream: U, writer: W) -> Self {
        Self { upstream, writer }
    }

    /// Copies `request.collection` and returns the number of fetched documents.
    pub async fn copy(&self, request: &CopyRequest) -> EtlResult<usize> {
        if request.page_size == 0 {
            bail!(
                ErrorKind::ConfigError,
                "Page size must be positive",
                format!("copy of `{}` requested with page size 0", request.collection)
            );
        }

        let documents = self.fetch_all(request).await?;
        let total = documents.len();
        info!(
            collection = %request.collection,
            total,
            "found documents to stage"
        );

        self.writer.init_table(&request.target).await?;

        #[cfg(feature = "failpoints")]
        etl_fail_point(STAGING_COPY__BEFORE_WRITE)?;

        for (index, document) in documents.iter().enumerate() {
            let natural_key = natural_key(document, &request.sort_field)?;
            let payload = normalize_document(document);

            self.writer
                .append(&request.target, &natural_key, Utc::now().naive_utc(), &payload)
                .await?;

            let processed = index + 1;
            if processed % LOG_THRESHOLD == 0 {
                info!(
                    collection = %request.collection,
                    processed,
                    total,
                    "staging documents"
                );
            }
        }

        Ok(total)
    }

    /// Requests pages at increasing offsets until the provider returns an empty one.
    async fn fetch_all(&self, request: &CopyRequest) -> EtlResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page = PageRequest {
            collection: request.collection.clone(),
            sort_field: request.sort_field.clone(),
            sort_direction: request.sort_direction,
            window: request.window,
            limit: request.page_size,
            offset: 0,
        };

        loop {
            let batch = self.upstream.fetch_page(&page).await?;
            if batch.is_empty() {
                return Ok(documents);
            }

            documents.extend(batch);
            page.offset += request.page_size;
        }
    }
}

/// Renders the value of `sort_field` as the natural key of the staged record.
fn natural_key(document: &Document, sort_field: &str) -> EtlResult<String> {
    let value = document.get(sort_field).ok_or_else(|| {
        etl_error!(
            ErrorKind::InvalidPayload,
            "Upstream document has no sort field",
            format!("document is missing `{sort_field}`")
        )
    })?;

    Ok(match normalize_value(value) {
        Value::String(key) => key,
        other => other.to_string(),
    })
}
