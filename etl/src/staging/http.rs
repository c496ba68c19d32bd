use std::time::Duration;

use config::shared::UpstreamConfig;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::staging::upstream::{PageRequest, UpstreamProvider};
use crate::types::{Document, document_from_json};

/// Format of the `from` and `to` query parameters.
const WINDOW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// [`UpstreamProvider`] for the delivery system REST API.
///
/// Pages are filtered by the `from`/`to` bounds of [`PageRequest::window`].
/// Documents are returned as JSON where identifiers use the extended JSON
/// form `{"$oid": "..."}`.
#[derive(Debug, Clone)]
pub struct HttpUpstreamProvider {
    client: reqwest::Client,
    api_url: String,
    nickname: String,
    cohort: String,
    api_key: SecretString,
}

impl HttpUpstreamProvider {
    pub fn new(config: &UpstreamConfig) -> EtlResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            nickname: config.nickname.clone(),
            cohort: config.cohort.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

impl UpstreamProvider for HttpUpstreamProvider {
    async fn fetch_page(&self, request: &PageRequest) -> EtlResult<Vec<Document>> {
        let url = format!("{}/{}", self.api_url, request.collection);

        debug!(
            collection = %request.collection,
            offset = request.offset,
            limit = request.limit,
            "requesting upstream page"
        );

        let response = self
            .client
            .get(&url)
            .header("X-Nickname", &self.nickname)
            .header("X-Cohort", &self.cohort)
            .header("X-API-KEY", self.api_key.expose_secret())
            .query(&[
                (
                    "from",
                    request.window.from.format(WINDOW_TIMESTAMP_FORMAT).to_string(),
                ),
                (
                    "to",
                    request.window.to.format(WINDOW_TIMESTAMP_FORMAT).to_string(),
                ),
                ("sort_field", request.sort_field.clone()),
                ("sort_direction", request.sort_direction.to_string()),
                ("limit", request.limit.to_string()),
                ("offset", request.offset.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                ErrorKind::UpstreamRequestFailed,
                "Upstream API rejected the page request",
                format!("GET {url} returned {status}: {body}")
            );
        }

        let values: Vec<Value> = response.json().await?;

        let mut documents = Vec::with_capacity(values.len());
        for value in values {
            let Some(document) = document_from_json(value) else {
                bail!(
                    ErrorKind::InvalidPayload,
                    "Upstream API returned a non-object document",
                    format!("collection `{}` at offset {}", request.collection, request.offset)
                );
            };
            documents.push(document);
        }

        Ok(documents)
    }
}
