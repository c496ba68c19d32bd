use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::error::EtlResult;
use crate::staging::upstream::{PageRequest, UpstreamProvider};
use crate::types::{Document, document_from_json};

/// An [`UpstreamProvider`] serving a fixed sequence of pages.
///
/// The n-th request gets the n-th page, requests past the last page get an
/// empty one. Every request is recorded.
#[derive(Debug, Clone, Default)]
pub struct MemoryUpstream {
    pages: Arc<Vec<Vec<Document>>>,
    requests: Arc<Mutex<Vec<PageRequest>>>,
}

impl MemoryUpstream {
    pub fn new(pages: Vec<Vec<Document>>) -> Self {
        Self {
            pages: Arc::new(pages),
            requests: Arc::default(),
        }
    }

    /// Builds pages of the given sizes holding generated courier documents.
    pub fn with_page_sizes(sizes: &[usize]) -> Self {
        let mut next = 0;
        let pages = sizes
            .iter()
            .map(|size| {
                (0..*size)
                    .map(|_| {
                        next += 1;
                        courier_document(next)
                    })
                    .collect()
            })
            .collect();

        Self::new(pages)
    }

    pub async fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().await.clone()
    }
}

impl UpstreamProvider for MemoryUpstream {
    async fn fetch_page(&self, request: &PageRequest) -> EtlResult<Vec<Document>> {
        let mut requests = self.requests.lock().await;
        let page = self.pages.get(requests.len()).cloned().unwrap_or_default();
        requests.push(request.clone());

        Ok(page)
    }
}

/// A courier document in the shape returned by the delivery system API, with
/// an extended JSON identifier.
pub fn courier_document(n: u32) -> Document {
    document_from_json(courier_json(n)).unwrap_or_default()
}

pub fn courier_json(n: u32) -> Value {
    json!({
        "_id": {"$oid": format!("{n:024x}")},
        "name": format!("Courier {n}"),
    })
}
