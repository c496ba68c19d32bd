use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::EtlResult;
use crate::ledger::{CourierDelivery, CourierLedgerEntry, CourierLedgerRepository};

#[derive(Debug, Default)]
struct Inner {
    deliveries: Vec<CourierDelivery>,
    entries: Vec<CourierLedgerEntry>,
}

/// In-memory [`CourierLedgerRepository`] over a fixed list of deliveries.
#[derive(Debug, Clone, Default)]
pub struct MemoryCourierLedger {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryCourierLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_delivery(&self, delivery: CourierDelivery) {
        self.inner.lock().await.deliveries.push(delivery);
    }

    /// Returns the ledger as last replaced.
    pub async fn entries(&self) -> Vec<CourierLedgerEntry> {
        self.inner.lock().await.entries.clone()
    }
}

impl CourierLedgerRepository for MemoryCourierLedger {
    async fn deliveries(&self) -> EtlResult<Vec<CourierDelivery>> {
        Ok(self.inner.lock().await.deliveries.clone())
    }

    async fn replace(&self, entries: &[CourierLedgerEntry]) -> EtlResult<()> {
        self.inner.lock().await.entries = entries.to_vec();

        Ok(())
    }
}
