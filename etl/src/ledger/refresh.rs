use tracing::info;

use crate::error::EtlResult;
use crate::ledger::CourierLedgerRepository;
use crate::ledger::rules::build_courier_ledger;

/// Rebuilds the courier ledger from every delivery fact.
///
/// The ledger is derived data, each refresh replaces it as a whole so that
/// corrections of facts in past months are picked up too.
#[derive(Debug, Clone)]
pub struct CourierLedgerRefresher<R> {
    repository: R,
}

impl<R> CourierLedgerRefresher<R>
where
    R: CourierLedgerRepository,
{
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Returns the number of ledger entries written.
    pub async fn refresh(&self) -> EtlResult<usize> {
        let deliveries = self.repository.deliveries().await?;
        let entries = build_courier_ledger(&deliveries);

        self.repository.replace(&entries).await?;

        info!(
            deliveries = deliveries.len(),
            entries = entries.len(),
            "courier ledger refreshed"
        );

        Ok(entries.len())
    }
}
