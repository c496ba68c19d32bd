use std::future::Future;

use crate::error::EtlResult;
use crate::types::WatermarkState;

/// Durable storage of per-stream progress.
///
/// [`WatermarkStore`] implementations persist the progress map of a
/// [`WatermarkState`] opaquely and keep exactly one state per workflow key.
/// Loaders save the state after every applied record, so a write that returns
/// `Ok` must be durable.
pub trait WatermarkStore {
    /// Returns the last saved state of `workflow_key`.
    ///
    /// A workflow that never checkpointed yields `None`, which is not an error.
    fn get(
        &self,
        workflow_key: &str,
    ) -> impl Future<Output = EtlResult<Option<WatermarkState>>> + Send;

    /// Replaces the saved state of `state.workflow_key`.
    fn save(&self, state: &WatermarkState) -> impl Future<Output = EtlResult<()>> + Send;
}
