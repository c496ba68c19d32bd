use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::EtlResult;
use crate::store::watermark::WatermarkStore;
use crate::types::WatermarkState;

#[derive(Debug, Default)]
struct Inner {
    states: HashMap<String, WatermarkState>,
    /// Every state ever saved, in save order, across all workflows.
    history: Vec<WatermarkState>,
}

/// In-memory [`WatermarkStore`], state is lost when the process exits.
///
/// Keeps the full save history so tests can assert on each checkpoint.
#[derive(Debug, Clone, Default)]
pub struct MemoryWatermarkStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryWatermarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the states saved for `workflow_key`, oldest first.
    pub async fn history(&self, workflow_key: &str) -> Vec<WatermarkState> {
        let inner = self.inner.lock().await;

        inner
            .history
            .iter()
            .filter(|state| state.workflow_key == workflow_key)
            .cloned()
            .collect()
    }

    /// Seeds the store as if `state` had been saved by an earlier run.
    pub async fn seed(&self, state: WatermarkState) {
        let mut inner = self.inner.lock().await;
        inner.states.insert(state.workflow_key.clone(), state);
    }
}

impl WatermarkStore for MemoryWatermarkStore {
    async fn get(&self, workflow_key: &str) -> EtlResult<Option<WatermarkState>> {
        let inner = self.inner.lock().await;

        Ok(inner.states.get(workflow_key).cloned())
    }

    async fn save(&self, state: &WatermarkState) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;

        inner.history.push(state.clone());
        inner
            .states
            .insert(state.workflow_key.clone(), state.clone());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_workflows_are_not_errors() {
        let store = MemoryWatermarkStore::new();

        assert_eq!(store.get("couriers").await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_replaces_and_records_history() {
        let store = MemoryWatermarkStore::new();
        let mut state = WatermarkState::initial("couriers");

        state.advance(3).unwrap();
        store.save(&state).await.unwrap();
        state.advance(7).unwrap();
        store.save(&state).await.unwrap();

        let saved = store.get("couriers").await.unwrap().unwrap();
        assert_eq!(saved.last_loaded_id().unwrap(), 7);

        let history = store.history("couriers").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].last_loaded_id().unwrap(), 3);
        assert!(store.history("orders").await.is_empty());
    }
}
