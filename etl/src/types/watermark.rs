use serde_json::{Map, Value};

use crate::bail;
use crate::error::{ErrorKind, EtlResult};

/// Progress key holding the id of the last staged record applied by a stream.
pub const LAST_LOADED_ID_KEY: &str = "last_loaded_id";

/// Cursor value meaning "nothing loaded yet", below every staged record id.
pub const NOTHING_LOADED_ID: i64 = -1;

/// Durable progress of one synchronization stream.
///
/// The progress map is opaque to the stores that persist it, the loaders only
/// rely on [`LAST_LOADED_ID_KEY`].
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkState {
    pub workflow_key: String,
    pub progress: Map<String, Value>,
}

impl WatermarkState {
    /// Creates the state of a stream that never applied a record.
    pub fn initial(workflow_key: impl Into<String>) -> WatermarkState {
        let mut progress = Map::new();
        progress.insert(LAST_LOADED_ID_KEY.to_owned(), Value::from(NOTHING_LOADED_ID));

        WatermarkState {
            workflow_key: workflow_key.into(),
            progress,
        }
    }

    /// Returns the id of the last applied staged record.
    ///
    /// A state persisted without the cursor reads as [`NOTHING_LOADED_ID`].
    pub fn last_loaded_id(&self) -> EtlResult<i64> {
        match self.progress.get(LAST_LOADED_ID_KEY) {
            None => Ok(NOTHING_LOADED_ID),
            Some(value) => match value.as_i64() {
                Some(id) => Ok(id),
                None => bail!(
                    ErrorKind::InvalidState,
                    "Watermark cursor is not an integer",
                    format!(
                        "workflow `{}` stores `{LAST_LOADED_ID_KEY}` = {value}",
                        self.workflow_key
                    )
                ),
            },
        }
    }

    /// Moves the cursor forward to `record_id`.
    ///
    /// The cursor never moves backwards, an older id leaves the state untouched
    /// and returns `false`.
    pub fn advance(&mut self, record_id: i64) -> EtlResult<bool> {
        if record_id <= self.last_loaded_id()? {
            return Ok(false);
        }

        self.progress
            .insert(LAST_LOADED_ID_KEY.to_owned(), Value::from(record_id));

        Ok(true)
    }
}
