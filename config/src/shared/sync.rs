use serde::Deserialize;

use crate::Config;
use crate::shared::{PgConnectionConfig, UpstreamConfig, ValidationError};

/// Complete configuration of the `syncer` binary.
///
/// Intentionally not `Serialize`, it carries the warehouse password and the API key.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Warehouse holding staging tables, the dimensional model and watermarks.
    pub warehouse: PgConnectionConfig,
    /// Delivery system API staged by `syncer stage`.
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub staging: StagingConfig,
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.warehouse.validate()?;
        self.upstream.validate()?;
        self.staging.validate()
    }
}

impl Config for SyncConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}

/// Where raw upstream documents land.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StagingConfig {
    /// Schema holding one table per staged collection.
    #[serde(default = "default_staging_schema")]
    pub schema: String,
}

fn default_staging_schema() -> String {
    "stg".to_owned()
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            schema: default_staging_schema(),
        }
    }
}

impl StagingConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema.trim().is_empty() {
            return Err(ValidationError::EmptyStagingSchema);
        }

        Ok(())
    }
}
