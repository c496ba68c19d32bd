use config::load_config;
use config::shared::SyncConfig;

/// Loads the configuration of the current environment and validates it.
pub fn load_sync_config() -> anyhow::Result<SyncConfig> {
    let config = load_config::<SyncConfig>()?;
    config.validate()?;

    Ok(config)
}
