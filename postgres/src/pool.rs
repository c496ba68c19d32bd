use config::shared::{IntoConnectOptions, PgConnectionConfig};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

/// Name reported in `pg_stat_activity` for connections opened by the sync jobs.
const APPLICATION_NAME: &str = "warehouse_syncer";

/// Opens a pool against the warehouse database described by `config`.
pub async fn connect_to_warehouse(config: &PgConnectionConfig) -> sqlx::Result<PgPool> {
    let options: PgConnectOptions = config.with_db();

    PgPoolOptions::new()
        .min_connections(1)
        .max_connections(config.max_connections.max(1))
        .connect_with(options.application_name(APPLICATION_NAME))
        .await
}
