use config::shared::{IntoConnectOptions, PgConnectionConfig, TlsConfig};
use pg_escape::quote_identifier;
use secrecy::SecretString;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;

/// An isolated, uniquely named database dropped when the test ends.
pub struct PgDatabase {
    pub config: PgConnectionConfig,
    pub pool: PgPool,
}

impl PgDatabase {
    /// Creates a fresh database on the server configured through `TESTS_DATABASE_*`.
    ///
    /// # Panics
    ///
    /// Panics if the variables are missing or the server is unreachable.
    pub async fn new() -> PgDatabase {
        let config = local_pg_connection_config();

        let server_options: PgConnectOptions = config.without_db();
        let mut connection = PgConnection::connect_with(&server_options)
            .await
            .expect("Failed to connect to Postgres");
        connection
            .execute(&*format!("create database {}", quote_identifier(&config.name)))
            .await
            .expect("Failed to create test database");

        let database_options: PgConnectOptions = config.with_db();
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect_with(database_options)
            .await
            .expect("Failed to connect to test database");

        PgDatabase { config, pool }
    }

    /// Closes the pool and drops the database.
    pub async fn cleanup(self) {
        self.pool.close().await;

        let server_options: PgConnectOptions = self.config.without_db();
        let mut connection = PgConnection::connect_with(&server_options)
            .await
            .expect("Failed to connect to Postgres");
        connection
            .execute(&*format!(
                "drop database if exists {} with (force)",
                quote_identifier(&self.config.name)
            ))
            .await
            .expect("Failed to drop test database");
    }
}

/// Connection settings for a test database with a random name.
///
/// Reads `TESTS_DATABASE_HOST`, `TESTS_DATABASE_PORT`, `TESTS_DATABASE_USERNAME`
/// and the optional `TESTS_DATABASE_PASSWORD`.
fn local_pg_connection_config() -> PgConnectionConfig {
    PgConnectionConfig {
        host: std::env::var("TESTS_DATABASE_HOST").expect("TESTS_DATABASE_HOST must be set"),
        port: std::env::var("TESTS_DATABASE_PORT")
            .expect("TESTS_DATABASE_PORT must be set")
            .parse()
            .expect("TESTS_DATABASE_PORT must be a valid port number"),
        name: Uuid::new_v4().to_string(),
        username: std::env::var("TESTS_DATABASE_USERNAME")
            .expect("TESTS_DATABASE_USERNAME must be set"),
        password: std::env::var("TESTS_DATABASE_PASSWORD")
            .ok()
            .map(SecretString::new),
        tls: TlsConfig::default(),
        max_connections: 2,
    }
}
