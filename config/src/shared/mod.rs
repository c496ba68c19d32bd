//! Configuration types shared by the sync services.

mod base;
mod connection;
mod sync;
mod upstream;

pub use base::ValidationError;
pub use connection::{DefaultPgConnectionOptions, IntoConnectOptions, PgConnectionConfig, TlsConfig};
pub use sync::{StagingConfig, SyncConfig};
pub use upstream::UpstreamConfig;
