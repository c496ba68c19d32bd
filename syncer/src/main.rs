//! Command line entry point of the warehouse sync jobs.
//!
//! Each invocation runs exactly one job and exits, scheduling and ordering
//! between jobs (dimensions before the facts referencing them) belong to the
//! external scheduler.

use clap::Parser;
use tracing::error;

use crate::cli::Cli;
use crate::config::load_sync_config;
use crate::core::run_job;

mod cli;
mod config;
mod core;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let sync_config = load_sync_config()?;

    let _log_flusher = telemetry::init_tracing(env!("CARGO_BIN_NAME"))?;

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run_job(sync_config, cli.job));

    if let Err(err) = &result {
        error!("sync job failed: {err:#}");
    }

    result
}
