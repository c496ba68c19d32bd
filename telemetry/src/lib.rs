//! Tracing setup shared by the `syncer` binary and the test suites.

use std::io;
use std::sync::Once;

use config::Environment;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Filter applied when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to determine the environment")]
    Environment(#[source] io::Error),

    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized(#[source] TryInitError),
}

/// Flushes buffered log lines when dropped, keep it alive until `main` returns.
#[must_use = "dropping the guard stops the log writer"]
pub struct LogFlusher {
    _guard: WorkerGuard,
}

/// Installs the global subscriber for `app_name`.
///
/// Lines go through a non-blocking stdout writer. The format follows the
/// environment from `APP_ENVIRONMENT`: JSON in prod, human readable in dev.
/// Verbosity comes from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing(app_name: &str) -> Result<LogFlusher, TracingError> {
    let environment = Environment::load().map_err(TracingError::Environment)?;
    let (writer, guard) = tracing_appender::non_blocking(io::stdout());

    let filter = env_filter();
    let registry = tracing_subscriber::registry().with(filter);

    if environment.is_prod() {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(writer),
            )
            .try_init()
            .map_err(TracingError::AlreadyInitialized)?;
    } else {
        registry
            .with(fmt::layer().with_writer(writer))
            .try_init()
            .map_err(TracingError::AlreadyInitialized)?;
    }

    tracing::info!(app_name, %environment, "tracing initialized");

    Ok(LogFlusher { _guard: guard })
}

/// Installs a test subscriber writing through the test harness capture.
///
/// Safe to call from every test, only the first call has an effect.
pub fn init_test_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(env_filter())
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
