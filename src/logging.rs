//! Tracing setup for the binary.

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Install a stdout subscriber filtered by `directive`.
///
/// Keep the returned guard alive for the life of the process or buffered
/// lines are lost on exit.
pub fn init(directive: &str) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_new(directive)
        .map_err(|e| anyhow!("invalid log filter {directive:?}: {e}"))?;
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    Registry::default()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_target(true).compact())
        .try_init()
        .map_err(|e| anyhow!("failed to initialize tracing subscriber: {e}"))?;

    Ok(guard)
}
