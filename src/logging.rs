//! Tracing setup: human-readable logs on stderr plus a persistent,
//! timestamped `error.log` for warnings and errors.

use std::path::Path;

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// File name of the persistent error log.
pub const ERROR_LOG: &str = "error.log";

/// Layer appending WARN and above to `<log_dir>/error.log`, without ANSI
/// colours. Lines are buffered until the returned guard is dropped.
pub fn error_log_layer<S>(
    log_dir: &Path,
) -> std::io::Result<(impl Layer<S> + Send + Sync + 'static, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    std::fs::create_dir_all(log_dir)?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, ERROR_LOG));

    let layer = fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_filter(LevelFilter::WARN);

    Ok((layer, guard))
}

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process so buffered log lines are flushed on exit.
pub fn init(log_dir: &Path) -> std::io::Result<WorkerGuard> {
    let (file_layer, guard) = error_log_layer(log_dir)?;

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
