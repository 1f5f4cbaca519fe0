//! Log pipeline setup
//!
//! Both services share one configuration but write separate log files
//! (`<service>.log`), so a colocated ledger/transfer pair never interleaves.
//! Stdout always carries the human-readable stream; the file layer switches
//! to JSON when configured, for shipping.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::AppConfig;

/// Install the global subscriber for one service.
///
/// The returned guard flushes the file writer on drop; hold it for the life
/// of the process.
pub fn init_logging(config: &AppConfig, service: &str) -> WorkerGuard {
    let rotation = match config.rotation.as_str() {
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        _ => Rotation::NEVER,
    };
    let appender =
        RollingFileAppender::new(rotation, &config.log_dir, format!("{}.log", service));
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    // RUST_LOG wins over the config file when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let file_layer = if config.use_json {
        fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_ansi(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    guard
}
