//! Console and rolling-file logging via `tracing`.

use crate::config::LoggingConfig;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

const THIS_CRATE: &str = env!("CARGO_CRATE_NAME");

/// Install the global subscriber. The returned guard flushes the file writer
/// and must live as long as the process.
pub fn install_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let timer = fmt::time::ChronoLocal::rfc_3339();

    // serenity and sqlx are chatty at DEBUG, so only this crate goes lower.
    let targets = if config.console_debug {
        Targets::new()
            .with_default(LevelFilter::INFO)
            .with_target(THIS_CRATE, LevelFilter::DEBUG)
    } else {
        Targets::new().with_default(LevelFilter::INFO)
    };

    let console_layer = fmt::layer()
        .with_ansi(true)
        .with_file(config.console_debug)
        .with_line_number(config.console_debug)
        .with_target(true)
        .with_timer(timer.clone())
        .with_filter(targets.clone());

    let (file_layer, guard) = if config.logs_enabled {
        let appender =
            tracing_appender::rolling::daily(&config.log_dir, format!("{THIS_CRATE}.log"));
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer)
            .with_writer(writer)
            .compact()
            .with_filter(targets);

        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}
