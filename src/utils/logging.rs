use tracing::warn;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the logging system with the specified log level.
///
/// # Arguments
///
/// * `log_level` - An `EnvFilter` directive (e.g. "info", "bookshelf=debug")
/// * `with_file` - Whether to also log to a daily rotating file in the "logs" directory.
pub fn init_logging(log_level: &str, with_file: bool) {
    let (filter, invalid_level) = match EnvFilter::try_new(log_level) {
        Ok(f) => (f, false),
        Err(_) => (EnvFilter::new("info"), true),
    };

    let stdout_layer = fmt::layer().with_line_number(true).with_target(true);

    if with_file {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "bookshelf.log");

        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_line_number(true)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .init();
    }

    if invalid_level {
        warn!("Invalid log level '{}', defaulting to 'info'", log_level);
    }
}
