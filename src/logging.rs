use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR: &str = "logs";
const DEFAULT_DIRECTIVE: &str = "enrollment_roster=info";

/// Sets up console logging plus a daily-rotated JSON log file under `logs/`.
/// `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let _ = fs::create_dir_all(LOG_DIR);

    let file_appender = tracing_appender::rolling::daily(LOG_DIR, "roster.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::from_default_env()
        .add_directive(DEFAULT_DIRECTIVE.parse().expect("static directive parses"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_writer(std::io::stdout))
        .init();

    // The guard flushes buffered log lines on drop; the subscriber lives for
    // the whole process, so leak it.
    std::mem::forget(guard);
}
