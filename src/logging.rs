use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR: &str = "logs";
const DEFAULT_DIRECTIVE: &str = "fashion_etl=info";

/// Initializes the logging system with both console and file output.
///
/// `RUST_LOG` adds to the default `fashion_etl=info` directive. The returned
/// guard flushes the file writer when dropped, so hold it until exit.
pub fn init_logging() -> WorkerGuard {
    let _ = fs::create_dir_all(LOG_DIR);

    // Daily rotated JSON file alongside human-readable console output
    let file_appender = tracing_appender::rolling::daily(LOG_DIR, "etl.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_writer(std::io::stdout);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = DEFAULT_DIRECTIVE.parse() {
        filter = filter.add_directive(directive);
    }

    // try_init so tests and repeated calls do not panic
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropping_guard_flushes_log_file() {
        let guard = init_logging();
        tracing::info!(marker = "guard-flush-check", "Logging flush check");
        drop(guard);

        let flushed = fs::read_dir(LOG_DIR)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| fs::read_to_string(entry.path()).ok())
            .any(|content| content.contains("guard-flush-check"));
        assert!(flushed);
    }
}
