use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub const LOG_FILE_PREFIX: &str = "cstudio.log";

/// Keeps the background log writer alive; drop it only at exit
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// `RUST_LOG` wins over the configured level
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Route `tracing` output to a daily-rolling file in `log_dir`
pub fn init_logging(log_dir: &Path, level: &str) -> io::Result<LoggingGuard> {
    std::fs::create_dir_all(log_dir)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let subscriber = tracing_subscriber::registry().with(build_filter(level)).with(
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false),
    );

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a logger is already installed, keeping it");
    }

    tracing::info!(dir = %log_dir.display(), level, "logging initialized");
    Ok(LoggingGuard { _guard: guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_falls_back_without_panicking() {
        let filter = build_filter("not a [valid filter");
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn creates_log_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("nested").join("logs");
        let _guard = init_logging(&logs, "debug").unwrap();
        assert!(logs.is_dir());
    }
}
