use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{env_bool, env_string};

const LOG_FILE_PREFIX: &str = "neolearn.log";

/// Keeps the non-blocking file writer alive; drop it only at shutdown.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

fn file_logging_enabled() -> bool {
    env_bool("ENABLE_FILE_LOGS").unwrap_or(false)
}

fn log_dir() -> PathBuf {
    PathBuf::from(env_string("LOG_DIR").unwrap_or_else(|| "./logs".to_string()))
}

fn parse_filter(log_level: &str) -> (EnvFilter, bool) {
    match EnvFilter::try_new(log_level) {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new("info"), false),
    }
}

/// Installs the global subscriber: stdout always, plus a daily rolling file
/// under `LOG_DIR` when `ENABLE_FILE_LOGS` is set.
pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let (env_filter, filter_ok) = parse_filter(log_level);
    let stdout_layer = fmt::layer().with_target(true);

    let mut dir_error = None;
    let file = if file_logging_enabled() {
        let dir = log_dir();
        match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                let appender = RollingFileAppender::new(Rotation::DAILY, &dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                Some((dir, writer, guard))
            }
            Err(err) => {
                dir_error = Some((dir, err));
                None
            }
        }
    } else {
        None
    };

    let registry = tracing_subscriber::registry().with(env_filter).with(stdout_layer);
    let guard = match file {
        Some((dir, writer, guard)) => {
            registry
                .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
                .init();
            tracing::info!(filter = log_level, log_dir = %dir.display(), file = LOG_FILE_PREFIX, "file logging enabled");
            Some(FileLogGuard { _guard: guard })
        }
        None => {
            registry.init();
            None
        }
    };

    if !filter_ok {
        tracing::warn!(filter = log_level, "invalid RUST_LOG directive, using info");
    }
    if let Some((dir, err)) = dir_error {
        tracing::warn!(log_dir = %dir.display(), error = %err, "cannot create log directory, logging to stdout only");
    }
    tracing::debug!(filter = log_level, "tracing initialised");

    guard
}
