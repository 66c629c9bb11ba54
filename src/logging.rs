use crate::config::LoggingConfig;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub const LOG_ENV: &str = "TASKMATRIX_LOG";
const LOG_FILE: &str = "taskmatrix.log";

/// Routes tracing output to a daily rolling file. The terminal belongs to the TUI.
///
/// The returned guard flushes buffered records on drop, so hold it until exit.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    if fs::create_dir_all(&config.dir).is_err() {
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&config.dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_level = std::env::var(LOG_ENV).ok();
    let filter = build_env_filter(env_level.as_deref(), &config.level);
    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true),
    );

    // Keep the guard even if a subscriber was already installed.
    let _ = tracing::subscriber::set_global_default(subscriber);

    Some(guard)
}

/// Precedence: TASKMATRIX_LOG, then the configured level, then "info".
fn build_env_filter(env_level: Option<&str>, configured: &str) -> EnvFilter {
    if let Some(level) = env_level
        && let Ok(filter) = EnvFilter::try_new(level)
    {
        return filter;
    }

    if let Ok(filter) = EnvFilter::try_new(configured) {
        return filter;
    }

    EnvFilter::new("info")
}
