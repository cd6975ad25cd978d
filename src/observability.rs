//! Logging and observability helpers.
//!
//! The engine runs inside a host application that owns stdout, so its
//! diagnostics go to a rolling file when the host opts in. Initialization
//! is best-effort: a host that already installed a subscriber keeps it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "rowguard.log";
const LOG_RETENTION_DAYS: u64 = 14;

/// Initializes tracing into the default per-user log directory.
pub fn init_tracing() {
    init_tracing_at(log_directory());
}

/// Initializes tracing into an explicit log directory, for hosts that keep
/// agent logs next to their own.
pub fn init_tracing_at(log_dir: impl Into<PathBuf>) {
    let log_dir = log_dir.into();
    let _ = fs::create_dir_all(&log_dir);

    // 1. Clean up old logs
    if let Err(e) = cleanup_old_logs(&log_dir, LOG_RETENTION_DAYS) {
        eprintln!("Failed to clean up old logs: {}", e);
    }

    // 2. Setup file appender
    let file_appender: RollingFileAppender =
        tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rowguard=info"));

    // 3. Setup subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .json()
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .try_init();

    // 4. Register panic hook
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let payload = panic_info.payload();
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            format!("PANIC: {}", s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("PANIC: {}", s)
        } else {
            "PANIC: unknown cause".to_string()
        };

        tracing::error!(target: "panic", location = %location, message = %msg, "panicked inside monitored process");

        // Call previous hook to ensure default behavior continues
        previous_hook(panic_info);
    }));

    tracing::info!("Tracing initialized. Logs directory: {:?}", log_dir);
}

fn log_directory() -> PathBuf {
    if cfg!(windows) {
        let appdata = std::env::var_os("APPDATA")
            .unwrap_or_else(|| std::env::var_os("USERPROFILE").unwrap_or_default());
        let mut path = PathBuf::from(appdata);
        path.push("rowguard");
        path.push("logs");
        path
    } else {
        let home = std::env::var_os("HOME").unwrap_or_default();
        let mut path = PathBuf::from(home);
        path.push(".rowguard");
        path.push("logs");
        path
    }
}

fn cleanup_old_logs(log_dir: &Path, retention_days: u64) -> std::io::Result<()> {
    let entries = fs::read_dir(log_dir)?;
    let now = SystemTime::now();
    let retention_duration = Duration::from_secs(retention_days * 24 * 60 * 60);

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        let is_engine_log = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(LOG_FILE_PREFIX))
            .unwrap_or(false);
        if !is_engine_log {
            continue;
        }

        if let Ok(metadata) = fs::metadata(&path) {
            if let Ok(modified) = metadata.modified() {
                if let Ok(age) = now.duration_since(modified) {
                    if age > retention_duration {
                        if let Err(e) = fs::remove_file(&path) {
                            eprintln!("Failed to remove old log file {:?}: {}", path, e);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
