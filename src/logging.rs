use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use time::UtcOffset;
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{self, EnvFilter, fmt, prelude::*};

const LOG_RETENTION_DAYS: u64 = 7;

/// Default directory for session logs in the user cache directory
/// - Linux: ~/.cache/complement-engine/
/// - macOS: ~/Library/Caches/complement-engine/
/// - Windows: %LOCALAPPDATA%\complement-engine\
pub fn default_log_dir() -> io::Result<PathBuf> {
    let cache_dir = dirs::cache_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Unable to determine user cache directory")
    })?;
    Ok(cache_dir.join("complement-engine"))
}

fn is_session_log(name: &str) -> bool {
    name.starts_with("session-") && name.ends_with(".log")
}

/// Remove session logs last modified more than `LOG_RETENTION_DAYS` ago
fn cleanup_old_logs(log_dir: &Path) -> usize {
    let now = SystemTime::now();
    let retention = Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60);

    let Ok(entries) = fs::read_dir(log_dir) else {
        return 0;
    };
    let mut removed = 0;
    for entry in entries.flatten() {
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let is_log = entry.file_name().to_str().is_some_and(is_session_log);
        let expired = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .is_some_and(|age| age > retention);
        if metadata.is_file() && is_log && expired {
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!("Failed to remove old log file {:?}: {}", entry.path(), e),
            }
        }
    }
    removed
}

fn session_log_name() -> io::Result<String> {
    let timestamp = time::OffsetDateTime::now_utc()
        .format(format_description!("[year][month][day]-[hour][minute][second]"))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(format!("session-{}-{}.log", timestamp, std::process::id()))
}

/// Initialize logging to stderr and, when `log_dir` is given, to a session file
///
/// Returns the `WorkerGuard` of the file writer; it must be kept alive for the
/// duration of the program or buffered file logs are lost.
///
/// # Arguments
/// * `no_color` - Disable ANSI colors in stderr output
/// * `log_level` - Override log level (otherwise uses RUST_LOG or defaults to "info")
/// * `log_dir` - Directory for `session-*.log` files (see `default_log_dir`); `None` logs to stderr only
///
/// A global subscriber that is already installed is left in place and no session
/// file is opened.
pub fn init_logger(
    no_color: bool,
    log_level: Option<&str>,
    log_dir: Option<PathBuf>,
) -> io::Result<WorkerGuard> {
    if tracing::dispatcher::has_been_set() {
        tracing::debug!("Global subscriber already installed; keeping it");
        let (_, guard) = tracing_appender::non_blocking(io::sink());
        return Ok(guard);
    }

    let timer = fmt::time::OffsetTime::new(
        UtcOffset::UTC,
        format_description!("[[[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z]"),
    );

    let stderr_filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(timer.clone())
        .with_ansi(!no_color)
        .with_filter(stderr_filter);

    let Some(log_dir) = log_dir else {
        let (_, guard) = tracing_appender::non_blocking(io::sink());
        tracing_subscriber::registry()
            .with(stderr_layer)
            .try_init()
            .map_err(io::Error::other)?;
        return Ok(guard);
    };

    fs::create_dir_all(&log_dir)?;
    cleanup_old_logs(&log_dir);
    let log_path = log_dir.join(session_log_name()?);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_timer(timer)
        .with_ansi(false)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(io::Error::other)?;
    eprintln!("Logging to file: {:?}", log_path);
    Ok(guard)
}
