use std::fs;
use std::io;
use std::path::PathBuf;

use time::UtcOffset;
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{self, fmt, prelude::*};

const LOG_RETENTION_DAYS: u64 = 7;

/// Log directory in the user-specific OS cache directory, e.g.
/// `~/.cache/labels-finder-language-server/` on Linux.
fn get_log_dir() -> io::Result<PathBuf> {
    let cache_dir = dirs::cache_dir().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "Unable to determine user cache directory",
        )
    })?;

    let log_dir = cache_dir.join("labels-finder-language-server");
    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)?;
    }
    Ok(log_dir)
}

/// Remove session logs older than LOG_RETENTION_DAYS.
fn cleanup_old_logs(log_dir: &PathBuf) -> io::Result<()> {
    let now = std::time::SystemTime::now();
    let retention = std::time::Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60);

    if let Ok(entries) = fs::read_dir(log_dir) {
        for entry in entries.flatten() {
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !(name.starts_with("session-") && name.ends_with(".log")) {
                continue;
            }
            if let Ok(modified) = metadata.modified() {
                if let Ok(age) = now.duration_since(modified) {
                    if age > retention {
                        if let Err(e) = fs::remove_file(entry.path()) {
                            eprintln!("Failed to remove old log file {:?}: {}", entry.path(), e);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Initialize logging with stderr output and, optionally, a per-session
/// DEBUG log file in the user cache directory. Returns a `WorkerGuard`
/// that must stay alive for the duration of the program.
///
/// Stderr logs at `log_level` if given, otherwise `RUST_LOG`, otherwise
/// "info".
pub fn init_logger(
    no_color: bool,
    log_level: Option<&str>,
    enable_file_logging: bool,
) -> io::Result<WorkerGuard> {
    let timer = fmt::time::OffsetTime::new(
        UtcOffset::UTC,
        format_description!(
            "[[[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z]"
        ),
    );

    let stderr_filter = match log_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(timer.clone())
        .with_ansi(!no_color)
        .with_filter(stderr_filter);

    if enable_file_logging {
        let log_dir = get_log_dir()?;
        cleanup_old_logs(&log_dir)?;

        let timestamp = time::OffsetDateTime::now_utc()
            .format(
                &time::format_description::parse("[year][month][day]-[hour][minute][second]")
                    .expect("valid format description"),
            )
            .expect("UTC timestamp formats");
        let log_path = log_dir.join(format!("session-{}-{}.log", timestamp, std::process::id()));

        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_timer(timer)
            .with_ansi(false)
            .with_filter(tracing_subscriber::EnvFilter::new("debug"));

        let result = tracing_subscriber::registry()
            .with(stderr_layer)
            .with(file_layer)
            .try_init();

        match result {
            Ok(()) => {
                eprintln!("Logging to file: {:?}", log_path);
                Ok(guard)
            }
            // Ignore a subscriber that was already installed (tests).
            Err(e) if e.to_string().contains("already been set") => Ok(guard),
            Err(e) => Err(io::Error::other(e)),
        }
    } else {
        let (_, guard) = tracing_appender::non_blocking(std::io::sink());
        let result = tracing_subscriber::registry().with(stderr_layer).try_init();
        match result {
            Ok(()) => Ok(guard),
            Err(e) if e.to_string().contains("already been set") => Ok(guard),
            Err(e) => Err(io::Error::other(e)),
        }
    }
}
