//! Tracing initialization.
//! Builds a subscriber with EnvFilter, supports compact or JSON formats, and optional file logging.
//!
//! Behavior:
//! - Log level is driven by LogLevel (no RUST_LOG override here).
//! - JSON/non-JSON formatting is selected via the `json` flag.
//! - If `log_file` is provided and passes safety checks, a non-blocking file layer is added.
//!
//! File logging is refused when any ancestor of the file path is a symlink.

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use std::fmt as stdfmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogLevel, path_has_symlink_ancestor};

/// Human-friendly timestamp formatter (DD/MM/YY HH:MM:SS)
struct LocalHumanTime;
impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%d/%m/%y %H:%M:%S"))
    }
}

/// Filter for a LogLevel.
pub fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::new(level.filter_directive())
}

fn open_log_file_append(path: &Path) -> io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600).custom_flags(libc::O_NOFOLLOW);
    }
    opts.open(path)
}

/// Open a non-blocking writer for `path`, refusing symlinked ancestors.
fn open_non_blocking_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    if path_has_symlink_ancestor(path).with_context(|| format!("check log path {} for symlinks", path.display()))? {
        return Err(anyhow!(
            "refusing to enable file logging: ancestor of {} is a symlink",
            path.display()
        ));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = open_log_file_append(path).with_context(|| format!("open log file {}", path.display()))?;
    Ok(tracing_appender::non_blocking(file))
}

/// Initialize tracing based on LogLevel and format. Returns a WorkerGuard when
/// a file appender is created; hold it until shutdown so buffered lines flush.
///
/// A log file that cannot be used is reported on stderr and logging continues
/// to stderr only.
pub fn init_tracing(level: LogLevel, log_file: Option<&Path>, json: bool) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(level);

    let file_writer = match log_file.map(open_non_blocking_writer) {
        Some(Ok(pair)) => Some(pair),
        Some(Err(e)) => {
            eprintln!("{e:#}; logs will continue to stderr only.");
            None
        }
        None => None,
    };

    let (writer, guard) = match file_writer {
        Some((w, g)) => (Some(w), Some(g)),
        None => (None, None),
    };

    let installed = if json {
        let stderr_layer = tsfmt::layer()
            .event_format(tsfmt::format().json())
            .with_timer(LocalHumanTime)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(io::stderr);
        let file_layer = writer.map(|w| {
            tsfmt::layer()
                .event_format(tsfmt::format().json())
                .with_timer(LocalHumanTime)
                .with_target(true)
                .with_thread_ids(true)
                .with_writer(w)
        });
        registry().with(filter).with(stderr_layer).with(file_layer).try_init()
    } else {
        let stderr_layer = tsfmt::layer()
            .with_timer(LocalHumanTime)
            .with_target(true)
            .with_thread_ids(true)
            .compact()
            .with_writer(io::stderr);
        let file_layer = writer.map(|w| {
            tsfmt::layer()
                .with_timer(LocalHumanTime)
                .with_target(true)
                .with_thread_ids(true)
                .compact()
                .with_ansi(false)
                .with_writer(w)
        });
        registry().with(filter).with(stderr_layer).with(file_layer).try_init()
    };
    installed.map_err(|e| anyhow!("install tracing subscriber: {e}"))?;

    Ok(guard)
}
