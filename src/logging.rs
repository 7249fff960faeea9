//! Global `tracing` subscriber for the binary.
//!
//! Two layers: a compact console layer on stderr whose level follows `-v`
//! (overridable with `RUST_LOG`), and an optional plain-text layer writing
//! every debug event of the run to its own log file.

use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Console level for a `-v` count.
pub fn console_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

/// `cleanup_<YYYYmmdd_HHMMSS>.log`
pub fn log_file_name() -> String {
    format!("cleanup_{}.log", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Creates `logs_folder` if needed and opens a fresh run log inside it.
///
/// Events are written by a background worker; keep the guard alive until
/// the run ends or buffered lines are lost.
pub fn open_log_writer(logs_folder: &Path) -> io::Result<(NonBlocking, WorkerGuard, PathBuf)> {
    fs::create_dir_all(logs_folder)?;
    let name = log_file_name();
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(&name)
        .build(logs_folder)
        .map_err(io::Error::other)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((writer, guard, logs_folder.join(name)))
}

/// Installs the global subscriber and returns whether it was installed.
///
/// If another subscriber is already in place it is left alone.
pub fn init(verbosity: u8, log_writer: Option<NonBlocking>) -> bool {
    let console_filter = EnvFilter::builder()
        .with_default_directive(console_level(verbosity).into())
        .from_env_lossy();

    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_filter(console_filter);

    let file = log_writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .with_filter(LevelFilter::DEBUG)
    });

    match tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
    {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "global subscriber already installed, keeping it");
            false
        }
    }
}
