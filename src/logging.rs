//! File logging through `tracing`.
//!
//! The terminal belongs to the panel, so log output always goes to a file.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LoggingSettings, default_log_path};

/// Where the log ends up: the configured file or the XDG state default.
pub fn log_path(settings: &LoggingSettings) -> Option<PathBuf> {
    settings.file.clone().or_else(default_log_path)
}

/// Install the global subscriber. `RUST_LOG` overrides `settings.filter`.
///
/// Returns the path written to, or `None` when no log location is known and
/// logging stays disabled.
pub fn init(settings: &LoggingSettings) -> io::Result<Option<PathBuf>> {
    let Some(path) = log_path(settings) else {
        return Ok(None);
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_names(true)
        .try_init()
        .map_err(io::Error::other)?;
    Ok(Some(path))
}
