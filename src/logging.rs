//! File logging. The terminal belongs to the TUI, so events go to
//! `<data dir>/aptmart.log`.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter from `APTMART_LOG`, then `RUST_LOG`, default `info`
fn env_filter() -> EnvFilter {
    let directives = std::env::var("APTMART_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".into());
    EnvFilter::new(directives)
}

/// Install the global subscriber writing to `path`. Returns the path used.
pub fn init(path: Option<PathBuf>) -> Result<Option<PathBuf>> {
    let Some(path) = path.or_else(crate::config::log_path) else {
        return Ok(None);
    };
    let file = open_log(&path)?;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(Some(path))
}

fn open_log(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}
