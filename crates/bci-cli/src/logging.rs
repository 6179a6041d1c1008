// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "BCI_LOG";

/// `BCI_LOG` wins over the configured level; an unparsable directive falls
/// back to `info`.
pub fn build_env_filter(configured: &str) -> EnvFilter {
    if let Ok(raw) = env::var(LOG_ENV)
        && let Ok(filter) = EnvFilter::try_new(&raw)
    {
        return filter;
    }
    EnvFilter::try_new(configured).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Appends logs to `path` so the terminal stays free for the UI.
pub fn init(level: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;

    tracing::debug!(log_file = %path.display(), "logging initialized");
    Ok(())
}
