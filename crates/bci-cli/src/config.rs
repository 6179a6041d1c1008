// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use bci_app::{DEFAULT_PAGE_SIZE, DEFAULT_RECORD_URL_TEMPLATE, DisplayOptions, GroupMode};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "bci-leads";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";
const CONFIG_PATH_ENV: &str = "BCI_CONFIG_PATH";
const ACCESS_TOKEN_ENV: &str = "BCI_ACCESS_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub list: List,
    #[serde(default)]
    pub display: Display,
    #[serde(default)]
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            backend: Backend::default(),
            list: List::default(),
            display: Display::default(),
            logging: Logging::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Backend {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
    pub access_token: Option<String>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct List {
    pub page_size: Option<i64>,
    pub group: Option<String>,
}

impl Default for List {
    fn default() -> Self {
        Self {
            page_size: Some(DEFAULT_PAGE_SIZE as i64),
            group: Some(GroupMode::default().as_str().to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Display {
    pub record_url_template: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Logging {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [backend], [list], [display] and [logging]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.version != CONFIG_VERSION {
            bail!(
                "config {} has version {}; expected 1",
                path.display(),
                self.version
            );
        }

        if let Some(timeout) = &self.backend.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "backend.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(page_size) = self.list.page_size
            && page_size <= 0
        {
            bail!(
                "list.page_size in {} must be positive, got {}",
                path.display(),
                page_size
            );
        }

        if let Some(group) = &self.list.group
            && GroupMode::parse(group).is_none()
        {
            bail!(
                "list.group in {} must be one of All_Projects, Following_Projects, Accounts_Matches; got {:?}",
                path.display(),
                group
            );
        }

        if let Some(template) = &self.display.record_url_template
            && !template.contains("{id}")
        {
            bail!(
                "display.record_url_template in {} must contain {{id}}",
                path.display()
            );
        }

        Ok(())
    }

    /// Trailing slashes trimmed; `None` when unset or blank.
    pub fn base_url(&self) -> Option<&str> {
        self.backend
            .base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.backend.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    /// `BCI_ACCESS_TOKEN` wins over the file.
    pub fn access_token(&self) -> Option<String> {
        env::var(ACCESS_TOKEN_ENV)
            .ok()
            .or_else(|| self.backend.access_token.clone())
            .filter(|token| !token.trim().is_empty())
    }

    pub fn page_size(&self) -> usize {
        self.list
            .page_size
            .and_then(|size| usize::try_from(size).ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn group(&self) -> GroupMode {
        self.list
            .group
            .as_deref()
            .and_then(GroupMode::parse)
            .unwrap_or_default()
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            record_url_template: self
                .display
                .record_url_template
                .clone()
                .unwrap_or_else(|| DEFAULT_RECORD_URL_TEMPLATE.to_owned()),
        }
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.logging.file {
            return Ok(PathBuf::from(file));
        }
        let cache_root = dirs::cache_dir().ok_or_else(|| {
            anyhow!("cannot resolve cache directory; set logging.file in the config")
        })?;
        Ok(cache_root.join(APP_NAME).join(format!("{APP_NAME}.log")))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# {APP_NAME} config\n# Place this file at: {}\n\nversion = 1\n\n[backend]\n# Required unless running with --demo\n# base_url = \"https://example.my.salesforce.com/services/apexrest/bci\"\ntimeout = \"{DEFAULT_TIMEOUT}\"\n# Optional. {ACCESS_TOKEN_ENV} overrides this value\n# access_token = \"\"\n\n[list]\npage_size = {DEFAULT_PAGE_SIZE}\n# All_Projects, Following_Projects or Accounts_Matches\ngroup = \"All_Projects\"\n\n[display]\nrecord_url_template = \"{DEFAULT_RECORD_URL_TEMPLATE}\"\n\n[logging]\n# EnvFilter directive; BCI_LOG overrides it\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n# Optional. Default is the platform cache dir\n# file = \"/absolute/path/to/{APP_NAME}.log\"\n",
            path.display(),
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}
