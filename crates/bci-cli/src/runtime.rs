// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::Config;
use anyhow::{Context, Result, bail};
use bci_app::{
    DEFAULT_COLUMNS, DisplayOptions, GroupMode, LeadBackend, LeadListState, LeadRow, ListCommand,
    LoadStatus, PageQuery, PicklistEntry, PicklistKind, drive,
};
use bci_client::Client;
use bci_testkit::MemoryBackend;
use std::io::Write;

const DEMO_SEED: u64 = 2026;
const DEMO_LEADS: usize = 480;

/// The query service the list talks to: the real HTTP one, or generated
/// leads held in memory for `--demo`.
#[derive(Debug)]
pub enum Runtime {
    Http(Client),
    Demo(MemoryBackend),
}

impl Runtime {
    pub fn from_config(config: &Config, demo: bool) -> Result<Self> {
        if demo {
            tracing::info!(leads = DEMO_LEADS, "using in-memory demo backend");
            return Ok(Self::Demo(MemoryBackend::seeded(DEMO_SEED, DEMO_LEADS)));
        }

        let Some(base_url) = config.base_url() else {
            bail!("backend.base_url is not set; add it to the config or run with --demo");
        };
        let token = config.access_token();
        let client = Client::new(base_url, config.timeout()?, token.as_deref())
            .context("invalid [backend] config; fix base_url/timeout values")?;
        tracing::info!(base_url, authenticated = client.has_access_token(), "using HTTP backend");
        Ok(Self::Http(client))
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Demo(_) => "demo",
        }
    }
}

impl LeadBackend for Runtime {
    fn project_count(&mut self, filters_json: &str, group: GroupMode) -> Result<u64> {
        match self {
            Self::Http(client) => client.project_count(filters_json, group),
            Self::Demo(backend) => backend.project_count(filters_json, group),
        }
    }

    fn projects(&mut self, query: &PageQuery) -> Result<Vec<LeadRow>> {
        match self {
            Self::Http(client) => client.projects(query),
            Self::Demo(backend) => backend.projects(query),
        }
    }

    fn picklist_values(&mut self, kind: PicklistKind) -> Result<Vec<PicklistEntry>> {
        match self {
            Self::Http(client) => client.picklist_values(kind),
            Self::Demo(backend) => backend.picklist_values(kind),
        }
    }
}

/// Loads the first page and writes it as tab-separated text, then the
/// summary line. Fails when the load ends in an error.
pub fn dump<B: LeadBackend + ?Sized, W: Write>(
    state: &mut LeadListState,
    backend: &mut B,
    options: &DisplayOptions,
    out: &mut W,
) -> Result<()> {
    drive(state, backend, ListCommand::Init);
    if state.load_status() == LoadStatus::Error {
        bail!(
            "{}; see the log file for details",
            state.status_line().unwrap_or("load failed")
        );
    }

    let header = DEFAULT_COLUMNS
        .iter()
        .map(|column| column.label)
        .collect::<Vec<_>>()
        .join("\t");
    writeln!(out, "{header}").context("write dump header")?;
    for row in state.display_rows(options) {
        writeln!(out, "{}", row.cells().join("\t")).context("write dump row")?;
    }
    writeln!(out, "{}", state.summary().headline()).context("write dump summary")?;
    Ok(())
}
