// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::format::{format_currency, format_optional_currency, strip_markup, timestamp_date_part};
use crate::{LeadId, LeadListState, LeadRow, LoadStatus};

pub const DEFAULT_RECORD_URL_TEMPLATE: &str = "/lightning/r/Organisation__c/{id}/view";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    /// `{id}` is replaced with the row identifier.
    pub record_url_template: String,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            record_url_template: DEFAULT_RECORD_URL_TEMPLATE.to_owned(),
        }
    }
}

impl DisplayOptions {
    pub fn record_link(&self, id: &LeadId) -> String {
        self.record_url_template.replace("{id}", id.as_str())
    }
}

/// A row as the table shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub id: LeadId,
    pub last_updated: String,
    pub name: String,
    pub record_link: String,
    pub location: String,
    pub value: String,
    pub developer: String,
    pub priority: String,
}

impl DisplayRow {
    /// Cell text in [`crate::DEFAULT_COLUMNS`] order; the overview column shows
    /// the name and links to the record.
    pub fn cells(&self) -> [&str; 6] {
        [
            &self.last_updated,
            &self.name,
            &self.location,
            &self.value,
            &self.developer,
            &self.priority,
        ]
    }
}

pub fn project_row(row: &LeadRow, options: &DisplayOptions) -> DisplayRow {
    DisplayRow {
        id: row.id.clone(),
        last_updated: row
            .time_stamp
            .as_deref()
            .map(timestamp_date_part)
            .unwrap_or_default()
            .to_owned(),
        name: row.name.clone().unwrap_or_default(),
        record_link: options.record_link(&row.id),
        location: row.location.clone().unwrap_or_default(),
        value: format_optional_currency(row.value),
        developer: row.developer.clone().unwrap_or_default(),
        priority: row.priority.as_deref().map(strip_markup).unwrap_or_default(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSummary {
    pub loaded: usize,
    pub total: Option<u64>,
    pub value_total: String,
    pub status: LoadStatus,
}

impl ListSummary {
    pub fn headline(&self) -> String {
        let total = self
            .total
            .map_or_else(|| "?".to_owned(), |total| total.to_string());
        format!(
            "{} of {total} projects · {} loaded value",
            self.loaded, self.value_total
        )
    }
}

impl LeadListState {
    pub fn display_rows(&self, options: &DisplayOptions) -> Vec<DisplayRow> {
        self.rows()
            .iter()
            .map(|row| project_row(row, options))
            .collect()
    }

    pub fn summary(&self) -> ListSummary {
        ListSummary {
            loaded: self.loaded(),
            total: self.total(),
            value_total: format_currency(self.value_total()),
            status: self.load_status(),
        }
    }
}
