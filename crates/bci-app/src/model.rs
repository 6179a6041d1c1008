// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::ids::LeadId;

pub const DEFAULT_PAGE_SIZE: usize = 150;
pub const DEFAULT_COUNTRY: &str = "Australia";
pub const COUNTRIES: [&str; 3] = ["Australia", "New Zealand", "United Kingdom"];
pub const VISIBLE_OPTION_COUNT: usize = 3;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecencyWindow {
    #[serde(rename = "Last 7 Days")]
    Last7Days,
    #[serde(rename = "Last 30 Days")]
    Last30Days,
    #[default]
    #[serde(rename = "Last 3 Months")]
    Last3Months,
    #[serde(rename = "Last 12 Months")]
    Last12Months,
    #[serde(rename = "All Time")]
    AllTime,
}

impl RecencyWindow {
    pub const ALL: [Self; 5] = [
        Self::Last7Days,
        Self::Last30Days,
        Self::Last3Months,
        Self::Last12Months,
        Self::AllTime,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Last7Days => "Last 7 Days",
            Self::Last30Days => "Last 30 Days",
            Self::Last3Months => "Last 3 Months",
            Self::Last12Months => "Last 12 Months",
            Self::AllTime => "All Time",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Last 7 Days" => Some(Self::Last7Days),
            "Last 30 Days" => Some(Self::Last30Days),
            "Last 3 Months" => Some(Self::Last3Months),
            "Last 12 Months" => Some(Self::Last12Months),
            "All Time" => Some(Self::AllTime),
            _ => None,
        }
    }
}

/// Which backend result set is queried. Orthogonal to [`FilterCriteria`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupMode {
    #[default]
    #[serde(rename = "All_Projects")]
    All,
    #[serde(rename = "Following_Projects")]
    Followed,
    #[serde(rename = "Accounts_Matches")]
    AccountMatches,
}

impl GroupMode {
    pub const ALL: [Self; 3] = [Self::All, Self::Followed, Self::AccountMatches];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "All_Projects",
            Self::Followed => "Following_Projects",
            Self::AccountMatches => "Accounts_Matches",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All Projects",
            Self::Followed => "Following Projects",
            Self::AccountMatches => "My Accounts",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "All_Projects" => Some(Self::All),
            "Following_Projects" => Some(Self::Followed),
            "Accounts_Matches" => Some(Self::AccountMatches),
            _ => None,
        }
    }
}

/// Picklists whose legal values come from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PicklistKind {
    Category,
    ProjectStage,
    Council,
}

impl PicklistKind {
    pub const ALL: [Self; 3] = [Self::Category, Self::ProjectStage, Self::Council];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::ProjectStage => "project_stage",
            Self::Council => "council",
        }
    }

    pub const fn field(self) -> SelectionField {
        match self {
            Self::Category => SelectionField::Category,
            Self::ProjectStage => SelectionField::ProjectStage,
            Self::Council => SelectionField::Council,
        }
    }
}

/// Multi-select filter fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionField {
    Category,
    ProjectStage,
    Council,
    Country,
}

impl SelectionField {
    pub const ALL: [Self; 4] = [
        Self::Category,
        Self::ProjectStage,
        Self::Council,
        Self::Country,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::ProjectStage => "Stage",
            Self::Council => "Council",
            Self::Country => "Country",
        }
    }

    pub const fn picklist(self) -> Option<PicklistKind> {
        match self {
            Self::Category => Some(PicklistKind::Category),
            Self::ProjectStage => Some(PicklistKind::ProjectStage),
            Self::Council => Some(PicklistKind::Council),
            Self::Country => None,
        }
    }
}

/// Ordered, duplicate-free list of selected values. Serialized as a JSON array
/// in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SelectionSet(Vec<String>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the value was already selected.
    pub fn insert(&mut self, value: &str) -> bool {
        if self.contains(value) {
            return false;
        }
        self.0.push(value.to_owned());
        true
    }

    pub fn remove(&mut self, value: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|item| item != value);
        self.0.len() != before
    }

    pub fn replace<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.0.clear();
        for value in values {
            self.insert(value.as_ref());
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|item| item == value)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for SelectionSet {
    fn from(values: Vec<String>) -> Self {
        let mut set = Self::new();
        set.replace(values);
        set
    }
}

impl From<SelectionSet> for Vec<String> {
    fn from(set: SelectionSet) -> Self {
        set.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.replace(iter);
        set
    }
}

/// Filter payload sent to the query service, keyed the way the service
/// expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    #[serde(rename = "Cat_1_Name")]
    pub categories: SelectionSet,
    #[serde(rename = "Project_Stage")]
    pub project_stages: SelectionSet,
    #[serde(rename = "Council")]
    pub councils: SelectionSet,
    #[serde(rename = "Start_Date", with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(rename = "End_Date", with = "iso_date::option")]
    pub end_date: Option<Date>,
    #[serde(rename = "Developer")]
    pub developer: Option<String>,
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "LastUpdated")]
    pub last_updated: RecencyWindow,
    #[serde(rename = "Country")]
    pub countries: SelectionSet,
    #[serde(rename = "HideViewedProjects")]
    pub hide_viewed_projects: bool,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            categories: SelectionSet::new(),
            project_stages: SelectionSet::new(),
            councils: SelectionSet::new(),
            start_date: None,
            end_date: None,
            developer: None,
            state: None,
            last_updated: RecencyWindow::Last3Months,
            countries: SelectionSet::from_iter([DEFAULT_COUNTRY]),
            hide_viewed_projects: false,
        }
    }
}

impl FilterCriteria {
    pub fn selection(&self, field: SelectionField) -> &SelectionSet {
        match field {
            SelectionField::Category => &self.categories,
            SelectionField::ProjectStage => &self.project_stages,
            SelectionField::Council => &self.councils,
            SelectionField::Country => &self.countries,
        }
    }

    pub fn selection_mut(&mut self, field: SelectionField) -> &mut SelectionSet {
        match field {
            SelectionField::Category => &mut self.categories,
            SelectionField::ProjectStage => &mut self.project_stages,
            SelectionField::Council => &mut self.councils,
            SelectionField::Country => &mut self.countries,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("encode filter criteria")
    }
}

/// One result row as returned by the query service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRow {
    #[serde(rename = "Id")]
    pub id: LeadId,
    #[serde(rename = "BCI_Name__c", default)]
    pub name: Option<String>,
    #[serde(rename = "Time_Stamp__c", default)]
    pub time_stamp: Option<String>,
    #[serde(rename = "Location__c", default)]
    pub location: Option<String>,
    #[serde(rename = "Value__c", default)]
    pub value: Option<f64>,
    #[serde(rename = "Developer__c", default)]
    pub developer: Option<String>,
    #[serde(rename = "AI_Lead_Priority__c", default)]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PicklistEntry {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PicklistOption {
    pub label: String,
    pub value: String,
    pub selected: bool,
}

impl From<PicklistEntry> for PicklistOption {
    fn from(entry: PicklistEntry) -> Self {
        Self {
            label: entry.label,
            value: entry.value,
            selected: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Exhausted,
    Error,
}

impl LoadStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Exhausted => "exhausted",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Date,
    Url,
    Text,
    Currency,
    RichText,
}

/// Static table column metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub label: &'static str,
    pub field: &'static str,
    pub initial_width: Option<u16>,
    pub sortable: bool,
    pub kind: ColumnKind,
}

pub const DEFAULT_COLUMNS: [ColumnSpec; 6] = [
    ColumnSpec {
        label: "Last Updated",
        field: "Time_Stamp__c",
        initial_width: Some(120),
        sortable: true,
        kind: ColumnKind::Date,
    },
    ColumnSpec {
        label: "Overview",
        field: "recordLink",
        initial_width: None,
        sortable: false,
        kind: ColumnKind::Url,
    },
    ColumnSpec {
        label: "Location",
        field: "Location__c",
        initial_width: Some(270),
        sortable: true,
        kind: ColumnKind::Text,
    },
    ColumnSpec {
        label: "Value",
        field: "Value__c",
        initial_width: Some(120),
        sortable: true,
        kind: ColumnKind::Currency,
    },
    ColumnSpec {
        label: "Developer",
        field: "Developer__c",
        initial_width: None,
        sortable: false,
        kind: ColumnKind::Text,
    },
    ColumnSpec {
        label: "Lead Priority",
        field: "AI_Lead_Priority__c",
        initial_width: Some(110),
        sortable: false,
        kind: ColumnKind::RichText,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateOption {
    pub label: &'static str,
    pub value: Option<&'static str>,
}

pub const STATE_OPTIONS: [StateOption; 9] = [
    StateOption {
        label: "None",
        value: None,
    },
    StateOption {
        label: "New South Wales",
        value: Some("NSW"),
    },
    StateOption {
        label: "Victoria",
        value: Some("VIC"),
    },
    StateOption {
        label: "Tasmania",
        value: Some("TAS"),
    },
    StateOption {
        label: "Western Australia",
        value: Some("WA"),
    },
    StateOption {
        label: "Queensland",
        value: Some("QLD"),
    },
    StateOption {
        label: "South Australia",
        value: Some("SA"),
    },
    StateOption {
        label: "Northern Territory",
        value: Some("NT"),
    },
    StateOption {
        label: "Australian Capital Territory",
        value: Some("ACT"),
    },
];

#[cfg(test)]
mod tests {
    use super::{FilterCriteria, GroupMode, LeadRow, RecencyWindow, SelectionSet};
    use anyhow::Result;
    use time::{Date, Month};

    #[test]
    fn default_criteria_serializes_to_service_literal() -> Result<()> {
        let json = FilterCriteria::default().to_json()?;
        assert_eq!(
            json,
            concat!(
                r#"{"Cat_1_Name":[],"Project_Stage":[],"Council":[],"Start_Date":null,"#,
                r#""End_Date":null,"Developer":null,"State":null,"LastUpdated":"Last 3 Months","#,
                r#""Country":["Australia"],"HideViewedProjects":false}"#
            )
        );
        Ok(())
    }

    #[test]
    fn dates_serialize_as_iso_days() -> Result<()> {
        let criteria = FilterCriteria {
            start_date: Some(Date::from_calendar_date(2025, Month::March, 4)?),
            ..FilterCriteria::default()
        };
        let json = criteria.to_json()?;
        assert!(json.contains(r#""Start_Date":"2025-03-04""#), "got {json}");

        let decoded: FilterCriteria = serde_json::from_str(&json)?;
        assert_eq!(decoded, criteria);
        Ok(())
    }

    #[test]
    fn selection_set_deduplicates_and_keeps_order() {
        let mut set = SelectionSet::from_iter(["Retail", "Office", "Retail"]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["Retail", "Office"]);
        assert!(!set.insert("Office"));
        assert!(set.remove("Retail"));
        assert!(!set.remove("Retail"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["Office"]);
    }

    #[test]
    fn selection_set_decodes_duplicates_away() -> Result<()> {
        let set: SelectionSet = serde_json::from_str(r#"["NSW","NSW","VIC"]"#)?;
        assert_eq!(set.len(), 2);
        Ok(())
    }

    #[test]
    fn enum_wire_values_round_trip() {
        for window in RecencyWindow::ALL {
            assert_eq!(RecencyWindow::parse(window.as_str()), Some(window));
        }
        for mode in GroupMode::ALL {
            assert_eq!(GroupMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(GroupMode::AccountMatches.label(), "My Accounts");
    }

    #[test]
    fn lead_row_tolerates_missing_fields() -> Result<()> {
        let row: LeadRow = serde_json::from_str(r#"{"Id":"a01","Value__c":2500000}"#)?;
        assert_eq!(row.id.as_str(), "a01");
        assert_eq!(row.value, Some(2_500_000.0));
        assert!(row.name.is_none());
        Ok(())
    }
}
