// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use bci_app::{
    FilterCriteria, GroupMode, LeadBackend, LeadId, LeadRow, PageQuery, PicklistEntry,
    PicklistKind, RecencyWindow,
};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use time::macros::date;
use time::{Date, Duration};

/// "Today" for generated timestamps and recency filtering.
pub const REFERENCE_DATE: Date = date!(2026 - 01 - 01);
/// Generated leads were all updated within this many days, so the default
/// recency window sees every one of them.
const RECENT_DAYS: usize = 90;

const CATEGORIES: [&str; 8] = [
    "Commercial",
    "Education",
    "Health",
    "Industrial",
    "Infrastructure",
    "Office",
    "Residential",
    "Retail",
];

const PROJECT_STAGES: [&str; 6] = [
    "Concept",
    "Design & Documentation",
    "Development Approval",
    "Tender",
    "Contract Let",
    "Construction",
];

const COUNCILS: [&str; 10] = [
    "City of Sydney",
    "City of Parramatta",
    "City of Melbourne",
    "City of Brisbane",
    "City of Perth",
    "City of Adelaide",
    "City of Hobart",
    "City of Darwin",
    "Canberra",
    "Gold Coast",
];

const STATES: [&str; 8] = ["NSW", "VIC", "TAS", "WA", "QLD", "SA", "NT", "ACT"];

const SUBURBS: [&str; 12] = [
    "Parramatta",
    "Chatswood",
    "Docklands",
    "Southbank",
    "Fortitude Valley",
    "Subiaco",
    "Glenelg",
    "Sandy Bay",
    "Braddon",
    "Surfers Paradise",
    "Newstead",
    "Ultimo",
];

const DEVELOPERS: [&str; 10] = [
    "Lendlease",
    "Mirvac",
    "Stockland",
    "Walker Corporation",
    "Meriton",
    "Frasers Property",
    "Dexus",
    "Charter Hall",
    "Multiplex",
    "Hickory",
];

const BUILDING_KINDS: [&str; 10] = [
    "Tower",
    "Mixed Use Precinct",
    "Logistics Hub",
    "Hospital Expansion",
    "School Upgrade",
    "Apartments",
    "Shopping Centre",
    "Business Park",
    "Station Upgrade",
    "Townhouses",
];

const PRIORITIES: [&str; 3] = [
    "<span class=\"priority-high\">High</span>",
    "<span class=\"priority-medium\">Medium</span>",
    "<span class=\"priority-low\">Low</span>",
];

/// Splitmix64 stream. The same seed always yields the same leads.
#[derive(Debug, Clone)]
struct DeterministicRng {
    counter: u64,
}

impl DeterministicRng {
    const GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

    fn new(seed: u64) -> Self {
        Self {
            counter: seed.rotate_left(17) ^ Self::GAMMA,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.counter = self.counter.wrapping_add(Self::GAMMA);
        let mut z = self.counter;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform-enough index in `0..n`; zero when `n` is zero.
    fn below(&mut self, n: usize) -> usize {
        match u64::try_from(n) {
            Ok(0) | Err(_) => 0,
            Ok(bound) => usize::try_from(self.next_u64() % bound).unwrap_or(0),
        }
    }

    fn one_in(&mut self, n: usize) -> bool {
        self.below(n) == 0
    }
}

/// A lead plus the attributes the in-memory backend filters on.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoLead {
    pub row: LeadRow,
    pub category: String,
    pub project_stage: String,
    pub council: String,
    pub state: String,
    pub country: String,
    pub followed: bool,
    pub account_match: bool,
    pub viewed: bool,
    pub updated: Date,
}

#[derive(Debug, Clone)]
pub struct LeadFaker {
    rng: DeterministicRng,
    next_id: u64,
}

impl LeadFaker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: DeterministicRng::new(seed),
            next_id: 1,
        }
    }

    pub fn lead(&mut self) -> DemoLead {
        let suburb = self.pick(&SUBURBS);
        let kind = self.pick(&BUILDING_KINDS);
        let state = self.pick(&STATES);
        let id = format!("a0B{:012}", self.next_id);
        self.next_id += 1;

        let value = (self.rng.below(4_000) as f64 + 1.0) * 250_000.0;
        let updated = REFERENCE_DATE - Duration::days(self.rng.below(RECENT_DAYS) as i64);
        let row = LeadRow {
            id: LeadId::new(id),
            name: Some(format!("{suburb} {kind}")),
            time_stamp: Some(self.timestamp(updated)),
            location: Some(format!("{} {suburb} {state}", self.rng.below(400) + 1)),
            value: Some(value),
            developer: Some(self.pick(&DEVELOPERS).to_owned()),
            priority: Some(self.pick(&PRIORITIES).to_owned()),
        };

        DemoLead {
            row,
            category: self.pick(&CATEGORIES).to_owned(),
            project_stage: self.pick(&PROJECT_STAGES).to_owned(),
            council: self.pick(&COUNCILS).to_owned(),
            state: state.to_owned(),
            country: "Australia".to_owned(),
            followed: self.rng.one_in(4),
            account_match: self.rng.one_in(4),
            viewed: self.rng.one_in(3),
            updated,
        }
    }

    pub fn leads(&mut self, count: usize) -> Vec<DemoLead> {
        (0..count).map(|_| self.lead()).collect()
    }

    fn timestamp(&mut self, date: Date) -> String {
        format!(
            "{}T{:02}:{:02}:00.000+0000",
            bci_app::format::format_date(Some(date)),
            self.rng.below(24),
            self.rng.below(60),
        )
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.below(items.len())]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Count {
        filters_json: String,
        group: GroupMode,
    },
    Page {
        offset: usize,
        limit: usize,
        sort_by: Option<String>,
        sort_direction: Option<String>,
    },
    Picklist(PicklistKind),
}

/// In-process query service over a fixed set of leads. Records every call and
/// can be told to fail specific operations.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    leads: Vec<DemoLead>,
    calls: Vec<BackendCall>,
    failing_pages: BTreeSet<usize>,
    fail_counts: bool,
    failing_picklists: Vec<PicklistKind>,
    page_cap: Option<usize>,
}

impl MemoryBackend {
    pub fn new(leads: Vec<DemoLead>) -> Self {
        Self {
            leads,
            ..Self::default()
        }
    }

    /// `count` generated leads, all in Australia.
    pub fn seeded(seed: u64, count: usize) -> Self {
        Self::new(LeadFaker::new(seed).leads(count))
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn fail_page_at(&mut self, offset: usize) {
        self.failing_pages.insert(offset);
    }

    pub fn heal_pages(&mut self) {
        self.failing_pages.clear();
    }

    /// Serve at most `rows` rows per page whatever limit is asked for.
    pub fn cap_page_rows(&mut self, rows: usize) {
        self.page_cap = Some(rows);
    }

    pub fn fail_counts(&mut self, fail: bool) {
        self.fail_counts = fail;
    }

    pub fn fail_picklist(&mut self, kind: PicklistKind) {
        self.failing_picklists.push(kind);
    }

    fn matching(&self, filters_json: &str, group: GroupMode) -> Result<Vec<&DemoLead>> {
        let criteria: FilterCriteria =
            serde_json::from_str(filters_json).context("decode filters json")?;
        Ok(self
            .leads
            .iter()
            .filter(|lead| lead_matches(lead, &criteria, group))
            .collect())
    }
}

fn lead_matches(lead: &DemoLead, criteria: &FilterCriteria, group: GroupMode) -> bool {
    let in_set = |set: &bci_app::SelectionSet, value: &str| set.is_empty() || set.contains(value);
    let group_ok = match group {
        GroupMode::All => true,
        GroupMode::Followed => lead.followed,
        GroupMode::AccountMatches => lead.account_match,
    };
    let developer_ok = criteria.developer.as_deref().is_none_or(|needle| {
        lead.row
            .developer
            .as_deref()
            .unwrap_or_default()
            .to_ascii_lowercase()
            .contains(&needle.to_ascii_lowercase())
    });

    let updated_ok = criteria.start_date.is_none_or(|start| lead.updated >= start)
        && criteria.end_date.is_none_or(|end| lead.updated <= end)
        && recency_days(criteria.last_updated)
            .is_none_or(|days| REFERENCE_DATE - lead.updated <= Duration::days(days));

    group_ok
        && developer_ok
        && updated_ok
        && !(criteria.hide_viewed_projects && lead.viewed)
        && in_set(&criteria.categories, &lead.category)
        && in_set(&criteria.project_stages, &lead.project_stage)
        && in_set(&criteria.councils, &lead.council)
        && in_set(&criteria.countries, &lead.country)
        && criteria
            .state
            .as_deref()
            .is_none_or(|state| state == lead.state)
}

fn recency_days(window: RecencyWindow) -> Option<i64> {
    match window {
        RecencyWindow::Last7Days => Some(7),
        RecencyWindow::Last30Days => Some(30),
        RecencyWindow::Last3Months => Some(91),
        RecencyWindow::Last12Months => Some(365),
        RecencyWindow::AllTime => None,
    }
}

fn compare_rows(left: &LeadRow, right: &LeadRow, field: &str) -> Ordering {
    match field {
        "Value__c" => left
            .value
            .partial_cmp(&right.value)
            .unwrap_or(Ordering::Equal),
        "Location__c" => left.location.cmp(&right.location),
        "Time_Stamp__c" => left.time_stamp.cmp(&right.time_stamp),
        _ => Ordering::Equal,
    }
}

impl LeadBackend for MemoryBackend {
    fn project_count(&mut self, filters_json: &str, group: GroupMode) -> Result<u64> {
        self.calls.push(BackendCall::Count {
            filters_json: filters_json.to_owned(),
            group,
        });
        if self.fail_counts {
            bail!("count query failed");
        }
        Ok(self.matching(filters_json, group)?.len() as u64)
    }

    fn projects(&mut self, query: &PageQuery) -> Result<Vec<LeadRow>> {
        self.calls.push(BackendCall::Page {
            offset: query.offset,
            limit: query.limit,
            sort_by: query.sort_by.clone(),
            sort_direction: query.sort_direction.clone(),
        });
        if self.failing_pages.contains(&query.offset) {
            bail!("page query failed at offset {}", query.offset);
        }

        let mut rows = self
            .matching(&query.filters_json, query.group)?
            .into_iter()
            .map(|lead| lead.row.clone())
            .collect::<Vec<_>>();
        if let Some(field) = query.sort_by.as_deref() {
            rows.sort_by(|left, right| compare_rows(left, right, field));
            if query.sort_direction.as_deref() == Some("desc") {
                rows.reverse();
            }
        }
        Ok(rows
            .into_iter()
            .skip(query.offset)
            .take(self.page_cap.map_or(query.limit, |cap| cap.min(query.limit)))
            .collect())
    }

    fn picklist_values(&mut self, kind: PicklistKind) -> Result<Vec<PicklistEntry>> {
        self.calls.push(BackendCall::Picklist(kind));
        if self.failing_picklists.contains(&kind) {
            bail!("picklist {} unavailable", kind.as_str());
        }
        let values: &[&str] = match kind {
            PicklistKind::Category => &CATEGORIES,
            PicklistKind::ProjectStage => &PROJECT_STAGES,
            PicklistKind::Council => &COUNCILS,
        };
        Ok(values
            .iter()
            .map(|value| PicklistEntry {
                label: (*value).to_owned(),
                value: (*value).to_owned(),
            })
            .collect())
    }
}
