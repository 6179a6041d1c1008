// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::backend::{BackendFailure, BackendReply, BackendRequest, PageQuery, RequestTicket};
use crate::filters::{
    DateCheck, DateField, END_BEFORE_START_MESSAGE, FieldMessage, FilterChange,
};
use crate::pills::{FilterPills, PillKey};
use crate::{
    COUNTRIES, ColumnSpec, DEFAULT_COLUMNS, DEFAULT_COUNTRY, DEFAULT_PAGE_SIZE, FilterCriteria,
    Generation, GroupMode, LeadRow, LoadStatus, PicklistEntry, PicklistKind, PicklistOption,
    SelectionField, VISIBLE_OPTION_COUNT,
};

pub const STATUS_LOADING: &str = "Loading...";
pub const STATUS_NO_MORE_DATA: &str = "No more data to load";
pub const STATUS_LOAD_ERROR: &str = "Error loading data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListCommand {
    /// Fetch picklists (once) and run the first query.
    Init,
    ChangeFilter(FilterChange),
    SetGroup(GroupMode),
    ApplyFilter,
    ResetFilters,
    RemovePill(PillKey),
    Sort { field: String, direction: String },
    LoadMore,
    Reply(BackendReply),
    ToggleShowMore(SelectionField),
    ToggleFilterPanel,
    ResizeColumn { field: String, width: u16 },
    ResetColumns,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent {
    Request(BackendRequest),
    FiltersChanged,
    GroupChanged(GroupMode),
    ValidationChanged(Vec<FieldMessage>),
    OptionsLoaded { kind: PicklistKind, count: usize },
    RowsCleared,
    TotalUpdated(u64),
    RowsAppended { count: usize, loaded: usize },
    LoadStatusChanged(LoadStatus),
    StatusUpdated(String),
    StatusCleared,
    StaleReplyDropped(Generation),
    ShowMoreChanged(Option<SelectionField>),
    FilterPanelToggled(bool),
    ColumnsChanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InFlight {
    Count(RequestTicket),
    Page(RequestTicket),
}

impl InFlight {
    fn ticket(&self) -> &RequestTicket {
        match self {
            Self::Count(ticket) | Self::Page(ticket) => ticket,
        }
    }
}

/// Option lists backing the multi-select filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    categories: Vec<PicklistOption>,
    project_stages: Vec<PicklistOption>,
    councils: Vec<PicklistOption>,
    countries: Vec<PicklistOption>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            project_stages: Vec::new(),
            councils: Vec::new(),
            countries: COUNTRIES
                .iter()
                .map(|country| PicklistOption {
                    label: (*country).to_owned(),
                    value: (*country).to_owned(),
                    selected: *country == DEFAULT_COUNTRY,
                })
                .collect(),
        }
    }
}

impl FilterOptions {
    pub fn get(&self, field: SelectionField) -> &[PicklistOption] {
        match field {
            SelectionField::Category => &self.categories,
            SelectionField::ProjectStage => &self.project_stages,
            SelectionField::Council => &self.councils,
            SelectionField::Country => &self.countries,
        }
    }

    fn get_mut(&mut self, field: SelectionField) -> &mut Vec<PicklistOption> {
        match field {
            SelectionField::Category => &mut self.categories,
            SelectionField::ProjectStage => &mut self.project_stages,
            SelectionField::Council => &mut self.councils,
            SelectionField::Country => &mut self.countries,
        }
    }

    fn populate(&mut self, kind: PicklistKind, entries: Vec<PicklistEntry>) {
        *self.get_mut(kind.field()) = entries.into_iter().map(PicklistOption::from).collect();
    }

    fn mark(&mut self, field: SelectionField, value: &str, selected: bool) {
        if let Some(option) = self
            .get_mut(field)
            .iter_mut()
            .find(|option| option.value == value)
        {
            option.selected = selected;
        }
    }

    fn sync(&mut self, field: SelectionField, criteria: &FilterCriteria) {
        let selection = criteria.selection(field);
        for option in self.get_mut(field).iter_mut() {
            option.selected = selection.contains(&option.value);
        }
    }
}

/// Controller for the lead list: owns the filter state, the page cursor and
/// the loaded rows. Commands go in through [`LeadListState::dispatch`]; backend
/// work comes out as [`ListEvent::Request`] and its results come back as
/// [`ListCommand::Reply`].
#[derive(Debug, Clone, PartialEq)]
pub struct LeadListState {
    criteria: FilterCriteria,
    group: GroupMode,
    sort: Option<SortKey>,
    options: FilterOptions,
    date_messages: Vec<FieldMessage>,
    show_more: Option<SelectionField>,
    filter_panel_visible: bool,
    columns: Vec<ColumnSpec>,
    page_size: usize,
    offset: usize,
    rows: Vec<LeadRow>,
    total: Option<u64>,
    value_total: f64,
    drained: bool,
    failed: bool,
    generation: Generation,
    in_flight: Option<InFlight>,
    picklists_requested: bool,
    status_line: Option<String>,
}

impl Default for LeadListState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, GroupMode::default())
    }
}

impl LeadListState {
    /// A zero page size falls back to the default.
    pub fn new(page_size: usize, group: GroupMode) -> Self {
        Self {
            criteria: FilterCriteria::default(),
            group,
            sort: None,
            options: FilterOptions::default(),
            date_messages: Vec::new(),
            show_more: None,
            filter_panel_visible: true,
            columns: DEFAULT_COLUMNS.to_vec(),
            page_size: if page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                page_size
            },
            offset: 0,
            rows: Vec::new(),
            total: None,
            value_total: 0.0,
            drained: false,
            failed: false,
            generation: Generation::default(),
            in_flight: None,
            picklists_requested: false,
            status_line: None,
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn group(&self) -> GroupMode {
        self.group
    }

    pub fn sort(&self) -> Option<&SortKey> {
        self.sort.as_ref()
    }

    pub fn options(&self, field: SelectionField) -> &[PicklistOption] {
        self.options.get(field)
    }

    /// The compact panel shows the first few options until "show more" is
    /// toggled for that field.
    pub fn visible_options(&self, field: SelectionField) -> &[PicklistOption] {
        let options = self.options.get(field);
        if self.show_more == Some(field) {
            options
        } else {
            &options[..options.len().min(VISIBLE_OPTION_COUNT)]
        }
    }

    pub fn show_more(&self) -> Option<SelectionField> {
        self.show_more
    }

    /// Messages for the date inputs: a parse error first, then the range
    /// error while the stored end date precedes the start date.
    pub fn date_messages(&self) -> &[FieldMessage] {
        &self.date_messages
    }

    pub fn filter_panel_visible(&self) -> bool {
        self.filter_panel_visible
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn pills(&self) -> FilterPills<'_> {
        self.criteria.pills()
    }

    pub fn rows(&self) -> &[LeadRow] {
        &self.rows
    }

    pub fn loaded(&self) -> usize {
        self.rows.len()
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Sum of the value of every row loaded so far.
    pub fn value_total(&self) -> f64 {
        self.value_total
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn status_line(&self) -> Option<&str> {
        self.status_line.as_deref()
    }

    pub fn load_status(&self) -> LoadStatus {
        if self.in_flight.is_some() {
            return LoadStatus::Loading;
        }
        if self.failed {
            return LoadStatus::Error;
        }
        match self.total {
            Some(total) if self.drained || self.loaded() as u64 >= total => LoadStatus::Exhausted,
            _ => LoadStatus::Idle,
        }
    }

    pub fn dispatch(&mut self, command: ListCommand) -> Vec<ListEvent> {
        match command {
            ListCommand::Init => self.init(),
            ListCommand::ChangeFilter(change) => {
                let mut events = self.apply_filter_change(&change);
                if change.applies_immediately() {
                    events.extend(self.apply_filter());
                }
                events
            }
            ListCommand::SetGroup(group) => {
                self.group = group;
                let mut events = vec![ListEvent::GroupChanged(group)];
                events.extend(self.apply_filter());
                events
            }
            ListCommand::ApplyFilter => self.apply_filter(),
            ListCommand::ResetFilters => self.reset_filters(),
            ListCommand::RemovePill(key) => self.remove_pill(&key),
            ListCommand::Sort { field, direction } => {
                self.sort = Some(SortKey { field, direction });
                self.requery()
            }
            ListCommand::LoadMore => self.load_more(),
            ListCommand::Reply(reply) => self.handle_reply(reply),
            ListCommand::ToggleShowMore(field) => {
                self.show_more = if self.show_more == Some(field) {
                    None
                } else {
                    Some(field)
                };
                vec![ListEvent::ShowMoreChanged(self.show_more)]
            }
            ListCommand::ToggleFilterPanel => {
                self.filter_panel_visible = !self.filter_panel_visible;
                vec![ListEvent::FilterPanelToggled(self.filter_panel_visible)]
            }
            ListCommand::ResizeColumn { field, width } => {
                let Some(column) = self.columns.iter_mut().find(|column| column.field == field)
                else {
                    return Vec::new();
                };
                column.initial_width = Some(width);
                vec![ListEvent::ColumnsChanged]
            }
            ListCommand::ResetColumns => {
                self.columns = DEFAULT_COLUMNS.to_vec();
                vec![ListEvent::ColumnsChanged]
            }
        }
    }

    fn init(&mut self) -> Vec<ListEvent> {
        let mut events = Vec::new();
        if !self.picklists_requested {
            self.picklists_requested = true;
            events.extend(
                PicklistKind::ALL
                    .into_iter()
                    .map(|kind| ListEvent::Request(BackendRequest::Picklist { kind })),
            );
        }
        events.extend(self.requery());
        events
    }

    fn apply_filter_change(&mut self, change: &FilterChange) -> Vec<ListEvent> {
        let mut events = vec![ListEvent::FiltersChanged];
        if let FilterChange::Toggle {
            field,
            value,
            selected,
        } = change
        {
            self.options.mark(*field, value, *selected);
        }

        if let DateCheck::Checked(messages) = self.criteria.apply_change(change) {
            events.extend(self.set_date_messages(messages));
        }

        if let FilterChange::ReplaceSelection { field, .. } = change {
            self.options.sync(*field, &self.criteria);
        }
        tracing::debug!(?change, "filter changed");
        events
    }

    fn apply_filter(&mut self) -> Vec<ListEvent> {
        self.sort = None;
        self.requery()
    }

    fn reset_filters(&mut self) -> Vec<ListEvent> {
        self.criteria = FilterCriteria::default();
        for field in SelectionField::ALL {
            self.options.sync(field, &self.criteria);
        }

        let mut events = vec![ListEvent::FiltersChanged];
        events.extend(self.set_date_messages(Vec::new()));
        events.extend(self.apply_filter());
        events
    }

    fn remove_pill(&mut self, key: &PillKey) -> Vec<ListEvent> {
        if !self.criteria.remove_pill(key) {
            tracing::debug!(?key, "pill not active; nothing to remove");
            return Vec::new();
        }
        if let PillKey::Selection { field, value } = key {
            self.options.mark(*field, value, false);
        }

        let mut events = vec![ListEvent::FiltersChanged];
        let removed_date = match key {
            PillKey::StartDate => Some(DateField::Start),
            PillKey::EndDate => Some(DateField::End),
            _ => None,
        };
        if let Some(removed) = removed_date {
            let mut messages = self
                .date_messages
                .iter()
                .filter(|message| {
                    message.field != removed && message.message != END_BEFORE_START_MESSAGE
                })
                .cloned()
                .collect::<Vec<_>>();
            messages.extend(self.criteria.date_range_message());
            events.extend(self.set_date_messages(messages));
        }
        events.extend(self.apply_filter());
        events
    }

    /// Starts over: supersedes in-flight work, clears the cursor and rows,
    /// and asks for the total before any page.
    fn requery(&mut self) -> Vec<ListEvent> {
        if let Some(previous) = self.in_flight.take() {
            let ticket = previous.ticket();
            ticket.cancel.cancel();
            tracing::debug!(
                generation = ticket.generation.get(),
                "superseding in-flight request"
            );
        }

        self.generation = self.generation.next();
        self.offset = 0;
        self.rows.clear();
        self.value_total = 0.0;
        self.total = None;
        self.drained = false;
        self.failed = false;

        let mut events = vec![ListEvent::RowsCleared];
        let filters_json = match self.criteria.to_json() {
            Ok(json) => json,
            Err(error) => {
                tracing::error!(error = %format!("{error:#}"), "cannot encode filters");
                self.failed = true;
                events.push(self.set_status(STATUS_LOAD_ERROR));
                events.push(ListEvent::LoadStatusChanged(self.load_status()));
                return events;
            }
        };

        let ticket = RequestTicket::new(self.generation);
        self.in_flight = Some(InFlight::Count(ticket.clone()));
        tracing::info!(
            generation = self.generation.get(),
            group = self.group.as_str(),
            "querying project count"
        );
        events.push(self.set_status(STATUS_LOADING));
        events.push(ListEvent::Request(BackendRequest::Count {
            ticket,
            filters_json,
            group: self.group,
        }));
        events.push(ListEvent::LoadStatusChanged(LoadStatus::Loading));
        events
    }

    fn load_more(&mut self) -> Vec<ListEvent> {
        match self.load_status() {
            LoadStatus::Loading => {
                tracing::debug!("load more ignored while loading");
                Vec::new()
            }
            LoadStatus::Exhausted => vec![self.set_status(STATUS_NO_MORE_DATA)],
            LoadStatus::Idle | LoadStatus::Error if self.total.is_none() => self.requery(),
            LoadStatus::Idle | LoadStatus::Error => self.request_page(),
        }
    }

    fn request_page(&mut self) -> Vec<ListEvent> {
        let filters_json = match self.criteria.to_json() {
            Ok(json) => json,
            Err(error) => {
                tracing::error!(error = %format!("{error:#}"), "cannot encode filters");
                self.failed = true;
                return vec![
                    self.set_status(STATUS_LOAD_ERROR),
                    ListEvent::LoadStatusChanged(LoadStatus::Error),
                ];
            }
        };

        self.failed = false;
        let ticket = RequestTicket::new(self.generation);
        self.in_flight = Some(InFlight::Page(ticket.clone()));
        let query = PageQuery {
            offset: self.offset,
            limit: self.page_size,
            sort_by: self.sort.as_ref().map(|sort| sort.field.clone()),
            sort_direction: self.sort.as_ref().map(|sort| sort.direction.clone()),
            filters_json,
            group: self.group,
        };
        vec![
            self.set_status(STATUS_LOADING),
            ListEvent::Request(BackendRequest::Page { ticket, query }),
            ListEvent::LoadStatusChanged(LoadStatus::Loading),
        ]
    }

    fn handle_reply(&mut self, reply: BackendReply) -> Vec<ListEvent> {
        match reply {
            BackendReply::Picklist { kind, result } => self.handle_picklist(kind, result),
            BackendReply::Count { ticket, result } => {
                let current = self.take_in_flight(|in_flight| {
                    matches!(in_flight, InFlight::Count(pending) if pending.generation == ticket.generation)
                });
                if !current {
                    return self.drop_stale(&ticket);
                }
                match result {
                    Ok(total) => self.handle_total(total),
                    Err(failure) => self.handle_failure("count", &failure),
                }
            }
            BackendReply::Page { ticket, result } => {
                let current = self.take_in_flight(|in_flight| {
                    matches!(in_flight, InFlight::Page(pending) if pending.generation == ticket.generation)
                });
                if !current {
                    return self.drop_stale(&ticket);
                }
                match result {
                    Ok(rows) => self.handle_page(rows),
                    Err(failure) => self.handle_failure("page", &failure),
                }
            }
        }
    }

    fn take_in_flight(&mut self, is_current: impl Fn(&InFlight) -> bool) -> bool {
        if self.in_flight.as_ref().is_some_and(is_current) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    fn drop_stale(&self, ticket: &RequestTicket) -> Vec<ListEvent> {
        tracing::debug!(
            generation = ticket.generation.get(),
            current = self.generation.get(),
            "dropping stale reply"
        );
        vec![ListEvent::StaleReplyDropped(ticket.generation)]
    }

    fn handle_picklist(
        &mut self,
        kind: PicklistKind,
        result: Result<Vec<PicklistEntry>, BackendFailure>,
    ) -> Vec<ListEvent> {
        match result {
            Ok(entries) => {
                let count = entries.len();
                self.options.populate(kind, entries);
                self.options.sync(kind.field(), &self.criteria);
                vec![ListEvent::OptionsLoaded { kind, count }]
            }
            Err(failure) => {
                tracing::warn!(kind = kind.as_str(), error = %failure, "picklist fetch failed");
                Vec::new()
            }
        }
    }

    fn handle_total(&mut self, total: u64) -> Vec<ListEvent> {
        tracing::info!(total, generation = self.generation.get(), "project count");
        self.total = Some(total);
        let mut events = vec![ListEvent::TotalUpdated(total)];
        if total == 0 {
            events.push(self.set_status(STATUS_NO_MORE_DATA));
            events.push(ListEvent::LoadStatusChanged(self.load_status()));
        } else {
            events.extend(self.request_page());
        }
        events
    }

    fn handle_page(&mut self, mut rows: Vec<LeadRow>) -> Vec<ListEvent> {
        let total = self.total.unwrap_or(0);
        let room = usize::try_from(total)
            .unwrap_or(usize::MAX)
            .saturating_sub(self.loaded());
        if rows.len() > room {
            tracing::warn!(
                received = rows.len(),
                room,
                "page overruns reported total; truncating"
            );
            rows.truncate(room);
        }
        if rows.is_empty() && (self.loaded() as u64) < total {
            tracing::warn!(
                loaded = self.loaded(),
                total,
                "empty page before reaching total; treating list as drained"
            );
            self.drained = true;
        } else if rows.len() < self.page_size && ((self.loaded() + rows.len()) as u64) < total {
            tracing::debug!(
                received = rows.len(),
                limit = self.page_size,
                "short page; more rows remain"
            );
        }

        let count = rows.len();
        self.value_total += rows.iter().filter_map(|row| row.value).sum::<f64>();
        self.rows.extend(rows);
        self.offset += self.page_size;

        vec![
            ListEvent::RowsAppended {
                count,
                loaded: self.loaded(),
            },
            self.clear_status(),
            ListEvent::LoadStatusChanged(self.load_status()),
        ]
    }

    fn handle_failure(&mut self, stage: &str, failure: &BackendFailure) -> Vec<ListEvent> {
        tracing::error!(stage, error = %failure, "backend request failed");
        self.failed = true;
        vec![
            self.set_status(STATUS_LOAD_ERROR),
            ListEvent::LoadStatusChanged(LoadStatus::Error),
        ]
    }

    fn set_date_messages(&mut self, messages: Vec<FieldMessage>) -> Option<ListEvent> {
        if messages == self.date_messages {
            return None;
        }
        self.date_messages = messages.clone();
        Some(ListEvent::ValidationChanged(messages))
    }

    fn set_status(&mut self, message: &str) -> ListEvent {
        self.status_line = Some(message.to_owned());
        ListEvent::StatusUpdated(message.to_owned())
    }

    fn clear_status(&mut self) -> ListEvent {
        self.status_line = None;
        ListEvent::StatusCleared
    }
}
