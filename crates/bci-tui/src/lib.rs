// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use bci_app::format::format_date;
use bci_app::{
    BackendReply, BackendRequest, ColumnSpec, DisplayOptions, FilterChange, GroupMode,
    LeadBackend, LeadListState, ListCommand, ListEvent, LoadStatus, RecencyWindow, STATE_OPTIONS,
    SelectionField, execute,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute as term_execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const PAGE_ROWS: usize = 10;
const PIXELS_PER_CELL: u16 = 8;
const WIDTH_STEP: u16 = 16;
const MIN_COLUMN_WIDTH: u16 = 40;
const SORT_MARK_ASC: &str = "▲";
const SORT_MARK_DESC: &str = "▼";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Developer,
    StartDate,
    EndDate,
}

impl TextField {
    const fn prompt(self) -> &'static str {
        match self {
            Self::Developer => "developer",
            Self::StartDate => "start date (YYYY-MM-DD)",
            Self::EndDate => "end date (YYYY-MM-DD)",
        }
    }

    fn current(self, state: &LeadListState) -> String {
        let criteria = state.criteria();
        match self {
            Self::Developer => criteria.developer.clone().unwrap_or_default(),
            Self::StartDate if criteria.start_date.is_some() => format_date(criteria.start_date),
            Self::EndDate if criteria.end_date.is_some() => format_date(criteria.end_date),
            Self::StartDate | Self::EndDate => String::new(),
        }
    }

    fn change(self, value: String) -> FilterChange {
        match self {
            Self::Developer => FilterChange::Developer(value),
            Self::StartDate => FilterChange::StartDate(value),
            Self::EndDate => FilterChange::EndDate(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextInput {
    field: TextField,
    buffer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    selected_row: usize,
    selected_col: usize,
    focused_field: usize,
    option_cursor: usize,
    pill_cursor: usize,
    input: Option<TextInput>,
    help_visible: bool,
}

impl ViewData {
    fn focused(&self) -> SelectionField {
        SelectionField::ALL[self.focused_field % SelectionField::ALL.len()]
    }
}

/// Runs the terminal UI until the user quits. Backend requests are served on
/// a worker thread that owns `backend`.
pub fn run_app<B>(state: &mut LeadListState, backend: B, options: &DisplayOptions) -> Result<()>
where
    B: LeadBackend + Send + 'static,
{
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    term_execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend_ui = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend_ui).context("create terminal")?;

    let (reply_tx, reply_rx) = mpsc::channel();
    let requests = spawn_backend_worker(backend, reply_tx);
    let mut view_data = ViewData::default();
    dispatch(state, &mut view_data, &requests, ListCommand::Init);

    let mut result = Ok(());
    loop {
        process_replies(state, &mut view_data, &requests, &reply_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data, options)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event
            && let Event::Key(key) = event::read().context("read event")?
            && handle_key_event(state, &mut view_data, &requests, key)
        {
            break;
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    term_execute!(io::stdout(), terminal::LeaveAlternateScreen)
        .context("leave alternate screen")?;
    result
}

fn spawn_backend_worker<B>(mut backend: B, replies: Sender<BackendReply>) -> Sender<BackendRequest>
where
    B: LeadBackend + Send + 'static,
{
    let (request_tx, request_rx) = mpsc::channel::<BackendRequest>();
    thread::spawn(move || {
        for request in request_rx {
            let Some(reply) = execute(&mut backend, request) else {
                continue;
            };
            if replies.send(reply).is_err() {
                break;
            }
        }
        tracing::debug!("backend worker exiting");
    });
    request_tx
}

fn process_replies(
    state: &mut LeadListState,
    view_data: &mut ViewData,
    requests: &Sender<BackendRequest>,
    replies: &Receiver<BackendReply>,
) {
    while let Ok(reply) = replies.try_recv() {
        dispatch(state, view_data, requests, ListCommand::Reply(reply));
    }
}

fn dispatch(
    state: &mut LeadListState,
    view_data: &mut ViewData,
    requests: &Sender<BackendRequest>,
    command: ListCommand,
) {
    for event in state.dispatch(command) {
        match event {
            ListEvent::Request(request) => {
                if requests.send(request).is_err() {
                    tracing::error!("backend worker is gone; request dropped");
                }
            }
            ListEvent::RowsCleared => view_data.selected_row = 0,
            ListEvent::FiltersChanged => {
                let pills = state.pills().count();
                view_data.pill_cursor = view_data.pill_cursor.min(pills.saturating_sub(1));
            }
            ListEvent::OptionsLoaded { .. } | ListEvent::ShowMoreChanged(_) => {
                let visible = state.visible_options(view_data.focused()).len();
                view_data.option_cursor = view_data.option_cursor.min(visible.saturating_sub(1));
            }
            _ => {}
        }
    }
}

fn handle_key_event(
    state: &mut LeadListState,
    view_data: &mut ViewData,
    requests: &Sender<BackendRequest>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }
    if view_data.input.is_some() {
        handle_input_key(state, view_data, requests, key);
        return false;
    }
    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            view_data.help_visible = false;
        }
        return false;
    }

    let command = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('?') => {
            view_data.help_visible = true;
            None
        }
        KeyCode::Char('j') | KeyCode::Down => move_row(state, view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => move_row(state, view_data, -1),
        KeyCode::PageDown => move_row(state, view_data, PAGE_ROWS as isize),
        KeyCode::PageUp => move_row(state, view_data, -(PAGE_ROWS as isize)),
        KeyCode::Char('h') | KeyCode::Left => {
            view_data.selected_col = view_data.selected_col.saturating_sub(1);
            None
        }
        KeyCode::Char('l') | KeyCode::Right => {
            let last = state.columns().len().saturating_sub(1);
            view_data.selected_col = (view_data.selected_col + 1).min(last);
            None
        }
        KeyCode::Char('m') | KeyCode::End => {
            view_data.selected_row = state.loaded().saturating_sub(1);
            Some(ListCommand::LoadMore)
        }
        KeyCode::Char('s') => sort_command(state, view_data.selected_col),
        KeyCode::Char('g') => Some(ListCommand::SetGroup(next_group(state.group()))),
        KeyCode::Char('a') => Some(ListCommand::ApplyFilter),
        KeyCode::Char('r') => Some(ListCommand::ResetFilters),
        KeyCode::Char('p') => Some(ListCommand::ToggleFilterPanel),
        KeyCode::Char('[') => {
            view_data.pill_cursor = view_data.pill_cursor.saturating_sub(1);
            None
        }
        KeyCode::Char(']') => {
            let last = state.pills().count().saturating_sub(1);
            view_data.pill_cursor = (view_data.pill_cursor + 1).min(last);
            None
        }
        KeyCode::Char('x') => state
            .pills()
            .nth(view_data.pill_cursor)
            .map(|pill| ListCommand::RemovePill(pill.key)),
        KeyCode::Tab => {
            view_data.focused_field = (view_data.focused_field + 1) % SelectionField::ALL.len();
            view_data.option_cursor = 0;
            None
        }
        KeyCode::Char(',') => {
            view_data.option_cursor = view_data.option_cursor.saturating_sub(1);
            None
        }
        KeyCode::Char('.') => {
            let visible = state.visible_options(view_data.focused()).len();
            view_data.option_cursor = (view_data.option_cursor + 1).min(visible.saturating_sub(1));
            None
        }
        KeyCode::Char(' ') => toggle_option_command(state, view_data),
        KeyCode::Char('o') => Some(ListCommand::ToggleShowMore(view_data.focused())),
        KeyCode::Char('d') => open_input(state, view_data, TextField::Developer),
        KeyCode::Char('b') => open_input(state, view_data, TextField::StartDate),
        KeyCode::Char('e') => open_input(state, view_data, TextField::EndDate),
        KeyCode::Char('t') => Some(ListCommand::ChangeFilter(FilterChange::State(
            next_state(state.criteria().state.as_deref())
                .unwrap_or_default()
                .to_owned(),
        ))),
        KeyCode::Char('u') => Some(ListCommand::ChangeFilter(FilterChange::LastUpdated(
            next_window(state.criteria().last_updated),
        ))),
        KeyCode::Char('v') => Some(ListCommand::ChangeFilter(FilterChange::HideViewed(
            !state.criteria().hide_viewed_projects,
        ))),
        KeyCode::Char('+') => resize_command(state, view_data.selected_col, WIDTH_STEP as i32),
        KeyCode::Char('-') => resize_command(state, view_data.selected_col, -(WIDTH_STEP as i32)),
        KeyCode::Char('=') => Some(ListCommand::ResetColumns),
        _ => None,
    };

    if let Some(command) = command {
        dispatch(state, view_data, requests, command);
    }
    false
}

fn handle_input_key(
    state: &mut LeadListState,
    view_data: &mut ViewData,
    requests: &Sender<BackendRequest>,
    key: KeyEvent,
) {
    let Some(input) = view_data.input.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => view_data.input = None,
        KeyCode::Enter => {
            if let Some(input) = view_data.input.take() {
                let change = input.field.change(input.buffer);
                dispatch(state, view_data, requests, ListCommand::ChangeFilter(change));
                dispatch(state, view_data, requests, ListCommand::ApplyFilter);
            }
        }
        KeyCode::Backspace => {
            input.buffer.pop();
        }
        KeyCode::Char(ch) => input.buffer.push(ch),
        _ => {}
    }
}

fn open_input(
    state: &LeadListState,
    view_data: &mut ViewData,
    field: TextField,
) -> Option<ListCommand> {
    view_data.input = Some(TextInput {
        field,
        buffer: field.current(state),
    });
    None
}

/// Moving past the last loaded row asks for the next page.
fn move_row(state: &LeadListState, view_data: &mut ViewData, delta: isize) -> Option<ListCommand> {
    let loaded = state.loaded();
    if delta > 0 && view_data.selected_row + 1 >= loaded {
        return (state.load_status() != LoadStatus::Loading).then_some(ListCommand::LoadMore);
    }
    let last = loaded.saturating_sub(1);
    view_data.selected_row = view_data
        .selected_row
        .saturating_add_signed(delta)
        .min(last);
    None
}

fn sort_command(state: &LeadListState, column: usize) -> Option<ListCommand> {
    let spec = state.columns().get(column)?;
    if !spec.sortable {
        tracing::debug!(column = spec.label, "column is not sortable");
        return None;
    }
    let direction = match state.sort() {
        Some(sort) if sort.field == spec.field && sort.direction == "asc" => "desc",
        _ => "asc",
    };
    Some(ListCommand::Sort {
        field: spec.field.to_owned(),
        direction: direction.to_owned(),
    })
}

fn resize_command(state: &LeadListState, column: usize, delta: i32) -> Option<ListCommand> {
    let spec = state.columns().get(column)?;
    let current = i32::from(spec.initial_width.unwrap_or(120));
    let width = (current + delta).clamp(i32::from(MIN_COLUMN_WIDTH), i32::from(u16::MAX));
    Some(ListCommand::ResizeColumn {
        field: spec.field.to_owned(),
        width: u16::try_from(width).unwrap_or(MIN_COLUMN_WIDTH),
    })
}

fn toggle_option_command(state: &LeadListState, view_data: &ViewData) -> Option<ListCommand> {
    let field = view_data.focused();
    let option = state.visible_options(field).get(view_data.option_cursor)?;
    Some(ListCommand::ChangeFilter(FilterChange::Toggle {
        field,
        value: option.value.clone(),
        selected: !option.selected,
    }))
}

fn next_group(group: GroupMode) -> GroupMode {
    let index = GroupMode::ALL
        .iter()
        .position(|candidate| *candidate == group)
        .unwrap_or(0);
    GroupMode::ALL[(index + 1) % GroupMode::ALL.len()]
}

fn next_window(window: RecencyWindow) -> RecencyWindow {
    let index = RecencyWindow::ALL
        .iter()
        .position(|candidate| *candidate == window)
        .unwrap_or(0);
    RecencyWindow::ALL[(index + 1) % RecencyWindow::ALL.len()]
}

fn next_state(current: Option<&str>) -> Option<&'static str> {
    let index = STATE_OPTIONS
        .iter()
        .position(|option| option.value == current)
        .unwrap_or(0);
    STATE_OPTIONS[(index + 1) % STATE_OPTIONS.len()].value
}

fn render(
    frame: &mut ratatui::Frame<'_>,
    state: &LeadListState,
    view_data: &ViewData,
    options: &DisplayOptions,
) {
    let panel = if state.filter_panel_visible() {
        filter_panel_lines(state, view_data)
    } else {
        Vec::new()
    };
    let panel_height = if panel.is_empty() {
        0
    } else {
        u16::try_from(panel.len() + 2).unwrap_or(u16::MAX)
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(panel_height),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(state))
        .block(Block::default().title("bci leads").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    if !panel.is_empty() {
        let filters =
            Paragraph::new(panel).block(Block::default().title("filters").borders(Borders::ALL));
        frame.render_widget(filters, layout[1]);
    }

    render_table(frame, layout[2], state, view_data, options);

    let status = Paragraph::new(status_text(state, view_data, options))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if view_data.help_visible {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &LeadListState,
    view_data: &ViewData,
    options: &DisplayOptions,
) {
    let header = Row::new(state.columns().iter().enumerate().map(|(index, spec)| {
        let mut style = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        if index == view_data.selected_col {
            style = style.fg(Color::Cyan);
        }
        Cell::from(header_label(state, spec)).style(style)
    }));

    let rows = state.display_rows(options).into_iter().map(|row| {
        Row::new(
            row.cells()
                .into_iter()
                .map(|cell| Cell::from(cell.to_owned()))
                .collect::<Vec<_>>(),
        )
    });

    let title = format!("projects ({})", state.load_status().label());
    let table = Table::new(rows, column_constraints(state.columns()))
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().bg(Color::DarkGray));

    let mut table_state =
        TableState::default().with_selected((state.loaded() > 0).then_some(view_data.selected_row));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn column_constraints(columns: &[ColumnSpec]) -> Vec<Constraint> {
    columns
        .iter()
        .map(|spec| match spec.initial_width {
            Some(width) => Constraint::Length((width / PIXELS_PER_CELL).max(6)),
            None => Constraint::Min(12),
        })
        .collect()
}

fn header_label(state: &LeadListState, spec: &ColumnSpec) -> String {
    match state.sort() {
        Some(sort) if sort.field == spec.field => {
            let mark = if sort.direction == "desc" {
                SORT_MARK_DESC
            } else {
                SORT_MARK_ASC
            };
            format!("{} {mark}", spec.label)
        }
        _ => spec.label.to_owned(),
    }
}

fn header_text(state: &LeadListState) -> String {
    format!(
        "{} · {}",
        state.group().label(),
        state.summary().headline()
    )
}

fn filter_panel_lines(state: &LeadListState, view_data: &ViewData) -> Vec<Line<'static>> {
    let mut lines = SelectionField::ALL
        .into_iter()
        .map(|field| {
            let focused = field == view_data.focused();
            let text = selection_line(state, field, focused.then_some(view_data.option_cursor));
            if focused {
                Line::from(Span::styled(
                    text,
                    Style::default().add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(text)
            }
        })
        .collect::<Vec<_>>();

    lines.push(Line::from(scalar_line(state)));
    lines.extend(state.date_messages().iter().map(|message| {
        Line::from(Span::styled(
            format!("{}: {}", message.field.label(), message.message),
            Style::default().fg(Color::Red),
        ))
    }));
    lines.push(Line::from(pills_line(state, view_data.pill_cursor)));
    lines
}

fn selection_line(state: &LeadListState, field: SelectionField, cursor: Option<usize>) -> String {
    let visible = state.visible_options(field);
    let hidden = state.options(field).len() - visible.len();
    let mut parts = visible
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let mark = if option.selected { "[x]" } else { "[ ]" };
            let pointer = if cursor == Some(index) { ">" } else { "" };
            format!("{pointer}{mark} {}", option.label)
        })
        .collect::<Vec<_>>();
    if visible.is_empty() {
        parts.push("(no options)".to_owned());
    }
    if hidden > 0 {
        parts.push(format!("(+{hidden} more)"));
    }
    let focus = if cursor.is_some() { "›" } else { " " };
    format!("{focus} {}: {}", field.label(), parts.join("  "))
}

fn scalar_line(state: &LeadListState) -> String {
    let criteria = state.criteria();
    let dates = match (criteria.start_date, criteria.end_date) {
        (None, None) => "any".to_owned(),
        (start, end) => format!("{}..{}", format_date(start), format_date(end)),
    };
    format!(
        "  Dates: {dates}  Developer: {}  State: {}  Updated: {}  Hide viewed: {}",
        criteria.developer.as_deref().unwrap_or("any"),
        criteria.state.as_deref().unwrap_or("any"),
        criteria.last_updated.as_str(),
        if criteria.hide_viewed_projects {
            "yes"
        } else {
            "no"
        },
    )
}

fn pills_line(state: &LeadListState, cursor: usize) -> String {
    let pills = state
        .pills()
        .enumerate()
        .map(|(index, pill)| {
            let pointer = if index == cursor { ">" } else { "" };
            format!("{pointer}[{} ×]", pill.label)
        })
        .collect::<Vec<_>>();
    if pills.is_empty() {
        "  Active: none".to_owned()
    } else {
        format!("  Active: {}", pills.join(" "))
    }
}

fn status_text(state: &LeadListState, view_data: &ViewData, options: &DisplayOptions) -> String {
    if let Some(input) = &view_data.input {
        return format!(
            "{}: {}_  (enter apply, esc cancel)",
            input.field.prompt(),
            input.buffer
        );
    }
    if let Some(status) = state.status_line() {
        return status.to_owned();
    }
    match state.rows().get(view_data.selected_row) {
        Some(row) => format!("open: {}  ·  ? help", options.record_link(&row.id)),
        None => "? help  ·  q quit".to_owned(),
    }
}

fn help_overlay_text() -> String {
    [
        "j/k, up/down    move between rows (past the end loads more)",
        "h/l, left/right move between columns",
        "m, end          load more",
        "s               sort by selected column (again to flip)",
        "+/-/=           widen / narrow / reset column widths",
        "g               cycle group",
        "tab             focus next multi-select filter",
        ",/.             move option cursor",
        "space           toggle option",
        "o               show more / fewer options",
        "d/b/e           edit developer / start date / end date (enter applies)",
        "t/u/v           cycle state / last updated, toggle hide viewed",
        "a               apply filters",
        "r               reset filters",
        "[/]             move between active filters",
        "x               remove selected active filter",
        "p               show / hide filter panel",
        "q, esc          quit",
    ]
    .join("\n")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        TextField, ViewData, column_constraints, handle_key_event, next_group, next_state,
        pills_line, scalar_line, selection_line, status_text,
    };
    use bci_app::{
        BackendRequest, DEFAULT_COLUMNS, DisplayOptions, GroupMode, LeadListState, ListCommand,
        SelectionField, drive,
    };
    use bci_testkit::MemoryBackend;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::layout::Constraint;
    use std::sync::mpsc::{self, Receiver, Sender};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded_state(count: usize) -> LeadListState {
        let mut state = LeadListState::default();
        let mut backend = MemoryBackend::seeded(21, count);
        drive(&mut state, &mut backend, ListCommand::Init);
        state
    }

    fn channel() -> (Sender<BackendRequest>, Receiver<BackendRequest>) {
        mpsc::channel()
    }

    fn press(
        state: &mut LeadListState,
        view_data: &mut ViewData,
        tx: &Sender<BackendRequest>,
        code: KeyCode,
    ) -> bool {
        handle_key_event(state, view_data, tx, key(code))
    }

    #[test]
    fn quit_keys_end_the_loop() {
        let mut state = LeadListState::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = channel();
        assert!(press(&mut state, &mut view_data, &tx, KeyCode::Char('q')));
        assert!(handle_key_event(
            &mut state,
            &mut view_data,
            &tx,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
        ));
    }

    #[test]
    fn group_key_requeries_with_next_group() {
        let mut state = loaded_state(40);
        let mut view_data = ViewData::default();
        let (tx, rx) = channel();

        press(&mut state, &mut view_data, &tx, KeyCode::Char('g'));
        assert_eq!(state.group(), GroupMode::Followed);
        let request = rx.try_recv().expect("count request");
        assert!(matches!(
            request,
            BackendRequest::Count {
                group: GroupMode::Followed,
                ..
            }
        ));
        assert_eq!(next_group(GroupMode::AccountMatches), GroupMode::All);
    }

    #[test]
    fn scrolling_past_last_row_loads_more() {
        let mut state = loaded_state(320);
        let mut view_data = ViewData {
            selected_row: 149,
            ..ViewData::default()
        };
        let (tx, rx) = channel();

        press(&mut state, &mut view_data, &tx, KeyCode::Char('j'));
        let request = rx.try_recv().expect("page request");
        let BackendRequest::Page { query, .. } = request else {
            panic!("expected page request, got {request:?}");
        };
        assert_eq!(query.offset, 150);

        press(&mut state, &mut view_data, &tx, KeyCode::Char('j'));
        assert!(rx.try_recv().is_err(), "no second request while loading");
    }

    #[test]
    fn sort_key_flips_direction_and_skips_unsortable_columns() {
        let mut state = loaded_state(30);
        let mut view_data = ViewData::default();
        let (tx, rx) = channel();

        press(&mut state, &mut view_data, &tx, KeyCode::Char('s'));
        assert_eq!(state.sort().map(|sort| sort.direction.as_str()), Some("asc"));
        press(&mut state, &mut view_data, &tx, KeyCode::Char('s'));
        assert_eq!(
            state.sort().map(|sort| sort.direction.as_str()),
            Some("desc")
        );
        while rx.try_recv().is_ok() {}

        let before = state.generation();
        press(&mut state, &mut view_data, &tx, KeyCode::Char('l'));
        press(&mut state, &mut view_data, &tx, KeyCode::Char('s'));
        assert_eq!(state.generation(), before);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn developer_input_applies_on_enter() {
        let mut state = loaded_state(10);
        let mut view_data = ViewData::default();
        let (tx, rx) = channel();

        press(&mut state, &mut view_data, &tx, KeyCode::Char('d'));
        assert_eq!(
            view_data.input.as_ref().map(|input| input.field),
            Some(TextField::Developer)
        );
        for ch in "Mirvx".chars() {
            press(&mut state, &mut view_data, &tx, KeyCode::Char(ch));
        }
        press(&mut state, &mut view_data, &tx, KeyCode::Backspace);
        assert!(
            status_text(&state, &view_data, &DisplayOptions::default()).starts_with("developer: Mirv_")
        );
        assert!(rx.try_recv().is_err());
        press(&mut state, &mut view_data, &tx, KeyCode::Enter);

        assert_eq!(state.criteria().developer.as_deref(), Some("Mirv"));
        assert!(view_data.input.is_none());
        let Ok(BackendRequest::Count { filters_json, .. }) = rx.try_recv() else {
            panic!("expected a count request after enter");
        };
        assert!(filters_json.contains(r#""Developer":"Mirv""#), "got {filters_json}");
    }

    #[test]
    fn space_toggles_focused_option_and_requeries() {
        let mut state = loaded_state(10);
        let mut view_data = ViewData::default();
        let (tx, rx) = channel();

        press(&mut state, &mut view_data, &tx, KeyCode::Char(' '));
        assert_eq!(state.criteria().categories.len(), 1);
        assert!(state.options(SelectionField::Category)[0].selected);
        assert!(matches!(
            rx.try_recv(),
            Ok(BackendRequest::Count { .. })
        ));
    }

    #[test]
    fn selection_line_marks_cursor_and_hidden_count() {
        let state = loaded_state(5);
        let line = selection_line(&state, SelectionField::Category, Some(1));
        assert!(line.starts_with("› Category: [ ] Commercial  >[ ] Education"), "got {line}");
        assert!(line.ends_with("(+5 more)"), "got {line}");

        let countries = selection_line(&state, SelectionField::Country, None);
        assert!(countries.contains("[x] Australia"));
        assert!(!countries.contains("more"));
    }

    #[test]
    fn panel_text_reflects_criteria() {
        let mut state = LeadListState::default();
        assert_eq!(pills_line(&state, 0), "  Active: >[Country: Australia ×]");
        assert!(scalar_line(&state).contains("Dates: any"));

        state.dispatch(ListCommand::ChangeFilter(bci_app::FilterChange::StartDate(
            "2025-01-31".to_owned(),
        )));
        assert!(scalar_line(&state).contains("Dates: 2025-01-31.."));
        assert!(pills_line(&state, 1).starts_with("  Active: [Start Date: 2025-01-31 ×] >[Country"));
    }

    #[test]
    fn x_removes_the_pill_under_the_cursor() {
        let mut state = loaded_state(40);
        let mut view_data = ViewData::default();
        let (tx, rx) = channel();

        for _ in 0..2 {
            press(&mut state, &mut view_data, &tx, KeyCode::Char(' '));
            press(&mut state, &mut view_data, &tx, KeyCode::Char('.'));
        }
        press(&mut state, &mut view_data, &tx, KeyCode::Char('v'));
        while rx.try_recv().is_ok() {}
        let labels = state.pills().map(|pill| pill.label).collect::<Vec<_>>();
        assert_eq!(
            labels,
            vec![
                "Hide Viewed Projects",
                "Category: Commercial",
                "Category: Education",
                "Country: Australia",
            ]
        );

        press(&mut state, &mut view_data, &tx, KeyCode::Char(']'));
        press(&mut state, &mut view_data, &tx, KeyCode::Char(']'));
        assert!(pills_line(&state, view_data.pill_cursor).contains(">[Category: Education ×]"));
        press(&mut state, &mut view_data, &tx, KeyCode::Char('x'));

        assert_eq!(
            state.criteria().categories.iter().collect::<Vec<_>>(),
            vec!["Commercial"]
        );
        assert!(state.criteria().hide_viewed_projects);
        assert!(!state.options(SelectionField::Category)[1].selected);
        assert!(matches!(rx.try_recv(), Ok(BackendRequest::Count { .. })));

        for _ in 0..5 {
            press(&mut state, &mut view_data, &tx, KeyCode::Char(']'));
        }
        assert_eq!(view_data.pill_cursor, 2);
    }

    #[test]
    fn status_shows_record_link_when_idle() {
        let state = loaded_state(3);
        let view_data = ViewData::default();
        let text = status_text(&state, &view_data, &DisplayOptions::default());
        assert!(text.starts_with("open: /lightning/r/Organisation__c/"), "got {text}");
    }

    #[test]
    fn state_cycle_wraps_through_none() {
        assert_eq!(next_state(None), Some("NSW"));
        assert_eq!(next_state(Some("ACT")), None);
    }

    #[test]
    fn column_constraints_scale_pixel_widths() {
        let constraints = column_constraints(&DEFAULT_COLUMNS);
        assert_eq!(constraints[0], Constraint::Length(15));
        assert_eq!(constraints[1], Constraint::Min(12));
        assert_eq!(constraints[2], Constraint::Length(33));
    }
}
