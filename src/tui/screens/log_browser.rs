//! # Log Browser
//!
//! Loads the application log, filters it by level and a live search, and
//! shows either a scrolling list or one entry in detail.
//!
//! The filtered view is never edited in place: every filter or search change
//! rebuilds it from the loaded entries with [`filter_entries`], then clamps
//! the cursor and re-fits the scroll window.
//!
//! While idle the log reloads every [`REFRESH_INTERVAL`] without touching the
//! status line. `e` writes the filtered view to a file next to the log.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use log::{debug, info};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Padding, Paragraph};

use crate::ScreenKind;
use crate::core::{CoreError, SharedViewState};
use crate::core::log_entry::{LogEntry, LogLevel};
use crate::tui::event::TuiEvent;
use crate::tui::screen::{Completion, Outcome, Screen, ScreenEvent, Task};
use crate::tui::text;

/// Rows of the viewport not available to the entry list.
pub const CHROME_ROWS: u16 = 10;
const PAGE_SIZE: usize = 10;
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LevelFilter {
    #[default]
    All,
    Only(LogLevel),
}

impl LevelFilter {
    /// all → error → warn → info → debug → all
    pub fn next(self) -> Self {
        match self {
            LevelFilter::All => LevelFilter::Only(LogLevel::Error),
            LevelFilter::Only(LogLevel::Error) => LevelFilter::Only(LogLevel::Warn),
            LevelFilter::Only(LogLevel::Warn) => LevelFilter::Only(LogLevel::Info),
            LevelFilter::Only(LogLevel::Info) => LevelFilter::Only(LogLevel::Debug),
            LevelFilter::Only(LogLevel::Debug) => LevelFilter::All,
        }
    }

    pub fn matches(self, level: LogLevel) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Only(wanted) => wanted == level,
        }
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelFilter::All => f.write_str("all"),
            LevelFilter::Only(level) => write!(f, "{level}"),
        }
    }
}

/// Entries at `level` whose message or error contains `search`
/// (case-insensitive), in their loaded order.
pub fn filter_entries(entries: &[LogEntry], level: LevelFilter, search: &str) -> Vec<LogEntry> {
    let needle = search.to_lowercase();
    entries
        .iter()
        .filter(|entry| level.matches(entry.level))
        .filter(|entry| {
            needle.is_empty()
                || entry.message.to_lowercase().contains(&needle)
                || entry
                    .error
                    .as_deref()
                    .is_some_and(|e| e.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

pub struct LogBrowser {
    view: SharedViewState,
    entries: Vec<LogEntry>,
    filtered: Vec<LogEntry>,
    level_filter: LevelFilter,
    search: String,
    searching: bool,
    show_details: bool,
    offset: usize,
    /// When the last load finished; auto-refresh counts from here.
    last_refresh: Option<Instant>,
    updated: Option<DateTime<Local>>,
    /// Set by an explicit reload, which reports its result in the status line.
    announce_load: bool,
}

impl LogBrowser {
    pub fn new() -> Self {
        Self {
            view: SharedViewState::new(),
            entries: Vec::new(),
            filtered: Vec::new(),
            level_filter: LevelFilter::All,
            search: String::new(),
            searching: false,
            show_details: false,
            offset: 0,
            last_refresh: None,
            updated: None,
            announce_load: false,
        }
    }

    pub fn view(&self) -> &SharedViewState {
        &self.view
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn filtered(&self) -> &[LogEntry] {
        &self.filtered
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.level_filter
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn show_details(&self) -> bool {
        self.show_details
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn selected(&self) -> Option<&LogEntry> {
        self.filtered.get(self.view.cursor())
    }

    /// `max(1, height - 10)`
    pub fn visible_rows(&self) -> usize {
        let (_, height) = self.view.size();
        height.saturating_sub(CHROME_ROWS).max(1) as usize
    }

    fn recompute(&mut self) {
        self.filtered = filter_entries(&self.entries, self.level_filter, &self.search);
        let len = self.filtered.len();
        let cursor = if len == 0 { 0 } else { self.view.cursor().min(len - 1) };
        self.view.set_cursor(cursor);
        self.adjust_scroll();
    }

    fn adjust_scroll(&mut self) {
        let cursor = self.view.cursor();
        let visible = self.visible_rows();
        if cursor < self.offset {
            self.offset = cursor;
        } else if cursor >= self.offset + visible {
            self.offset = cursor + 1 - visible;
        }
    }

    fn move_by(&mut self, delta: isize) {
        self.view.move_cursor(delta, self.filtered.len());
        self.adjust_scroll();
    }

    fn move_to(&mut self, index: usize) {
        let len = self.filtered.len();
        self.view.set_cursor(if len == 0 { 0 } else { index.min(len - 1) });
        self.adjust_scroll();
    }

    fn refresh(&mut self) -> Outcome {
        if self.view.is_loading() {
            return Outcome::Stay;
        }
        self.view.set_loading(true);
        self.view.set_status("Loading logs...");
        self.announce_load = true;
        Outcome::Dispatch(Task::LoadLogs)
    }

    fn auto_refresh(&mut self, now: Instant) -> Outcome {
        let due = self
            .last_refresh
            .is_some_and(|last| now.saturating_duration_since(last) >= REFRESH_INTERVAL);
        if !due || self.view.is_loading() {
            return Outcome::Stay;
        }
        debug!("Auto-refreshing logs");
        self.view.set_loading(true);
        Outcome::Dispatch(Task::LoadLogs)
    }

    fn on_loaded(&mut self, result: Result<Vec<LogEntry>, CoreError>) {
        self.view.set_loading(false);
        self.last_refresh = Some(Instant::now());
        let announce = std::mem::take(&mut self.announce_load);
        match result {
            Ok(entries) => {
                debug!("Loaded {} log entries", entries.len());
                self.entries = entries;
                self.updated = Some(Local::now());
                if announce || self.view.error().is_some() {
                    self.view.clear_error();
                    self.view
                        .set_status(format!("Loaded {} entries", self.entries.len()));
                }
                self.recompute();
            }
            Err(e) => self.view.set_error(e),
        }
    }

    fn export(&mut self) -> Outcome {
        if self.view.is_loading() {
            return Outcome::Stay;
        }
        if self.filtered.is_empty() {
            self.view.set_status("Nothing to export");
            return Outcome::Stay;
        }
        self.view.set_loading(true);
        self.view
            .set_status(format!("Exporting {} entries...", self.filtered.len()));
        Outcome::Dispatch(Task::ExportLogs {
            entries: self.filtered.clone(),
            filter: self.level_filter.to_string(),
            search: self.search.clone(),
        })
    }

    fn on_exported(&mut self, result: Result<PathBuf, CoreError>) {
        self.view.set_loading(false);
        match result {
            Ok(path) => {
                info!("Exported logs to {}", path.display());
                self.view.clear_error();
                self.view.set_status(format!("Exported to {}", path.display()));
            }
            Err(e) => self.view.set_error(e),
        }
    }

    fn handle_search_input(&mut self, input: TuiEvent) -> Outcome {
        match input {
            TuiEvent::Char(c) => {
                self.search.push(c);
                self.recompute();
            }
            TuiEvent::Backspace => {
                self.search.pop();
                self.recompute();
            }
            TuiEvent::Enter => self.searching = false,
            TuiEvent::Escape => {
                self.searching = false;
                self.search.clear();
                self.recompute();
            }
            _ => {}
        }
        Outcome::Stay
    }

    fn handle_detail_input(&mut self, input: TuiEvent) -> Outcome {
        match input {
            TuiEvent::Enter | TuiEvent::Escape => self.show_details = false,
            TuiEvent::Char('q') => return Outcome::Quit,
            _ => {}
        }
        Outcome::Stay
    }

    fn handle_list_input(&mut self, input: TuiEvent) -> Outcome {
        match input {
            TuiEvent::Char('/') | TuiEvent::Char('s') => {
                self.searching = true;
                self.search.clear();
                self.recompute();
            }
            TuiEvent::Tab | TuiEvent::Char('f') => {
                self.level_filter = self.level_filter.next();
                debug!("Log level filter: {}", self.level_filter);
                self.recompute();
            }
            TuiEvent::Char('c') => {
                self.entries.clear();
                self.filtered.clear();
                self.view.set_cursor(0);
                self.offset = 0;
                self.view.set_status("Cleared (log file untouched)");
            }
            TuiEvent::Char('r') => return self.refresh(),
            TuiEvent::Char('e') => return self.export(),
            TuiEvent::Enter => {
                if !self.filtered.is_empty() {
                    self.show_details = true;
                }
            }
            TuiEvent::Up | TuiEvent::Char('k') => self.move_by(-1),
            TuiEvent::Down | TuiEvent::Char('j') => self.move_by(1),
            TuiEvent::PageUp => self.move_by(-(PAGE_SIZE as isize)),
            TuiEvent::PageDown => self.move_by(PAGE_SIZE as isize),
            TuiEvent::Home | TuiEvent::Char('g') => self.move_to(0),
            TuiEvent::End | TuiEvent::Char('G') => self.move_to(usize::MAX),
            TuiEvent::Escape => return Outcome::Back,
            TuiEvent::Char('q') => return Outcome::Quit,
            _ => {}
        }
        Outcome::Stay
    }

    fn header_line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled("Filter: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                self.level_filter.to_string(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled("   Search: ", Style::default().fg(Color::DarkGray)),
        ];
        if self.searching {
            spans.push(Span::styled(
                format!("{}_", self.search),
                Style::default().fg(Color::Yellow),
            ));
        } else if self.search.is_empty() {
            spans.push(Span::styled("-", Style::default().fg(Color::DarkGray)));
        } else {
            spans.push(Span::raw(self.search.clone()));
        }
        spans.push(Span::styled(
            format!("   {} of {} entries", self.filtered.len(), self.entries.len()),
            Style::default().fg(Color::DarkGray),
        ));
        Line::from(spans)
    }

    fn list_lines(&self, width: usize) -> Vec<Line<'static>> {
        if self.filtered.is_empty() {
            let text = if self.view.is_loading() {
                "Loading..."
            } else {
                "No log entries"
            };
            return vec![Line::styled(text, Style::default().fg(Color::DarkGray))];
        }
        let cursor = self.view.cursor();
        let message_width = width.saturating_sub(18);
        self.filtered
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(self.visible_rows())
            .map(|(i, entry)| {
                let selected = i == cursor;
                let base = if selected {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(
                        format!("{} ", entry.timestamp.format("%H:%M:%S")),
                        base.fg(Color::DarkGray),
                    ),
                    Span::styled(
                        format!("{:<7}", format!("[{}]", entry.level.as_str().to_uppercase())),
                        base.fg(level_color(entry.level)).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(text::truncate(&entry.message, message_width), base),
                ])
            })
            .collect()
    }

    fn detail_lines(&self, width: usize) -> Vec<Line<'static>> {
        let Some(entry) = self.selected() else {
            return vec![Line::raw("No entry selected")];
        };
        let label = Style::default().fg(Color::DarkGray);
        let wrap_width = width.saturating_sub(2).max(10);
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Time:    ", label),
                Span::raw(entry.timestamp.to_rfc3339()),
            ]),
            Line::from(vec![
                Span::styled("Level:   ", label),
                Span::styled(
                    entry.level.as_str().to_uppercase(),
                    Style::default()
                        .fg(level_color(entry.level))
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
        ];
        if let Some(file) = &entry.source_file {
            let location = match entry.source_line {
                Some(line) => format!("{file}:{line}"),
                None => file.clone(),
            };
            lines.push(Line::from(vec![
                Span::styled("Source:  ", label),
                Span::raw(location),
            ]));
        }
        lines.push(Line::default());
        lines.push(Line::styled("Message:", label));
        lines.extend(
            text::wrap(&entry.message, wrap_width)
                .into_iter()
                .map(|line| Line::raw(format!("  {line}"))),
        );
        if !entry.fields.is_empty() {
            lines.push(Line::default());
            lines.push(Line::styled("Fields:", label));
            // BTreeMap iteration is already sorted by key
            for (key, value) in &entry.fields {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("  {key}: "), Style::default().fg(Color::Cyan)),
                    Span::raw(value),
                ]));
            }
        }
        if let Some(error) = &entry.error {
            lines.push(Line::default());
            lines.push(Line::styled("Error:", Style::default().fg(Color::Red)));
            lines.extend(
                text::wrap(error, wrap_width)
                    .into_iter()
                    .map(|line| Line::styled(format!("  {line}"), Style::default().fg(Color::Red))),
            );
        }
        lines
    }
}

impl Default for LogBrowser {
    fn default() -> Self {
        Self::new()
    }
}

fn level_color(level: LogLevel) -> Color {
    match level {
        LogLevel::Error => Color::Red,
        LogLevel::Warn => Color::Yellow,
        LogLevel::Info => Color::Green,
        LogLevel::Debug => Color::Blue,
    }
}

impl Screen for LogBrowser {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Logs
    }

    fn is_busy(&self) -> bool {
        self.view.is_loading()
    }

    fn init(&mut self) -> Option<Task> {
        match self.refresh() {
            Outcome::Dispatch(task) => Some(task),
            _ => None,
        }
    }

    fn handle_event(&mut self, event: ScreenEvent) -> Outcome {
        match event {
            ScreenEvent::Input(TuiEvent::Resize(width, height)) => {
                self.view.set_size(width, height);
                self.adjust_scroll();
                Outcome::Stay
            }
            ScreenEvent::Input(input) if self.searching => self.handle_search_input(input),
            ScreenEvent::Input(input) if self.show_details => self.handle_detail_input(input),
            ScreenEvent::Input(input) => self.handle_list_input(input),
            ScreenEvent::Completed(Completion::LogsLoaded(result)) => {
                self.on_loaded(result);
                Outcome::Stay
            }
            ScreenEvent::Completed(Completion::LogsExported(result)) => {
                self.on_exported(result);
                Outcome::Stay
            }
            ScreenEvent::Completed(other) => {
                debug!("Log browser ignoring completion {:?}", other);
                Outcome::Stay
            }
            ScreenEvent::Tick(now) => self.auto_refresh(now),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        // 3 + 3 + 2 + list borders (2) = CHROME_ROWS
        let [title_area, header_area, body_area, status_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .areas(area);

        let title = Paragraph::new(Line::from(vec![
            Span::styled(
                "Application log",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                if self.show_details { "  (detail)" } else { "" },
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                self.updated
                    .map(|at| format!("   Updated: {}", at.format("%H:%M:%S")))
                    .unwrap_or_default(),
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .block(Block::default().borders(Borders::BOTTOM).padding(Padding::top(1)));
        frame.render_widget(title, title_area);

        frame.render_widget(
            Paragraph::new(self.header_line()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            ),
            header_area,
        );

        let inner_width = body_area.width.saturating_sub(2) as usize;
        let (lines, help) = if self.show_details {
            (self.detail_lines(inner_width), " Enter/Esc Back to list  q Quit ")
        } else if self.searching {
            (self.list_lines(inner_width), " Type to search  Enter Keep  Esc Clear ")
        } else {
            (
                self.list_lines(inner_width),
                " / Search  Tab Level  Enter Details  c Clear  r Refresh  e Export  Esc Back ",
            )
        };
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title_bottom(Line::from(help).centered()),
            ),
            body_area,
        );

        let status_style = if self.view.error().is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Gray)
        };
        frame.render_widget(
            Paragraph::new(self.view.status())
                .style(status_style)
                .block(Block::default().borders(Borders::TOP)),
            status_area,
        );
    }
}
