//! # Diff Workflow
//!
//! Pick two workbooks, compare them in the background, browse the result.
//!
//! ```text
//!              init / retry ──► discovery
//!                                  │
//!        ┌────────── empty / err ──┴── documents ──────────┐
//!        ▼                                                  ▼
//!    ┌───────┐  r (retry)                             ┌───────────┐
//!    │ Error │ ─────────────────────────────────────► │ Selecting │ ◄──┐
//!    └───────┘ ◄────────── load failure ───────────── └─────┬─────┘    │
//!                                                first+second│         │ Esc / q
//!                                                  comparison▼         │
//!                                                     ┌─────────┐      │
//!                                                     │ Viewing │ ─────┘
//!                                                     └─────────┘
//! ```
//!
//! A comparison result is only accepted while its pair is still the current
//! selection; anything else is stale and dropped on arrival.

mod browser;

pub use browser::{BROWSER_CHROME_ROWS, DiffBrowser, DisplayMode};

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph, Wrap};

use crate::ScreenKind;
use crate::core::{CoreError, SharedViewState};
use crate::sources::DocumentDiff;
use crate::tui::event::TuiEvent;
use crate::tui::screen::{Completion, Outcome, Screen, ScreenEvent, Task};

/// Header + status rows around the document list and the browser.
const SCREEN_CHROME_ROWS: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffState {
    Selecting,
    Viewing,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSelection {
    pub first: Option<PathBuf>,
    pub second: Option<PathBuf>,
}

impl DiffSelection {
    fn clear(&mut self) {
        self.first = None;
        self.second = None;
    }

    fn is(&self, first: &Path, second: &Path) -> bool {
        self.first.as_deref() == Some(first) && self.second.as_deref() == Some(second)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Discovery,
    Comparison { first: PathBuf, second: PathBuf },
}

pub struct DiffScreen {
    root: PathBuf,
    extensions: Vec<String>,
    view: SharedViewState,
    state: DiffState,
    documents: Vec<PathBuf>,
    selection: DiffSelection,
    pending: Option<Pending>,
    browser: Option<DiffBrowser>,
    list_state: ListState,
    show_help: bool,
}

impl DiffScreen {
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            extensions,
            view: SharedViewState::new(),
            state: DiffState::Selecting,
            documents: Vec::new(),
            selection: DiffSelection::default(),
            pending: None,
            browser: None,
            list_state: ListState::default(),
            show_help: true,
        }
    }

    pub fn state(&self) -> DiffState {
        self.state
    }

    pub fn documents(&self) -> &[PathBuf] {
        &self.documents
    }

    pub fn selection(&self) -> &DiffSelection {
        &self.selection
    }

    pub fn view(&self) -> &SharedViewState {
        &self.view
    }

    pub fn comparison(&self) -> Option<&DocumentDiff> {
        self.browser.as_ref().map(DiffBrowser::diff)
    }

    pub fn browser(&self) -> Option<&DiffBrowser> {
        self.browser.as_ref()
    }

    pub fn shows_help(&self) -> bool {
        self.show_help
    }

    /// Key hints under the document list; `h`/`?` toggles the full set.
    pub fn selecting_hint(&self) -> &'static str {
        if self.show_help {
            " ↑/↓ Navigate  Enter Select  r Reset  h/? Help  Esc Back "
        } else {
            " h/? Help  Esc Back "
        }
    }

    fn start_discovery(&mut self) -> Task {
        self.state = DiffState::Selecting;
        self.selection.clear();
        self.browser = None;
        self.view.reset();
        self.view.set_loading(true);
        self.view.set_status("Discovering documents...");
        self.pending = Some(Pending::Discovery);
        Task::DiscoverDocuments {
            root: self.root.clone(),
            extensions: self.extensions.clone(),
        }
    }

    fn fail(&mut self, error: CoreError) {
        warn!("Diff workflow error: {}", error);
        self.state = DiffState::Error;
        self.view.set_loading(false);
        self.view.set_error(error);
    }

    fn on_discovered(&mut self, result: Result<Vec<PathBuf>, CoreError>) {
        if self.pending != Some(Pending::Discovery) {
            debug!("Dropping stale discovery result");
            return;
        }
        self.pending = None;
        match result {
            Ok(documents) if documents.is_empty() => {
                self.documents = documents;
                self.fail(CoreError::NotFound("no documents found".to_string()));
            }
            Ok(documents) => {
                info!("Discovered {} documents", documents.len());
                self.documents = documents;
                self.view.set_loading(false);
                self.view.set_cursor(0);
                self.view.set_status(format!(
                    "Found {} documents. Select the first one.",
                    self.documents.len()
                ));
            }
            Err(e) => self.fail(e),
        }
    }

    fn on_compared(
        &mut self,
        first: PathBuf,
        second: PathBuf,
        result: Result<DocumentDiff, CoreError>,
    ) {
        let expected = Pending::Comparison {
            first: first.clone(),
            second: second.clone(),
        };
        if self.pending.as_ref() != Some(&expected) {
            debug!("Dropping comparison of {} and {}: no longer pending", first.display(), second.display());
            return;
        }
        self.pending = None;
        if self.state != DiffState::Selecting || !self.selection.is(&first, &second) {
            debug!("Dropping comparison of {} and {}: selection changed", first.display(), second.display());
            return;
        }
        match result {
            Ok(diff) => {
                self.view.set_loading(false);
                self.view.set_status(if diff.has_changes() {
                    format!("{} changes", diff.summary.total_changes)
                } else {
                    "No changes detected".to_string()
                });
                self.browser = Some(DiffBrowser::new(diff));
                self.state = DiffState::Viewing;
            }
            Err(e) => self.fail(e),
        }
    }

    fn select_current(&mut self) -> Outcome {
        if self.view.is_loading() {
            return Outcome::Stay;
        }
        let Some(current) = self.documents.get(self.view.cursor()).cloned() else {
            return Outcome::Stay;
        };
        match (&self.selection.first, &self.selection.second) {
            (None, _) => {
                self.view
                    .set_status(format!("First: {}. Select the second document.", current.display()));
                self.selection.first = Some(current);
                Outcome::Stay
            }
            (Some(_), Some(_)) => Outcome::Stay,
            (Some(first), None) if *first == current => Outcome::Stay,
            (Some(first), None) => {
                let first = first.clone();
                self.selection.second = Some(current.clone());
                self.pending = Some(Pending::Comparison {
                    first: first.clone(),
                    second: current.clone(),
                });
                self.view.set_loading(true);
                self.view.set_status(format!(
                    "Comparing {} with {}...",
                    first.display(),
                    current.display()
                ));
                Outcome::Dispatch(Task::CompareDocuments {
                    first,
                    second: current,
                    progress: self.view.clone(),
                })
            }
        }
    }

    fn handle_selecting(&mut self, input: TuiEvent) -> Outcome {
        match input {
            TuiEvent::Up | TuiEvent::Char('k') => self.view.move_cursor(-1, self.documents.len()),
            TuiEvent::Down | TuiEvent::Char('j') => self.view.move_cursor(1, self.documents.len()),
            TuiEvent::Enter | TuiEvent::Char(' ') => return self.select_current(),
            TuiEvent::Char('r') if self.pending.is_some() => {
                debug!("Ignoring reset while {:?} is outstanding", self.pending);
            }
            TuiEvent::Char('r') => {
                self.selection.clear();
                self.view.set_status("Selection cleared");
            }
            TuiEvent::Char('h' | '?') => self.show_help = !self.show_help,
            TuiEvent::Escape | TuiEvent::Char('q') => return Outcome::Back,
            _ => {}
        }
        Outcome::Stay
    }

    fn handle_viewing(&mut self, input: TuiEvent) -> Outcome {
        match input {
            TuiEvent::Escape | TuiEvent::Char('q') => {
                self.browser = None;
                self.selection.clear();
                self.state = DiffState::Selecting;
                self.view.set_status("Select the first document.");
            }
            other => {
                let rows = self.browser_rows();
                if let Some(browser) = self.browser.as_mut() {
                    browser.handle_event(other, rows);
                }
            }
        }
        Outcome::Stay
    }

    fn handle_error(&mut self, input: TuiEvent) -> Outcome {
        match input {
            TuiEvent::Char('r') => {
                info!("Retrying document discovery");
                Outcome::Dispatch(self.start_discovery())
            }
            TuiEvent::Escape | TuiEvent::Char('q') => Outcome::Back,
            _ => Outcome::Stay,
        }
    }

    fn browser_rows(&self) -> usize {
        let (_, height) = self.view.size();
        height
            .saturating_sub(SCREEN_CHROME_ROWS + BROWSER_CHROME_ROWS)
            .max(1) as usize
    }

    fn render_selecting(&mut self, frame: &mut Frame, area: Rect) {
        let cursor = self.view.cursor();
        let items: Vec<ListItem> = self
            .documents
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let marker = if self.selection.first.as_ref() == Some(path) {
                    "[1] "
                } else if self.selection.second.as_ref() == Some(path) {
                    "[2] "
                } else {
                    "    "
                };
                let style = if i == cursor {
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else if marker.trim().is_empty() {
                    Style::default().fg(Color::Gray)
                } else {
                    Style::default().fg(Color::Cyan)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(Color::Cyan)),
                    Span::styled(path.display().to_string(), style),
                ]))
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" Documents in {} ", self.root.display()))
            .title_bottom(Line::from(self.selecting_hint()).centered())
            .padding(Padding::horizontal(1));

        if self.documents.is_empty() {
            let text = if self.view.is_loading() {
                "Discovering documents..."
            } else {
                "No documents"
            };
            frame.render_widget(
                Paragraph::new(text)
                    .style(Style::default().fg(Color::DarkGray))
                    .block(block),
                area,
            );
            return;
        }

        self.list_state.select(Some(cursor));
        frame.render_stateful_widget(List::new(items).block(block), area, &mut self.list_state);
    }

    fn render_error(&self, frame: &mut Frame, area: Rect) {
        let message = self
            .view
            .error()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        let paragraph = Paragraph::new(vec![
            Line::styled("Error", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Line::default(),
            Line::raw(message),
        ])
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Compare documents ")
                .title_bottom(Line::from(" r Retry  Esc Back ").centered())
                .padding(Padding::uniform(1)),
        );
        frame.render_widget(paragraph, area);
    }
}

impl Screen for DiffScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Diff
    }

    fn is_busy(&self) -> bool {
        self.view.is_loading()
    }

    fn init(&mut self) -> Option<Task> {
        Some(self.start_discovery())
    }

    fn handle_event(&mut self, event: ScreenEvent) -> Outcome {
        match event {
            ScreenEvent::Input(TuiEvent::Resize(width, height)) => {
                self.view.set_size(width, height);
                Outcome::Stay
            }
            ScreenEvent::Input(input) => match self.state {
                DiffState::Selecting => self.handle_selecting(input),
                DiffState::Viewing => self.handle_viewing(input),
                DiffState::Error => self.handle_error(input),
            },
            ScreenEvent::Completed(Completion::DocumentsDiscovered(result)) => {
                self.on_discovered(result);
                Outcome::Stay
            }
            ScreenEvent::Completed(Completion::ComparisonReady {
                first,
                second,
                result,
            }) => {
                self.on_compared(first, second, result);
                Outcome::Stay
            }
            ScreenEvent::Completed(other) => {
                debug!("Diff screen ignoring completion {:?}", other);
                Outcome::Stay
            }
            ScreenEvent::Tick(_) => Outcome::Stay,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [header_area, body_area, status_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .areas(area);

        let selection = |slot: &Option<PathBuf>| {
            slot.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        let header = Paragraph::new(Line::from(vec![
            Span::styled("Compare documents", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::styled(
                format!(
                    "   first: {}   second: {}",
                    selection(&self.selection.first),
                    selection(&self.selection.second)
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(header, header_area);

        match self.state {
            DiffState::Selecting => self.render_selecting(frame, body_area),
            DiffState::Viewing => {
                if let Some(browser) = &self.browser {
                    browser.render(frame, body_area);
                }
            }
            DiffState::Error => self.render_error(frame, body_area),
        }

        let status_style = if self.view.error().is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Gray)
        };
        let status = Paragraph::new(self.view.status())
            .style(status_style)
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(status, status_area);
    }
}
