//! Settings screen: browse every registered key, toggle or edit it, save.
//!
//! Every successful change is handed to the app as [`Outcome::Apply`] so the
//! screens opened afterwards see it. Failures stay on this screen as inline
//! status text.

use std::path::PathBuf;

use log::{debug, info};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph};

use crate::ScreenKind;
use crate::core::SharedViewState;
use crate::core::accessor::{self, ValueKind};
use crate::core::config::SettingsDocument;
use crate::tui::event::TuiEvent;
use crate::tui::screen::{Completion, Outcome, Screen, ScreenEvent, Task};
use crate::tui::text;

pub struct SettingsScreen {
    view: SharedViewState,
    settings: SettingsDocument,
    config_path: PathBuf,
    keys: Vec<&'static str>,
    editing: Option<String>,
    list_state: ListState,
}

impl SettingsScreen {
    pub fn new(settings: SettingsDocument, config_path: PathBuf) -> Self {
        Self {
            view: SharedViewState::new(),
            settings,
            config_path,
            keys: accessor::keys(),
            editing: None,
            list_state: ListState::default(),
        }
    }

    pub fn view(&self) -> &SharedViewState {
        &self.view
    }

    pub fn settings(&self) -> &SettingsDocument {
        &self.settings
    }

    /// The edit buffer, if a value is being edited.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn selected_key(&self) -> Option<&'static str> {
        self.keys.get(self.view.cursor()).copied()
    }

    fn applied(&self, key: &str) -> Outcome {
        let value = accessor::get(&self.settings, key)
            .map(|v| v.to_string())
            .unwrap_or_default();
        info!("Setting {} = {}", key, value);
        self.view.clear_error();
        self.view.set_status(format!("{key} = {value} (press s to save)"));
        Outcome::Apply(Box::new(self.settings.clone()))
    }

    fn activate(&mut self) -> Outcome {
        let Some(key) = self.selected_key() else {
            return Outcome::Stay;
        };
        if accessor::kind_of(key) == Some(ValueKind::Bool) {
            return match accessor::toggle(&mut self.settings, key) {
                Ok(()) => self.applied(key),
                Err(e) => {
                    self.view.set_error(e);
                    Outcome::Stay
                }
            };
        }
        match accessor::get(&self.settings, key) {
            Ok(value) => {
                self.editing = Some(value.to_string());
                self.view.set_status(format!("Editing {key}"));
            }
            Err(e) => self.view.set_error(e),
        }
        Outcome::Stay
    }

    fn handle_edit(&mut self, input: TuiEvent) -> Outcome {
        let Some(buffer) = self.editing.as_mut() else {
            return Outcome::Stay;
        };
        match input {
            TuiEvent::Char(c) => buffer.push(c),
            TuiEvent::Backspace => {
                buffer.pop();
            }
            TuiEvent::Escape => {
                self.editing = None;
                self.view.clear_error();
                self.view.set_status("Edit cancelled");
            }
            TuiEvent::Enter => {
                let raw = buffer.clone();
                let Some(key) = self.selected_key() else {
                    return Outcome::Stay;
                };
                return match accessor::set_raw(&mut self.settings, key, &raw) {
                    Ok(()) => {
                        self.editing = None;
                        self.applied(key)
                    }
                    Err(e) => {
                        debug!("Rejected value {:?} for {}: {}", raw, key, e);
                        self.view.set_error(e);
                        Outcome::Stay
                    }
                };
            }
            _ => {}
        }
        Outcome::Stay
    }

    fn save(&self) -> Outcome {
        self.view.set_loading(true);
        self.view.set_status(format!("Saving to {}...", self.config_path.display()));
        Outcome::Dispatch(Task::SaveSettings {
            path: self.config_path.clone(),
            settings: Box::new(self.settings.clone()),
        })
    }
}

impl Screen for SettingsScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Settings
    }

    fn is_busy(&self) -> bool {
        self.view.is_loading()
    }

    fn init(&mut self) -> Option<Task> {
        self.view.set_status(format!("Config: {}", self.config_path.display()));
        None
    }

    fn handle_event(&mut self, event: ScreenEvent) -> Outcome {
        match event {
            ScreenEvent::Input(TuiEvent::Resize(width, height)) => {
                self.view.set_size(width, height);
                Outcome::Stay
            }
            ScreenEvent::Input(input) if self.editing.is_some() => self.handle_edit(input),
            ScreenEvent::Input(input) => match input {
                TuiEvent::Up | TuiEvent::Char('k') => {
                    self.view.move_cursor(-1, self.keys.len());
                    Outcome::Stay
                }
                TuiEvent::Down | TuiEvent::Char('j') => {
                    self.view.move_cursor(1, self.keys.len());
                    Outcome::Stay
                }
                TuiEvent::Enter | TuiEvent::Char(' ') => self.activate(),
                TuiEvent::Char('s') if !self.view.is_loading() => self.save(),
                TuiEvent::Escape | TuiEvent::Char('q') => Outcome::Back,
                _ => Outcome::Stay,
            },
            ScreenEvent::Completed(Completion::SettingsSaved(result)) => {
                self.view.set_loading(false);
                match result {
                    Ok(path) => {
                        self.view.clear_error();
                        self.view.set_status(format!("Saved to {}", path.display()));
                    }
                    Err(e) => self.view.set_error(e),
                }
                Outcome::Stay
            }
            ScreenEvent::Completed(other) => {
                debug!("Settings screen ignoring completion {:?}", other);
                Outcome::Stay
            }
            ScreenEvent::Tick(_) => Outcome::Stay,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [title_area, list_area, edit_area, status_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(if self.editing.is_some() { 3 } else { 0 }),
            Constraint::Length(2),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(
                    "Settings",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  {}", self.config_path.display()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
            .block(Block::default().borders(Borders::BOTTOM).padding(Padding::top(1))),
            title_area,
        );

        let key_width = self.keys.iter().map(|k| k.len()).max().unwrap_or(0) + 2;
        let value_width = (list_area.width as usize).saturating_sub(key_width + 6);
        let mut section = "";
        let mut items = Vec::with_capacity(self.keys.len());
        let mut rows_before_cursor = 0;
        for (i, key) in self.keys.iter().enumerate() {
            let key_section = key.split('.').next().unwrap_or_default();
            if key_section != section {
                section = key_section;
                items.push(ListItem::new(Line::styled(
                    format!("[{section}]"),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
            }
            if i == self.view.cursor() {
                rows_before_cursor = items.len();
            }
            let value = accessor::get(&self.settings, key)
                .map(|v| v.to_string())
                .unwrap_or_default();
            let value = if value.is_empty() { "-".to_string() } else { value };
            items.push(ListItem::new(Line::from(vec![
                Span::raw(text::fit(key, key_width)),
                Span::styled(
                    text::truncate(&value, value_width),
                    Style::default().fg(Color::Gray),
                ),
            ])));
        }
        self.list_state.select(Some(rows_before_cursor));
        let help = if self.editing.is_some() {
            " Enter Apply  Esc Cancel "
        } else {
            " Enter Toggle/Edit  s Save  Esc Back "
        };
        let list = List::new(items)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title_bottom(Line::from(help).centered())
                    .padding(Padding::horizontal(1)),
            );
        frame.render_stateful_widget(list, list_area, &mut self.list_state);

        if let Some(buffer) = &self.editing {
            let title = self.selected_key().unwrap_or_default();
            frame.render_widget(
                Paragraph::new(format!("{buffer}_")).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Yellow))
                        .title(format!(" {title} ")),
                ),
                edit_area,
            );
        }

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
