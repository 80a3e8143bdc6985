//! # Screen Contract
//!
//! Every screen is a state machine driven by the event loop:
//!
//! ```text
//!   init() ──► Option<Task> ──► executor ──► Completion ─┐
//!                                                        ▼
//!   key / resize ──────────────────────────────► handle_event() ──► Outcome
//!                                                        │
//!                                                   render()
//! ```
//!
//! `handle_event` is synchronous and never performs I/O. Anything slow is
//! returned as [`Outcome::Dispatch`] and comes back later as a
//! [`ScreenEvent::Completed`]. The loop also delivers a [`ScreenEvent::Tick`]
//! every iteration, which screens without timed work ignore.

use std::path::PathBuf;
use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::Rect;

use crate::ScreenKind;
use crate::core::config::SettingsDocument;
use crate::core::log_entry::LogEntry;
use crate::core::{CoreError, SharedViewState};
use crate::sources::DocumentDiff;
use crate::tui::event::TuiEvent;

/// Background work a screen asks the loop to run.
#[derive(Debug)]
pub enum Task {
    DiscoverDocuments {
        root: PathBuf,
        extensions: Vec<String>,
    },
    /// `progress` is the requesting screen's view state, used for status text.
    CompareDocuments {
        first: PathBuf,
        second: PathBuf,
        progress: SharedViewState,
    },
    LoadLogs,
    /// Write `entries` to a file; `filter` and `search` describe the selection.
    ExportLogs {
        entries: Vec<LogEntry>,
        filter: String,
        search: String,
    },
    SaveSettings {
        path: PathBuf,
        settings: Box<SettingsDocument>,
    },
}

/// The typed result of a [`Task`], delivered back to the active screen.
#[derive(Debug, Clone)]
pub enum Completion {
    DocumentsDiscovered(Result<Vec<PathBuf>, CoreError>),
    ComparisonReady {
        first: PathBuf,
        second: PathBuf,
        result: Result<DocumentDiff, CoreError>,
    },
    LogsLoaded(Result<Vec<LogEntry>, CoreError>),
    LogsExported(Result<PathBuf, CoreError>),
    SettingsSaved(Result<PathBuf, CoreError>),
}

#[derive(Debug, Clone)]
pub enum ScreenEvent {
    Input(TuiEvent),
    Completed(Completion),
    /// Sent once per loop iteration so screens can schedule timed work.
    Tick(Instant),
}

/// What the loop should do after a screen handled an event.
#[derive(Debug)]
pub enum Outcome {
    Stay,
    Dispatch(Task),
    /// Return to the parent menu.
    Back,
    Quit,
    Open(ScreenKind),
    /// The settings document changed; later screens should see the new one.
    Apply(Box<SettingsDocument>),
}

pub trait Screen {
    fn kind(&self) -> ScreenKind;

    /// Called once when the screen becomes active.
    fn init(&mut self) -> Option<Task>;

    fn handle_event(&mut self, event: ScreenEvent) -> Outcome;

    /// True while waiting on a dispatched task.
    fn is_busy(&self) -> bool {
        false
    }

    fn render(&mut self, frame: &mut Frame, area: Rect);
}
