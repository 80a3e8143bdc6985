//! Routes events to the active screen and acts on its [`Outcome`].
//!
//! The app owns the settings document so changes applied on the settings
//! screen reach every screen opened afterwards. It performs no I/O itself:
//! tasks are handed back to the caller to spawn.

use std::path::PathBuf;

use log::{debug, info};
use ratatui::Frame;

use crate::ScreenKind;
use crate::core::config::SettingsDocument;
use crate::tui::event::TuiEvent;
use crate::tui::screen::{Outcome, Screen, ScreenEvent, Task};
use crate::tui::screens::{DiffScreen, LogBrowser, MenuScreen, SettingsScreen};

/// What the loop should do after the app handled one event.
#[derive(Debug)]
pub enum Step {
    Continue,
    Run(Task),
    Quit,
}

pub struct App {
    root: PathBuf,
    config_path: PathBuf,
    settings: SettingsDocument,
    screen: Box<dyn Screen>,
    size: Option<(u16, u16)>,
}

impl App {
    pub fn new(root: PathBuf, config_path: PathBuf, settings: SettingsDocument) -> Self {
        Self {
            root,
            config_path,
            settings,
            screen: Box::new(MenuScreen::new()),
            size: None,
        }
    }

    pub fn settings(&self) -> &SettingsDocument {
        &self.settings
    }

    pub fn current(&self) -> ScreenKind {
        self.screen.kind()
    }

    pub fn is_busy(&self) -> bool {
        self.screen.is_busy()
    }

    fn build_screen(&self, kind: ScreenKind) -> Box<dyn Screen> {
        match kind {
            ScreenKind::Menu => Box::new(MenuScreen::new()),
            ScreenKind::Diff => Box::new(DiffScreen::new(
                self.root.clone(),
                self.settings.watcher.file_extensions.clone(),
            )),
            ScreenKind::Logs => Box::new(LogBrowser::new()),
            ScreenKind::Settings => Box::new(SettingsScreen::new(
                self.settings.clone(),
                self.config_path.clone(),
            )),
        }
    }

    /// Replace the active screen with a fresh `kind` and run its `init`.
    /// Results still in flight for the old screen are dropped on arrival.
    pub fn open(&mut self, kind: ScreenKind) -> Option<Task> {
        info!("Opening screen {:?}", kind);
        self.screen = self.build_screen(kind);
        if let Some((width, height)) = self.size {
            self.screen
                .handle_event(ScreenEvent::Input(TuiEvent::Resize(width, height)));
        }
        self.screen.init()
    }

    pub fn handle(&mut self, event: ScreenEvent) -> Step {
        match event {
            ScreenEvent::Input(TuiEvent::ForceQuit) => return Step::Quit,
            ScreenEvent::Input(TuiEvent::Resize(width, height)) => {
                self.size = Some((width, height));
            }
            _ => {}
        }

        match self.screen.handle_event(event) {
            Outcome::Stay => Step::Continue,
            Outcome::Dispatch(task) => Step::Run(task),
            Outcome::Back => self.step_to(ScreenKind::Menu),
            Outcome::Open(kind) => self.step_to(kind),
            Outcome::Quit => Step::Quit,
            Outcome::Apply(settings) => {
                debug!("Settings applied");
                self.settings = *settings;
                Step::Continue
            }
        }
    }

    fn step_to(&mut self, kind: ScreenKind) -> Step {
        match self.open(kind) {
            Some(task) => Step::Run(task),
            None => Step::Continue,
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        self.screen.render(frame, area);
    }
}
