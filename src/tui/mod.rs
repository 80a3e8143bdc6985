//! # TUI Adapter
//!
//! The ratatui-specific layer: terminal I/O, the event loop, and the screens.
//!
//! ## Event Loop
//!
//! One event is processed to completion before the next:
//!
//! ```text
//!   crossterm ──► TuiEvent ──┐
//!                            ├──► App::handle ──► Step::Run(task) ──► tokio::spawn
//!   mpsc::Receiver ──────────┘                                            │
//!        ▲                                                                │
//!        └───────────────────────── Completion ◄──────────────────────────┘
//! ```
//!
//! The loop redraws only after something happened. While a screen shows a
//! loading state it polls on a short timeout so progress text written by a
//! running task appears without waiting for input. Each iteration ends with a
//! `ScreenEvent::Tick`, which is how a screen runs periodic work.

pub mod app;
pub mod event;
pub mod screen;
pub mod screens;
pub mod tasks;
pub mod text;

use log::{debug, info, warn};
use std::io::stdout;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::ScreenKind;
use crate::core::config::SettingsDocument;
use crate::tui::app::{App, Step};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};
use crate::tui::screen::ScreenEvent;
use crate::tui::tasks::{Collaborators, spawn_task};

const BUSY_POLL: Duration = Duration::from_millis(100);
const IDLE_POLL: Duration = Duration::from_millis(500);

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Lets the terminal report a bare Escape without the usual delay;
        // terminals without the protocol ignore it
        execute!(
            stdout(),
            Hide,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
        info!("Terminal modes enabled (hidden cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), PopKeyboardEnhancementFlags, Show);
    }
}

/// Everything the loop needs to start.
pub struct Launch {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub settings: SettingsDocument,
    pub collaborators: Collaborators,
    pub initial: ScreenKind,
}

pub fn run(launch: Launch) -> std::io::Result<()> {
    let Launch {
        root,
        config_path,
        settings,
        collaborators,
        initial,
    } = launch;

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Completions from background tasks
    let (tx, rx) = mpsc::channel();

    let mut app = App::new(root, config_path, settings);
    match terminal.size() {
        Ok(size) => {
            app.handle(ScreenEvent::Input(TuiEvent::Resize(size.width, size.height)));
        }
        Err(e) => warn!("Could not read terminal size: {}", e),
    }
    if let Some(task) = app.open(initial) {
        spawn_task(task, &collaborators, tx.clone());
    }

    let mut needs_redraw = true; // Force first frame

    let result = loop {
        if needs_redraw {
            if let Err(e) = terminal.draw(|f| app.render(f)) {
                break Err(e);
            }
            needs_redraw = false;
        }

        let busy = app.is_busy();
        let timeout = if busy { BUSY_POLL } else { IDLE_POLL };
        let first_event = poll_event_timeout(timeout);
        if busy {
            // Progress text may have changed under a running task
            needs_redraw = true;
        }

        let mut should_quit = false;
        let completions = std::iter::from_fn(|| rx.try_recv().ok()).map(ScreenEvent::Completed);
        let inputs = first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
            .map(ScreenEvent::Input);
        let events = inputs.chain(completions).map(|event| (true, event));
        let tick = std::iter::once((false, ScreenEvent::Tick(Instant::now())));
        for (redraw, event) in events.chain(tick) {
            needs_redraw |= redraw;
            match app.handle(event) {
                Step::Continue => {}
                Step::Run(task) => {
                    needs_redraw = true;
                    debug!("Dispatching task from {:?}", app.current());
                    spawn_task(task, &collaborators, tx.clone());
                }
                Step::Quit => {
                    should_quit = true;
                    break;
                }
            }
        }

        if should_quit {
            info!("Quit requested, leaving event loop");
            break Ok(());
        }
    };

    ratatui::restore();
    result
}
