//! The screens the app routes between. Each one implements [`Screen`](crate::tui::screen::Screen).

pub mod diff;
pub mod log_browser;
pub mod menu;
pub mod settings;

pub use diff::{DiffScreen, DiffState};
pub use log_browser::{LevelFilter, LogBrowser};
pub use menu::MenuScreen;
pub use settings::SettingsScreen;
