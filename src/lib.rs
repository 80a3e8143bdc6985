//! cellview library exports for testing

use clap::ValueEnum;

pub mod core;
pub mod sources;
pub mod tui;

#[cfg(test)]
pub mod test_support;

/// The screens the application can show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ScreenKind {
    #[default]
    Menu,
    Diff,
    Logs,
    Settings,
}
