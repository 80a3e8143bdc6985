//! # Core
//!
//! Everything the screens share that knows nothing about the terminal.
//!
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  view_state  │   │   accessor   │   │  log_entry   │
//!     │ (Arc<RwLock>)│   │ (dotted keys)│   │  (parser)    │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │                  │                  │
//!            │           ┌──────▼───────┐   ┌──────▼───────┐
//!            │           │    config    │   │   logging    │
//!            │           │ (toml file)  │   │ (simplelog)  │
//!            │           └──────────────┘   └──────────────┘
//!            ▼
//!        used by every screen in `tui`
//! ```
//!
//! ## Modules
//!
//! - [`view_state`]: `SharedViewState`, the lock-guarded cursor/status/error holder
//! - [`accessor`]: typed get/set/toggle over the settings document by dotted key
//! - [`config`]: the settings document and its TOML persistence
//! - [`duration`]: `1h30m`-style time spans
//! - [`log_entry`]: `LogEntry` and the log line parser
//! - [`logging`]: file logger setup and structured event records
//! - [`error`]: `CoreError`

pub mod accessor;
pub mod config;
pub mod duration;
pub mod error;
pub mod log_entry;
pub mod logging;
pub mod view_state;

pub use error::CoreError;
pub use view_state::SharedViewState;
