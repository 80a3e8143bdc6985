//! # Shared View State
//!
//! Cross-cutting UI state every screen needs: viewport size, cursor,
//! status line, loading flag and the last error.
//!
//! ```text
//! SharedViewState (cheap clone, same state)
//! └── Arc<RwLock<ViewState>>
//!     ├── width, height   // viewport
//!     ├── cursor          // selected row
//!     ├── status          // status line text
//!     ├── loading         // background work in flight
//!     └── error           // last failure, if any
//! ```
//!
//! The owning screen mutates it from the event loop. A clone may be handed
//! to a background task so it can post progress text; the lock is held only
//! for the duration of a single field read or write.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::error::CoreError;

pub const DEFAULT_WIDTH: u16 = 80;
pub const DEFAULT_HEIGHT: u16 = 24;

#[derive(Debug, Clone)]
struct ViewState {
    width: u16,
    height: u16,
    cursor: usize,
    status: String,
    loading: bool,
    error: Option<CoreError>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            cursor: 0,
            status: String::new(),
            loading: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedViewState {
    inner: Arc<RwLock<ViewState>>,
}

impl SharedViewState {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicked writer cannot leave a torn value behind (every write is a
    // single assignment), so a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, ViewState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ViewState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_size(&self, width: u16, height: u16) {
        let mut state = self.write();
        state.width = width;
        state.height = height;
    }

    /// Returns `(width, height)`.
    pub fn size(&self) -> (u16, u16) {
        let state = self.read();
        (state.width, state.height)
    }

    pub fn set_cursor(&self, cursor: usize) {
        self.write().cursor = cursor;
    }

    pub fn cursor(&self) -> usize {
        self.read().cursor
    }

    /// Move the cursor by `delta`, clamped to `[0, max - 1]`.
    /// With `max == 0` there is nothing to select and the cursor is 0.
    pub fn move_cursor(&self, delta: isize, max: usize) {
        let mut state = self.write();
        state.cursor = if max == 0 {
            0
        } else {
            state.cursor.saturating_add_signed(delta).min(max - 1)
        };
    }

    pub fn set_status(&self, status: impl Into<String>) {
        self.write().status = status.into();
    }

    pub fn status(&self) -> String {
        self.read().status.clone()
    }

    pub fn set_loading(&self, loading: bool) {
        self.write().loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    /// Record an error. The status line is overwritten with its message.
    pub fn set_error(&self, error: CoreError) {
        let mut state = self.write();
        state.status = error.to_string();
        state.error = Some(error);
    }

    pub fn error(&self) -> Option<CoreError> {
        self.read().error.clone()
    }

    pub fn clear_error(&self) {
        self.write().error = None;
    }

    /// Cursor, status, loading and error back to their defaults. Size is kept.
    pub fn reset(&self) {
        let mut state = self.write();
        state.cursor = 0;
        state.status.clear();
        state.loading = false;
        state.error = None;
    }
}
