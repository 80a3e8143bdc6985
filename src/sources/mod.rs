//! # Sources
//!
//! The collaborators the screens consume: document discovery, conversion,
//! structural diffing and log retrieval.
//!
//! Screens only see the traits below. The binary wires in the default
//! implementations ([`SnapshotConverter`], [`CellDiffEngine`],
//! [`FileLogSource`]); tests swap in stubs.

use std::path::Path;

use async_trait::async_trait;

use crate::core::CoreError;
use crate::core::log_entry::LogEntry;

pub mod diff;
pub mod discovery;
pub mod document;
pub mod log_file;
pub mod snapshot;

pub use diff::{
    CellChange, CellDiffEngine, ChangeKind, DiffEngine, DiffSummary, DocumentDiff, SheetAction,
    SheetDiff,
};
pub use discovery::discover_documents;
pub use document::{Cell, ConvertOptions, Sheet, StructuredDocument};
pub use log_file::{FileLogSource, export_entries};
pub use snapshot::SnapshotConverter;

/// Turns a workbook on disk into a [`StructuredDocument`].
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn load_document(
        &self,
        path: &Path,
        options: ConvertOptions,
    ) -> Result<StructuredDocument, CoreError>;
}

/// Produces the entries shown by the log browser.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn load_entries(&self) -> Result<Vec<LogEntry>, CoreError>;
}
