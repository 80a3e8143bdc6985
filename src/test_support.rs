//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;

use crate::core::CoreError;
use crate::core::log_entry::{LogEntry, LogLevel};
use crate::sources::{
    Cell, CellDiffEngine, ConvertOptions, DocumentConverter, LogSource, Sheet, StructuredDocument,
};
use crate::tui::tasks::Collaborators;

/// Serves documents from memory; unknown paths fail like a missing file.
#[derive(Default)]
pub struct StubConverter {
    documents: HashMap<PathBuf, StructuredDocument>,
}

impl StubConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, document: StructuredDocument) -> Self {
        self.documents.insert(PathBuf::from(path), document);
        self
    }
}

#[async_trait]
impl DocumentConverter for StubConverter {
    async fn load_document(
        &self,
        path: &Path,
        options: ConvertOptions,
    ) -> Result<StructuredDocument, CoreError> {
        let mut document = self
            .documents
            .get(path)
            .cloned()
            .ok_or_else(|| CoreError::load_failure(path, "no such file"))?;
        options.apply(&mut document);
        Ok(document)
    }
}

pub struct StubLogSource {
    entries: Vec<LogEntry>,
}

impl StubLogSource {
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn with(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl LogSource for StubLogSource {
    async fn load_entries(&self) -> Result<Vec<LogEntry>, CoreError> {
        Ok(self.entries.clone())
    }
}

pub fn stub_collaborators(converter: StubConverter, logs: StubLogSource) -> Collaborators {
    Collaborators {
        converter: Arc::new(converter),
        engine: Arc::new(CellDiffEngine),
        logs: Arc::new(logs),
        export_dir: std::env::temp_dir(),
    }
}

/// One sheet, two cells.
pub fn sample_document() -> StructuredDocument {
    let mut sheet = Sheet {
        name: "Sheet1".to_string(),
        ..Sheet::default()
    };
    sheet.cells.insert("A1".to_string(), Cell::with_value("Revenue"));
    sheet.cells.insert("B1".to_string(), Cell::with_value(42));
    StructuredDocument {
        version: "1.0".to_string(),
        sheets: vec![sheet],
    }
}

/// An entry at a fixed timestamp, `seconds` after 2025-03-01T10:00:00Z.
pub fn log_entry(level: LogLevel, message: &str, seconds: i64) -> LogEntry {
    let base = DateTime::parse_from_rfc3339("2025-03-01T10:00:00+00:00")
        .expect("valid timestamp");
    LogEntry::new(base + chrono::Duration::seconds(seconds), level, message)
}
