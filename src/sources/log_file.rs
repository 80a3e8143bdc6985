//! Reads log entries back out of the application's log file.

use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use log::debug;
use serde_json::Value;

use super::LogSource;
use crate::core::CoreError;
use crate::core::log_entry::LogEntry;

/// How many entries the log browser keeps.
pub const DEFAULT_ENTRY_LIMIT: usize = 1000;

pub struct FileLogSource {
    path: PathBuf,
    limit: usize,
}

impl FileLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            limit: DEFAULT_ENTRY_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[async_trait]
impl LogSource for FileLogSource {
    async fn load_entries(&self) -> Result<Vec<LogEntry>, CoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No log file at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(CoreError::load_failure(&self.path, e)),
        };
        // A torn or foreign line must not hide the rest of the file
        let contents = String::from_utf8_lossy(&bytes);
        Ok(parse_entries(&contents, self.limit))
    }
}

/// Parse every recognizable line, newest first, keeping at most `limit`.
/// Entries with equal timestamps keep the later line first.
pub fn parse_entries(contents: &str, limit: usize) -> Vec<LogEntry> {
    let mut entries: Vec<LogEntry> = contents.lines().filter_map(LogEntry::parse_line).collect();
    entries.reverse();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries.truncate(limit);
    entries
}

/// Write `entries` to a new `cellview_logs_<stamp>.txt` under `dir` and
/// return its path. `filter` and `search` describe the selection and go into
/// the header; an empty `search` is left out.
pub fn export_entries(
    dir: &Path,
    entries: &[LogEntry],
    filter: &str,
    search: &str,
    generated: DateTime<Local>,
) -> Result<PathBuf, CoreError> {
    let path = dir.join(format!("cellview_logs_{}.txt", generated.format("%Y%m%d_%H%M%S")));
    let contents = render_export(entries, filter, search, generated);
    fs::create_dir_all(dir)
        .and_then(|()| fs::write(&path, contents))
        .map_err(|e| CoreError::Internal(format!("could not write {}: {e}", path.display())))?;
    Ok(path)
}

fn render_export(entries: &[LogEntry], filter: &str, search: &str, generated: DateTime<Local>) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_export(&mut out, entries, filter, search, generated);
    out
}

fn write_export(
    out: &mut String,
    entries: &[LogEntry],
    filter: &str,
    search: &str,
    generated: DateTime<Local>,
) -> std::fmt::Result {
    writeln!(out, "cellview Log Export")?;
    writeln!(out, "Generated: {}", generated.to_rfc3339())?;
    writeln!(out, "Total Entries: {}", entries.len())?;
    writeln!(out, "Filter: {filter}")?;
    if !search.is_empty() {
        writeln!(out, "Search: {search}")?;
    }
    writeln!(out, "{}", "=".repeat(80))?;
    writeln!(out)?;

    for entry in entries {
        writeln!(out, "Timestamp: {}", entry.timestamp.to_rfc3339())?;
        writeln!(out, "Level: {}", entry.level)?;
        writeln!(out, "Message: {}", entry.message)?;
        if let Some(file) = &entry.source_file {
            match entry.source_line {
                Some(line) => writeln!(out, "Location: {file}:{line}")?,
                None => writeln!(out, "Location: {file}")?,
            }
        }
        if let Some(error) = &entry.error {
            writeln!(out, "Error: {error}")?;
        }
        if !entry.fields.is_empty() {
            writeln!(out, "Fields:")?;
            for (key, value) in &entry.fields {
                match value {
                    Value::String(text) => writeln!(out, "  {key}: {text}")?,
                    other => writeln!(out, "  {key}: {other}")?,
                }
            }
        }
        writeln!(out, "{}", "-".repeat(40))?;
        writeln!(out)?;
    }
    Ok(())
}
