//! # Log Entries
//!
//! The record the log browser works on, and the parser that recovers it
//! from the application's own log file.
//!
//! Lines look like what [`crate::core::logging`] writes:
//!
//! ```text
//! 2025-03-01T10:15:42.123+00:00 [ERROR] cellview::sources: [src/sources/mod.rs:88] load failed {"error":"bad zip"}
//! └──────── timestamp ────────┘ └level┘ └─── target ────┘ └──── location ─────┘ └message┘ └── fields ──┘
//! ```
//!
//! Everything after the level is optional.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Case-insensitive. `WARNING` is warn; `TRACE` folds into debug.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Some(LogLevel::Error),
            "WARN" | "WARNING" => Some(LogLevel::Warn),
            "INFO" => Some(LogLevel::Info),
            "DEBUG" | "TRACE" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<FixedOffset>,
    pub level: LogLevel,
    pub message: String,
    pub source_file: Option<String>,
    pub source_line: Option<u32>,
    pub error: Option<String>,
    pub fields: BTreeMap<String, Value>,
}

impl LogEntry {
    pub fn new(timestamp: DateTime<FixedOffset>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            level,
            message: message.into(),
            source_file: None,
            source_line: None,
            error: None,
            fields: BTreeMap::new(),
        }
    }

    /// Parse one log line. Returns `None` for anything that is not an entry
    /// (continuation lines, blank lines, foreign output).
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim_end();
        let (stamp, rest) = line.split_once(' ')?;
        let timestamp = DateTime::parse_from_rfc3339(stamp).ok()?;

        let rest = rest.trim_start().strip_prefix('[')?;
        let (level, mut rest) = rest.split_once(']')?;
        let level = LogLevel::parse(level)?;
        rest = rest.trim_start();

        // Optional "(thread)"
        if rest.starts_with('(')
            && let Some(end) = rest.find(')')
        {
            rest = rest[end + 1..].trim_start();
        }

        // Optional "target:" (a single token ending in a colon)
        let mut target = None;
        if let Some((token, tail)) = rest.split_once(' ')
            && token.len() > 1
            && token.ends_with(':')
            && !token.contains('[')
        {
            target = Some(token.trim_end_matches(':').to_string());
            rest = tail.trim_start();
        }

        // Optional "[file:line]"
        let mut source_file = None;
        let mut source_line = None;
        if rest.starts_with('[')
            && let Some(end) = rest.find(']')
        {
            let location = &rest[1..end];
            match location.rsplit_once(':') {
                Some((file, line)) if line.parse::<u32>().is_ok() => {
                    source_file = Some(file.to_string());
                    source_line = line.parse().ok();
                }
                _ => source_file = Some(location.to_string()),
            }
            rest = rest[end + 1..].trim_start();
        }

        let (message, fields) = split_fields(rest);
        let error = fields.get("error").map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

        Some(Self {
            timestamp,
            level,
            message: message.to_string(),
            source_file: source_file.or(target),
            source_line,
            error,
            fields,
        })
    }
}

/// Split a trailing ` {json object}` off the message, if it parses.
fn split_fields(text: &str) -> (&str, BTreeMap<String, Value>) {
    if text.ends_with('}')
        && let Some(start) = text.rfind(" {").map(|i| i + 1).or(text.starts_with('{').then_some(0))
        && let Ok(fields) = serde_json::from_str::<BTreeMap<String, Value>>(&text[start..])
    {
        return (text[..start].trim_end(), fields);
    }
    (text, BTreeMap::new())
}
