//! # Logging
//!
//! File logger setup and structured event records.
//!
//! The log file doubles as the data source of the log browser screen, so the
//! line layout here and the parser in [`crate::core::log_entry`] must agree:
//! RFC 3339 timestamp, level, `[file:line]`, message, optional JSON fields.

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

pub const LOG_FILE_NAME: &str = "cellview.log";

/// `~/.cellview/logs/cellview.log`, or `./cellview.log` without a home directory.
pub fn log_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".cellview").join("logs").join(LOG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(LOG_FILE_NAME))
}

/// Install the global file logger. Logging is best-effort: if the file can't
/// be opened the application runs without it.
pub fn init(level: LevelFilter) -> Option<PathBuf> {
    let path = log_path();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && fs::create_dir_all(parent).is_err()
    {
        return None;
    }

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_location_level(LevelFilter::Error)
        .build();

    let file: File = OpenOptions::new().create(true).append(true).open(&path).ok()?;
    WriteLogger::init(level, log_config, file).ok()?;
    Some(path)
}

/// Log `message` with a trailing JSON object of `fields`, which the log
/// browser shows as structured data. A string `"error"` field becomes the
/// entry's error text.
///
/// A macro so the record's `[file:line]` points at the caller.
macro_rules! record_event {
    ($level:expr, $message:expr, $fields:expr $(,)?) => {{
        let fields: ::serde_json::Value = $fields;
        match &fields {
            ::serde_json::Value::Object(map) if !map.is_empty() => {
                ::log::log!($level, "{} {}", $message, fields)
            }
            _ => ::log::log!($level, "{}", $message),
        }
    }};
}
pub(crate) use record_event;

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use log::{Level, Log, Metadata, Record};
    use serde_json::json;

    struct Captured(Mutex<Vec<(String, Option<u32>)>>);

    impl Log for Captured {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            if let Ok(mut records) = self.0.lock() {
                records.push((record.args().to_string(), record.line()));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURED: Captured = Captured(Mutex::new(Vec::new()));

    fn captured(prefix: &str) -> Vec<(String, Option<u32>)> {
        let _ = log::set_logger(&CAPTURED);
        log::set_max_level(log::LevelFilter::Trace);
        CAPTURED
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|(message, _)| message.starts_with(prefix))
            .cloned()
            .collect()
    }

    #[test]
    fn test_log_path_file_name() {
        assert!(log_path().ends_with(LOG_FILE_NAME));
    }

    #[test]
    fn test_record_event_reports_caller_location() {
        captured("");
        let line = line!();
        record_event!(Level::Info, "caller_location", json!({"rows": 3}));
        record_event!(Level::Warn, "caller_location_bare", json!({}));

        let records = captured("caller_location");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], (r#"caller_location {"rows":3}"#.to_string(), Some(line + 1)));
        assert_eq!(records[1], ("caller_location_bare".to_string(), Some(line + 2)));
    }
}
