//! # Settings Accessor
//!
//! Typed get/set/toggle on a [`SettingsDocument`] by dotted key.
//!
//! Each value kind has a closed registry of keys, generated from a single
//! table below. Looking up a key outside its kind's registry is always an
//! [`CoreError::UnknownKey`]; there is no fallback and no guessing. A failed
//! call leaves the document untouched.
//!
//! ```text
//! "git.auto_push" ──► bool registry ──► &mut doc.git.auto_push
//! "git.nope"      ──► UnknownKey { key, kind: Bool }
//! ```

use std::fmt;
use std::time::Duration;

use crate::core::config::SettingsDocument;
use crate::core::duration;
use crate::core::error::CoreError;

/// The kinds of value a setting can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Bool,
    Duration,
    Int,
    StringList,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Bool => "boolean",
            ValueKind::Duration => "duration",
            ValueKind::Int => "int",
            ValueKind::StringList => "string slice",
        };
        f.write_str(name)
    }
}

/// A setting's current value, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    String(String),
    Bool(bool),
    Duration(Duration),
    Int(i64),
    StringList(Vec<String>),
}

impl SettingValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            SettingValue::String(_) => ValueKind::String,
            SettingValue::Bool(_) => ValueKind::Bool,
            SettingValue::Duration(_) => ValueKind::Duration,
            SettingValue::Int(_) => ValueKind::Int,
            SettingValue::StringList(_) => ValueKind::StringList,
        }
    }
}

/// Renders the value in the same syntax `set_raw` accepts.
impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::String(s) => f.write_str(s),
            SettingValue::Bool(b) => write!(f, "{b}"),
            SettingValue::Duration(d) => f.write_str(&duration::format(*d)),
            SettingValue::Int(i) => write!(f, "{i}"),
            SettingValue::StringList(items) => f.write_str(&items.join(", ")),
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Generates, per kind, the key list plus shared and mutable field lookups.
/// The match arms are the registry: a key not listed here does not exist.
macro_rules! registry {
    ($($kind:ident: $ty:ty, $keys:ident, $field:ident, $field_mut:ident {
        $($key:literal => $($path:ident).+),+ $(,)?
    })+) => {
        $(
            pub const $keys: &[&str] = &[$($key),+];

            fn $field<'a>(doc: &'a SettingsDocument, key: &str) -> Result<&'a $ty, CoreError> {
                match key {
                    $($key => Ok(&doc.$($path).+),)+
                    _ => Err(CoreError::unknown_key(key, ValueKind::$kind)),
                }
            }

            fn $field_mut<'a>(doc: &'a mut SettingsDocument, key: &str) -> Result<&'a mut $ty, CoreError> {
                match key {
                    $($key => Ok(&mut doc.$($path).+),)+
                    _ => Err(CoreError::unknown_key(key, ValueKind::$kind)),
                }
            }
        )+
    };
}

registry! {
    String: String, STRING_KEYS, string_field, string_field_mut {
        "git.remote" => git.remote,
        "git.branch" => git.branch,
        "git.user_name" => git.user_name,
        "git.user_email" => git.user_email,
        "git.commit_template" => git.commit_template,
        "converter.chunking_strategy" => converter.chunking_strategy,
    }
    Bool: bool, BOOL_KEYS, bool_field, bool_field_mut {
        "git.auto_push" => git.auto_push,
        "git.auto_pull" => git.auto_pull,
        "converter.preserve_formulas" => converter.preserve_formulas,
        "converter.preserve_styles" => converter.preserve_styles,
        "converter.preserve_comments" => converter.preserve_comments,
        "converter.compact_json" => converter.compact_json,
        "converter.ignore_empty_cells" => converter.ignore_empty_cells,
        "features.experimental" => features.experimental,
        "features.beta_updates" => features.beta_updates,
        "features.telemetry" => features.telemetry,
        "updates.auto_check" => updates.auto_check,
        "updates.include_prereleases" => updates.include_prereleases,
        "updates.auto_download" => updates.auto_download,
        "updates.notify_on_update" => updates.notify_on_update,
    }
    Duration: Duration, DURATION_KEYS, duration_field, duration_field_mut {
        "watcher.debounce_delay" => watcher.debounce_delay,
        "updates.check_interval" => updates.check_interval,
    }
    Int: i64, INT_KEYS, int_field, int_field_mut {
        "converter.max_cells_per_sheet" => converter.max_cells_per_sheet,
    }
    StringList: Vec<String>, STRING_LIST_KEYS, string_list_field, string_list_field_mut {
        "watcher.directories" => watcher.directories,
        "watcher.ignore_patterns" => watcher.ignore_patterns,
        "watcher.file_extensions" => watcher.file_extensions,
    }
}

/// Domain constraint for integer fields, checked before the write.
fn check_int(key: &str, value: i64) -> Result<(), CoreError> {
    match key {
        "converter.max_cells_per_sheet" if value < 1 => Err(CoreError::validation(
            key,
            "max_cells_per_sheet must be at least 1",
        )),
        _ => Ok(()),
    }
}

/// Which kind `key` belongs to, or `None` if it is in no registry.
pub fn kind_of(key: &str) -> Option<ValueKind> {
    [
        (STRING_KEYS, ValueKind::String),
        (BOOL_KEYS, ValueKind::Bool),
        (DURATION_KEYS, ValueKind::Duration),
        (INT_KEYS, ValueKind::Int),
        (STRING_LIST_KEYS, ValueKind::StringList),
    ]
    .into_iter()
    .find(|(keys, _)| keys.contains(&key))
    .map(|(_, kind)| kind)
}

/// Every registered key, grouped by section in document order.
pub fn keys() -> Vec<&'static str> {
    const SECTIONS: &[&str] = &["git.", "watcher.", "converter.", "features.", "updates."];
    let all: Vec<&'static str> = [
        STRING_KEYS,
        BOOL_KEYS,
        DURATION_KEYS,
        INT_KEYS,
        STRING_LIST_KEYS,
    ]
    .concat();
    SECTIONS
        .iter()
        .flat_map(|section| all.iter().copied().filter(move |key| key.starts_with(*section)))
        .collect()
}

// ============================================================================
// Typed Accessors
// ============================================================================

pub fn get_string(doc: &SettingsDocument, key: &str) -> Result<String, CoreError> {
    string_field(doc, key).cloned()
}

pub fn set_string(doc: &mut SettingsDocument, key: &str, value: &str) -> Result<(), CoreError> {
    *string_field_mut(doc, key)? = value.to_string();
    Ok(())
}

pub fn get_bool(doc: &SettingsDocument, key: &str) -> Result<bool, CoreError> {
    bool_field(doc, key).copied()
}

pub fn set_bool(doc: &mut SettingsDocument, key: &str, value: bool) -> Result<(), CoreError> {
    *bool_field_mut(doc, key)? = value;
    Ok(())
}

/// Flip the boolean at `key`. Fails without writing if `key` is not a boolean.
pub fn toggle(doc: &mut SettingsDocument, key: &str) -> Result<(), CoreError> {
    let field = bool_field_mut(doc, key)?;
    *field = !*field;
    Ok(())
}

pub fn get_duration(doc: &SettingsDocument, key: &str) -> Result<Duration, CoreError> {
    duration_field(doc, key).copied()
}

pub fn set_duration(doc: &mut SettingsDocument, key: &str, raw: &str) -> Result<(), CoreError> {
    let field = duration_field_mut(doc, key)?;
    *field = duration::parse(raw)
        .map_err(|e| CoreError::validation(key, format!("invalid duration format: {e}")))?;
    Ok(())
}

pub fn get_int(doc: &SettingsDocument, key: &str) -> Result<i64, CoreError> {
    int_field(doc, key).copied()
}

pub fn set_int(doc: &mut SettingsDocument, key: &str, raw: &str) -> Result<(), CoreError> {
    // Resolve the key first so an unknown key wins over a bad number
    int_field(doc, key)?;
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|e| CoreError::validation(key, format!("invalid integer format: {e}")))?;
    check_int(key, value)?;
    *int_field_mut(doc, key)? = value;
    Ok(())
}

pub fn get_string_list(doc: &SettingsDocument, key: &str) -> Result<Vec<String>, CoreError> {
    string_list_field(doc, key).cloned()
}

/// Comma-separated input; elements are trimmed and empty ones dropped.
pub fn set_string_list(doc: &mut SettingsDocument, key: &str, raw: &str) -> Result<(), CoreError> {
    *string_list_field_mut(doc, key)? = split_list(raw);
    Ok(())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Kind-Dispatching Accessors
// ============================================================================

/// Read any registered key as a tagged value.
pub fn get(doc: &SettingsDocument, key: &str) -> Result<SettingValue, CoreError> {
    match kind_of(key) {
        Some(ValueKind::String) => get_string(doc, key).map(SettingValue::String),
        Some(ValueKind::Bool) => get_bool(doc, key).map(SettingValue::Bool),
        Some(ValueKind::Duration) => get_duration(doc, key).map(SettingValue::Duration),
        Some(ValueKind::Int) => get_int(doc, key).map(SettingValue::Int),
        Some(ValueKind::StringList) => get_string_list(doc, key).map(SettingValue::StringList),
        None => Err(CoreError::unknown_key(key, ValueKind::String)),
    }
}

/// Parse `raw` according to the key's kind and write it.
pub fn set_raw(doc: &mut SettingsDocument, key: &str, raw: &str) -> Result<(), CoreError> {
    match kind_of(key) {
        Some(ValueKind::String) => set_string(doc, key, raw),
        Some(ValueKind::Bool) => set_bool(doc, key, parse_bool(key, raw)?),
        Some(ValueKind::Duration) => set_duration(doc, key, raw),
        Some(ValueKind::Int) => set_int(doc, key, raw),
        Some(ValueKind::StringList) => set_string_list(doc, key, raw),
        None => Err(CoreError::unknown_key(key, ValueKind::String)),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, CoreError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(CoreError::validation(
            key,
            format!("invalid boolean \"{other}\""),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> SettingsDocument {
        SettingsDocument::default()
    }

    #[test]
    fn test_string_round_trip() {
        let mut d = doc();
        set_string(&mut d, "git.remote", "origin").unwrap();
        assert_eq!(get_string(&d, "git.remote").unwrap(), "origin");
        assert_eq!(d.git.remote, "origin");
    }

    #[test]
    fn test_toggle_is_an_involution() {
        for key in BOOL_KEYS {
            let mut d = doc();
            let before = get_bool(&d, key).unwrap();
            toggle(&mut d, key).unwrap();
            assert_eq!(get_bool(&d, key).unwrap(), !before, "{key}");
            toggle(&mut d, key).unwrap();
            assert_eq!(get_bool(&d, key).unwrap(), before, "{key}");
            assert_eq!(d, doc());
        }
    }

    #[test]
    fn test_toggle_rejects_non_boolean_key() {
        let mut d = doc();
        let err = toggle(&mut d, "git.branch").unwrap_err();
        assert_eq!(err, CoreError::unknown_key("git.branch", ValueKind::Bool));
        assert_eq!(d, doc());
    }

    #[test]
    fn test_unknown_keys_fail_and_leave_document_untouched() {
        let unknown = ["", "git", "git.nope", "GIT.BRANCH", "watcher.debounce_delay.x", "features"];
        for key in unknown {
            let mut d = doc();
            assert!(get_string(&d, key).is_err());
            assert!(get_bool(&d, key).is_err());
            assert!(get_duration(&d, key).is_err());
            assert!(get_int(&d, key).is_err());
            assert!(get_string_list(&d, key).is_err());
            assert!(get(&d, key).is_err());
            assert!(set_string(&mut d, key, "x").is_err());
            assert!(set_bool(&mut d, key, true).is_err());
            assert!(set_duration(&mut d, key, "1s").is_err());
            assert!(set_int(&mut d, key, "5").is_err());
            assert!(set_string_list(&mut d, key, "a,b").is_err());
            assert!(set_raw(&mut d, key, "1").is_err());
            assert!(toggle(&mut d, key).is_err());
            assert_eq!(d, doc(), "{key:?} modified the document");
        }
    }

    #[test]
    fn test_keys_are_kind_specific() {
        let mut d = doc();
        // A real key of the wrong kind is unknown to that kind
        let err = set_int(&mut d, "git.branch", "3").unwrap_err();
        assert_eq!(err, CoreError::unknown_key("git.branch", ValueKind::Int));
        assert!(get_bool(&d, "watcher.file_extensions").is_err());
        assert!(get_string(&d, "git.auto_push").is_err());
    }

    #[test]
    fn test_string_list_trims_and_drops_empties() {
        let mut d = doc();
        set_string_list(&mut d, "watcher.directories", "a, b ,, c").unwrap();
        assert_eq!(d.watcher.directories, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_string_list_all_empty_is_empty_list() {
        let mut d = doc();
        set_string_list(&mut d, "watcher.ignore_patterns", " , ,, ").unwrap();
        assert!(d.watcher.ignore_patterns.is_empty());
        set_string_list(&mut d, "watcher.ignore_patterns", "").unwrap();
        assert!(d.watcher.ignore_patterns.is_empty());
    }

    #[test]
    fn test_int_capacity_constraint() {
        let mut d = doc();
        let err = set_int(&mut d, "converter.max_cells_per_sheet", "0").unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(d.converter.max_cells_per_sheet, doc().converter.max_cells_per_sheet);

        set_int(&mut d, "converter.max_cells_per_sheet", "5000").unwrap();
        assert_eq!(get_int(&d, "converter.max_cells_per_sheet").unwrap(), 5000);
    }

    #[test]
    fn test_int_rejects_non_numbers() {
        let mut d = doc();
        let err = set_int(&mut d, "converter.max_cells_per_sheet", "lots").unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn test_duration_set_and_reject() {
        let mut d = doc();
        set_duration(&mut d, "watcher.debounce_delay", "750ms").unwrap();
        assert_eq!(
            get_duration(&d, "watcher.debounce_delay").unwrap(),
            Duration::from_millis(750)
        );

        let err = set_duration(&mut d, "updates.check_interval", "daily").unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(d.updates.check_interval, doc().updates.check_interval);
    }

    #[test]
    fn test_every_key_has_exactly_one_kind() {
        let all = keys();
        let total = STRING_KEYS.len()
            + BOOL_KEYS.len()
            + DURATION_KEYS.len()
            + INT_KEYS.len()
            + STRING_LIST_KEYS.len();
        assert_eq!(all.len(), total);
        for key in &all {
            let hits = [STRING_KEYS, BOOL_KEYS, DURATION_KEYS, INT_KEYS, STRING_LIST_KEYS]
                .iter()
                .filter(|keys| keys.contains(key))
                .count();
            assert_eq!(hits, 1, "{key}");
            assert!(get(&doc(), key).is_ok(), "{key}");
        }
    }

    #[test]
    fn test_keys_grouped_by_section() {
        let all = keys();
        assert_eq!(all.first(), Some(&"git.remote"));
        let first_watcher = all.iter().position(|k| k.starts_with("watcher.")).unwrap();
        let last_git = all.iter().rposition(|k| k.starts_with("git.")).unwrap();
        assert!(last_git < first_watcher);
    }

    #[test]
    fn test_set_raw_dispatches_by_kind() {
        let mut d = doc();
        set_raw(&mut d, "git.auto_push", "yes").unwrap();
        assert!(d.git.auto_push);
        set_raw(&mut d, "watcher.debounce_delay", "5s").unwrap();
        assert_eq!(d.watcher.debounce_delay, Duration::from_secs(5));
        set_raw(&mut d, "watcher.file_extensions", ".csv, .XLSX").unwrap();
        assert_eq!(d.watcher.file_extensions, vec![".csv", ".XLSX"]);
        assert!(set_raw(&mut d, "git.auto_pull", "maybe").is_err());
        assert!(d.git.auto_pull);
    }

    #[test]
    fn test_display_matches_set_raw_syntax() {
        let mut d = doc();
        for key in keys() {
            let shown = get(&d, key).unwrap().to_string();
            set_raw(&mut d, key, &shown).unwrap();
        }
        assert_eq!(d, doc());
    }
}
