//! Small text helpers shared by the screens.

use serde_json::Value;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Truncate to `max_width` display columns, ending in "..." when cut.
pub fn truncate(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let budget = max_width - 3;
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

/// Word-wrap into lines of at most `width` columns. Never returns an empty vec.
pub fn wrap(s: &str, width: usize) -> Vec<String> {
    let lines: Vec<String> = textwrap::wrap(s, width.max(1))
        .into_iter()
        .map(|line| line.into_owned())
        .collect();
    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

/// Pad or truncate to exactly `width` columns.
pub fn fit(s: &str, width: usize) -> String {
    let cut = truncate(s, width);
    let pad = width.saturating_sub(cut.width());
    format!("{cut}{}", " ".repeat(pad))
}

/// A cell value for display: strings unquoted, `<empty>` for nothing.
pub fn cell_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "<empty>".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// A cell as shown in tables: the formula if it has one, else the value.
pub fn cell_summary(value: Option<&Value>, formula: Option<&str>) -> String {
    match formula {
        Some(f) if !f.is_empty() => format!("={f}"),
        _ => cell_value(value),
    }
}

/// The JSON type name of a value, as shown in detail views.
pub fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer message", 10), "a longe...");
        assert_eq!(truncate("abcdef", 2), "..");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // Each CJK char is two columns wide
        assert_eq!(truncate("日本語テキスト", 7), "日本...");
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("", 10), vec![String::new()]);
    }

    #[test]
    fn test_fit_pads_and_cuts() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abcdefgh", 6), "abc...");
    }

    #[test]
    fn test_cell_summary() {
        assert_eq!(cell_summary(Some(&json!("x")), None), "x");
        assert_eq!(cell_summary(Some(&json!(1.5)), Some("A1*2")), "=A1*2");
        assert_eq!(cell_summary(None, None), "<empty>");
        assert_eq!(cell_value(Some(&json!(true))), "true");
    }
}
