//! Display helpers for sampled records.
//!
//! Records are opaque JSON. These helpers dig out the handful of fields worth
//! showing in a terminal, accepting the shapes used by the different zones
//! (works carry a plain `title`, newspaper articles a `heading` and a nested
//! `title.value` for the masthead).

use serde_json::Value;

/// Truncate text to `max_width` characters, appending an ellipsis if cut.
///
/// # Examples
///
/// ```
/// use trove_random::utils::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
/// assert_eq!(truncate_with_ellipsis("Hi", 8), "Hi");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if text.chars().count() <= max_width {
        return text.to_string();
    }

    let keep = max_width.saturating_sub(3);
    if keep == 0 {
        return "...".to_string();
    }
    let truncated: String = text.chars().take(keep).collect();
    format!("{}...", truncated)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("value").and_then(as_text),
        Value::Array(items) => items.first().and_then(as_text),
        _ => None,
    }
}

/// Record identifier
pub fn record_id(record: &Value) -> Option<String> {
    record.get("id").and_then(as_text)
}

/// Human-readable title: `heading` for articles, `title` otherwise
pub fn record_title(record: &Value) -> String {
    record
        .get("heading")
        .and_then(as_text)
        .or_else(|| record.get("title").and_then(as_text))
        .unwrap_or_else(|| "[untitled]".to_string())
}

/// Masthead or series title for newspaper articles
pub fn record_source(record: &Value) -> Option<String> {
    record
        .get("heading")
        .and_then(|_| record.get("title"))
        .and_then(as_text)
}

/// Date of issue or publication
pub fn record_date(record: &Value) -> Option<String> {
    record
        .get("date")
        .and_then(as_text)
        .or_else(|| record.get("issued").and_then(as_text))
}

/// Link to the record on the Trove website
pub fn record_url(record: &Value) -> Option<String> {
    record
        .get("troveUrl")
        .and_then(as_text)
        .or_else(|| record.get("url").and_then(as_text))
}

/// `(label, value)` rows describing a record, skipping absent fields
pub fn record_rows(record: &Value) -> Vec<(&'static str, String)> {
    let mut rows = vec![("Title", record_title(record))];
    if let Some(source) = record_source(record) {
        rows.push(("Source", source));
    }
    if let Some(date) = record_date(record) {
        rows.push(("Date", date));
    }
    if let Some(id) = record_id(record) {
        rows.push(("ID", id));
    }
    if let Some(url) = record_url(record) {
        rows.push(("URL", url));
    }
    rows
}
