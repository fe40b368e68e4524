//! Regex restrictions declared on editable attributes.
//!
//! An attribute may carry `regex: {source, error}`. The pattern is searched
//! anywhere in the value (not anchored unless the pattern itself is).

use regex::Regex;
use serde_json::{Map, Value};

const DEFAULT_REGEX_ERROR: &str = "Invalid value";

/// Check an attribute's value against its regex restriction.
///
/// Returns `None` when the value matches or no restriction is declared,
/// otherwise the restriction's error message.
pub fn validate_regex(attr: &Map<String, Value>) -> Option<String> {
    let restriction = attr.get("regex")?.as_object()?;
    if restriction.is_empty() {
        return None;
    }

    let error = restriction
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_REGEX_ERROR)
        .to_string();
    let Some(source) = restriction.get("source").and_then(Value::as_str) else {
        return Some("Regex restriction has no source pattern".to_string());
    };
    let pattern = match Regex::new(source) {
        Ok(pattern) => pattern,
        Err(e) => return Some(format!("Invalid regex pattern {source:?}: {e}")),
    };

    let value = attr.get("value");
    let is_list = matches!(
        attr.get("type").and_then(Value::as_str),
        Some("text_list" | "textarea_list")
    );

    if is_list {
        let Some(items) = value.and_then(Value::as_array) else {
            return Some(error);
        };
        let all_match = items
            .iter()
            .all(|item| item.as_str().is_some_and(|s| pattern.is_match(s)));
        return (!all_match).then_some(error);
    }

    match value.and_then(Value::as_str) {
        Some(text) if pattern.is_match(text) => None,
        _ => Some(error),
    }
}
