// crates/fcs-core/src/model/json_path.rs
// ============================================================================
// Module: Dotted JSON Paths
// Description: Extraction and assignment using dotted manifest paths.
// Purpose: Translate `Data.Account.0.AccountId` style paths for jsonpath_lib.
// Dependencies: jsonpath_lib, serde_json
// ============================================================================

//! ## Overview
//! Manifests address JSON bodies with dotted paths where numeric segments
//! index arrays and a trailing `#` yields an array length. Extraction is
//! delegated to `jsonpath_lib`; assignment walks the document directly and
//! creates intermediate objects as needed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use jsonpath_lib::select;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Converts a dotted path into a `JSONPath` expression.
///
/// Paths already starting with `$` are returned unchanged.
#[must_use]
pub fn to_jsonpath(dotted: &str) -> String {
    if dotted.starts_with('$') {
        return dotted.to_string();
    }
    let mut out = String::from("$");
    for segment in dotted.split('.').filter(|segment| !segment.is_empty()) {
        if segment.bytes().all(|byte| byte.is_ascii_digit()) {
            out.push('[');
            out.push_str(segment);
            out.push(']');
        } else if segment.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'_') {
            out.push('.');
            out.push_str(segment);
        } else {
            out.push_str("['");
            out.push_str(&segment.replace('\'', "\\'"));
            out.push_str("']");
        }
    }
    out
}

/// Selects the first value addressed by a dotted path.
///
/// A trailing `#` segment returns the length of the addressed array.
///
/// # Errors
///
/// Returns a message when the path cannot be compiled.
pub fn select_first(document: &Value, dotted: &str) -> Result<Option<Value>, String> {
    if let Some(prefix) = dotted.strip_suffix(".#") {
        let target = select_first(document, prefix)?;
        return Ok(target.and_then(|value| value.as_array().map(|items| Value::from(items.len()))));
    }
    let path = to_jsonpath(dotted);
    let selected = select(document, &path).map_err(|err| format!("invalid path {dotted}: {err}"))?;
    Ok(selected.first().map(|value| (*value).clone()))
}

/// Renders a JSON scalar for comparison with manifest string values.
#[must_use]
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// SECTION: Assignment
// ============================================================================

/// Assigns `value` at the dotted path, creating intermediate objects.
///
/// Numeric segments index existing arrays; otherwise every segment is an
/// object key. Non-container intermediates are replaced with objects.
pub fn set_path(document: &mut Value, dotted: &str, value: Value) {
    let segments: Vec<&str> = dotted.split('.').filter(|segment| !segment.is_empty()).collect();
    let Some((last, parents)) = segments.split_last() else {
        *document = value;
        return;
    };
    let mut cursor = document;
    for segment in parents {
        cursor = descend(cursor, segment);
    }
    if let Some(slot) = array_index(cursor, last).and_then(|index| cursor.as_array_mut()?.get_mut(index)) {
        *slot = value;
        return;
    }
    if !cursor.is_object() {
        *cursor = Value::Object(Map::new());
    }
    if let Value::Object(map) = cursor {
        map.insert((*last).to_string(), value);
    }
}

/// Moves one segment deeper, creating an object when the segment is absent.
fn descend<'a>(cursor: &'a mut Value, segment: &str) -> &'a mut Value {
    let index = array_index(cursor, segment);
    if index.is_none() && !cursor.is_object() {
        *cursor = Value::Object(Map::new());
    }
    match (cursor, index) {
        (Value::Array(items), Some(index)) => &mut items[index],
        (Value::Object(map), _) => {
            map.entry(segment.to_string()).or_insert_with(|| Value::Object(Map::new()))
        }
        (other, _) => other,
    }
}

/// Returns the in-bounds array index named by `segment`, if any.
fn array_index(cursor: &Value, segment: &str) -> Option<usize> {
    let index = segment.parse::<usize>().ok()?;
    cursor.as_array().filter(|items| index < items.len()).map(|_| index)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
