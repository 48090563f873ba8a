//! Parsing of the JSON strings carried in action inputs.

use serde_json::{Map, Value as JsonValue};

use crate::error::ConnectorError;

fn parse(data: &str, what: &str) -> Result<JsonValue, ConnectorError> {
    if data.trim().is_empty() {
        return Err(ConnectorError::Validation(format!("{what} must not be empty")));
    }
    serde_json::from_str(data)
        .map_err(|e| ConnectorError::Validation(format!("{what} is not valid JSON: {e}")))
}

/// Parse an array of row objects.
///
/// # Errors
/// `ConnectorError::Validation` for malformed JSON, a non-array, an empty array or a
/// non-object element.
pub fn parse_rows(data: &str) -> Result<Vec<Map<String, JsonValue>>, ConnectorError> {
    let JsonValue::Array(items) = parse(data, "data")? else {
        return Err(ConnectorError::Validation(
            "data must be a JSON array of row objects".into(),
        ));
    };
    if items.is_empty() {
        return Err(ConnectorError::Validation(
            "data must contain at least one row".into(),
        ));
    }
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            JsonValue::Object(row) => Ok(row),
            other => Err(ConnectorError::Validation(format!(
                "row {} must be an object, got {}",
                idx + 1,
                kind_of(&other)
            ))),
        })
        .collect()
}

/// Parse a single JSON object such as the fields of an update.
///
/// # Errors
/// `ConnectorError::Validation` for malformed JSON or a non-object.
pub fn parse_object(data: &str) -> Result<Map<String, JsonValue>, ConnectorError> {
    match parse(data, "data")? {
        JsonValue::Object(map) => Ok(map),
        other => Err(ConnectorError::Validation(format!(
            "data must be a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

/// Parse a `{"column": "SQL TYPE"}` object into definitions.
///
/// # Errors
/// `ConnectorError::Validation` when a type is not a string.
pub fn parse_columns(data: &str) -> Result<Vec<(String, String)>, ConnectorError> {
    parse_object(data)?
        .into_iter()
        .map(|(name, ty)| match ty {
            JsonValue::String(ty) => Ok((name, ty)),
            other => Err(ConnectorError::Validation(format!(
                "type of column {name:?} must be a string, got {}",
                kind_of(&other)
            ))),
        })
        .collect()
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
