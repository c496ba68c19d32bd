//! Conversion of upstream documents into plain JSON before staging.
//!
//! Document stores attach identifier types that have no JSON representation.
//! Normalization walks the whole document and rewrites them as strings so that
//! staged payloads only contain JSON values.

use serde_json::{Map, Number, Value};

use crate::types::{Document, DocumentValue};

/// Normalizes every value of `document` into a JSON object.
pub fn normalize_document(document: &Document) -> Value {
    Value::Object(normalize_map(document))
}

/// Normalizes a single value.
///
/// Maps and arrays are walked recursively, an [`crate::types::ObjectId`]
/// becomes its lowercase hex string and scalars pass through unchanged.
/// Non-finite floats have no JSON form and become `null`.
pub fn normalize_value(value: &DocumentValue) -> Value {
    match value {
        DocumentValue::Null => Value::Null,
        DocumentValue::Bool(value) => Value::Bool(*value),
        DocumentValue::Int(value) => Value::Number((*value).into()),
        DocumentValue::UInt(value) => Value::Number((*value).into()),
        DocumentValue::Float(value) => Number::from_f64(*value)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        DocumentValue::String(value) => Value::String(value.clone()),
        DocumentValue::ObjectId(oid) => Value::String(oid.to_string()),
        DocumentValue::Array(values) => Value::Array(values.iter().map(normalize_value).collect()),
        DocumentValue::Map(document) => Value::Object(normalize_map(document)),
    }
}

fn normalize_map(document: &Document) -> Map<String, Value> {
    document
        .iter()
        .map(|(key, value)| (key.clone(), normalize_value(value)))
        .collect()
}
