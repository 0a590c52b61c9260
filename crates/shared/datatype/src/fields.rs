//! Field presence checks over the serialized form of a struct.

use serde::Serialize;
use serde_json::Value;

use crate::error::{DatatypeError, DatatypeResult};

/// Whether a serialized field holds its zero value.
///
/// Null, empty strings and collections, `false` and zero are empty. Null
/// types and zero dates serialize to `null` or `""` and count as empty too.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Check field presence on `data`.
///
/// A field is unset when it serializes to `null` (`None` or a null
/// [`Null`](crate::Null)). With no `except` names the result is true when
/// every field is unset. Otherwise it is true when every named field is set.
pub fn check_field_values<T: Serialize>(data: &T, except: &[&str]) -> DatatypeResult<bool> {
    let value = serde_json::to_value(data).map_err(|e| DatatypeError::convert("struct", e))?;
    let Value::Object(fields) = value else {
        return Err(DatatypeError::NotAStruct);
    };
    if except.is_empty() {
        return Ok(fields.values().all(Value::is_null));
    }
    for name in except {
        let field = fields
            .get(*name)
            .ok_or_else(|| DatatypeError::UnknownField(name.to_string()))?;
        if field.is_null() {
            return Ok(false);
        }
    }
    Ok(true)
}
