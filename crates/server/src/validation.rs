//! Cross-field validation rules and error formatting.
//!
//! The rules work on the serialized form of a value, so field names are the
//! serde names. Use them from a schema validator:
//!
//! ```ignore
//! #[derive(Deserialize, Serialize, Validate)]
//! #[validate(schema(function = "check_contact"))]
//! struct Contact { street: String, postal_code: u32 }
//!
//! fn check_contact(c: &Contact) -> Result<(), ValidationError> {
//!     depends_on(c, &["street", "postal_code"])
//! }
//! ```

use std::borrow::Cow;

use datatype::is_empty_value;
use serde::Serialize;
use serde_json::Value;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// Every named field must hold a non-empty value.
pub fn depends_on<T: Serialize>(value: &T, fields: &[&str]) -> Result<(), ValidationError> {
    let object = to_object(value)?;
    for field in fields {
        if field_is_empty(&object, field) {
            tracing::info!(field_name = %field, "This field needs to be set");
            let mut error = ValidationError::new("depends_on");
            error.message = Some(Cow::Owned(format!("{field} needs to be set")));
            error.add_param(Cow::Borrowed("field"), field);
            return Err(error);
        }
    }
    Ok(())
}

/// At least one named field must hold a non-empty value.
pub fn depends_one_of<T: Serialize>(value: &T, fields: &[&str]) -> Result<(), ValidationError> {
    let object = to_object(value)?;
    if fields.iter().any(|field| !field_is_empty(&object, field)) {
        return Ok(());
    }

    let joined = fields.join(", ");
    tracing::info!(fields = %joined, "At least one of these fields needs to be set");
    let mut error = ValidationError::new("depends_one_of");
    error.message = Some(Cow::Owned(format!("at least one of {joined} needs to be set")));
    error.add_param(Cow::Borrowed("fields"), &fields);
    Err(error)
}

fn to_object<T: Serialize>(value: &T) -> Result<serde_json::Map<String, Value>, ValidationError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(object)) => Ok(object),
        _ => Err(ValidationError::new("not_a_struct")),
    }
}

fn field_is_empty(object: &serde_json::Map<String, Value>, field: &str) -> bool {
    object.get(field).map_or(true, is_empty_value)
}

/// Render validation errors as sorted `field: message` entries joined by `; `.
pub fn describe(errors: &ValidationErrors) -> String {
    let mut entries = Vec::new();
    collect(errors, "", &mut entries);
    entries.sort();
    entries.join("; ")
}

fn collect(errors: &ValidationErrors, prefix: &str, entries: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(errors) => {
                for error in errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    entries.push(format!("{path}: {message}"));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(nested, &path, entries),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(nested, &format!("{path}[{index}]"), entries);
                }
            }
        }
    }
}
