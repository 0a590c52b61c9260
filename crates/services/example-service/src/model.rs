//! API models.

use std::collections::HashMap;

use datatype::{CustomTime, NullBool, NullDate, NullString};
use serde::{Deserialize, Serialize};
use server::validation::depends_one_of;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// A stored example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Example {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = 34)]
    pub age: i32,
    #[schema(example = "jane@example.com")]
    pub email: String,
    pub active: bool,
    #[schema(value_type = Option<String>, example = "1990-05-17Z")]
    pub birthday: NullDate,
    #[schema(value_type = String, example = "2024-01-26T10:55:00Z")]
    pub created_at: CustomTime,
}

/// Example creation request with validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ExampleRequest {
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[validate(range(min = 0, max = 130))]
    #[serde(default)]
    #[schema(example = 34)]
    pub age: i32,
    #[validate(email)]
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[serde(default)]
    #[schema(value_type = Option<bool>)]
    pub active: NullBool,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "1990-05-17Z")]
    pub birthday: NullDate,
}

/// Filter of the example check; `name` or `email` must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, IntoParams)]
#[validate(schema(function = "check_filter"))]
#[into_params(parameter_in = Query)]
pub struct ExampleCheckQuery {
    pub name: Option<String>,
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub email: NullString,
    #[serde(default)]
    #[param(value_type = Option<bool>)]
    pub active: NullBool,
}

fn check_filter(query: &ExampleCheckQuery) -> Result<(), ValidationError> {
    depends_one_of(query, &["name", "email"])
}

/// Check results per example and flag.
pub type ExampleCheck = HashMap<String, HashMap<String, bool>>;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExampleResponse {
    pub data: Example,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExampleListResponse {
    pub data: Vec<Example>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_validation() {
        let request: ExampleRequest = serde_json::from_str(
            r#"{"name":"Jane","age":34,"email":"jane@example.com","birthday":"1990-05-17"}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());
        assert!(request.active.is_null());
        assert!(!request.birthday.is_null());

        let invalid = ExampleRequest {
            age: 131,
            email: "not-an-email".to_string(),
            ..request
        };
        let errors = invalid.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("age"));
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn check_query_needs_name_or_email() {
        assert!(ExampleCheckQuery::default().validate().is_err());

        let query = ExampleCheckQuery {
            email: NullString::new("jane@example.com".to_string()),
            ..Default::default()
        };
        assert!(query.validate().is_ok());
    }
}
