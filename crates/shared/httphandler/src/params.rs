//! Request parameters from serializable structs.
//!
//! Fields are read from the serialized form, so `#[serde(rename)]` decides
//! the parameter name. Absent values (`None`, a null `Null<T>`) are skipped;
//! a set `Null<T>` is sent even when it holds `false`, `0` or `""`.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{HttpClientError, HttpClientResult};

/// Scalar fields as single-valued parameters. Array fields are skipped.
pub fn to_params<T: Serialize>(data: &T) -> HttpClientResult<HashMap<String, String>> {
    Ok(fields(data)?
        .into_iter()
        .filter(|(_, value)| !value.is_array())
        .map(|(name, value)| (name, render(&value)))
        .collect())
}

/// Array fields as multi-valued parameters. Scalar fields are skipped.
pub fn to_multi_params<T: Serialize>(data: &T) -> HttpClientResult<HashMap<String, Vec<String>>> {
    Ok(fields(data)?
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::Array(items) => Some((
                name,
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(render)
                    .collect::<Vec<_>>(),
            )),
            _ => None,
        })
        .filter(|(_, values)| !values.is_empty())
        .collect())
}

fn fields<T: Serialize>(data: &T) -> HttpClientResult<Map<String, Value>> {
    match serde_json::to_value(data)? {
        Value::Object(map) => Ok(map
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect()),
        _ => Err(HttpClientError::NotAStruct),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use datatype::{CustomDate, DateFormat, NullBool, NullInt64, NullString};

    #[derive(Serialize, Default)]
    struct Query {
        name: String,
        #[serde(rename = "e-mail")]
        email: NullString,
        active: NullBool,
        limit: NullInt64,
        since: Option<CustomDate>,
        tags: Vec<String>,
        ids: Vec<NullInt64>,
    }

    #[test]
    fn renders_scalars_and_skips_absent() {
        let query = Query {
            name: "john".to_string(),
            email: NullString::new("john@example.com".to_string()),
            active: NullBool::new(true),
            limit: NullInt64::null(),
            since: Some(CustomDate::new(
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                DateFormat::Default,
            )),
            tags: vec!["a".to_string()],
            ..Default::default()
        };

        let params = to_params(&query).unwrap();

        assert_eq!(params.len(), 4);
        assert_eq!(params["name"], "john");
        assert_eq!(params["e-mail"], "john@example.com");
        assert_eq!(params["active"], "true");
        assert_eq!(params["since"], "2024-03-01Z");
        assert!(!params.contains_key("tags"));
        assert!(!params.contains_key("limit"));
    }

    #[test]
    fn collects_only_arrays() {
        let query = Query {
            name: "john".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
            ids: vec![NullInt64::new(1), NullInt64::null(), NullInt64::new(3)],
            ..Default::default()
        };

        let params = to_multi_params(&query).unwrap();

        assert_eq!(params.len(), 2);
        assert_eq!(params["tags"], vec!["a", "b"]);
        assert_eq!(params["ids"], vec!["1", "3"]);
    }

    #[test]
    fn keeps_set_zero_values() {
        let query = Query {
            name: "john".to_string(),
            email: NullString::new(String::new()),
            active: NullBool::new(false),
            limit: NullInt64::new(0),
            ids: vec![NullInt64::new(0), NullInt64::null()],
            ..Default::default()
        };

        let params = to_params(&query).unwrap();
        assert_eq!(params.get("active").map(String::as_str), Some("false"));
        assert_eq!(params.get("limit").map(String::as_str), Some("0"));
        assert_eq!(params.get("e-mail").map(String::as_str), Some(""));
        assert!(!params.contains_key("since"));

        let multi = to_multi_params(&query).unwrap();
        assert_eq!(multi["ids"], vec!["0"]);
        assert!(!multi.contains_key("tags"));
    }

    #[test]
    fn rejects_non_structs() {
        assert!(matches!(to_params(&42), Err(HttpClientError::NotAStruct)));
        assert!(matches!(
            to_multi_params(&vec![1, 2]),
            Err(HttpClientError::NotAStruct)
        ));
    }
}
