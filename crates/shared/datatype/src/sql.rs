//! Driver-level values for scanning custom types.

use chrono::{NaiveDate, NaiveDateTime};

/// A raw column value as handed back by a database driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Date(NaiveDate),
    Time(NaiveDateTime),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<Option<String>> for SqlValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::Text)
    }
}
