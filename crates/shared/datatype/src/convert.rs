//! String and layout converters.

use std::fmt::Write;

use crate::date::CustomDate;
use crate::error::{DatatypeError, DatatypeResult};
use crate::time::CustomTime;

/// Parse an optional decimal string.
pub fn string_to_i64(value: Option<&str>) -> DatatypeResult<Option<i64>> {
    value
        .map(|v| v.parse::<i64>().map_err(|e| DatatypeError::convert(v, e)))
        .transpose()
}

/// Parse an optional boolean string.
///
/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn string_to_bool(value: Option<&str>) -> DatatypeResult<Option<bool>> {
    value.map(parse_bool).transpose()
}

pub(crate) fn parse_bool(value: &str) -> DatatypeResult<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(DatatypeError::convert(value, "invalid syntax")),
    }
}

/// Re-render `time` with `pattern` and parse the result back.
///
/// The zone mode of the source is kept, so the pattern must produce one of
/// the known layouts.
pub fn time_to_format(time: &CustomTime, pattern: &str) -> DatatypeResult<CustomTime> {
    let rendered = render(pattern, |out| write!(out, "{}", time.datetime().format(pattern)))?;
    CustomTime::parse(&rendered, time.no_utc())
}

/// Re-render `date` with `pattern` and parse the result back.
pub fn date_to_format(date: &CustomDate, pattern: &str) -> DatatypeResult<CustomDate> {
    let rendered = render(pattern, |out| write!(out, "{}", date.date().format(pattern)))?;
    CustomDate::parse(&rendered, date.no_utc())
}

fn render<F>(pattern: &str, write: F) -> DatatypeResult<String>
where
    F: FnOnce(&mut String) -> std::fmt::Result,
{
    let mut out = String::new();
    write(&mut out).map_err(|_| DatatypeError::convert(pattern, "invalid format pattern"))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CUSTOM_DATE_FORMAT, DEFAULT_TIME_FORMAT};

    #[test]
    fn string_to_i64_cases() {
        assert_eq!(string_to_i64(Some("123")).unwrap(), Some(123));
        assert_eq!(string_to_i64(None).unwrap(), None);
        assert!(string_to_i64(Some("abc")).is_err());
    }

    #[test]
    fn string_to_bool_cases() {
        assert_eq!(string_to_bool(Some("T")).unwrap(), Some(true));
        assert_eq!(string_to_bool(Some("0")).unwrap(), Some(false));
        assert_eq!(string_to_bool(None).unwrap(), None);
        assert!(string_to_bool(Some("yes")).is_err());
    }

    #[test]
    fn time_to_format_switches_layout() {
        let time = CustomTime::parse("2024-01-26T10:55:00", false).unwrap();
        let converted = time_to_format(&time, DEFAULT_TIME_FORMAT).unwrap();
        assert_eq!(converted.to_string(), "10:55:00Z");
        assert!(time_to_format(&time, "invalid").is_err());
    }

    #[test]
    fn date_to_format_switches_layout() {
        let date = CustomDate::parse("2024-01-26", false).unwrap();
        let converted = date_to_format(&date, CUSTOM_DATE_FORMAT).unwrap();
        assert_eq!(converted.to_string(), "20240126Z");
        assert!(date_to_format(&date, "invalid").is_err());
    }

    #[test]
    fn bad_pattern_is_an_error() {
        let date = CustomDate::parse("2024-01-26", false).unwrap();
        assert!(date_to_format(&date, "%Q").is_err());
    }
}
