//! Calendar date with format auto-detection.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DatatypeError, DatatypeResult};
use crate::format::{join_patterns, DateFormat};
use crate::sql::SqlValue;
use crate::utc::{is_utc, set_as_utc};

const ZERO_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

/// A date that remembers the layout it was parsed from.
///
/// The zero value has no layout and renders as an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomDate {
    date: NaiveDate,
    no_utc: bool,
    format: Option<DateFormat>,
}

impl Default for CustomDate {
    fn default() -> Self {
        Self {
            date: ZERO_DATE,
            no_utc: false,
            format: None,
        }
    }
}

impl CustomDate {
    /// Wrap an existing date with an explicit layout.
    pub fn new(date: NaiveDate, format: DateFormat) -> Self {
        Self {
            date,
            no_utc: !format.is_utc(),
            format: Some(format),
        }
    }

    /// Today's UTC date in the first layout of the zone mode.
    pub fn now(no_utc: bool) -> Self {
        let format = DateFormat::candidates(no_utc)[0];
        Self {
            date: Utc::now().date_naive(),
            no_utc,
            format: Some(format),
        }
    }

    /// Parse `value` against the layouts of the given zone mode.
    ///
    /// Without `no_utc` the UTC designator is appended before matching.
    pub fn parse(value: &str, no_utc: bool) -> DatatypeResult<Self> {
        if value.is_empty() {
            return Err(DatatypeError::Empty("date"));
        }
        let input = if no_utc {
            value.to_string()
        } else {
            set_as_utc(value)
        };
        let candidates = DateFormat::candidates(no_utc);
        for format in candidates {
            if let Ok(date) = NaiveDate::parse_from_str(&input, format.pattern()) {
                return Ok(Self {
                    date,
                    no_utc,
                    format: Some(*format),
                });
            }
        }
        Err(DatatypeError::Parse {
            kind: "date",
            input,
            formats: join_patterns(candidates.iter().map(|f| f.pattern())),
        })
    }

    /// Parse with the zone mode taken from the input itself.
    ///
    /// An empty string yields the zero value.
    pub fn detect(value: &str) -> DatatypeResult<Self> {
        if value.is_empty() {
            return Ok(Self::default());
        }
        Self::parse(value, !is_utc(value))
    }

    /// Read a value handed back by the database driver.
    pub fn scan(value: SqlValue) -> DatatypeResult<Self> {
        match value {
            SqlValue::Null => Ok(Self::default()),
            SqlValue::Date(date) => Ok(Self::new(date, DateFormat::Default)),
            SqlValue::Time(datetime) => Ok(Self::new(datetime.date(), DateFormat::Default)),
            SqlValue::Text(text) => Self::detect(&text),
            _ => Err(DatatypeError::Scan("date")),
        }
    }

    /// Value written to the database; `None` for the zero value.
    pub fn to_sql(&self) -> Option<String> {
        if self.is_zero() {
            None
        } else {
            Some(self.to_string())
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn no_utc(&self) -> bool {
        self.no_utc
    }

    pub fn format(&self) -> Option<DateFormat> {
        self.format
    }

    pub fn is_zero(&self) -> bool {
        self.date == ZERO_DATE
    }

    /// Signed distance `self - other`.
    pub fn sub(&self, other: &CustomDate) -> TimeDelta {
        self.date.signed_duration_since(other.date)
    }
}

impl fmt::Display for CustomDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            Some(format) => write!(f, "{}", self.date.format(format.pattern())),
            None => Ok(()),
        }
    }
}

impl FromStr for CustomDate {
    type Err = DatatypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::detect(s)
    }
}

impl From<NaiveDate> for CustomDate {
    fn from(date: NaiveDate) -> Self {
        Self::new(date, DateFormat::Default)
    }
}

impl Serialize for CustomDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CustomDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => Self::detect(&text).map_err(serde::de::Error::custom),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_appends_utc_designator() {
        let parsed = CustomDate::parse("2024-01-26", false).unwrap();
        assert_eq!(parsed.date(), date(2024, 1, 26));
        assert_eq!(parsed.format(), Some(DateFormat::Default));
        assert_eq!(parsed.to_string(), "2024-01-26Z");
    }

    #[test]
    fn parse_tries_custom_layout_second() {
        let parsed = CustomDate::parse("20240126Z", false).unwrap();
        assert_eq!(parsed.format(), Some(DateFormat::Custom));
        assert_eq!(parsed.to_string(), "20240126Z");
    }

    #[test]
    fn parse_without_zone() {
        let parsed = CustomDate::parse("20240126", true).unwrap();
        assert!(parsed.no_utc());
        assert_eq!(parsed.format(), Some(DateFormat::CustomNoUtc));
        assert_eq!(parsed.to_string(), "20240126");
    }

    #[test]
    fn parse_reports_all_candidates() {
        let err = CustomDate::parse("26.01.2024", false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot parse the given date string \"26.01.2024Z\" to one of these formats (%Y-%m-%dZ, %Y%m%dZ)"
        );
    }

    #[test]
    fn parse_rejects_empty_input() {
        assert_eq!(
            CustomDate::parse("", false),
            Err(DatatypeError::Empty("date"))
        );
    }

    #[test]
    fn detect_uses_designator_for_zone_mode() {
        assert!(!CustomDate::detect("2024-01-26Z").unwrap().no_utc());
        assert!(CustomDate::detect("2024-01-26").unwrap().no_utc());
        assert!(CustomDate::detect("").unwrap().is_zero());
    }

    #[test]
    fn zero_value_renders_empty() {
        let zero = CustomDate::default();
        assert_eq!(zero.to_string(), "");
        assert_eq!(zero.to_sql(), None);
    }

    #[test]
    fn json_round_trip_keeps_layout() {
        let parsed: CustomDate = serde_json::from_str("\"20240126\"").unwrap();
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"20240126\"");

        let null: CustomDate = serde_json::from_str("null").unwrap();
        assert!(null.is_zero());
        let empty: CustomDate = serde_json::from_str("\"\"").unwrap();
        assert!(empty.is_zero());
    }

    #[test]
    fn json_rejects_garbage() {
        assert!(serde_json::from_str::<CustomDate>("\"tomorrow\"").is_err());
    }

    #[test]
    fn scan_driver_values() {
        let scanned = CustomDate::scan(SqlValue::Date(date(2024, 1, 26))).unwrap();
        assert_eq!(scanned.to_string(), "2024-01-26Z");

        let text = CustomDate::scan(SqlValue::Text("2024-01-26".into())).unwrap();
        assert!(text.no_utc());

        assert!(CustomDate::scan(SqlValue::Null).unwrap().is_zero());
        assert_eq!(
            CustomDate::scan(SqlValue::Int(5)),
            Err(DatatypeError::Scan("date"))
        );
    }

    #[test]
    fn sub_returns_signed_days() {
        let a = CustomDate::parse("2024-01-26", false).unwrap();
        let b = CustomDate::parse("2024-01-24", false).unwrap();
        assert_eq!(a.sub(&b), TimeDelta::days(2));
        assert_eq!(b.sub(&a), TimeDelta::days(-2));
    }

    #[test]
    fn now_uses_first_layout() {
        assert_eq!(CustomDate::now(false).format(), Some(DateFormat::Default));
        assert_eq!(
            CustomDate::now(true).format(),
            Some(DateFormat::DefaultNoUtc)
        );
    }
}
