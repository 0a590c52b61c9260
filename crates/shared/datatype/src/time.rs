//! Date-time (or time of day) with format auto-detection.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DatatypeError, DatatypeResult};
use crate::format::{join_patterns, TimeFormat};
use crate::sql::SqlValue;
use crate::utc::{is_utc, set_as_utc};

const ZERO_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

/// Date used for values parsed from a time-of-day layout.
const TIME_ONLY_DATE: NaiveDate = match NaiveDate::from_ymd_opt(0, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

/// A date-time that remembers the layout it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomTime {
    datetime: NaiveDateTime,
    no_utc: bool,
    format: Option<TimeFormat>,
}

impl Default for CustomTime {
    fn default() -> Self {
        Self {
            datetime: ZERO_DATE.and_time(NaiveTime::MIN),
            no_utc: false,
            format: None,
        }
    }
}

impl CustomTime {
    pub fn new(datetime: NaiveDateTime, format: TimeFormat) -> Self {
        Self {
            datetime,
            no_utc: !format.is_utc(),
            format: Some(format),
        }
    }

    /// Current UTC time truncated to whole seconds.
    pub fn now(no_utc: bool) -> Self {
        let format = TimeFormat::candidates(no_utc)[0];
        Self {
            datetime: Utc::now().naive_utc().trunc_subsecs(0),
            no_utc,
            format: Some(format),
        }
    }

    /// Parse `value` against the layouts of the given zone mode.
    pub fn parse(value: &str, no_utc: bool) -> DatatypeResult<Self> {
        if value.is_empty() {
            return Err(DatatypeError::Empty("time"));
        }
        let input = if no_utc {
            value.to_string()
        } else {
            set_as_utc(value)
        };
        let candidates = TimeFormat::candidates(no_utc);
        for format in candidates {
            if let Some(datetime) = parse_with(&input, *format) {
                return Ok(Self {
                    datetime,
                    no_utc,
                    format: Some(*format),
                });
            }
        }
        Err(DatatypeError::Parse {
            kind: "time",
            input,
            formats: join_patterns(candidates.iter().map(|f| f.pattern())),
        })
    }

    /// Parse with the zone mode taken from the input itself.
    pub fn detect(value: &str) -> DatatypeResult<Self> {
        if value.is_empty() {
            return Ok(Self::default());
        }
        Self::parse(value, !is_utc(value))
    }

    pub fn scan(value: SqlValue) -> DatatypeResult<Self> {
        match value {
            SqlValue::Null => Ok(Self::default()),
            SqlValue::Time(datetime) => Ok(Self::new(datetime, TimeFormat::Custom)),
            SqlValue::Date(date) => Ok(Self::new(date.and_time(NaiveTime::MIN), TimeFormat::Custom)),
            SqlValue::Text(text) => Self::detect(&text),
            _ => Err(DatatypeError::Scan("time")),
        }
    }

    pub fn to_sql(&self) -> Option<String> {
        if self.is_zero() {
            None
        } else {
            Some(self.to_string())
        }
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }

    pub fn no_utc(&self) -> bool {
        self.no_utc
    }

    pub fn format(&self) -> Option<TimeFormat> {
        self.format
    }

    pub fn is_zero(&self) -> bool {
        self.datetime == ZERO_DATE.and_time(NaiveTime::MIN)
    }

    /// Signed distance `self - other`.
    pub fn sub(&self, other: &CustomTime) -> TimeDelta {
        self.datetime.signed_duration_since(other.datetime)
    }
}

fn parse_with(input: &str, format: TimeFormat) -> Option<NaiveDateTime> {
    if format.is_time_only() {
        NaiveTime::parse_from_str(input, format.pattern())
            .ok()
            .map(|time| TIME_ONLY_DATE.and_time(time))
    } else {
        NaiveDateTime::parse_from_str(input, format.pattern()).ok()
    }
}

impl fmt::Display for CustomTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            Some(format) => write!(f, "{}", self.datetime.format(format.pattern())),
            None => Ok(()),
        }
    }
}

impl FromStr for CustomTime {
    type Err = DatatypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::detect(s)
    }
}

impl From<NaiveDateTime> for CustomTime {
    fn from(datetime: NaiveDateTime) -> Self {
        Self::new(datetime, TimeFormat::Custom)
    }
}

impl Serialize for CustomTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CustomTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => Self::detect(&text).map_err(serde::de::Error::custom),
            None => Ok(Self::default()),
        }
    }
}
