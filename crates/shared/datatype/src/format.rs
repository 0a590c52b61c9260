//! Known date and time layouts.

use crate::constants::*;

/// Layouts accepted for [`CustomDate`](crate::CustomDate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateFormat {
    Default,
    Custom,
    DefaultNoUtc,
    CustomNoUtc,
}

impl DateFormat {
    /// Detection order for values carrying the UTC designator.
    pub const UTC: [DateFormat; 2] = [DateFormat::Default, DateFormat::Custom];

    /// Detection order for values without it.
    pub const NO_UTC: [DateFormat; 2] = [DateFormat::DefaultNoUtc, DateFormat::CustomNoUtc];

    pub fn pattern(self) -> &'static str {
        match self {
            DateFormat::Default => DEFAULT_DATE_FORMAT,
            DateFormat::Custom => CUSTOM_DATE_FORMAT,
            DateFormat::DefaultNoUtc => DEFAULT_DATE_FORMAT_NO_UTC,
            DateFormat::CustomNoUtc => CUSTOM_DATE_FORMAT_NO_UTC,
        }
    }

    pub fn is_utc(self) -> bool {
        matches!(self, DateFormat::Default | DateFormat::Custom)
    }

    /// Candidate list for the given zone mode.
    pub fn candidates(no_utc: bool) -> &'static [DateFormat] {
        if no_utc {
            &Self::NO_UTC
        } else {
            &Self::UTC
        }
    }
}

/// Layouts accepted for [`CustomTime`](crate::CustomTime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeFormat {
    Default,
    Custom,
    DefaultNoUtc,
    CustomNoUtc,
}

impl TimeFormat {
    /// Detection order for values carrying the UTC designator.
    pub const UTC: [TimeFormat; 2] = [TimeFormat::Custom, TimeFormat::Default];

    /// Detection order for values without it.
    pub const NO_UTC: [TimeFormat; 2] = [TimeFormat::CustomNoUtc, TimeFormat::DefaultNoUtc];

    pub fn pattern(self) -> &'static str {
        match self {
            TimeFormat::Default => DEFAULT_TIME_FORMAT,
            TimeFormat::Custom => CUSTOM_TIME_FORMAT,
            TimeFormat::DefaultNoUtc => DEFAULT_TIME_FORMAT_NO_UTC,
            TimeFormat::CustomNoUtc => CUSTOM_TIME_FORMAT_NO_UTC,
        }
    }

    pub fn is_utc(self) -> bool {
        matches!(self, TimeFormat::Default | TimeFormat::Custom)
    }

    /// Whether the layout carries only the time of day.
    pub fn is_time_only(self) -> bool {
        matches!(self, TimeFormat::Default | TimeFormat::DefaultNoUtc)
    }

    /// Candidate list for the given zone mode.
    pub fn candidates(no_utc: bool) -> &'static [TimeFormat] {
        if no_utc {
            &Self::NO_UTC
        } else {
            &Self::UTC
        }
    }
}

pub(crate) fn join_patterns<I: IntoIterator<Item = &'static str>>(patterns: I) -> String {
    patterns.into_iter().collect::<Vec<_>>().join(", ")
}
