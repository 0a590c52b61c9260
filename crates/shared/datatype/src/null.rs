//! Nullable scalars with explicit JSON/XML null semantics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::date::CustomDate;
use crate::time::CustomTime;

/// Values that have a "zero" state treated as absent when wrapped in [`Null`].
pub trait Zeroable {
    fn is_zero(&self) -> bool {
        false
    }
}

impl Zeroable for bool {}
impl Zeroable for i64 {}
impl Zeroable for f64 {}
impl Zeroable for String {}

impl Zeroable for CustomDate {
    fn is_zero(&self) -> bool {
        CustomDate::is_zero(self)
    }
}

impl Zeroable for CustomTime {
    fn is_zero(&self) -> bool {
        CustomTime::is_zero(self)
    }
}

/// A value that may be SQL `NULL`.
///
/// Serializes as the inner value or `null`. Deserializing `null` or an absent
/// field yields the null state; any other value, including `""` for a
/// date/time, is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Null<T>(pub Option<T>);

pub type NullBool = Null<bool>;
pub type NullInt64 = Null<i64>;
pub type NullFloat64 = Null<f64>;
pub type NullString = Null<String>;
pub type NullTime = Null<CustomTime>;
pub type NullDate = Null<CustomDate>;

impl<T> Default for Null<T> {
    fn default() -> Self {
        Null(None)
    }
}

impl<T> Null<T> {
    pub fn new(value: T) -> Self {
        Null(Some(value))
    }

    pub fn null() -> Self {
        Null(None)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    pub fn value(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn into_option(self) -> Option<T> {
        self.0
    }
}

impl<T> From<Option<T>> for Null<T> {
    fn from(value: Option<T>) -> Self {
        Null(value)
    }
}

impl<T> From<Null<T>> for Option<T> {
    fn from(value: Null<T>) -> Self {
        value.0
    }
}

impl<T: fmt::Display> fmt::Display for Null<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => value.fmt(f),
            None => Ok(()),
        }
    }
}

/// Parses path and query parameters; an empty parameter is null.
impl<T> FromStr for Null<T>
where
    T: FromStr + Zeroable,
{
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Null(None));
        }
        let value = s.parse::<T>()?;
        Ok(Null(Some(value).filter(|v| !v.is_zero())))
    }
}

impl<T: Serialize> Serialize for Null<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(value) => value.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Null<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Null)
    }
}
