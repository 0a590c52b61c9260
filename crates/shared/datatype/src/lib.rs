//! Custom data types for services.
//!
//! This crate provides:
//! - [`CustomDate`] and [`CustomTime`] with layout auto-detection and UTC
//!   designator handling across JSON, XML, query parameters and SQL
//! - [`Null`] wrappers for nullable scalars
//! - String and layout converters
//! - Field presence checks and XML record mapping
//!
//! Enable the `database` feature to use the types as sea-orm columns.

pub mod constants;
pub mod convert;
pub mod date;
pub mod error;
pub mod fields;
pub mod format;
pub mod null;
pub mod sql;
pub mod time;
pub mod utc;
mod validate;
pub mod xml;

#[cfg(feature = "database")]
mod orm;

pub use convert::{date_to_format, string_to_bool, string_to_i64, time_to_format};
pub use date::CustomDate;
pub use error::{DatatypeError, DatatypeResult};
pub use fields::{check_field_values, is_empty_value};
pub use format::{DateFormat, TimeFormat};
pub use null::{Null, NullBool, NullDate, NullFloat64, NullInt64, NullString, NullTime, Zeroable};
pub use sql::SqlValue;
pub use time::CustomTime;
pub use utc::{is_utc, set_as_utc};
pub use xml::{get_xml_value, parse_xml_records, parse_xml_to, parse_xml_to_vec, XmlMapping};
