//! Datatype errors.
//!
//! Returned by the parsers, converters and XML helpers of this crate.

use thiserror::Error;

/// Errors raised while parsing or converting custom data types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatatypeError {
    /// Input did not match any of the accepted formats
    #[error("cannot parse the given {kind} string \"{input}\" to one of these formats ({formats})")]
    Parse {
        kind: &'static str,
        input: String,
        formats: String,
    },

    /// Empty input where a value is required
    #[error("cannot parse an empty {0} string")]
    Empty(&'static str),

    /// Value could not be converted to the requested type
    #[error("cannot convert \"{input}\": {reason}")]
    Convert { input: String, reason: String },

    /// Database value of an unsupported kind
    #[error("cannot scan the given value into a {0}")]
    Scan(&'static str),

    /// Field checks were given a non-object value
    #[error("the given value is not a struct")]
    NotAStruct,

    /// Field name not present on the checked value
    #[error("cannot find field \"{0}\"")]
    UnknownField(String),

    /// Malformed XML or selector
    #[error("xml error: {0}")]
    Xml(String),

    /// Selector matched nothing
    #[error("cannot find node by given selector \"{0}\"")]
    NodeNotFound(String),

    /// Mapped XML record could not be deserialized
    #[error("cannot decode xml record: {0}")]
    Decode(String),
}

impl DatatypeError {
    pub(crate) fn convert(input: impl Into<String>, reason: impl ToString) -> Self {
        DatatypeError::Convert {
            input: input.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias
pub type DatatypeResult<T> = Result<T, DatatypeError>;
