//! Format patterns for custom dates and times.
//!
//! Patterns use `chrono` strftime syntax.

// =============================================================================
// Date
// =============================================================================

/// `2006-01-02Z`
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dZ";

/// `20060102Z`
pub const CUSTOM_DATE_FORMAT: &str = "%Y%m%dZ";

/// `2006-01-02`
pub const DEFAULT_DATE_FORMAT_NO_UTC: &str = "%Y-%m-%d";

/// `20060102`
pub const CUSTOM_DATE_FORMAT_NO_UTC: &str = "%Y%m%d";

// =============================================================================
// Time
// =============================================================================

/// `15:04:05Z`, time of day only
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%SZ";

/// `2006-01-02T15:04:05Z`
pub const CUSTOM_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// `15:04:05`, time of day only
pub const DEFAULT_TIME_FORMAT_NO_UTC: &str = "%H:%M:%S";

/// `2006-01-02T15:04:05`
pub const CUSTOM_TIME_FORMAT_NO_UTC: &str = "%Y-%m-%dT%H:%M:%S";
