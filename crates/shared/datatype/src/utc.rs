//! UTC suffix helpers.

/// Zone designator appended to UTC values.
pub const UTC_SUFFIX: char = 'Z';

/// Whether `value` carries the UTC designator.
pub fn is_utc(value: &str) -> bool {
    value.ends_with(UTC_SUFFIX)
}

/// Append the UTC designator unless it is already present.
pub fn set_as_utc(value: &str) -> String {
    if is_utc(value) {
        value.to_string()
    } else {
        format!("{value}{UTC_SUFFIX}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_utc_suffix() {
        assert!(is_utc("2024-01-26Z"));
        assert!(is_utc("10:55:00Z"));
        assert!(!is_utc("2024-01-26"));
        assert!(!is_utc(""));
    }

    #[test]
    fn appends_suffix_once() {
        assert_eq!(set_as_utc("2024-01-26"), "2024-01-26Z");
        assert_eq!(set_as_utc("2024-01-26Z"), "2024-01-26Z");
        assert_eq!(set_as_utc(""), "Z");
    }
}
