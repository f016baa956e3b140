//! Document number generation.
//!
//! Numbers are `{prefix}-{sequence:06}`. Each repository reads the highest
//! number of its own table inside the creating transaction, takes the next
//! sequence, and relies on the unique index to catch a concurrent winner;
//! the collision is retried with a fresh candidate a bounded number of
//! times before surfacing.

/// Attempts per document before a numbering collision is surfaced.
pub const MAX_NUMBERING_ATTEMPTS: usize = 3;

/// Prefix for sale numbers.
pub const SALE_PREFIX: &str = "V";
/// Prefix for purchase receipt numbers.
pub const RECEIPT_PREFIX: &str = "R";
/// Prefix for return numbers.
pub const RETURN_PREFIX: &str = "D";
/// Prefix for customer order numbers.
pub const ORDER_PREFIX: &str = "P";

/// Formats a document number.
#[must_use]
pub fn format_number(prefix: &str, sequence: u64) -> String {
    format!("{prefix}-{sequence:06}")
}

/// Extracts the sequence from a document number, if it matches the prefix.
#[must_use]
pub fn parse_sequence(number: &str, prefix: &str) -> Option<u64> {
    number
        .strip_prefix(prefix)?
        .strip_prefix('-')?
        .parse()
        .ok()
}

/// Next sequence after the highest persisted number.
#[must_use]
pub fn next_sequence(last: Option<&str>, prefix: &str) -> u64 {
    last.and_then(|number| parse_sequence(number, prefix))
        .map_or(1, |sequence| sequence + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_six_digits() {
        assert_eq!(format_number(SALE_PREFIX, 42), "V-000042");
        assert_eq!(format_number(RETURN_PREFIX, 1_234_567), "D-1234567");
    }

    #[test]
    fn test_parse_roundtrip() {
        assert_eq!(parse_sequence("V-000042", "V"), Some(42));
        assert_eq!(parse_sequence("R-999999", "R"), Some(999_999));
        assert_eq!(parse_sequence("V-000042", "R"), None);
        assert_eq!(parse_sequence("garbage", "V"), None);
    }

    #[test]
    fn test_next_sequence() {
        assert_eq!(next_sequence(None, "V"), 1);
        assert_eq!(next_sequence(Some("V-000042"), "V"), 43);
        assert_eq!(next_sequence(Some("not-a-number"), "V"), 1);
    }
}
