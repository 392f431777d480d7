//! Parsing and display of building type byte values.

use crate::error::ValidationError;

/// Range-check an integer into a byte value.
pub fn value_from_int(value: i64) -> Result<u8, ValidationError> {
    u8::try_from(value).map_err(|_| ValidationError::ValueOutOfRange(value))
}

/// Parse a user-entered value.
///
/// Accepts decimal (`"14"`) or `0x`-prefixed hexadecimal (`"0x0E"`).
/// Surrounding whitespace is ignored.
pub fn parse_value(text: &str) -> Result<u8, ValidationError> {
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => trimmed.parse::<i64>(),
    };
    let value = parsed.map_err(|_| ValidationError::InvalidNumber(text.to_string()))?;
    value_from_int(value)
}

/// Two-digit uppercase hexadecimal with a `0x` prefix, e.g. `0x0E`.
pub fn format_value(value: u8) -> String {
    format!("0x{value:02X}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_decimal() {
        assert_eq!(parse_value("14").unwrap(), 14);
        assert_eq!(parse_value(" 255 ").unwrap(), 255);
        assert_eq!(parse_value("0").unwrap(), 0);
    }

    #[test]
    fn parse_hex() {
        assert_eq!(parse_value("0x0E").unwrap(), 14);
        assert_eq!(parse_value("0XFF").unwrap(), 255);
        assert_eq!(parse_value("0x63").unwrap(), 99);
    }

    #[test]
    fn parse_rejects_out_of_range() {
        assert_eq!(parse_value("256"), Err(ValidationError::ValueOutOfRange(256)));
        assert_eq!(parse_value("-1"), Err(ValidationError::ValueOutOfRange(-1)));
        assert_eq!(parse_value("0x100"), Err(ValidationError::ValueOutOfRange(256)));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(parse_value("abc"), Err(ValidationError::InvalidNumber(_))));
        assert!(matches!(parse_value(""), Err(ValidationError::InvalidNumber(_))));
        assert!(matches!(parse_value("0x"), Err(ValidationError::InvalidNumber(_))));
    }

    #[test]
    fn format_is_two_digit_uppercase() {
        assert_eq!(format_value(14), "0x0E");
        assert_eq!(format_value(0), "0x00");
        assert_eq!(format_value(255), "0xFF");
    }

    proptest! {
        #[test]
        fn formatted_value_parses_back(v in any::<u8>()) {
            prop_assert_eq!(parse_value(&format_value(v)).unwrap(), v);
        }

        #[test]
        fn value_from_int_accepts_only_bytes(v in any::<i64>()) {
            let result = value_from_int(v);
            prop_assert_eq!(result.is_ok(), (0..=255).contains(&v));
        }
    }
}
