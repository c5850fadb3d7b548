//! Price and count extraction from listing text

use regex::Regex;
use std::sync::OnceLock;

fn price_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\d,]+\.?\d*").ok()).as_ref()
}

fn integer_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\d,]+").ok()).as_ref()
}

/// Parse a listing price such as `$1,299.99` or `$20.00 to $35.00`.
///
/// Ranges use their lower bound. Returns `None` when no number is present.
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned = text.trim();
    let cleaned = match cleaned.to_ascii_lowercase().find(" to ") {
        Some(at) => cleaned[..at].trim(),
        None => cleaned,
    };
    let found = price_pattern()?.find(cleaned)?;
    found.as_str().replace(',', "").parse().ok()
}

/// First integer in `text`, thousands separators allowed (`1,234 results`)
#[must_use]
pub fn parse_count(text: &str) -> Option<u64> {
    let found = integer_pattern()?.find(text)?;
    found.as_str().replace(',', "").parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod price_tests {
        use super::*;

        #[test]
        fn test_plain_price() {
            assert_eq!(parse_price("$89.99"), Some(89.99));
            assert_eq!(parse_price("  US $45  "), Some(45.0));
        }

        #[test]
        fn test_thousands_separator() {
            assert_eq!(parse_price("$1,299.50"), Some(1299.5));
        }

        #[test]
        fn test_range_uses_lower_bound() {
            assert_eq!(parse_price("$20.00 to $35.00"), Some(20.0));
            assert_eq!(parse_price("$20.00 TO $35.00"), Some(20.0));
        }

        #[test]
        fn test_no_number() {
            assert_eq!(parse_price("See price"), None);
            assert_eq!(parse_price(""), None);
        }
    }

    mod count_tests {
        use super::*;

        #[test]
        fn test_count_with_separator() {
            assert_eq!(parse_count("12,345 results for shoes"), Some(12_345));
        }

        #[test]
        fn test_count_in_parentheses() {
            assert_eq!(parse_count("Shopping cart (3 items)"), Some(3));
            assert_eq!(parse_count("no digits"), None);
        }
    }
}
