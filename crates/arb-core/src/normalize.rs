//! # Normalizers
//!
//! Pure functions that turn raw cells into canonical values.
//!
//! ```text
//! ┌────────────────────┬────────────────────────┬──────────────────────────┐
//! │ Raw cell           │ Normalizer             │ Canonical                │
//! ├────────────────────┼────────────────────────┼──────────────────────────┤
//! │ " dd1391-100 "     │ normalize_product_code │ "DD1391-100"             │
//! │ "3000+件" / 150    │ extract_sales_count    │ 3000 / 150               │
//! │ "3.6" / "" / "abc" │ parse_discount_factor  │ 3.6 / 10 / 10            │
//! │ "1299" / 1299.5    │ parse_amount           │ Some(1299.0) / Some(..)  │
//! └────────────────────┴────────────────────────┴──────────────────────────┘
//! ```
//!
//! None of these fail. Deciding whether a fallback value deserves a
//! validation problem is the extractor's job.

use crate::sheet::Cell;
use crate::types::DiscountFactor;

/// Trims and uppercases a product code.
///
/// Empty or absent input yields an empty string; callers skip such rows.
///
/// ## Example
/// ```rust
/// use arb_core::normalize::normalize_product_code;
/// use arb_core::sheet::Cell;
///
/// assert_eq!(normalize_product_code(&Cell::from(" dd1391-100 ")), "DD1391-100");
/// assert_eq!(normalize_product_code(&Cell::Empty), "");
/// ```
pub fn normalize_product_code(raw: &Cell) -> String {
    normalize_code_str(&raw.text())
}

/// String form of [`normalize_product_code`], for codes typed by hand.
pub fn normalize_code_str(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Cleans a sales cell into a non-negative count.
///
/// ## Rules
/// - Numeric cell: used as-is (negative → 0, fraction truncated)
/// - Text: the first run of ASCII digits anywhere ("3000+件" → 3000)
/// - Absent, or no digits at all ("无") → 0
///
/// A digit run too long for `u64` saturates at `u64::MAX`.
pub fn extract_sales_count(raw: &Cell) -> u64 {
    match raw {
        Cell::Empty => 0,
        Cell::Number(n) => {
            if n.is_finite() && *n > 0.0 {
                n.trunc() as u64
            } else {
                0
            }
        }
        Cell::Text(s) => first_digit_run(s)
            .map(|digits| digits.parse::<u64>().unwrap_or(u64::MAX))
            .unwrap_or(0),
    }
}

fn first_digit_run(s: &str) -> Option<&str> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let rest = &s[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Parses a discount factor on the 0–10 scale.
///
/// Absent, non-numeric or out-of-range input falls back to full price (10),
/// i.e. "no discount applied".
///
/// ## Example
/// ```rust
/// use arb_core::normalize::parse_discount_factor;
/// use arb_core::sheet::Cell;
///
/// assert_eq!(parse_discount_factor(&Cell::from("3.6")).value(), 3.6);
/// assert_eq!(parse_discount_factor(&Cell::from("")).value(), 10.0);
/// assert_eq!(parse_discount_factor(&Cell::from("abc")).value(), 10.0);
/// ```
pub fn parse_discount_factor(raw: &Cell) -> DiscountFactor {
    parse_amount(raw)
        .and_then(DiscountFactor::from_scale)
        .unwrap_or_default()
}

/// Parses a plain decimal from a cell.
///
/// Numbers pass through; text is trimmed and parsed. Blank cells and
/// anything that is not a finite decimal yield `None`.
pub fn parse_amount(raw: &Cell) -> Option<f64> {
    let value = match raw {
        Cell::Empty => return None,
        Cell::Number(n) => *n,
        Cell::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_product_code() {
        assert_eq!(normalize_product_code(&Cell::from("  cw2288-111\t")), "CW2288-111");
        assert_eq!(normalize_product_code(&Cell::from(720055.0)), "720055");
        assert_eq!(normalize_product_code(&Cell::from("   ")), "");
        assert_eq!(normalize_product_code(&Cell::Empty), "");
    }

    #[test]
    fn test_normalize_product_code_is_idempotent() {
        for raw in ["dd1391-100", " Fv5029-010 ", "ABC", "aj1 low"] {
            let once = normalize_product_code(&Cell::from(raw));
            let twice = normalize_product_code(&Cell::from(once.as_str()));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_extract_sales_count() {
        assert_eq!(extract_sales_count(&Cell::from("3000+件")), 3000);
        assert_eq!(extract_sales_count(&Cell::from(150.0)), 150);
        assert_eq!(extract_sales_count(&Cell::from("")), 0);
        assert_eq!(extract_sales_count(&Cell::from("无")), 0);
        assert_eq!(extract_sales_count(&Cell::Empty), 0);
    }

    #[test]
    fn test_extract_sales_count_edge_cases() {
        assert_eq!(extract_sales_count(&Cell::from("月销 1.2万")), 1);
        assert_eq!(extract_sales_count(&Cell::from(-4.0)), 0);
        assert_eq!(extract_sales_count(&Cell::from(12.9)), 12);
        assert_eq!(
            extract_sales_count(&Cell::from("99999999999999999999999")),
            u64::MAX
        );
    }

    #[test]
    fn test_parse_discount_factor() {
        assert_eq!(parse_discount_factor(&Cell::from("3.6")).value(), 3.6);
        assert_eq!(parse_discount_factor(&Cell::from(4.5)).hundredths(), 450);
        assert_eq!(parse_discount_factor(&Cell::from("")).value(), 10.0);
        assert_eq!(parse_discount_factor(&Cell::from("abc")).value(), 10.0);
        assert_eq!(parse_discount_factor(&Cell::from("36")).value(), 10.0);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(&Cell::from(" 1299 ")), Some(1299.0));
        assert_eq!(parse_amount(&Cell::from(-5.0)), Some(-5.0));
        assert_eq!(parse_amount(&Cell::from("12a")), None);
        assert_eq!(parse_amount(&Cell::from("NaN")), None);
        assert_eq!(parse_amount(&Cell::Empty), None);
    }
}
