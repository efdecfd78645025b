//! Numeric normalization for display-formatted cell text.
//!
//! Cells carry currency symbols, grouping commas, unicode minus signs and
//! magnitude suffixes (`$1.2M`, `−42.10`, `3,400 USDC`). [`parse_numeric`]
//! pulls the first number out of such text; [`format_notional`] goes the
//! other way for display.

use regex::Regex;
use std::sync::LazyLock;

use super::position::UNAVAILABLE;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?[0-9]+(?:\.[0-9]+)?").unwrap());

/// Scale factor for a magnitude suffix letter.
fn suffix_scale(c: char) -> Option<f64> {
    match c {
        'K' => Some(1_000.0),
        'M' => Some(1_000_000.0),
        'B' => Some(1_000_000_000.0),
        _ => None,
    }
}

/// Parse the first number in `text`, applying a K/M/B suffix if one follows.
///
/// Returns `None` for missing or empty input and for text without digits.
/// Absent is never reported as zero.
pub fn parse_numeric(text: Option<&str>) -> Option<f64> {
    let text = text?;
    if text.is_empty() {
        return None;
    }

    let cleaned = text
        .replace(',', "")
        .replace('\u{2212}', "-")
        .trim()
        .to_uppercase();
    if cleaned.is_empty() {
        return None;
    }

    let m = NUMBER_RE.find(&cleaned)?;
    let mut value: f64 = m.as_str().parse().ok()?;

    if let Some(scale) = cleaned[m.end()..].trim().chars().next().and_then(suffix_scale) {
        value *= scale;
    }

    Some(value)
}

/// Render a dollar amount: `$1,234.50`, or `$0.000012` below one dollar.
///
/// Sub-unit values keep six decimals so small prices stay readable.
/// `None` renders as [`UNAVAILABLE`].
pub fn format_notional(value: Option<f64>) -> String {
    let Some(value) = value else {
        return UNAVAILABLE.to_string();
    };

    let decimals = if value.abs() >= 1.0 { 2 } else { 6 };
    let digits = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

    let sign = if value < 0.0 { "-" } else { "" };
    if frac_part.is_empty() {
        format!("${sign}{}", group_thousands(int_part))
    } else {
        format!("${sign}{}.{frac_part}", group_thousands(int_part))
    }
}

/// Insert `,` every three digits from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_grouped() {
        assert_eq!(parse_numeric(Some("42")), Some(42.0));
        assert_eq!(parse_numeric(Some("$60,123.45")), Some(60_123.45));
        assert_eq!(parse_numeric(Some("  0.0031 ")), Some(0.0031));
    }

    #[test]
    fn test_parse_magnitude_suffixes() {
        assert_eq!(parse_numeric(Some("1,234.5K")), Some(1_234_500.0));
        assert_eq!(parse_numeric(Some("$2.5m")), Some(2_500_000.0));
        assert_eq!(parse_numeric(Some("1B")), Some(1_000_000_000.0));
        assert_eq!(parse_numeric(Some("3 K")), Some(3_000.0));
    }

    #[test]
    fn test_parse_other_trailing_text_does_not_scale() {
        assert_eq!(parse_numeric(Some("12.5 USDC")), Some(12.5));
        assert_eq!(parse_numeric(Some("20x")), Some(20.0));
        assert_eq!(parse_numeric(Some("+$120.00 (4.5%)")), Some(120.0));
    }

    #[test]
    fn test_parse_unit_starting_with_suffix_letter() {
        // only the first letter after the number is inspected
        assert_eq!(parse_numeric(Some("0.5 BTC")), Some(500_000_000.0));
    }

    #[test]
    fn test_parse_unicode_minus() {
        assert_eq!(parse_numeric(Some("\u{2212}42")), Some(-42.0));
        assert_eq!(parse_numeric(Some("-1.5K")), Some(-1_500.0));
    }

    #[test]
    fn test_parse_absent() {
        assert_eq!(parse_numeric(None), None);
        assert_eq!(parse_numeric(Some("")), None);
        assert_eq!(parse_numeric(Some("   ")), None);
        assert_eq!(parse_numeric(Some("N/A")), None);
        assert_eq!(parse_numeric(Some("--")), None);
    }

    #[test]
    fn test_format_notional() {
        assert_eq!(format_notional(Some(1234.5)), "$1,234.50");
        assert_eq!(format_notional(Some(1.0)), "$1.00");
        assert_eq!(format_notional(Some(255.0)), "$255.00");
        assert_eq!(format_notional(Some(1_234_567.891)), "$1,234,567.89");
    }

    #[test]
    fn test_format_notional_sub_unit() {
        assert_eq!(format_notional(Some(0.0000123)), "$0.000012");
        assert_eq!(format_notional(Some(0.5)), "$0.500000");
        assert_eq!(format_notional(Some(0.0)), "$0.000000");
    }

    #[test]
    fn test_format_notional_negative() {
        assert_eq!(format_notional(Some(-1234.5)), "$-1,234.50");
    }

    #[test]
    fn test_format_notional_unavailable() {
        assert_eq!(format_notional(None), "Unavailable");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("123456"), "123,456");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }
}
