//! Monetary amount recognition and validation.

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

/// An amount token: optional dollar sign, optional accounting parens,
/// digits with optional thousands separators and a cents fraction.
static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(?\$?\s?(\d[\d,]*(?:\.\d{1,2})?)\)?").unwrap());

/// Three or more lone digits in a row are one OCR-shredded number, not a
/// series of amounts.
static SPACED_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d(?:\s+\d){2,}").unwrap());

/// Largest plausible Form 990 amount. A trillion dollars on a nonprofit
/// return is an extraction error, not a number.
static MAX_AMOUNT: LazyLock<Decimal> = LazyLock::new(|| Decimal::new(1_000_000_000_000, 0));

/// Digit groups shorter than this on free text are line numbers or
/// sub-line letters ("26", "1a"), not values. Cell parses are exempt:
/// the cell's position already anchors its meaning.
const LINE_MIN_DIGITS: usize = 3;

/// A validated monetary amount with its display form preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    /// Formatted as found, separators kept, leading "-" for negatives.
    pub display: String,
    pub value: Decimal,
}

/// Parse a whole cell or token as one amount. Any digit count goes; only
/// magnitudes of a trillion or more are rejected.
pub fn parse_amount(text: &str) -> Option<Amount> {
    let trimmed = text.trim();
    let m = AMOUNT.find(trimmed)?;
    // Whole-token parse only; "12ab34" is not an amount.
    if m.start() != 0 || m.end() != trimmed.len() {
        return None;
    }
    amount_from_match(trimmed, 1)
}

/// All plausible amounts on a line of text, left to right.
///
/// Tokens inside a spaced digit run are skipped: "2 5 0 0 0 0 0" is one
/// shredded number, and reading its digits as amounts would fabricate
/// values. Callers rejoin such runs and rescan.
pub fn amounts_in_line(line: &str) -> Vec<Amount> {
    let runs: Vec<(usize, usize)> = SPACED_RUN
        .find_iter(line)
        .map(|m| (m.start(), m.end()))
        .collect();
    AMOUNT
        .find_iter(line)
        .filter(|m| !runs.iter().any(|&(s, e)| s <= m.start() && m.end() <= e))
        .filter_map(|m| amount_from_match(m.as_str(), LINE_MIN_DIGITS))
        .collect()
}

fn amount_from_match(token: &str, min_digits: usize) -> Option<Amount> {
    let negative = token.starts_with('(') && token.ends_with(')');
    let digits: String = token.chars().filter(|c| c.is_ascii_digit()).collect();

    let bare: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let numeric = bare.replace(',', "");
    let mut value = Decimal::from_str(&numeric).ok()?;
    if negative {
        value = -value;
    }

    if !plausible(&value, digits.len(), min_digits) {
        return None;
    }

    let mut display = bare;
    if negative {
        display.insert(0, '-');
    }
    Some(Amount { display, value })
}

/// Zero is always allowed regardless of the digit floor.
fn plausible(value: &Decimal, digit_count: usize, min_digits: usize) -> bool {
    if value.abs() >= *MAX_AMOUNT {
        return false;
    }
    digit_count >= min_digits || value.is_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_plain_amount() {
        let a = parse_amount("1,234,567").unwrap();
        assert_eq!(a.display, "1,234,567");
        assert_eq!(a.value, dec!(1234567));
    }

    #[test]
    fn test_parse_dollar_and_cents() {
        let a = parse_amount("$5,000.25").unwrap();
        assert_eq!(a.display, "5,000.25");
        assert_eq!(a.value, dec!(5000.25));
    }

    #[test]
    fn test_parse_accounting_negative() {
        let a = parse_amount("(12,500)").unwrap();
        assert_eq!(a.display, "-12,500");
        assert_eq!(a.value, dec!(-12500));
    }

    #[test]
    fn test_zero_is_valid() {
        let a = parse_amount("0").unwrap();
        assert_eq!(a.value, Decimal::ZERO);
    }

    #[test]
    fn test_cell_parse_keeps_small_amounts() {
        assert_eq!(parse_amount("400").unwrap().value, dec!(400));
        assert_eq!(parse_amount("12").unwrap().value, dec!(12));
    }

    #[test]
    fn test_trillion_rejected() {
        assert!(parse_amount("1,000,000,000,000").is_none());
        assert!(parse_amount("999,999,999,999").is_some());
    }

    #[test]
    fn test_partial_token_rejected() {
        assert!(parse_amount("1234ab").is_none());
        assert!(parse_amount("Total 1,234").is_none());
    }

    #[test]
    fn test_amounts_in_line() {
        let amounts = amounts_in_line("12  Total revenue   1,100,000   1,234,567");
        let values: Vec<Decimal> = amounts.iter().map(|a| a.value).collect();
        // The line number "12" is below the free-text digit floor.
        assert_eq!(values, vec![dec!(1100000), dec!(1234567)]);
    }

    #[test]
    fn test_line_scan_keeps_small_amounts_and_zero() {
        let amounts = amounts_in_line("Total liabilities   400");
        assert_eq!(amounts[0].value, dec!(400));
        let amounts = amounts_in_line("Investment income   0");
        assert_eq!(amounts[0].value, Decimal::ZERO);
    }

    #[test]
    fn test_line_scan_skips_sub_line_references() {
        let amounts = amounts_in_line("Total. Add lines 1a-1f   1,200,000");
        let values: Vec<Decimal> = amounts.iter().map(|a| a.value).collect();
        assert_eq!(values, vec![dec!(1200000)]);
    }

    #[test]
    fn test_line_scan_skips_spaced_digit_runs() {
        // Lone digits in a run never read as amounts, zeros included.
        assert!(amounts_in_line("$  2 5 0 0 0 0 0").is_empty());
        let amounts = amounts_in_line("2,000,000   0   0   0");
        let values: Vec<Decimal> = amounts.iter().map(|a| a.value).collect();
        assert_eq!(values, vec![dec!(2000000)]);
    }
}
