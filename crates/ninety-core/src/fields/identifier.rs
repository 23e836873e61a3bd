//! Employer identification number recognition.

use regex::Regex;
use std::sync::LazyLock;

static EIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{2}-\d{7}\b").unwrap());

/// OCR frequently spaces EIN digits out; the dash is the anchor.
static SPACED_EIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d)\s*(\d)\s*-\s*(\d)\s*(\d)\s*(\d)\s*(\d)\s*(\d)\s*(\d)\s*(\d)\b").unwrap()
});

/// First EIN-shaped token in the text. Shape is the only gate here;
/// suspicious digit patterns are kept and flagged through [`assess_ein`].
pub fn find_ein(text: &str) -> Option<String> {
    EIN.find(text).map(|m| m.as_str().to_string())
}

/// First EIN recoverable only by joining spaced digits. Lower trust than
/// [`find_ein`]; callers discount accordingly.
pub fn find_spaced_ein(text: &str) -> Option<String> {
    for caps in SPACED_EIN.captures_iter(text) {
        let joined = format!(
            "{}{}-{}{}{}{}{}{}{}",
            &caps[1], &caps[2], &caps[3], &caps[4], &caps[5], &caps[6], &caps[7], &caps[8], &caps[9]
        );
        // Skip matches that were already contiguous; find_ein owns those.
        if &caps[0] != joined.as_str() {
            return Some(joined);
        }
    }
    None
}

/// Confidence multiplier and warning for a shape-valid EIN.
///
/// Blank and sample filings carry filler numbers where the real one
/// belongs. Those stay extractable; an all-zero EIN is heavily discounted,
/// a sequential one is flagged but trusted, since low-digit EINs also
/// occur on genuine filings.
pub fn assess_ein(ein: &str) -> (f64, Option<&'static str>) {
    let digits: String = ein.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.chars().all(|c| c == '0') {
        return (0.5, Some("EIN is all zeros"));
    }
    if digits == "123456789" || digits == "987654321" {
        return (1.0, Some("EIN matches a sequential sample pattern"));
    }
    (1.0, None)
}
