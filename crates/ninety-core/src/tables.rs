//! Table cell cleaning.
//!
//! Raw cells from scanned filings carry OCR artifacts: garble sequences,
//! digits split by spaces, letter/digit confusions, dot leaders. Cleaning
//! is a fixed rule pipeline over each cell; configured artifact rules run
//! first, then the built-in repairs. The whole pipeline is idempotent:
//! cleaning already-clean text changes nothing.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::extraction::RawTable;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Spaced-out EIN, dash required: "1 2 - 3 45 6789" but not "123456789".
static SPACED_EIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d)\s*(\d)\s*-\s*(\d)\s*(\d)\s*(\d)\s*(\d)\s*(\d)\s*(\d)\s*(\d)\b").unwrap()
});

/// Three or more single digits separated by whitespace, e.g. "1 2 3 4".
static SPACED_DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\d\s+){2,}\d").unwrap());

static COLUMN_CL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(Cl\)").unwrap());

/// Whole cell is a parenthesized amount, optionally with a dollar sign.
static PAREN_NEGATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\$?\s*([\d,]+(?:\.\d+)?)\)$").unwrap());

static TRAILING_DOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d)\.$").unwrap());

/// A table whose cells have been through the cleaning pipeline.
#[derive(Debug, Clone)]
pub struct CleanTable {
    pub page: usize,
    pub rows: Vec<Vec<CleanCell>>,
}

#[derive(Debug, Clone)]
pub struct CleanCell {
    pub text: String,
    /// The cell exactly as the backend produced it.
    pub original: String,
    /// How much repair this cell needed, 1.0 for untouched cells with a
    /// floor of 0.5 for heavily repaired ones.
    pub confidence: f64,
    /// True when a dollar sign was stripped from the cell.
    pub currency_hint: bool,
}

/// Cell cleaner with the configured artifact rules compiled up front.
#[derive(Debug)]
pub struct CellCleaner {
    artifact_rules: Vec<(Regex, String)>,
}

impl CellCleaner {
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let mut artifact_rules = Vec::with_capacity(config.artifact_patterns.len());
        for (pattern, replacement) in &config.artifact_patterns {
            let re = Regex::new(pattern).map_err(|e| ExtractError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
            artifact_rules.push((re, replacement.clone()));
        }
        Ok(CellCleaner { artifact_rules })
    }

    pub fn clean_tables(&self, tables: &[RawTable]) -> Vec<CleanTable> {
        tables
            .iter()
            .map(|t| CleanTable {
                page: t.page,
                rows: t
                    .rows
                    .iter()
                    .map(|row| row.iter().map(|cell| self.clean_cell(cell)).collect())
                    .collect(),
            })
            .collect()
    }

    pub fn clean_cell(&self, raw: &str) -> CleanCell {
        let mut text = raw.to_string();

        for (re, replacement) in &self.artifact_rules {
            text = re.replace_all(&text, replacement.as_str()).into_owned();
        }

        text = SPACED_EIN.replace_all(&text, "$1$2-$3$4$5$6$7$8$9").into_owned();
        text = collapse_digit_runs(&text);
        text = COLUMN_CL.replace_all(&text, "(C)").into_owned();
        text = fix_standalone_tokens(&text);

        // Accounting negatives: "(1,234)" means -1,234.
        let trimmed = collapse_ws(&text);
        text = PAREN_NEGATIVE
            .replace(&trimmed, "-$1")
            .into_owned();

        let currency_hint = text.contains('$');
        if currency_hint {
            text = text.replace('$', "");
        }

        text = TRAILING_DOT.replace(&text, "$1").into_owned();
        text = collapse_ws(&text);

        let confidence = repair_confidence(raw, &text);
        CleanCell {
            text,
            original: raw.to_string(),
            confidence,
            currency_hint,
        }
    }
}

/// Join whitespace-split digit runs in a single pass, so a second cleaning
/// pass finds nothing left to join.
pub(crate) fn collapse_digit_runs(text: &str) -> String {
    SPACED_DIGIT_RUN
        .replace_all(text, |caps: &regex::Captures<'_>| {
            caps[0].chars().filter(|c| !c.is_whitespace()).collect::<String>()
        })
        .into_owned()
}

/// OCR letter/digit confusions that are only safe to fix on standalone
/// tokens: a lone "l" is a 1, a lone "O" is a 0.
fn fix_standalone_tokens(text: &str) -> String {
    let mut changed = false;
    let tokens: Vec<Cow<'_, str>> = text
        .split_whitespace()
        .map(|t| match t {
            "l" => {
                changed = true;
                Cow::Borrowed("1")
            }
            "O" => {
                changed = true;
                Cow::Borrowed("0")
            }
            other => Cow::Borrowed(other),
        })
        .collect();
    if changed {
        tokens.join(" ")
    } else {
        text.to_string()
    }
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Confidence from repair distance: mismatched positions plus the length
/// delta between the whitespace-normalized original and the cleaned text,
/// as a fraction of the original length. Floor at 0.5: even a heavily
/// repaired cell still carries signal.
fn repair_confidence(original: &str, cleaned: &str) -> f64 {
    let orig = collapse_ws(original);
    if orig == *cleaned {
        return 1.0;
    }
    let o: Vec<char> = orig.chars().collect();
    let c: Vec<char> = cleaned.chars().collect();
    let mismatches = o
        .iter()
        .zip(c.iter())
        .filter(|(a, b)| a != b)
        .count()
        + o.len().abs_diff(c.len());
    let len = o.len().max(1);
    (1.0 - mismatches as f64 / len as f64).max(0.5)
}
