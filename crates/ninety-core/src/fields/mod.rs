//! Field extraction.
//!
//! A static table of field specs drives everything: which section a field
//! belongs to, the labels that anchor it, whether it is an identifier or a
//! monetary amount, and which value to pick when a row carries several
//! columns. Each field is tried against cleaned tables and against raw page
//! text; when both sources agree the field is promoted to cross-referenced.

pub mod identifier;
pub mod monetary;

use crate::analyze::DocumentProfile;
use crate::model::{FieldSource, FieldValue, SectionMap};
use crate::tables::{collapse_digit_runs, CleanTable};
use monetary::Amount;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::trace;

/// Base confidence for a value read out of a cleaned table cell.
const TABLE_BASE: f64 = 0.95;
/// Identifier found in text directly adjacent to its label.
const LABELED_IDENTIFIER: f64 = 0.92;
/// Bare pattern match or amount on a labeled text line.
const TEXT_BASE: f64 = 0.85;
/// Value recovered only after rejoining OCR-spaced digits.
const RESPACED: f64 = 0.70;
/// Bonus when table and text agree on the same value.
const AGREEMENT_BONUS: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Identifier,
    Monetary,
}

/// Which of the amounts following a label to take. Form 990 rows carry up
/// to four columns (Part IX) or prior/current year pairs (Part I, Part X).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuePick {
    /// First amount after the label (column (A), or a lone value).
    First,
    /// Last amount (current year / end of year column).
    Last,
    /// Zero-based column index after the label.
    Nth(usize),
}

pub struct FieldSpec {
    pub section: &'static str,
    pub name: &'static str,
    pub kind: FieldKind,
    /// Case-insensitive label fragments that anchor the field.
    pub labels: &'static [&'static str],
    pub pick: ValuePick,
    /// Critical fields weigh triple in overall confidence and are reported
    /// when missing.
    pub critical: bool,
}

pub static FIELD_SPECS: &[FieldSpec] = &[
    // Page one: header block and the Part I summary (prior/current year
    // columns, current year rightmost).
    FieldSpec {
        section: "page1",
        name: "employer_identification_number",
        kind: FieldKind::Identifier,
        labels: &["Employer identification number", "EIN"],
        pick: ValuePick::First,
        critical: true,
    },
    FieldSpec {
        section: "page1",
        name: "gross_receipts",
        kind: FieldKind::Monetary,
        labels: &["Gross receipts"],
        pick: ValuePick::First,
        critical: true,
    },
    FieldSpec {
        section: "page1",
        name: "total_contributions",
        kind: FieldKind::Monetary,
        labels: &["Contributions and grants"],
        pick: ValuePick::Last,
        critical: true,
    },
    FieldSpec {
        section: "page1",
        name: "total_revenue",
        kind: FieldKind::Monetary,
        labels: &["Total revenue"],
        pick: ValuePick::Last,
        critical: true,
    },
    FieldSpec {
        section: "page1",
        name: "grants_and_similar_amounts_paid",
        kind: FieldKind::Monetary,
        labels: &["Grants and similar amounts paid"],
        pick: ValuePick::Last,
        critical: false,
    },
    FieldSpec {
        section: "page1",
        name: "salaries_compensation_benefits",
        kind: FieldKind::Monetary,
        labels: &["Salaries, other compensation, employee benefits"],
        pick: ValuePick::Last,
        critical: false,
    },
    FieldSpec {
        section: "page1",
        name: "total_fundraising_expenses",
        kind: FieldKind::Monetary,
        labels: &["Total fundraising expenses"],
        pick: ValuePick::First,
        critical: false,
    },
    // Part VIII, Statement of Revenue: column (A) "Total revenue" comes
    // first on each line.
    FieldSpec {
        section: "part_viii",
        name: "contributions_total",
        kind: FieldKind::Monetary,
        labels: &["Total. Add lines 1a", "Contributions, gifts, grants"],
        pick: ValuePick::First,
        critical: false,
    },
    FieldSpec {
        section: "part_viii",
        name: "program_service_revenue_total",
        kind: FieldKind::Monetary,
        labels: &["Total program service revenue", "Program service revenue"],
        pick: ValuePick::First,
        critical: false,
    },
    FieldSpec {
        section: "part_viii",
        name: "investment_income",
        kind: FieldKind::Monetary,
        labels: &["Investment income"],
        pick: ValuePick::First,
        critical: false,
    },
    FieldSpec {
        section: "part_viii",
        name: "other_revenue_total",
        kind: FieldKind::Monetary,
        labels: &["Total other revenue", "Miscellaneous revenue"],
        pick: ValuePick::First,
        critical: false,
    },
    FieldSpec {
        section: "part_viii",
        name: "total_revenue",
        kind: FieldKind::Monetary,
        labels: &["Total revenue"],
        pick: ValuePick::First,
        critical: false,
    },
    // Part IX, Statement of Functional Expenses: columns (A) total,
    // (B) program services, (C) management, (D) fundraising.
    FieldSpec {
        section: "part_ix",
        name: "total_functional_expenses_a",
        kind: FieldKind::Monetary,
        labels: &["Total functional expenses"],
        pick: ValuePick::Nth(0),
        critical: true,
    },
    FieldSpec {
        section: "part_ix",
        name: "total_functional_expenses_b",
        kind: FieldKind::Monetary,
        labels: &["Total functional expenses"],
        pick: ValuePick::Nth(1),
        critical: false,
    },
    FieldSpec {
        section: "part_ix",
        name: "total_functional_expenses_c",
        kind: FieldKind::Monetary,
        labels: &["Total functional expenses"],
        pick: ValuePick::Nth(2),
        critical: false,
    },
    FieldSpec {
        section: "part_ix",
        name: "total_functional_expenses_d",
        kind: FieldKind::Monetary,
        labels: &["Total functional expenses"],
        pick: ValuePick::Nth(3),
        critical: false,
    },
    FieldSpec {
        section: "part_ix",
        name: "joint_costs",
        kind: FieldKind::Monetary,
        labels: &["Joint costs"],
        pick: ValuePick::First,
        critical: false,
    },
    // Part X, Balance Sheet: beginning/end of year, end of year rightmost.
    FieldSpec {
        section: "balance_sheet",
        name: "total_assets",
        kind: FieldKind::Monetary,
        labels: &["Total assets"],
        pick: ValuePick::Last,
        critical: true,
    },
    FieldSpec {
        section: "balance_sheet",
        name: "total_liabilities",
        kind: FieldKind::Monetary,
        labels: &["Total liabilities"],
        pick: ValuePick::Last,
        critical: false,
    },
    FieldSpec {
        section: "balance_sheet",
        name: "net_assets_or_fund_balances",
        kind: FieldKind::Monetary,
        labels: &["Net assets or fund balances"],
        pick: ValuePick::Last,
        critical: true,
    },
];

static PART_VIII_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Part\s+VIII\b|Statement of Revenue").unwrap());
static PART_IX_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Part\s+IX\b|Statement of Functional Expenses").unwrap());
static BALANCE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Part\s+X\b|Balance Sheet").unwrap());

/// Extract every declared field from the document.
pub fn extract_sections(
    pages: &[String],
    tables: &[CleanTable],
    profile: &DocumentProfile,
) -> SectionMap {
    let factor = ocr_factor(profile.ocr_quality);
    let mut sections: SectionMap = BTreeMap::new();

    for spec in FIELD_SPECS {
        let (first, last) = section_pages(spec.section, pages, profile.form_start_page);
        let from_table = table_candidate(spec, tables, first, last);
        let from_text = text_candidate(spec, pages, first, last);
        let field = merge_candidates(from_table, from_text, factor);
        trace!(
            section = spec.section,
            field = spec.name,
            present = field.is_present(),
            confidence = field.confidence,
            "field resolved"
        );
        sections
            .entry(spec.section.to_string())
            .or_default()
            .insert(spec.name.to_string(), field);
    }

    sections
}

/// Poor OCR discounts every confidence: factor 1.0 on a perfect character
/// stream, 0.6 on an unreadable one.
fn ocr_factor(ocr_quality: f64) -> f64 {
    0.6 + 0.4 * ocr_quality.clamp(0.0, 1.0)
}

/// 1-based inclusive page window a section's fields are searched in.
///
/// `page1` is the form start page itself. The later parts anchor on their
/// headings, with one page of spillover for tables that run long; when a
/// heading is never seen the window falls back to the whole form.
fn section_pages(section: &str, pages: &[String], form_start: usize) -> (usize, usize) {
    let total = pages.len().max(1);
    if section == "page1" {
        let p = form_start.min(total);
        return (p, p);
    }
    let heading: &Regex = match section {
        "part_viii" => &PART_VIII_HEADING,
        "part_ix" => &PART_IX_HEADING,
        _ => &BALANCE_HEADING,
    };
    for (i, page) in pages.iter().enumerate().skip(form_start.saturating_sub(1)) {
        if heading.is_match(page) {
            let p = i + 1;
            return (p, (p + 1).min(total));
        }
    }
    (form_start.min(total), total)
}

/// A value found by one source, before OCR scaling and merging.
struct Candidate {
    display: String,
    /// Canonical form used to detect agreement between sources.
    canon: String,
    confidence: f64,
    source: FieldSource,
    /// Carried onto the field when the value itself looks suspect.
    warning: Option<String>,
}

fn table_candidate(
    spec: &FieldSpec,
    tables: &[CleanTable],
    first: usize,
    last: usize,
) -> Option<Candidate> {
    for table in tables.iter().filter(|t| t.page >= first && t.page <= last) {
        for row in &table.rows {
            let Some(label_idx) = row
                .iter()
                .position(|cell| matches_label(&cell.text, spec.labels))
            else {
                continue;
            };

            match spec.kind {
                FieldKind::Identifier => {
                    // The EIN may share the label cell or sit in its own.
                    for cell in &row[label_idx..] {
                        if let Some(ein) = identifier::find_ein(&cell.text) {
                            let (adjust, warning) = identifier::assess_ein(&ein);
                            return Some(Candidate {
                                canon: ein.clone(),
                                display: ein,
                                confidence: TABLE_BASE * cell.confidence * adjust,
                                source: FieldSource::Table,
                                warning: warning.map(str::to_string),
                            });
                        }
                    }
                }
                FieldKind::Monetary => {
                    let amounts: Vec<(Amount, f64)> = row[label_idx + 1..]
                        .iter()
                        .filter_map(|cell| {
                            monetary::parse_amount(&cell.text).map(|a| (a, cell.confidence))
                        })
                        .collect();
                    if let Some((amount, cell_conf)) = pick_amount(&amounts, spec.pick) {
                        return Some(Candidate {
                            display: amount.display.clone(),
                            canon: amount.value.normalize().to_string(),
                            confidence: TABLE_BASE * cell_conf,
                            source: FieldSource::Table,
                            warning: None,
                        });
                    }
                }
            }
        }
    }
    None
}

fn text_candidate(
    spec: &FieldSpec,
    pages: &[String],
    first: usize,
    last: usize,
) -> Option<Candidate> {
    let window = &pages[first.saturating_sub(1)..last.min(pages.len())];
    match spec.kind {
        FieldKind::Identifier => identifier_text_candidate(spec, window),
        FieldKind::Monetary => monetary_text_candidate(spec, window),
    }
}

fn identifier_text_candidate(spec: &FieldSpec, window: &[String]) -> Option<Candidate> {
    // Label-adjacent: the EIN on the label line or the one below it.
    for page in window {
        let lines: Vec<&str> = page.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            if !matches_label(line, spec.labels) {
                continue;
            }
            let below = lines.get(i + 1).copied().unwrap_or("");
            for text in [*line, below] {
                if let Some(ein) = identifier::find_ein(text) {
                    return Some(identifier_candidate(ein, LABELED_IDENTIFIER));
                }
            }
            for text in [*line, below] {
                if let Some(ein) = identifier::find_spaced_ein(text) {
                    return Some(identifier_candidate(ein, RESPACED));
                }
            }
        }
    }
    // Fall back to the pattern anywhere in the window.
    for page in window {
        if let Some(ein) = identifier::find_ein(page) {
            return Some(identifier_candidate(ein, TEXT_BASE));
        }
    }
    None
}

fn identifier_candidate(ein: String, confidence: f64) -> Candidate {
    let (adjust, warning) = identifier::assess_ein(&ein);
    Candidate {
        canon: ein.clone(),
        display: ein,
        confidence: confidence * adjust,
        source: FieldSource::TextPattern,
        warning: warning.map(str::to_string),
    }
}

fn monetary_text_candidate(spec: &FieldSpec, window: &[String]) -> Option<Candidate> {
    for page in window {
        for line in page.lines() {
            let lower = line.to_lowercase();
            let Some((_, label_end)) = find_label(&lower, spec.labels) else {
                continue;
            };
            // Scan only past the label, so the line number ahead of it
            // never reads as a value.
            let rest = &lower[label_end..];
            if let Some(c) = monetary_candidate(rest, spec.pick, TEXT_BASE) {
                return Some(c);
            }
            // OCR may have spaced the digits out; rejoin and retry.
            let rejoined = collapse_digit_runs(rest);
            if let Some(c) = monetary_candidate(&rejoined, spec.pick, RESPACED) {
                return Some(c);
            }
        }
    }
    None
}

fn monetary_candidate(text: &str, pick: ValuePick, confidence: f64) -> Option<Candidate> {
    let amounts: Vec<(Amount, f64)> = monetary::amounts_in_line(text)
        .into_iter()
        .map(|a| (a, 1.0))
        .collect();
    let (amount, _) = pick_amount(&amounts, pick)?;
    Some(Candidate {
        display: amount.display.clone(),
        canon: amount.value.normalize().to_string(),
        confidence,
        source: FieldSource::TextPattern,
        warning: None,
    })
}

fn pick_amount(amounts: &[(Amount, f64)], pick: ValuePick) -> Option<(Amount, f64)> {
    let picked = match pick {
        ValuePick::First => amounts.first(),
        ValuePick::Last => amounts.last(),
        ValuePick::Nth(i) => amounts.get(i),
    };
    picked.map(|(a, c)| (a.clone(), *c))
}

fn matches_label(text: &str, labels: &[&str]) -> bool {
    find_label(&text.to_lowercase(), labels).is_some()
}

/// Byte range of the first label occurrence in the lowercased text.
///
/// Labels match case-insensitively on word boundaries; a short label like
/// "EIN" must not hit inside "foreign" or "being".
fn find_label(lower: &str, labels: &[&str]) -> Option<(usize, usize)> {
    let boundary = |c: Option<char>| c.map_or(true, |c| !c.is_alphanumeric());
    for label in labels {
        let needle = label.to_lowercase();
        let mut from = 0;
        while let Some(pos) = lower[from..].find(&needle) {
            let start = from + pos;
            let end = start + needle.len();
            if boundary(lower[..start].chars().next_back())
                && boundary(lower[end..].chars().next())
            {
                return Some((start, end));
            }
            from = end;
        }
    }
    None
}

fn merge_candidates(
    table: Option<Candidate>,
    text: Option<Candidate>,
    factor: f64,
) -> FieldValue {
    match (table, text) {
        (Some(t), Some(x)) if t.canon == x.canon => {
            let best = (t.confidence.max(x.confidence) * factor + AGREEMENT_BONUS).min(1.0);
            attach_warning(
                FieldValue::present(t.display, best, FieldSource::CrossReferenced),
                t.warning,
            )
        }
        (Some(t), Some(x)) => {
            let (winner, loser) = if t.confidence >= x.confidence { (t, x) } else { (x, t) };
            let field = FieldValue::present(
                winner.display.clone(),
                winner.confidence * factor,
                winner.source,
            )
            .with_warning(format!(
                "table and text sources disagree ({} vs {})",
                winner.display, loser.display
            ));
            attach_warning(field, winner.warning)
        }
        (Some(c), None) | (None, Some(c)) => attach_warning(
            FieldValue::present(c.display, c.confidence * factor, c.source),
            c.warning,
        ),
        (None, None) => FieldValue::absent("field not found"),
    }
}

fn attach_warning(field: FieldValue, warning: Option<String>) -> FieldValue {
    match warning {
        Some(w) => field.with_warning(w),
        None => field,
    }
}
