//! Cross-field consistency checks.
//!
//! Four rules run in a fixed order. Each produces exactly one finding:
//! an error or warning when the involved amounts disagree beyond tolerance,
//! an informational note when they agree or when a field needed by the rule
//! was not extracted. Validation never mutates the extracted fields.

use crate::config::ExtractionConfig;
use crate::model::SectionMap;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Flat-dollar slack: rounding on the form itself can shift totals a few
/// dollars regardless of their magnitude.
const ABSOLUTE_SLACK: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Finding {
    pub rule: &'static str,
    pub severity: Severity,
    /// Qualified `section.name` of every field the rule examined.
    pub fields: &'static [&'static str],
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count()
    }

    /// One-line summary followed by each finding in rule order.
    pub fn render(&self) -> String {
        let mut out = format!(
            "Cross-validation: {} errors, {} warnings",
            self.error_count(),
            self.warning_count()
        );
        for f in &self.findings {
            out.push_str(&format!(
                "\n[{}] {}: {} (fields: {})",
                f.severity,
                f.rule,
                f.message,
                f.fields.join(", ")
            ));
        }
        out
    }
}

const REVENUE_FIELDS: &[&str] = &["page1.total_revenue", "part_viii.total_revenue"];
const CONTRIBUTION_FIELDS: &[&str] = &["page1.total_contributions", "part_viii.contributions_total"];
const EXPENSE_FIELDS: &[&str] = &[
    "part_ix.total_functional_expenses_a",
    "part_ix.total_functional_expenses_b",
    "part_ix.total_functional_expenses_c",
    "part_ix.total_functional_expenses_d",
];
const BALANCE_FIELDS: &[&str] = &[
    "balance_sheet.total_assets",
    "balance_sheet.total_liabilities",
    "balance_sheet.net_assets_or_fund_balances",
];

/// Run every consistency rule against the extracted sections.
pub fn validate(sections: &SectionMap, config: &ExtractionConfig) -> ValidationReport {
    let findings = vec![
        check_pair(
            sections,
            "revenue_consistency",
            Severity::Warning,
            REVENUE_FIELDS,
            config,
        ),
        check_pair(
            sections,
            "contributions_consistency",
            Severity::Warning,
            CONTRIBUTION_FIELDS,
            config,
        ),
        check_expense_allocation(sections, config),
        check_balance_sheet(sections, config),
    ];
    ValidationReport { findings }
}

/// Two renderings of the same figure must agree.
fn check_pair(
    sections: &SectionMap,
    rule: &'static str,
    severity: Severity,
    fields: &'static [&'static str],
    config: &ExtractionConfig,
) -> Finding {
    let (Some(left), Some(right)) = (amount(sections, fields[0]), amount(sections, fields[1]))
    else {
        return skipped(rule, fields);
    };
    if within_tolerance(left, right, config) {
        return consistent(rule, fields);
    }
    Finding {
        rule,
        severity,
        fields,
        message: format!("{} = {left} but {} = {right}", fields[0], fields[1]),
    }
}

/// Part IX column (A) must equal the sum of columns (B), (C) and (D).
fn check_expense_allocation(sections: &SectionMap, config: &ExtractionConfig) -> Finding {
    let rule = "expense_allocation";
    let (Some(total), Some(b), Some(c), Some(d)) = (
        amount(sections, EXPENSE_FIELDS[0]),
        amount(sections, EXPENSE_FIELDS[1]),
        amount(sections, EXPENSE_FIELDS[2]),
        amount(sections, EXPENSE_FIELDS[3]),
    ) else {
        return skipped(rule, EXPENSE_FIELDS);
    };
    let allocated = b + c + d;
    if within_tolerance(total, allocated, config) {
        return consistent(rule, EXPENSE_FIELDS);
    }
    Finding {
        rule,
        severity: Severity::Error,
        fields: EXPENSE_FIELDS,
        message: format!("column (A) total {total} but (B)+(C)+(D) = {allocated}"),
    }
}

/// Assets minus liabilities must equal net assets.
fn check_balance_sheet(sections: &SectionMap, config: &ExtractionConfig) -> Finding {
    let rule = "balance_sheet";
    let (Some(assets), Some(liabilities), Some(net)) = (
        amount(sections, BALANCE_FIELDS[0]),
        amount(sections, BALANCE_FIELDS[1]),
        amount(sections, BALANCE_FIELDS[2]),
    ) else {
        return skipped(rule, BALANCE_FIELDS);
    };
    let derived = assets - liabilities;
    if within_tolerance(derived, net, config) {
        return consistent(rule, BALANCE_FIELDS);
    }
    Finding {
        rule,
        severity: Severity::Error,
        fields: BALANCE_FIELDS,
        message: format!(
            "total assets {assets} minus liabilities {liabilities} = {derived}, \
             but net assets = {net}"
        ),
    }
}

fn skipped(rule: &'static str, fields: &'static [&'static str]) -> Finding {
    Finding {
        rule,
        severity: Severity::Info,
        fields,
        message: "skipped: required field not extracted".to_string(),
    }
}

fn consistent(rule: &'static str, fields: &'static [&'static str]) -> Finding {
    Finding {
        rule,
        severity: Severity::Info,
        fields,
        message: "consistent".to_string(),
    }
}

/// Amounts agree when they differ by at most the larger of a flat $10 and
/// the configured relative tolerance of their average magnitude.
fn within_tolerance(a: Decimal, b: Decimal, config: &ExtractionConfig) -> bool {
    let diff = (a - b).abs();
    let avg = (a.abs() + b.abs()) / Decimal::TWO;
    let slack = ABSOLUTE_SLACK.max(avg * config.tolerance);
    diff <= slack
}

fn amount(sections: &SectionMap, field: &str) -> Option<Decimal> {
    let (section, name) = field.split_once('.')?;
    let value = sections.get(section)?.get(name)?.value.as_deref()?;
    Decimal::from_str(&value.replace(',', "")).ok()
}
