//! Overall confidence scoring.

use crate::config::ExtractionConfig;
use crate::fields::FIELD_SPECS;
use crate::model::SectionMap;
use tracing::debug;

/// Weight multiplier for critical fields.
const CRITICAL_WEIGHT: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct Score {
    /// Weighted mean confidence over populated fields, 0.0 when nothing
    /// was extracted at all.
    pub overall: f64,
    pub pass_threshold: bool,
    /// One warning per missing critical field.
    pub warnings: Vec<String>,
}

/// Aggregate per-field confidences into a document score.
///
/// Only populated fields enter the mean; absence is reported through the
/// missing-critical warnings rather than dragging the average toward zero,
/// so a document with few but solid fields can still clear the threshold.
pub fn score(sections: &SectionMap, config: &ExtractionConfig) -> Score {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut warnings = Vec::new();

    for spec in FIELD_SPECS {
        let field = sections.get(spec.section).and_then(|s| s.get(spec.name));
        let populated = field.is_some_and(|f| f.is_present());

        if populated {
            let weight = if spec.critical { CRITICAL_WEIGHT } else { 1.0 };
            // Populated implies Some; absent fields were skipped above.
            if let Some(f) = field {
                weighted_sum += weight * f.confidence;
                weight_total += weight;
            }
        } else if spec.critical {
            warnings.push(format!(
                "critical field missing: {}.{}",
                spec.section, spec.name
            ));
        }
    }

    let overall = if weight_total > 0.0 {
        weighted_sum / weight_total
    } else {
        0.0
    };
    let pass_threshold = overall >= config.confidence_threshold;
    debug!(overall, pass_threshold, "document scored");

    Score {
        overall,
        pass_threshold,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldSource, FieldValue};
    use std::collections::BTreeMap;

    fn sections_with(fields: &[(&str, &str, Option<(&str, f64)>)]) -> SectionMap {
        let mut sections: SectionMap = BTreeMap::new();
        for (section, name, value) in fields {
            let field = match value {
                Some((v, c)) => FieldValue::present(v.to_string(), *c, FieldSource::Table),
                None => FieldValue::absent("field not found"),
            };
            sections
                .entry(section.to_string())
                .or_default()
                .insert(name.to_string(), field);
        }
        sections
    }

    #[test]
    fn test_empty_document_scores_zero() {
        let s = score(&BTreeMap::new(), &ExtractionConfig::default());
        assert_eq!(s.overall, 0.0);
        assert!(!s.pass_threshold);
        // Every critical field is reported missing.
        assert_eq!(s.warnings.len(), 7);
    }

    #[test]
    fn test_critical_fields_weigh_triple() {
        // One critical at 0.9, one ordinary at 0.5:
        // (3 * 0.9 + 1 * 0.5) / 4 = 0.8
        let sections = sections_with(&[
            ("page1", "gross_receipts", Some(("1,000,000", 0.9))),
            ("page1", "total_fundraising_expenses", Some(("5,000", 0.5))),
        ]);
        let s = score(&sections, &ExtractionConfig::default());
        assert!((s.overall - 0.8).abs() < 1e-9);
        assert!(s.pass_threshold);
    }

    #[test]
    fn test_absent_fields_do_not_dilute() {
        let sections = sections_with(&[
            ("page1", "employer_identification_number", Some(("94-1156347", 0.92))),
            ("page1", "total_revenue", None),
        ]);
        let s = score(&sections, &ExtractionConfig::default());
        assert!((s.overall - 0.92).abs() < 1e-9);
    }

    #[test]
    fn test_missing_criticals_warn() {
        let sections = sections_with(&[(
            "page1",
            "employer_identification_number",
            Some(("94-1156347", 0.92)),
        )]);
        let s = score(&sections, &ExtractionConfig::default());
        assert_eq!(s.warnings.len(), 6);
        assert!(s
            .warnings
            .iter()
            .any(|w| w.contains("balance_sheet.total_assets")));
    }

    #[test]
    fn test_threshold_gate() {
        let sections = sections_with(&[("page1", "gross_receipts", Some(("1,000", 0.69)))]);
        let mut config = ExtractionConfig::default();
        let s = score(&sections, &config);
        assert!(!s.pass_threshold);

        config.confidence_threshold = 0.5;
        let s = score(&sections, &config);
        assert!(s.pass_threshold);
    }
}
