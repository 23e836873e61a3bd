//! Text extraction backends.
//!
//! Each backend turns raw PDF bytes into a [`RawExtraction`]: per-page text,
//! any tables it could recover, and warnings about degradation. Backends
//! never touch cleaning or field logic; they only report what the bytes say.

mod combiner;
mod lopdf_backend;
mod pdftotext;

pub use combiner::run_backends;

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};

/// A table recovered from one page, as raw uncleaned cell strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    /// 1-based page the table was found on.
    pub page: usize,
    pub rows: Vec<Vec<String>>,
}

/// One backend's complete view of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawExtraction {
    /// Name of the backend that produced this extraction.
    pub backend: &'static str,
    /// Page texts in document order. A page the backend could not read is
    /// present as an empty string, never dropped.
    pub pages: Vec<String>,
    pub tables: Vec<RawTable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RawExtraction {
    /// Heuristic quality of this extraction, in [0, 1].
    ///
    /// Weighted blend of text coverage (fraction of non-empty pages, 0.5),
    /// table yield (saturating at 10 tables, 0.3), and a clean-run bonus
    /// when the backend reported no warnings (0.2).
    pub fn quality_score(&self) -> f64 {
        if self.pages.is_empty() {
            return 0.0;
        }
        let nonempty = self
            .pages
            .iter()
            .filter(|p| !p.trim().is_empty())
            .count() as f64;
        let coverage = nonempty / self.pages.len() as f64;
        let table_yield = (self.tables.len() as f64 / 10.0).min(1.0);
        let clean = if self.warnings.is_empty() { 1.0 } else { 0.0 };
        coverage * 0.5 + table_yield * 0.3 + clean * 0.2
    }
}

/// The closed set of extraction backends, in attempt order.
///
/// `PdftotextLayout` preserves column layout and so feeds the table parser;
/// `Lopdf` is the in-process fallback when poppler is missing or crashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    PdftotextLayout,
    Lopdf,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::PdftotextLayout, BackendKind::Lopdf];

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::PdftotextLayout => "pdftotext",
            BackendKind::Lopdf => "lopdf",
        }
    }

    pub fn extract(&self, bytes: &[u8]) -> Result<RawExtraction, ExtractError> {
        match self {
            BackendKind::PdftotextLayout => pdftotext::extract(bytes),
            BackendKind::Lopdf => lopdf_backend::extract(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pages: Vec<&str>, tables: usize, warnings: usize) -> RawExtraction {
        RawExtraction {
            backend: "test",
            pages: pages.into_iter().map(String::from).collect(),
            tables: (0..tables)
                .map(|i| RawTable {
                    page: i + 1,
                    rows: vec![vec!["a".into(), "b".into()]],
                })
                .collect(),
            warnings: (0..warnings).map(|i| format!("warning {i}")).collect(),
        }
    }

    #[test]
    fn test_quality_empty_document_is_zero() {
        assert_eq!(raw(vec![], 0, 0).quality_score(), 0.0);
    }

    #[test]
    fn test_quality_full_coverage_clean() {
        // 1.0 * 0.5 + 1.0 * 0.3 + 0.2
        let q = raw(vec!["text", "more"], 10, 0).quality_score();
        assert!((q - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_quality_warnings_remove_clean_bonus() {
        let clean = raw(vec!["text"], 0, 0).quality_score();
        let noisy = raw(vec!["text"], 0, 1).quality_score();
        assert!((clean - noisy - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_quality_table_yield_saturates() {
        let ten = raw(vec!["t"], 10, 0).quality_score();
        let twenty = raw(vec!["t"], 20, 0).quality_score();
        assert_eq!(ten, twenty);
    }

    #[test]
    fn test_backend_order() {
        assert_eq!(BackendKind::ALL[0].name(), "pdftotext");
        assert_eq!(BackendKind::ALL[1].name(), "lopdf");
    }
}
