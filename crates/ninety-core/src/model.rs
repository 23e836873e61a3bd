use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Layout classification of the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Born-digital text with regular spacing.
    Digital,
    /// Scanned pages recovered through OCR.
    Scanned,
    /// Machine-typeset e-file rendering (IRS "efile GRAPHIC print" output).
    Generated,
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentType::Digital => write!(f, "digital"),
            DocumentType::Scanned => write!(f, "scanned"),
            DocumentType::Generated => write!(f, "generated"),
        }
    }
}

/// Where a field value was recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// Structured table cell (highest trust).
    Table,
    /// Regex match in page text near a labeled anchor.
    TextPattern,
    /// Table and text sources independently agreed.
    CrossReferenced,
    /// Nothing found; the field is absent.
    Default,
}

impl fmt::Display for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSource::Table => write!(f, "table"),
            FieldSource::TextPattern => write!(f, "text_pattern"),
            FieldSource::CrossReferenced => write!(f, "cross_referenced"),
            FieldSource::Default => write!(f, "default"),
        }
    }
}

/// A single extracted field with its confidence and provenance.
///
/// Invariant: an absent value always carries confidence 0.0 and source
/// `Default`. A field is either fully populated or explicitly absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldValue {
    /// Raw string form of the datum: identifiers stay formatted
    /// ("12-3456789"), money stays a formatted numeric string ("1,234,567").
    pub value: Option<String>,
    /// Confidence in [0, 1]. Zero when the value is unset.
    pub confidence: f64,
    pub source: FieldSource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl FieldValue {
    pub fn present(value: String, confidence: f64, source: FieldSource) -> Self {
        FieldValue {
            value: Some(value),
            confidence: confidence.clamp(0.0, 1.0),
            source,
            warnings: Vec::new(),
        }
    }

    pub fn absent(warning: impl Into<String>) -> Self {
        FieldValue {
            value: None,
            confidence: 0.0,
            source: FieldSource::Default,
            warnings: vec![warning.into()],
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

/// Section name -> field name -> FieldValue. BTreeMaps keep serialization
/// and report ordering deterministic.
pub type SectionMap = BTreeMap<String, BTreeMap<String, FieldValue>>;

/// Complete result of one extraction request. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub filename: String,
    /// Name of the backend that won selection.
    pub extraction_method: String,
    /// 1-based page where the form actually begins.
    pub form_start_page: usize,
    pub document_type: DocumentType,
    /// Estimated OCR quality of the chosen extraction, 0..1.
    pub ocr_quality: f64,
    pub sections: SectionMap,
    pub overall_confidence: f64,
    /// True when overall confidence clears the configured threshold.
    pub pass_threshold: bool,
    pub validation_report: String,
    /// Document-level warnings (page-location fallback, missing critical
    /// fields, backend degradation).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    pub fn field(&self, section: &str, name: &str) -> Option<&FieldValue> {
        self.sections.get(section)?.get(name)
    }
}

/// Caller-facing envelope: either a complete result or an explicit failure
/// with a reason string, never a partial object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ExtractionResult>,
}

impl ExtractionResponse {
    pub fn from_outcome(outcome: Result<ExtractionResult, crate::error::ExtractError>) -> Self {
        match outcome {
            Ok(result) => {
                let message = if result.pass_threshold {
                    format!(
                        "extraction completed with confidence {:.2}",
                        result.overall_confidence
                    )
                } else {
                    format!(
                        "extraction confidence {:.2} below threshold; manual review required",
                        result.overall_confidence
                    )
                };
                ExtractionResponse {
                    success: true,
                    message,
                    data: Some(result),
                }
            }
            Err(e) => ExtractionResponse {
                success: false,
                message: e.to_string(),
                data: None,
            },
        }
    }
}
