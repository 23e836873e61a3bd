use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Pipeline configuration, constructed once and passed by reference into
/// every stage. No stage reads ambient settings.
///
/// Deserializes leniently: unknown keys are ignored and missing keys fall
/// back to the documented defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum overall confidence for `pass_threshold` (fail-fast gate).
    pub confidence_threshold: f64,

    /// Relative tolerance for cross-field consistency checks.
    pub tolerance: Decimal,

    /// Ordered artifact-cleaning rules applied to every table cell:
    /// (regex pattern, replacement).
    pub artifact_patterns: Vec<(String, String)>,

    /// Per-backend wall-clock timeout in seconds. A timed-out backend
    /// counts as a failed backend, not a fatal error.
    pub backend_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            confidence_threshold: 0.70,
            tolerance: Decimal::new(2, 2), // 0.02 = ±2%
            artifact_patterns: default_artifact_patterns(),
            backend_timeout_secs: 20,
        }
    }
}

impl ExtractionConfig {
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }
}

/// Known OCR corruption signatures, in application order.
///
/// The literal garble sequences come from observed scanned filings; the
/// generic rules remove dot leaders, tilde runs, and special-char clusters.
pub fn default_artifact_patterns() -> Vec<(String, String)> {
    [
        (r"<ti \(/1", ""),
        (r"C c,J :C", ""),
        (r"\.{5,}", ""),
        (r"~{5,}", ""),
        (r"[<>(){}/\\]{3,}", ""),
    ]
    .iter()
    .map(|(p, r)| (p.to_string(), r.to_string()))
    .collect()
}
