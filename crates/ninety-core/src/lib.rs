pub mod analyze;
pub mod config;
pub mod error;
pub mod extraction;
pub mod fields;
pub mod model;
pub mod score;
pub mod tables;
pub mod validate;

use config::ExtractionConfig;
use error::ExtractError;
use extraction::RawExtraction;
use model::{ExtractionResponse, ExtractionResult};
use std::path::Path;
use tracing::info;

/// Main API entry point: extract structured Form 990 data from PDF bytes.
///
/// Runs every backend, analyzes the winning extraction, cleans its tables,
/// pulls the declared fields, scores and cross-validates them. Fails only
/// when no backend yields text; everything past that point degrades into
/// warnings and lowered confidence instead of errors.
pub fn extract(
    pdf_bytes: &[u8],
    filename: &str,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractError> {
    let raw = extraction::run_backends(pdf_bytes, config)?;
    extract_from_raw(raw, filename, config)
}

/// Convenience wrapper reading the PDF from disk.
pub fn extract_path(
    path: &Path,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractError> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    extract(&bytes, &filename, config)
}

/// Run the pipeline stages downstream of text extraction.
///
/// Split out from [`extract`] so callers with text from another source
/// (or tests with synthetic extractions) can feed the same pipeline.
pub fn extract_from_raw(
    raw: RawExtraction,
    filename: &str,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractError> {
    if raw.pages.is_empty() {
        return Err(ExtractError::EmptyDocument);
    }

    let profile = analyze::analyze(&raw.pages);

    let cleaner = tables::CellCleaner::new(config)?;
    let clean_tables = cleaner.clean_tables(&raw.tables);

    let sections = fields::extract_sections(&raw.pages, &clean_tables, &profile);
    let score = score::score(&sections, config);
    let report = validate::validate(&sections, config);

    let mut warnings = raw.warnings;
    warnings.extend(profile.warnings);
    warnings.extend(score.warnings);

    info!(
        filename,
        backend = raw.backend,
        document_type = %profile.document_type,
        overall_confidence = score.overall,
        errors = report.error_count(),
        "extraction complete"
    );

    Ok(ExtractionResult {
        filename: filename.to_string(),
        extraction_method: raw.backend.to_string(),
        form_start_page: profile.form_start_page,
        document_type: profile.document_type,
        ocr_quality: profile.ocr_quality,
        sections,
        overall_confidence: score.overall,
        pass_threshold: score.pass_threshold,
        validation_report: report.render(),
        warnings,
    })
}

/// Extract and wrap the outcome in the caller-facing response envelope.
pub fn extract_response(
    pdf_bytes: &[u8],
    filename: &str,
    config: &ExtractionConfig,
) -> ExtractionResponse {
    ExtractionResponse::from_outcome(extract(pdf_bytes, filename, config))
}
