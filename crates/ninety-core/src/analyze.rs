//! Document analysis: where the form starts, what kind of document this is,
//! and how trustworthy the character stream looks.

use crate::model::DocumentType;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static FORM_990: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Form\s+990\b").unwrap());
static OMB_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"OMB No\.?\s*1545-0047").unwrap());
static PART_I_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Part\s+I\b.{0,40}Summary").unwrap()
});
static EIN_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Employer identification number").unwrap()
});
static EXTENSION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Form\s+8868|Application for\s+.{0,20}Extension")
        .unwrap()
});
static EFILE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"efile GRAPHIC print|Software ID").unwrap()
});

/// A token counts as well-formed when it is ordinary words/numbers with
/// common punctuation. Garble like `<ti(/1` or `C:,J` falls outside.
static WELL_FORMED_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9,.$()%/'\-]*$").unwrap()
});

/// What analysis learned about the document as a whole.
#[derive(Debug, Clone)]
pub struct DocumentProfile {
    /// 1-based page where the Form 990 itself begins. Cover letters and
    /// extension requests before it are skipped.
    pub form_start_page: usize,
    pub document_type: DocumentType,
    pub ocr_quality: f64,
    pub warnings: Vec<String>,
}

pub fn analyze(pages: &[String]) -> DocumentProfile {
    let mut warnings = Vec::new();

    let form_start_page = match find_form_start(pages) {
        Some(p) => p,
        None => {
            warnings.push(
                "could not locate Form 990 start page; assuming page 1".to_string(),
            );
            1
        }
    };

    let ocr_quality = ocr_quality(pages);
    let document_type = classify(pages, ocr_quality);
    debug!(
        form_start_page,
        %document_type,
        ocr_quality,
        "document analyzed"
    );

    DocumentProfile {
        form_start_page,
        document_type,
        ocr_quality,
        warnings,
    }
}

/// Locate the first page that reads like the front page of a Form 990.
///
/// A page qualifies when the "Form 990" heading co-occurs with the OMB
/// number, the Part I Summary heading, or the EIN label, or when at least
/// two of the four indicators appear. Pages carrying extension-request
/// markers (Form 8868) never qualify.
fn find_form_start(pages: &[String]) -> Option<usize> {
    for (i, page) in pages.iter().enumerate() {
        if EXTENSION_MARKER.is_match(page) {
            continue;
        }

        let form = FORM_990.is_match(page);
        let omb = OMB_NUMBER.is_match(page);
        let part_i = PART_I_SUMMARY.is_match(page);
        let ein = EIN_LABEL.is_match(page);

        let indicator_count = [form, omb, part_i, ein].iter().filter(|b| **b).count();
        if (form && (omb || part_i || ein)) || indicator_count >= 2 {
            return Some(i + 1);
        }
    }
    None
}

fn classify(pages: &[String], ocr_quality: f64) -> DocumentType {
    if pages.iter().any(|p| EFILE_MARKER.is_match(p)) {
        return DocumentType::Generated;
    }

    let total_chars: usize = pages.iter().map(|p| p.chars().count()).sum();
    let avg_chars = if pages.is_empty() {
        0.0
    } else {
        total_chars as f64 / pages.len() as f64
    };

    if avg_chars >= 800.0 && ocr_quality >= 0.8 {
        DocumentType::Digital
    } else {
        DocumentType::Scanned
    }
}

/// Fraction of whitespace-separated tokens that look like real words or
/// numbers. An empty document scores 0.0.
pub fn ocr_quality(pages: &[String]) -> f64 {
    let mut total = 0usize;
    let mut well_formed = 0usize;
    for page in pages {
        for token in page.split_whitespace() {
            total += 1;
            if WELL_FORMED_TOKEN.is_match(token) {
                well_formed += 1;
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        well_formed as f64 / total as f64
    }
}
