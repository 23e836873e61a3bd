use crate::error::ExtractError;
use crate::extraction::RawExtraction;
use lopdf::Document;

/// In-process extraction backend built on `lopdf`.
///
/// No external binary, so it works where poppler is not installed, but it
/// loses layout: text comes back as a word stream, so this backend never
/// reports tables. It exists to keep text flowing when pdftotext fails.
pub fn extract(pdf_bytes: &[u8]) -> Result<RawExtraction, ExtractError> {
    let doc = Document::load_mem(pdf_bytes).map_err(|e| ExtractError::Backend {
        backend: "lopdf",
        reason: e.to_string(),
    })?;

    if doc.is_encrypted() {
        return Err(ExtractError::Backend {
            backend: "lopdf",
            reason: "document is encrypted".to_string(),
        });
    }

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Err(ExtractError::EmptyDocument);
    }

    let mut pages = Vec::with_capacity(page_numbers.len());
    let mut warnings = Vec::new();
    for n in page_numbers {
        match doc.extract_text(&[n]) {
            Ok(text) => pages.push(text),
            Err(e) => {
                // Unreadable page keeps its slot as empty text.
                warnings.push(format!("page {n}: text extraction failed: {e}"));
                pages.push(String::new());
            }
        }
    }

    Ok(RawExtraction {
        backend: "lopdf",
        pages,
        tables: Vec::new(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_garbage_bytes() {
        let err = extract(b"not a pdf at all").unwrap_err();
        match err {
            ExtractError::Backend { backend, .. } => assert_eq!(backend, "lopdf"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
