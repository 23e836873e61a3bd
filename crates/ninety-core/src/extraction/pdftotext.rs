use crate::error::ExtractError;
use crate::extraction::{RawExtraction, RawTable};
use std::io::Write;
use std::process::Command;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Runs `pdftotext -layout` so column alignment survives as whitespace,
/// which is what the table reconstruction below keys on.
pub fn extract(pdf_bytes: &[u8]) -> Result<RawExtraction, ExtractError> {
    let mut tmpfile = tempfile::NamedTempFile::new()?;
    tmpfile.write_all(pdf_bytes)?;

    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg(tmpfile.path())
        .arg("-") // output to stdout
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExtractError::PdftotextNotFound
            } else {
                ExtractError::Io(e)
            }
        })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(ExtractError::PdftotextFailed { code, stderr });
    }

    let text = String::from_utf8_lossy(&output.stdout);
    let mut warnings = Vec::new();
    if !output.stderr.is_empty() {
        warnings.push(format!(
            "pdftotext stderr: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    // pdftotext separates pages with form feed \x0c, including a trailing
    // one. Drop only the final empty fragment so interior blank pages keep
    // their slot.
    let mut pages: Vec<String> = text.split('\x0c').map(|p| p.to_string()).collect();
    if pages.last().is_some_and(|p| p.trim().is_empty()) && pages.len() > 1 {
        pages.pop();
    }

    if pages.iter().all(|p| p.trim().is_empty()) {
        warnings.push("pdftotext produced no text on any page".to_string());
    }

    let tables = pages
        .iter()
        .enumerate()
        .flat_map(|(i, page)| tables_on_page(i + 1, page))
        .collect();

    Ok(RawExtraction {
        backend: "pdftotext",
        pages,
        tables,
        warnings,
    })
}

/// Reconstruct tables from a page of layout-preserved text.
///
/// A table row is a line that splits into two or more cells on runs of two
/// or more spaces. Two or more consecutive such lines form a table.
fn tables_on_page(page_number: usize, page: &str) -> Vec<RawTable> {
    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();

    for line in page.lines() {
        match split_row(line) {
            Some(cells) => current.push(cells),
            None => flush_table(page_number, &mut current, &mut tables),
        }
    }
    flush_table(page_number, &mut current, &mut tables);

    tables
}

fn flush_table(page_number: usize, current: &mut Vec<Vec<String>>, tables: &mut Vec<RawTable>) {
    if current.len() >= 2 {
        tables.push(RawTable {
            page: page_number,
            rows: std::mem::take(current),
        });
    } else {
        current.clear();
    }
}

/// Split a layout line into cells on gaps of 2+ spaces. Returns None for
/// lines that do not look tabular (fewer than two cells).
fn split_row(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim_end();
    if trimmed.trim().is_empty() {
        return None;
    }

    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut space_run = 0usize;

    for ch in trimmed.chars() {
        if ch == ' ' {
            space_run += 1;
            if space_run < 2 {
                cell.push(ch);
            }
        } else {
            if space_run >= 2 && !cell.trim().is_empty() {
                cells.push(cell.trim().to_string());
                cell.clear();
            }
            space_run = 0;
            cell.push(ch);
        }
    }
    if !cell.trim().is_empty() {
        cells.push(cell.trim().to_string());
    }

    if cells.len() >= 2 {
        Some(cells)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_row_on_gaps() {
        let cells = split_row("  Total revenue      1,234,567     1,300,000").unwrap();
        assert_eq!(cells, vec!["Total revenue", "1,234,567", "1,300,000"]);
    }

    #[test]
    fn test_split_row_keeps_single_spaces() {
        let cells = split_row("Gross receipts $   500,000").unwrap();
        assert_eq!(cells, vec!["Gross receipts $", "500,000"]);
    }

    #[test]
    fn test_split_row_rejects_prose() {
        assert!(split_row("Under penalties of perjury, I declare").is_none());
        assert!(split_row("   ").is_none());
    }

    #[test]
    fn test_tables_on_page_needs_two_rows() {
        let page = "\
Form 990 header text
  Contributions       100,000
  Program service     200,000
narrative line again
  Lonely row          300,000
";
        let tables = tables_on_page(3, page);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].page, 3);
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[0].rows[1][0], "Program service");
    }
}
