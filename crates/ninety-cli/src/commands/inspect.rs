use ninety_core::analyze;
use ninety_core::error::ExtractError;
use ninety_core::extraction::BackendKind;
use std::path::PathBuf;

/// Run each backend in sequence and report what it produced. Useful when a
/// filing extracts poorly and the question is which backend to blame.
pub fn run(input_file: PathBuf, backend: Option<&str>) -> Result<(), ExtractError> {
    let bytes = std::fs::read(&input_file)?;

    let selected: Vec<BackendKind> = BackendKind::ALL
        .into_iter()
        .filter(|k| backend.map_or(true, |name| k.name() == name))
        .collect();
    if selected.is_empty() {
        return Err(ExtractError::Backend {
            backend: "inspect",
            reason: format!("unknown backend '{}'", backend.unwrap_or_default()),
        });
    }

    let mut any_succeeded = false;
    for kind in selected {
        println!("=== {} ===", kind.name());
        match kind.extract(&bytes) {
            Ok(raw) => {
                any_succeeded = true;
                println!("  pages:   {}", raw.pages.len());
                println!(
                    "  text:    {} non-empty",
                    raw.pages.iter().filter(|p| !p.trim().is_empty()).count()
                );
                println!("  tables:  {}", raw.tables.len());
                println!("  quality: {:.3}", raw.quality_score());
                for w in &raw.warnings {
                    println!("  warning: {w}");
                }

                let profile = analyze::analyze(&raw.pages);
                println!("  document type:   {}", profile.document_type);
                println!("  form start page: {}", profile.form_start_page);
                println!("  ocr quality:     {:.3}", profile.ocr_quality);
            }
            Err(e) => println!("  failed: {e}"),
        }
        println!();
    }

    if !any_succeeded {
        return Err(ExtractError::AllBackendsFailed(
            "no backend produced output".into(),
        ));
    }
    Ok(())
}
