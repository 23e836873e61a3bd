use ninety_core::model::ExtractionResult;

pub fn print(result: &ExtractionResult, show_all: bool) {
    println!("=== {} ===\n", result.filename);
    println!("  method:          {}", result.extraction_method);
    println!("  document type:   {}", result.document_type);
    println!("  form start page: {}", result.form_start_page);
    println!("  ocr quality:     {:.3}", result.ocr_quality);
    println!(
        "  confidence:      {:.3} ({})",
        result.overall_confidence,
        if result.pass_threshold {
            "pass"
        } else {
            "needs review"
        }
    );
    println!();

    for (section, fields) in &result.sections {
        let to_show: Vec<_> = fields
            .iter()
            .filter(|(_, f)| show_all || f.is_present())
            .collect();
        if to_show.is_empty() {
            continue;
        }

        println!("  [{section}]");
        let max_name = to_show.iter().map(|(n, _)| n.len()).max().unwrap_or(10);
        for (name, field) in &to_show {
            let value = field.value.as_deref().unwrap_or("-");
            println!(
                "    {:<width$}  {:>15}  {:.2} ({})",
                name,
                value,
                field.confidence,
                field.source,
                width = max_name
            );
            for w in &field.warnings {
                println!("      ! {w}");
            }
        }
        println!();
    }

    if !result.warnings.is_empty() {
        println!("  Warnings:");
        for w in &result.warnings {
            println!("    - {w}");
        }
        println!();
    }

    println!("  {}", result.validation_report.replace('\n', "\n  "));
}
