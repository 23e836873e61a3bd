use ninety_core::config::ExtractionConfig;
use ninety_core::error::ExtractError;
use ninety_core::model::ExtractionResponse;
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::output;

pub fn run(
    input_file: PathBuf,
    output_format: &str,
    out: Option<PathBuf>,
    config_file: Option<PathBuf>,
    threshold: Option<f64>,
    tolerance: Option<Decimal>,
    show_all: bool,
) -> Result<(), ExtractError> {
    let mut config = match config_file {
        Some(path) => {
            let bytes = std::fs::read(&path)?;
            serde_json::from_slice::<ExtractionConfig>(&bytes)?
        }
        None => ExtractionConfig::default(),
    };
    if let Some(t) = threshold {
        config.confidence_threshold = t;
    }
    if let Some(t) = tolerance {
        config.tolerance = t;
    }

    let result = ninety_core::extract_path(&input_file, &config)?;
    let response = ExtractionResponse::from_outcome(Ok(result));

    if let Some(out_path) = out {
        let json = serde_json::to_string_pretty(&response)?;
        std::fs::write(&out_path, json)?;
    }

    match output_format {
        "json" => output::json::print(&response)?,
        _ => {
            // from_outcome(Ok) always carries data.
            if let Some(data) = &response.data {
                output::table::print(data, show_all);
            }
        }
    }

    Ok(())
}
