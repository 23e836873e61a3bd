use ninety_core::error::ExtractError;
use ninety_core::model::ExtractionResponse;

pub fn print(response: &ExtractionResponse) -> Result<(), ExtractError> {
    let json = serde_json::to_string_pretty(response)?;
    println!("{json}");
    Ok(())
}
