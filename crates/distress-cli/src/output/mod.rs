pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{json, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Flatten an analysis envelope into one row per period.
/// Returns None for anything that is not an analysis result.
pub fn period_rows(value: &Value) -> Option<Vec<Value>> {
    let periods = value.get("result")?.get("periods")?.as_array()?;
    Some(
        periods
            .iter()
            .map(|p| {
                let outcome = &p["outcome"];
                let detail = match outcome["status"].as_str() {
                    Some("failed") => outcome["reason"].clone(),
                    _ => Value::Null,
                };
                json!({
                    "period_end": p["period_end"],
                    "status": outcome["status"],
                    "model_key": outcome["model_key"],
                    "score": outcome["score"],
                    "zone": outcome["zone"],
                    "warnings": outcome["warnings"].as_array().map(|w| w.len()).unwrap_or(0),
                    "failure": detail,
                })
            })
            .collect(),
    )
}
