use serde_json::Value;

/// Paths to the headline answer of each command, in priority order.
const PRIORITY_PATHS: &[&[&str]] = &[
    &["score"],
    &["model_key"],
    &["maturity_stage"],
];

/// Print just the key answer value from the output.
///
/// Analyses print `<score> <zone>` for the latest scored period; other
/// results print the first priority field present.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(trend) = result_obj.get("trend") {
        match (trend.get("latest_score"), trend.get("latest_zone")) {
            (Some(score), Some(zone)) if !score.is_null() => {
                println!("{} {}", format_minimal(score), format_minimal(zone));
            }
            _ => println!("no scored periods"),
        }
        return;
    }

    for path in PRIORITY_PATHS {
        let found = path.iter().try_fold(result_obj, |v, key| v.get(*key));
        if let Some(val) = found.filter(|v| !v.is_null()) {
            println!("{}", format_minimal(val));
            return;
        }
    }

    if let Value::Array(rows) = result_obj {
        println!("{} rows", rows.len());
        return;
    }
    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
