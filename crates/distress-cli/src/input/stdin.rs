use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Deserialize piped stdin as JSON, or YAML when it is not JSON.
/// Returns None when stdin is interactive or empty.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(Some(serde_json::from_str(trimmed)?));
    }
    let value: T = serde_yaml::from_str(trimmed)
        .map_err(|e| format!("stdin is neither JSON nor YAML: {e}"))?;
    Ok(Some(value))
}
