use std::collections::BTreeMap;

use clap::Args;
use serde::Deserialize;
use serde_json::{json, Value};

use distress_core::models::registry::{ModelDefinition, ModelRegistry};

use crate::input;

/// Arguments for listing the model registry
#[derive(Args)]
pub struct ModelsArgs {
    /// Custom model definitions file (JSON or YAML)
    #[arg(long)]
    pub models: Option<String>,
}

/// On-disk shape of a custom registry.
#[derive(Debug, Deserialize)]
struct RegistryFile {
    models: Vec<ModelDefinition>,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

pub fn load_registry(path: &str) -> Result<ModelRegistry, Box<dyn std::error::Error>> {
    let file: RegistryFile = input::file::read_structured(path)?;
    Ok(ModelRegistry::from_definitions(file.models, file.aliases)?)
}

pub fn run_models(args: ModelsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let custom = args.models.as_deref().map(load_registry).transpose()?;
    let registry: &ModelRegistry = custom.as_ref().unwrap_or_else(|| ModelRegistry::standard());

    let rows: Vec<Value> = registry
        .models()
        .map(|m| {
            let aliases: Vec<&str> = registry
                .aliases()
                .iter()
                .filter(|(_, target)| **target == m.model_key)
                .map(|(alias, _)| alias.as_str())
                .collect();
            json!({
                "model_key": m.model_key,
                "aliases": aliases.join(", "),
                "equity_basis": m.equity_basis,
                "ratios": m.coefficients.keys().map(|r| r.name()).collect::<Vec<_>>().join(", "),
                "intercept": m.intercept,
                "distress_upper": m.thresholds.distress_upper,
                "safe_lower": m.thresholds.safe_lower,
                "description": m.description,
            })
        })
        .collect();
    Ok(Value::Array(rows))
}
