use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use distress_core::classification::classifier::{classify_company, CompanyMetadata};
use distress_core::config::AnalysisConfig;
use distress_core::models::registry::{ModelDefinition, ModelRegistry};
use distress_core::models::selector::select_model as select_model_key;
use distress_core::normalization::resolver::{resolve_source, RawSource, ResolutionContext};
use distress_core::pipeline::CompanyAnalysisInput;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_config(config_json: Option<String>) -> NapiResult<AnalysisConfig> {
    let config: AnalysisConfig = match config_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error)?,
        None => AnalysisConfig::default(),
    };
    config.validate().map_err(to_napi_error)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_company(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: CompanyAnalysisInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output =
        distress_core::pipeline::analyze_company(&input, ModelRegistry::standard(), &config)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ResolveRequest {
    source: RawSource,
    #[serde(default)]
    is_financial_institution: bool,
}

#[napi]
pub fn resolve_fields(input_json: String) -> NapiResult<String> {
    let request: ResolveRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let ctx = ResolutionContext {
        is_financial_institution: request.is_financial_institution,
    };
    let resolved = resolve_source(&request.source, &ctx).map_err(to_napi_error)?;
    serde_json::to_string(&resolved).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SelectRequest {
    company: CompanyMetadata,
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

#[napi]
pub fn select_model(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let request: SelectRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let profile = classify_company(&request.company, request.as_of.or(config.as_of), &config);
    let selection = select_model_key(&profile);
    let model = ModelRegistry::standard()
        .get(&selection.model_key)
        .map_err(to_napi_error)?;
    let output = serde_json::json!({
        "profile": profile,
        "selection": selection,
        "model": model,
    });
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn list_models() -> NapiResult<String> {
    let registry = ModelRegistry::standard();
    let models: Vec<&ModelDefinition> = registry.models().collect();
    let output = serde_json::json!({
        "models": models,
        "aliases": registry.aliases(),
    });
    serde_json::to_string(&output).map_err(to_napi_error)
}
