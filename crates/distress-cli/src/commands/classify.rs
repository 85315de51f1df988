use chrono::NaiveDate;
use clap::Args;
use serde_json::{json, Value};

use distress_core::classification::classifier::{classify_company, CompanyMetadata};
use distress_core::models::selector::select_model;

use super::load_config;
use crate::input;

/// Arguments for company classification
#[derive(Args)]
pub struct ClassifyArgs {
    /// Path to a company metadata file
    #[arg(long)]
    pub input: Option<String>,

    /// Reference date for company age (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Analysis config file (JSON or YAML)
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_classify(args: ClassifyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let metadata: CompanyMetadata = input::load(
        args.input.as_deref(),
        "--input <file> or stdin required for classification",
    )?;
    let config = load_config(args.config.as_deref())?;
    let as_of = args
        .as_of
        .or(config.as_of)
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let profile = classify_company(&metadata, Some(as_of), &config);
    let selection = select_model(&profile);

    let mut warnings = profile.warnings.clone();
    warnings.extend(selection.warnings.iter().cloned());

    Ok(json!({
        "result": {
            "industry_code": profile.industry_code,
            "industry_category": profile.industry_category,
            "is_public": profile.is_public,
            "is_emerging_market": profile.is_emerging_market,
            "maturity_stage": profile.maturity_stage,
            "age_years": profile.age_years,
            "model_key": selection.model_key,
            "rule": selection.rule,
            "reason": selection.reason,
        },
        "warnings": warnings,
    }))
}
