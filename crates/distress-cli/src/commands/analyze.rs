use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use distress_core::models::registry::ModelRegistry;
use distress_core::pipeline::{self, CompanyAnalysisInput};

use super::{load_config, models::load_registry, EquityBasisArg};
use crate::input;

/// Arguments for a full company analysis
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AnalyzeArgs {
    /// Path to a JSON/YAML file with `company` metadata and raw `sources`
    #[arg(long)]
    pub input: Option<String>,

    /// Analysis config file (JSON or YAML)
    #[arg(long)]
    pub config: Option<String>,

    /// Custom model definitions file, replacing the built-in registry
    #[arg(long)]
    pub models: Option<String>,

    /// Override the leverage-ratio equity basis for every model
    #[arg(long, value_enum)]
    pub equity_basis: Option<EquityBasisArg>,

    /// Relative source disagreement that triggers a warning (e.g. 0.003)
    #[arg(long)]
    pub discrepancy_tolerance: Option<Decimal>,

    /// Source names, highest authority first (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub source_priority: Option<Vec<String>>,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis_input: CompanyAnalysisInput = input::load(
        args.input.as_deref(),
        "--input <file> or stdin required for analysis",
    )?;

    let mut config = load_config(args.config.as_deref())?;
    if let Some(basis) = args.equity_basis {
        config.equity_basis = Some(basis.into());
    }
    if let Some(tolerance) = args.discrepancy_tolerance {
        config.discrepancy_tolerance = tolerance;
    }
    if let Some(priority) = args.source_priority {
        config.source_priority = priority;
    }

    let custom = args.models.as_deref().map(load_registry).transpose()?;
    let registry: &ModelRegistry = custom.as_ref().unwrap_or_else(|| ModelRegistry::standard());

    let result = pipeline::analyze_company(&analysis_input, registry, &config)?;
    Ok(serde_json::to_value(result)?)
}
