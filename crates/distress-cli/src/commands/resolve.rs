use clap::Args;
use serde_json::{json, Value};

use distress_core::normalization::resolver::{resolve_source, RawSource, ResolutionContext};

use crate::input;

/// Arguments for single-source field resolution
#[derive(Args)]
pub struct ResolveArgs {
    /// Path to a raw source file: `name`, `unit` and `periods`
    #[arg(long)]
    pub input: Option<String>,

    /// Enable financial-institution proxies (interest income as sales)
    #[arg(long)]
    pub financial: bool,
}

pub fn run_resolve(args: ResolveArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let source: RawSource = input::load(
        args.input.as_deref(),
        "--input <file> or stdin required for field resolution",
    )?;
    let ctx = ResolutionContext {
        is_financial_institution: args.financial,
    };
    let resolved = resolve_source(&source, &ctx)?;

    // One row per (period, canonical field)
    let rows: Vec<Value> = resolved
        .periods
        .iter()
        .flat_map(|(period_end, resolution)| {
            resolution.mappings.iter().map(move |m| {
                json!({
                    "period_end": period_end,
                    "field": m.field,
                    "value": m.value,
                    "provenance": m.provenance,
                    "source_label": m.source_label,
                    "formula": m.formula,
                    "note": m.note,
                })
            })
        })
        .collect();
    Ok(Value::Array(rows))
}
