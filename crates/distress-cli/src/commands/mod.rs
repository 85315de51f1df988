pub mod analyze;
pub mod classify;
pub mod models;
pub mod resolve;

use clap::ValueEnum;
use distress_core::config::AnalysisConfig;
use distress_core::models::registry::EquityBasis;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EquityBasisArg {
    Market,
    Book,
}

impl From<EquityBasisArg> for EquityBasis {
    fn from(arg: EquityBasisArg) -> Self {
        match arg {
            EquityBasisArg::Market => EquityBasis::Market,
            EquityBasisArg::Book => EquityBasis::Book,
        }
    }
}

/// Load `--config` (JSON or YAML) or fall back to defaults.
pub fn load_config(path: Option<&str>) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let config: AnalysisConfig = match path {
        Some(p) => input::file::read_structured(p)?,
        None => AnalysisConfig::default(),
    };
    config.validate()?;
    Ok(config)
}
