//! Run-level configuration shared by the reconciler, classifier, scoring
//! engine and validator. Every field has a documented default so callers
//! can supply any subset.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::registry::EquityBasis;
use crate::types::Rate;
use crate::{DistressError, DistressResult};

/// Relative disagreement between two sources above which a discrepancy
/// warning is emitted (0.3% of the larger magnitude).
pub const DEFAULT_DISCREPANCY_TOLERANCE: Rate = dec!(0.003);

/// Relative deviation of `total_assets` from `total_liabilities + equity`
/// tolerated before the validator warns.
pub const DEFAULT_IDENTITY_TOLERANCE: Rate = dec!(0.05);

/// Name of the regulatory-filing source (highest authority by default).
pub const SOURCE_SEC_EDGAR: &str = "sec_edgar";

/// Name of the market-data source.
pub const SOURCE_MARKET_DATA: &str = "market_data";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Source names, highest authority first.
    pub source_priority: Vec<String>,
    pub discrepancy_tolerance: Rate,
    pub identity_tolerance: Rate,
    /// Overrides the leverage-ratio equity of every model when set.
    pub equity_basis: Option<EquityBasis>,
    pub maturity: MaturityThresholds,
    /// Reference date for company age; the latest period end when absent.
    pub as_of: Option<NaiveDate>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            source_priority: vec![SOURCE_SEC_EDGAR.to_string(), SOURCE_MARKET_DATA.to_string()],
            discrepancy_tolerance: DEFAULT_DISCREPANCY_TOLERANCE,
            identity_tolerance: DEFAULT_IDENTITY_TOLERANCE,
            equity_basis: None,
            maturity: MaturityThresholds::default(),
            as_of: None,
        }
    }
}

/// Company-age thresholds in whole years.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaturityThresholds {
    pub early_stage_years: u32,
    pub growth_years: u32,
    /// Growth threshold for R&D-heavy industries (technology, pharma).
    pub extended_growth_years: u32,
}

impl Default for MaturityThresholds {
    fn default() -> Self {
        Self {
            early_stage_years: 3,
            growth_years: 10,
            extended_growth_years: 15,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> DistressResult<()> {
        if self.discrepancy_tolerance < Decimal::ZERO {
            return Err(DistressError::InvalidInput {
                field: "discrepancy_tolerance".into(),
                reason: "Tolerance cannot be negative.".into(),
            });
        }
        if self.identity_tolerance < Decimal::ZERO {
            return Err(DistressError::InvalidInput {
                field: "identity_tolerance".into(),
                reason: "Tolerance cannot be negative.".into(),
            });
        }
        let m = &self.maturity;
        if m.early_stage_years >= m.growth_years {
            return Err(DistressError::InvalidInput {
                field: "maturity.growth_years".into(),
                reason: "Growth threshold must exceed the early-stage threshold.".into(),
            });
        }
        if m.extended_growth_years < m.growth_years {
            return Err(DistressError::InvalidInput {
                field: "maturity.extended_growth_years".into(),
                reason: "Extended growth threshold cannot be below the growth threshold.".into(),
            });
        }
        let mut seen = std::collections::BTreeSet::new();
        for name in &self.source_priority {
            if !seen.insert(name.as_str()) {
                return Err(DistressError::InvalidInput {
                    field: "source_priority".into(),
                    reason: format!("Source '{name}' is listed more than once."),
                });
            }
        }
        Ok(())
    }

    /// Rank of a source: its position in `source_priority`, or after every
    /// listed source when absent. Lower is more authoritative.
    pub fn source_rank(&self, name: &str) -> usize {
        self.source_priority
            .iter()
            .position(|s| s == name)
            .unwrap_or(self.source_priority.len())
    }
}
