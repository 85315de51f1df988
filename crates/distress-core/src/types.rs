use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates and ratios expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Decimal places kept for canonical line items (millions).
pub const CANONICAL_PRECISION: u32 = 3;

/// Decimal places kept for reported ratios and scores.
pub const RATIO_PRECISION: u32 = 4;

/// Denominators smaller than this (in millions) are treated as zero.
pub const NEAR_ZERO: Decimal = dec!(0.000001);

/// Unit in which a raw source reports its amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportingUnit {
    #[default]
    Units,
    Thousands,
    Millions,
    Billions,
}

impl ReportingUnit {
    /// Absolute currency units per one reported unit.
    pub fn multiplier(&self) -> Decimal {
        match self {
            Self::Units => Decimal::ONE,
            Self::Thousands => dec!(1_000),
            Self::Millions => dec!(1_000_000),
            Self::Billions => dec!(1_000_000_000),
        }
    }

    /// Millions per one reported unit.
    pub fn millions_scale(&self) -> Decimal {
        match self {
            Self::Units => dec!(0.000001),
            Self::Thousands => dec!(0.001),
            Self::Millions => Decimal::ONE,
            Self::Billions => dec!(1_000),
        }
    }

    /// Convert an amount in this unit to millions, rounded to canonical precision.
    ///
    /// `None` when the converted amount does not fit in a `Decimal`.
    pub fn to_millions(&self, amount: Money) -> Option<Money> {
        amount.checked_mul(self.millions_scale()).map(round_canonical)
    }

    /// Express an absolute currency amount in this unit.
    pub fn from_absolute(&self, amount: Money) -> Money {
        amount / self.multiplier()
    }
}

pub fn round_canonical(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CANONICAL_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_ratio(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATIO_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
