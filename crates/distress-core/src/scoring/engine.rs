use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::registry::{EquityBasis, ModelDefinition, RatioId, ZoneThresholds};
use crate::normalization::schema::{CanonicalField, CanonicalRecord};
use crate::types::{round_ratio, Money, NEAR_ZERO};
use crate::{DistressError, DistressResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoringOptions {
    /// Overrides the model's leverage-ratio equity when set.
    #[serde(default)]
    pub equity_basis: Option<EquityBasis>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Distress,
    Grey,
    Safe,
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Grey => write!(f, "Grey Zone"),
            Self::Distress => write!(f, "Distress"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub ratio: RatioId,
    pub value: Decimal,
    pub coefficient: Decimal,
    pub weighted_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub period_end: NaiveDate,
    pub model_key: String,
    pub equity_basis: EquityBasis,
    /// Ratio values rounded to `RATIO_PRECISION`.
    pub ratios: BTreeMap<RatioId, Decimal>,
    pub components: Vec<ScoreComponent>,
    pub intercept: Decimal,
    pub score: Decimal,
    pub zone: Zone,
    pub thresholds: ZoneThresholds,
    pub warnings: Vec<String>,
}

impl ScoreResult {
    /// A copy of this result with `warnings` appended in order.
    pub fn with_warnings(mut self, warnings: impl IntoIterator<Item = String>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    MissingFields { fields: Vec<CanonicalField> },
    DegenerateDenominator { ratio: RatioId, denominator: CanonicalField },
    /// The ratio or its weighted contribution does not fit in a `Decimal`.
    Overflow { ratio: RatioId },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields { fields } => write!(
                f,
                "missing required fields: {}",
                fields
                    .iter()
                    .map(|x| x.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::DegenerateDenominator { ratio, denominator } => {
                write!(f, "{ratio} has a zero or near-zero {denominator} denominator")
            }
            Self::Overflow { ratio } => write!(f, "{ratio} overflows the decimal range"),
        }
    }
}

/// Scoring failure for one period; other periods are unaffected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringFailure {
    pub period_end: NaiveDate,
    pub model_key: String,
    pub reason: FailureReason,
    pub warnings: Vec<String>,
}

impl ScoringFailure {
    pub fn missing_fields(&self) -> &[CanonicalField] {
        match &self.reason {
            FailureReason::MissingFields { fields } => fields,
            FailureReason::DegenerateDenominator { .. } | FailureReason::Overflow { .. } => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Score one canonical record against one model.
///
/// Only the model's own ratios are computed. A missing required field or a
/// near-zero denominator fails the period; nothing is replaced by zero.
pub fn score_record(
    record: &CanonicalRecord,
    model: &ModelDefinition,
    options: &ScoringOptions,
) -> Result<ScoreResult, ScoringFailure> {
    let basis = options.equity_basis.unwrap_or(model.equity_basis);
    let fail = |reason: FailureReason| {
        warn!(period = %record.period_end, model = %model.model_key, "scoring failed: {reason}");
        ScoringFailure {
            period_end: record.period_end,
            model_key: model.model_key.clone(),
            reason,
            warnings: Vec::new(),
        }
    };

    let missing: Vec<CanonicalField> = model
        .required_fields_for(basis)
        .into_iter()
        .filter(|f| record.get(*f).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(fail(FailureReason::MissingFields { fields: missing }));
    }

    let mut ratios = BTreeMap::new();
    let mut components = Vec::with_capacity(model.coefficients.len());
    let mut score = model.intercept;

    for (&ratio, &coefficient) in &model.coefficients {
        let value = match compute_ratio(ratio, record, basis) {
            Ok(v) => v,
            Err(RatioError::Missing(field)) => {
                return Err(fail(FailureReason::MissingFields {
                    fields: vec![field],
                }))
            }
            Err(RatioError::Degenerate(denominator)) => {
                return Err(fail(FailureReason::DegenerateDenominator { ratio, denominator }))
            }
            Err(RatioError::Overflow) => return Err(fail(FailureReason::Overflow { ratio })),
        };
        let Some(weighted_value) = coefficient.checked_mul(value) else {
            return Err(fail(FailureReason::Overflow { ratio }));
        };
        score = match score.checked_add(weighted_value) {
            Some(total) => total,
            None => return Err(fail(FailureReason::Overflow { ratio })),
        };
        ratios.insert(ratio, round_ratio(value));
        components.push(ScoreComponent {
            ratio,
            value: round_ratio(value),
            coefficient,
            weighted_value: round_ratio(weighted_value),
        });
    }

    let score = round_ratio(score);
    let zone = classify_zone(score, &model.thresholds);
    debug!(period = %record.period_end, model = %model.model_key, %score, %zone, "scored period");

    Ok(ScoreResult {
        period_end: record.period_end,
        model_key: model.model_key.clone(),
        equity_basis: basis,
        ratios,
        components,
        intercept: model.intercept,
        score,
        zone,
        thresholds: model.thresholds,
        warnings: Vec::new(),
    })
}

/// Map a score onto the model's zones.
///
/// `score <= distress_upper` is distress; `score <= safe_lower` is grey;
/// only `score > safe_lower` is safe.
pub fn classify_zone(score: Decimal, thresholds: &ZoneThresholds) -> Zone {
    if score <= thresholds.distress_upper {
        Zone::Distress
    } else if score <= thresholds.safe_lower {
        Zone::Grey
    } else {
        Zone::Safe
    }
}

/// Divide, treating a zero or near-zero denominator as an error.
///
/// A quotient outside the `Decimal` range is `DistressError::Overflow`.
pub fn safe_divide(numerator: Money, denominator: Money, context: &str) -> DistressResult<Decimal> {
    if denominator.abs() < NEAR_ZERO {
        return Err(DistressError::DivisionByZero {
            context: context.to_string(),
        });
    }
    numerator
        .checked_div(denominator)
        .ok_or_else(|| DistressError::Overflow {
            context: context.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

enum RatioError {
    Missing(CanonicalField),
    Degenerate(CanonicalField),
    Overflow,
}

fn compute_ratio(
    ratio: RatioId,
    record: &CanonicalRecord,
    basis: EquityBasis,
) -> Result<Decimal, RatioError> {
    let get = |f: CanonicalField| record.get(f).ok_or(RatioError::Missing(f));

    let (numerator, denominator_field) = match ratio {
        RatioId::Liquidity => (
            get(CanonicalField::CurrentAssets)?
                .checked_sub(get(CanonicalField::CurrentLiabilities)?)
                .ok_or(RatioError::Overflow)?,
            CanonicalField::TotalAssets,
        ),
        RatioId::Reinvestment => (
            get(CanonicalField::RetainedEarnings)?,
            CanonicalField::TotalAssets,
        ),
        RatioId::Profitability => (get(CanonicalField::Ebit)?, CanonicalField::TotalAssets),
        RatioId::Leverage => (get(basis.field())?, CanonicalField::TotalLiabilities),
        RatioId::Turnover => (get(CanonicalField::Sales)?, CanonicalField::TotalAssets),
    };
    let denominator = get(denominator_field)?;

    let context = format!("{ratio} over {denominator_field}");
    safe_divide(numerator, denominator, &context).map_err(|e| {
        debug!("{e}");
        match e {
            DistressError::DivisionByZero { .. } => RatioError::Degenerate(denominator_field),
            _ => RatioError::Overflow,
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
