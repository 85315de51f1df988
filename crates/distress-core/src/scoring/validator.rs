//! Plausibility checks over a scored period.
//!
//! The validator only ever appends warnings. It never changes a score, a
//! ratio or a zone, and a check whose inputs are unresolved is skipped.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::models::registry::RatioId;
use crate::normalization::schema::{CanonicalField, CanonicalRecord};
use crate::scoring::engine::ScoreResult;
use crate::types::{round_ratio, NEAR_ZERO};

/// Inclusive plausible range per ratio. Ratios not listed are unchecked.
pub const RATIO_BOUNDS: [(RatioId, Decimal, Decimal); 4] = [
    (RatioId::Liquidity, dec!(-1), dec!(1)),
    (RatioId::Profitability, dec!(-1), dec!(1)),
    (RatioId::Turnover, dec!(0), dec!(5)),
    (RatioId::Leverage, dec!(0), dec!(100)),
];

/// Attach plausibility warnings to `result`, in check order.
pub fn validate_result(
    record: &CanonicalRecord,
    result: ScoreResult,
    config: &AnalysisConfig,
) -> ScoreResult {
    let mut warnings = Vec::new();

    if let Some(w) = check_balance_identity(record, config.identity_tolerance) {
        warnings.push(w);
    }

    for (ratio, low, high) in RATIO_BOUNDS {
        if let Some(&value) = result.ratios.get(&ratio) {
            if value < low || value > high {
                warnings.push(format!(
                    "{ratio} = {value} is outside the plausible range [{low}, {high}]"
                ));
            }
        }
    }

    warnings.extend(check_component_totals(record));

    if warnings.is_empty() {
        debug!(period = %record.period_end, "period passed all consistency checks");
    } else {
        warn!(
            period = %record.period_end,
            count = warnings.len(),
            "consistency checks raised warnings"
        );
    }
    result.with_warnings(warnings)
}

/// `total_assets ≈ total_liabilities + book_value_equity`, relative to
/// total assets. Skipped when the deviation does not fit in a `Decimal`.
fn check_balance_identity(record: &CanonicalRecord, tolerance: Decimal) -> Option<String> {
    let assets = record.total_assets?;
    let liabilities = record.total_liabilities?;
    let equity = record.book_value_equity?;
    if assets.abs() < NEAR_ZERO {
        return None;
    }
    let implied = liabilities.checked_add(equity)?;
    let deviation = assets.checked_sub(implied)?.checked_div(assets)?.abs();
    let percent = round_ratio(deviation.checked_mul(dec!(100))?);
    (deviation > tolerance).then(|| {
        format!(
            "Balance sheet identity off by {percent}%: total_assets {assets} vs \
             total_liabilities + book_value_equity {implied}"
        )
    })
}

fn check_component_totals(record: &CanonicalRecord) -> Vec<String> {
    [
        (CanonicalField::CurrentAssets, CanonicalField::TotalAssets),
        (CanonicalField::CurrentLiabilities, CanonicalField::TotalLiabilities),
    ]
    .into_iter()
    .filter_map(|(part, total)| {
        let (p, t) = (record.get(part)?, record.get(total)?);
        (p > t).then(|| format!("{part} {p} exceeds {total} {t}"))
    })
    .collect()
}
