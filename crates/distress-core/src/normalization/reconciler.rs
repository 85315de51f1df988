//! Merges independently resolved sources into one canonical record per
//! period, field by field, preferring the most authoritative source.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::normalization::resolver::ResolvedSource;
use crate::normalization::schema::{CanonicalField, CanonicalRecord, FieldMapping};
use crate::types::{round_ratio, Money};
use crate::{DistressError, DistressResult};

/// The mapping that supplied a canonical value, and which source won.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSource {
    /// `None` when no source resolved the field.
    pub source: Option<String>,
    pub mapping: FieldMapping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciledPeriod {
    pub record: CanonicalRecord,
    /// One entry per canonical field.
    pub provenance: BTreeMap<CanonicalField, FieldSource>,
    /// Every source's mappings for this period, for the audit trail.
    pub source_mappings: BTreeMap<String, Vec<FieldMapping>>,
    pub warnings: Vec<String>,
}

/// Merge resolved sources into chronologically ordered canonical records.
///
/// Periods are matched on exact period-end equality; a period present in
/// only one source is built from that source alone. Disagreements beyond
/// `config.discrepancy_tolerance` keep the higher-priority value and add a
/// warning.
pub fn reconcile_sources(
    sources: &[ResolvedSource],
    config: &AnalysisConfig,
) -> DistressResult<Vec<ReconciledPeriod>> {
    if sources.is_empty() {
        return Err(DistressError::InsufficientData(
            "At least one source is required for reconciliation.".into(),
        ));
    }
    let mut names = BTreeSet::new();
    for s in sources {
        if !names.insert(s.name.as_str()) {
            return Err(DistressError::InvalidInput {
                field: "sources".into(),
                reason: format!("Source '{}' supplied more than once.", s.name),
            });
        }
    }

    // Stable sort: unlisted sources keep their input order.
    let mut ranked: Vec<&ResolvedSource> = sources.iter().collect();
    ranked.sort_by_key(|s| config.source_rank(&s.name));

    let dates: BTreeSet<NaiveDate> = sources
        .iter()
        .flat_map(|s| s.periods.keys().copied())
        .collect();

    let periods = dates
        .into_iter()
        .map(|date| reconcile_period(date, &ranked, config.discrepancy_tolerance))
        .collect::<Vec<_>>();

    debug!(
        periods = periods.len(),
        order = ?ranked.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        "reconciled sources"
    );
    Ok(periods)
}

/// Relative gap between two values, measured against the larger magnitude.
pub fn relative_gap(a: Money, b: Money) -> Decimal {
    let scale = a.abs().max(b.abs());
    if scale.is_zero() {
        return Decimal::ZERO;
    }
    (a / scale - b / scale).abs()
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn reconcile_period(
    date: NaiveDate,
    ranked: &[&ResolvedSource],
    tolerance: Decimal,
) -> ReconciledPeriod {
    let mut record = CanonicalRecord::empty(date);
    let mut provenance = BTreeMap::new();
    let mut warnings = Vec::new();

    for field in CanonicalField::ALL {
        let candidates: Vec<(&str, &FieldMapping, Money)> = ranked
            .iter()
            .filter_map(|s| {
                let mapping = s.periods.get(&date)?.mapping(field).filter(|m| m.is_resolved())?;
                let value = mapping.value?;
                Some((s.name.as_str(), mapping, value))
            })
            .collect();

        let Some(&(winner, mapping, kept)) = candidates.first() else {
            provenance.insert(
                field,
                FieldSource {
                    source: None,
                    mapping: FieldMapping::unresolved(field, None),
                },
            );
            continue;
        };

        for &(other, _, value) in candidates.iter().skip(1) {
            let gap = relative_gap(kept, value);
            if gap > tolerance {
                let message = format!(
                    "Source discrepancy for {field} on {date}: {winner}={kept} vs {other}={value} \
                     ({}% apart); keeping {winner}.",
                    round_ratio(gap * dec!(100))
                );
                warn!("{message}");
                warnings.push(message);
            }
        }

        record = record.with_field(field, Some(kept));
        provenance.insert(
            field,
            FieldSource {
                source: Some(winner.to_string()),
                mapping: mapping.clone(),
            },
        );
    }

    let source_mappings = ranked
        .iter()
        .filter_map(|s| {
            s.periods
                .get(&date)
                .map(|r| (s.name.clone(), r.mappings.clone()))
        })
        .collect();

    ReconciledPeriod {
        record,
        provenance,
        source_mappings,
        warnings,
    }
}
