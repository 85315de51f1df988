//! End-to-end analysis of one company: classify, resolve every source,
//! reconcile, select a model once, then score and validate every period.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classification::classifier::{
    classify_company, CompanyMetadata, CompanyProfile, IndustryCategory,
};
use crate::config::AnalysisConfig;
use crate::models::registry::ModelRegistry;
use crate::models::selector::{select_model_definition, ModelSelection};
use crate::normalization::reconciler::{reconcile_sources, FieldSource};
use crate::normalization::resolver::{
    parse_period_key, resolve_source, RawSource, ResolutionContext,
};
use crate::normalization::schema::{CanonicalField, CanonicalRecord, FieldMapping};
use crate::scoring::engine::{score_record, ScoreResult, ScoringFailure, ScoringOptions, Zone};
use crate::scoring::validator::validate_result;
use crate::types::{with_metadata, ComputationOutput};
use crate::{DistressError, DistressResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyAnalysisInput {
    pub company: CompanyMetadata,
    pub sources: Vec<RawSource>,
}

/// Scoring outcome for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PeriodOutcome {
    Scored(ScoreResult),
    Failed(ScoringFailure),
}

impl PeriodOutcome {
    pub fn period_end(&self) -> NaiveDate {
        match self {
            Self::Scored(r) => r.period_end,
            Self::Failed(f) => f.period_end,
        }
    }

    pub fn scored(&self) -> Option<&ScoreResult> {
        match self {
            Self::Scored(r) => Some(r),
            Self::Failed(_) => None,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            Self::Scored(r) => &r.warnings,
            Self::Failed(f) => &f.warnings,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodAudit {
    /// Winning source and mapping for every canonical field.
    pub provenance: BTreeMap<CanonicalField, FieldSource>,
    /// Every source's mappings for the period.
    pub source_mappings: BTreeMap<String, Vec<FieldMapping>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodAnalysis {
    pub period_end: NaiveDate,
    pub record: CanonicalRecord,
    pub outcome: PeriodOutcome,
    pub audit: PeriodAudit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneTransition {
    pub from_period: NaiveDate,
    pub to_period: NaiveDate,
    pub from: Zone,
    pub to: Zone,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub scored_periods: usize,
    pub failed_periods: usize,
    pub first_period: Option<NaiveDate>,
    pub latest_period: Option<NaiveDate>,
    pub first_score: Option<Decimal>,
    pub latest_score: Option<Decimal>,
    /// `latest_score - first_score`; `None` with fewer than two scored periods.
    pub score_change: Option<Decimal>,
    pub latest_zone: Option<Zone>,
    pub transitions: Vec<ZoneTransition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyAnalysis {
    pub company_name: Option<String>,
    pub profile: CompanyProfile,
    pub selection: ModelSelection,
    /// Chronological.
    pub periods: Vec<PeriodAnalysis>,
    pub trend: TrendSummary,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the whole normalization and scoring chain for one company.
///
/// Structural problems (no sources, malformed period keys, an unknown model
/// key, an invalid config) are errors. A period that cannot be scored is
/// reported as [`PeriodOutcome::Failed`] and the others still score.
pub fn analyze_company(
    input: &CompanyAnalysisInput,
    registry: &ModelRegistry,
    config: &AnalysisConfig,
) -> DistressResult<ComputationOutput<CompanyAnalysis>> {
    let start = Instant::now();
    config.validate()?;

    if input.sources.is_empty() {
        return Err(DistressError::InsufficientData(
            "At least one raw source is required.".into(),
        ));
    }

    let as_of = match config.as_of {
        Some(date) => Some(date),
        None => latest_period_end(&input.sources)?,
    };
    let profile = classify_company(&input.company, as_of, config);

    let ctx = ResolutionContext {
        is_financial_institution: profile.industry_category == IndustryCategory::Financial,
    };
    let resolved = input
        .sources
        .iter()
        .map(|s| resolve_source(s, &ctx))
        .collect::<DistressResult<Vec<_>>>()?;
    let reconciled = reconcile_sources(&resolved, config)?;

    let (selection, model) = select_model_definition(&profile, registry)?;
    let options = ScoringOptions {
        equity_basis: config.equity_basis,
    };

    let periods: Vec<PeriodAnalysis> = reconciled
        .into_iter()
        .map(|period| {
            let outcome = match score_record(&period.record, model, &options) {
                Ok(result) => PeriodOutcome::Scored(validate_result(
                    &period.record,
                    result.with_warnings(period.warnings),
                    config,
                )),
                Err(mut failure) => {
                    let mut warnings = period.warnings;
                    warnings.append(&mut failure.warnings);
                    failure.warnings = warnings;
                    PeriodOutcome::Failed(failure)
                }
            };
            PeriodAnalysis {
                period_end: period.record.period_end,
                record: period.record,
                outcome,
                audit: PeriodAudit {
                    provenance: period.provenance,
                    source_mappings: period.source_mappings,
                },
            }
        })
        .collect();

    let outcomes: Vec<PeriodOutcome> = periods.iter().map(|p| p.outcome.clone()).collect();
    let trend = summarize_trend(&outcomes);

    let mut warnings: Vec<String> = profile.warnings.clone();
    warnings.extend(selection.warnings.iter().cloned());
    if trend.failed_periods > 0 {
        warnings.push(format!(
            "{} of {} periods could not be scored with {}.",
            trend.failed_periods,
            periods.len(),
            model.model_key
        ));
    }

    info!(
        company = input.company.name.as_deref().unwrap_or("-"),
        model = %model.model_key,
        scored = trend.scored_periods,
        failed = trend.failed_periods,
        latest_zone = ?trend.latest_zone,
        "analysis complete"
    );

    let assumptions = serde_json::json!({
        "model_key": model.model_key,
        "equity_basis": options.equity_basis.unwrap_or(model.equity_basis),
        "coefficients": model.coefficients,
        "intercept": model.intercept,
        "thresholds": model.thresholds,
        "config": config,
    });

    let analysis = CompanyAnalysis {
        company_name: input.company.name.clone(),
        profile,
        selection,
        periods,
        trend,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Multi-source field normalization with Altman Z-Score model selection",
        &assumptions,
        warnings,
        elapsed,
        analysis,
    ))
}

/// Summarize scored periods in chronological order.
pub fn summarize_trend(outcomes: &[PeriodOutcome]) -> TrendSummary {
    let mut scored: Vec<&ScoreResult> = outcomes.iter().filter_map(PeriodOutcome::scored).collect();
    scored.sort_by_key(|r| r.period_end);

    let transitions = scored
        .windows(2)
        .filter(|w| w[0].zone != w[1].zone)
        .map(|w| ZoneTransition {
            from_period: w[0].period_end,
            to_period: w[1].period_end,
            from: w[0].zone,
            to: w[1].zone,
        })
        .collect();

    let first = scored.first();
    let latest = scored.last();
    let score_change = match (first, latest) {
        (Some(a), Some(b)) if scored.len() > 1 => b.score.checked_sub(a.score),
        _ => None,
    };

    TrendSummary {
        scored_periods: scored.len(),
        failed_periods: outcomes.len() - scored.len(),
        first_period: first.map(|r| r.period_end),
        latest_period: latest.map(|r| r.period_end),
        first_score: first.map(|r| r.score),
        latest_score: latest.map(|r| r.score),
        score_change,
        latest_zone: latest.map(|r| r.zone),
        transitions,
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn latest_period_end(sources: &[RawSource]) -> DistressResult<Option<NaiveDate>> {
    let mut latest = None;
    for source in sources {
        for key in source.periods.keys() {
            let date = parse_period_key(&source.name, key)?;
            latest = latest.max(Some(date));
        }
    }
    Ok(latest)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
