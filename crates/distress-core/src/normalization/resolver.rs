//! Field resolution: maps arbitrary raw labels of one source and period
//! onto the canonical fields.
//!
//! Evaluation order per field is fixed: exact labels, synonyms, keyword
//! containment, proxies, then algebraic inference. Resolution never fails;
//! a field nothing matches is reported as `unresolved`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::normalization::rules::{
    contains_words, normalize_label, rules_for, IdentityOp, MatchRule, ProxyCondition, IDENTITIES,
    ZERO_DISTRUSTED,
};
use crate::normalization::schema::{AuxiliaryConcept, CanonicalField, Concept, FieldMapping, RuleKind};
use crate::types::{Money, ReportingUnit};
use crate::{DistressError, DistressResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Facts about the company that enable domain-specific proxy rules.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ResolutionContext {
    pub is_financial_institution: bool,
}

/// Raw per-period records from one provider, keyed by period-end date
/// (`YYYY-MM-DD`) and then by the provider's own label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSource {
    pub name: String,
    #[serde(default)]
    pub unit: ReportingUnit,
    pub periods: BTreeMap<String, BTreeMap<String, Money>>,
}

/// Every canonical field's mapping for one source and period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldResolution {
    /// One entry per canonical field, in canonical order.
    pub mappings: Vec<FieldMapping>,
    /// Raw labels no rule claimed.
    pub unmatched_labels: Vec<String>,
}

impl FieldResolution {
    pub fn mapping(&self, field: CanonicalField) -> Option<&FieldMapping> {
        self.mappings.iter().find(|m| m.field == field)
    }

    pub fn value(&self, field: CanonicalField) -> Option<Money> {
        self.mapping(field).and_then(|m| m.value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedSource {
    pub name: String,
    pub periods: BTreeMap<NaiveDate, FieldResolution>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve every canonical field from one period's raw label/value pairs.
///
/// Values in `raw` are in `unit`; resolved values are reported in millions.
pub fn resolve_fields(
    raw: &BTreeMap<String, Money>,
    unit: ReportingUnit,
    ctx: &ResolutionContext,
) -> FieldResolution {
    let labels: Vec<Label<'_>> = raw
        .iter()
        .map(|(original, value)| Label {
            original,
            normalized: normalize_label(original),
            value: *value,
        })
        .collect();

    let mut hits: BTreeMap<Concept, Hit<'_>> = BTreeMap::new();
    let mut rejections: BTreeMap<CanonicalField, Vec<&str>> = BTreeMap::new();

    let concepts = CanonicalField::ALL
        .into_iter()
        .map(Concept::Canonical)
        .chain(AuxiliaryConcept::ALL.into_iter().map(Concept::Auxiliary));

    for concept in concepts {
        let (hit, rejected) = match_concept(concept, &labels, ctx);
        if let Concept::Canonical(field) = concept {
            if !rejected.is_empty() {
                rejections.insert(field, rejected);
            }
        }
        if let Some(hit) = hit {
            debug!(
                concept = concept.name(),
                label = hit.label,
                rule = ?hit.rule,
                "matched raw label"
            );
            hits.insert(concept, hit);
        }
    }

    let inferred = infer_missing(&hits, unit);

    let mappings = CanonicalField::ALL
        .into_iter()
        .map(|field| {
            let note = rejections.get(&field).map(|labels| {
                format!(
                    "zero-valued match {} rejected as untrustworthy",
                    labels
                        .iter()
                        .map(|l| format!("'{l}'"))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            });
            if let Some(hit) = hits.get(&Concept::Canonical(field)) {
                match unit.to_millions(hit.value) {
                    Some(value) => FieldMapping {
                        field,
                        source_label: Some(hit.label.to_string()),
                        value: Some(value),
                        provenance: hit.rule.provenance(),
                        rule: Some(hit.rule),
                        formula: None,
                        note,
                    },
                    None => overflowed(field, &format!("'{}'", hit.label), note),
                }
            } else if let Some((value, formula)) = inferred.get(&field) {
                match unit.to_millions(*value) {
                    Some(value) => FieldMapping {
                        field,
                        source_label: None,
                        value: Some(value),
                        provenance: RuleKind::Inferred.provenance(),
                        rule: Some(RuleKind::Inferred),
                        formula: Some(formula.to_string()),
                        note,
                    },
                    None => overflowed(field, formula, note),
                }
            } else {
                FieldMapping::unresolved(field, note)
            }
        })
        .collect();

    let claimed: BTreeSet<&str> = hits.values().map(|h| h.label).collect();
    let unmatched_labels = raw
        .keys()
        .filter(|k| !claimed.contains(k.as_str()))
        .cloned()
        .collect();

    FieldResolution {
        mappings,
        unmatched_labels,
    }
}

/// Resolve every period of a raw source.
///
/// Fails only on structurally malformed input: a period key that is not an
/// ISO date, or two keys naming the same date.
pub fn resolve_source(source: &RawSource, ctx: &ResolutionContext) -> DistressResult<ResolvedSource> {
    let mut periods = BTreeMap::new();
    for (key, raw) in &source.periods {
        let period_end = parse_period_key(&source.name, key)?;
        let resolution = resolve_fields(raw, source.unit, ctx);
        if periods.insert(period_end, resolution).is_some() {
            return Err(DistressError::InvalidInput {
                field: format!("{}.periods", source.name),
                reason: format!("Period {period_end} appears more than once."),
            });
        }
    }
    debug!(source = %source.name, periods = periods.len(), "resolved source");
    Ok(ResolvedSource {
        name: source.name.clone(),
        periods,
    })
}

pub fn parse_period_key(source_name: &str, key: &str) -> DistressResult<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d").map_err(|_| DistressError::InvalidPeriodKey {
        source_name: source_name.to_string(),
        key: key.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct Label<'a> {
    original: &'a str,
    normalized: String,
    value: Money,
}

struct Hit<'a> {
    label: &'a str,
    value: Money,
    rule: RuleKind,
}

/// Run a concept's rules in order. Returns the accepted hit and the labels
/// rejected by the zero-value distrust check.
fn match_concept<'a>(
    concept: Concept,
    labels: &[Label<'a>],
    ctx: &ResolutionContext,
) -> (Option<Hit<'a>>, Vec<&'a str>) {
    let distrust_zero =
        matches!(concept, Concept::Canonical(f) if ZERO_DISTRUSTED.contains(&f));
    let mut rejected: Vec<&'a str> = Vec::new();

    for rule in rules_for(concept) {
        while let Some((label, kind)) = find_candidate(rule, labels, ctx, &rejected) {
            if distrust_zero && label.value.is_zero() {
                debug!(
                    concept = concept.name(),
                    label = label.original,
                    "rejecting zero-valued match"
                );
                rejected.push(label.original);
                continue;
            }
            return (
                Some(Hit {
                    label: label.original,
                    value: label.value,
                    rule: kind,
                }),
                rejected,
            );
        }
    }
    (None, rejected)
}

fn find_candidate<'l, 'a>(
    rule: &MatchRule,
    labels: &'l [Label<'a>],
    ctx: &ResolutionContext,
    rejected: &[&str],
) -> Option<(&'l Label<'a>, RuleKind)> {
    let eligible = |l: &&Label<'a>| !rejected.contains(&l.original);

    match rule {
        MatchRule::Exact(terms) | MatchRule::Synonym(terms) => {
            let kind = if matches!(rule, MatchRule::Exact(_)) {
                RuleKind::Exact
            } else {
                RuleKind::Synonym
            };
            terms.iter().find_map(|term| {
                labels
                    .iter()
                    .filter(eligible)
                    .find(|l| l.normalized == *term)
                    .map(|l| (l, kind))
            })
        }
        MatchRule::Keyword { contains, excludes } => labels
            .iter()
            .filter(eligible)
            .find(|l| keyword_hit(&l.normalized, contains, excludes))
            .map(|l| (l, RuleKind::Keyword)),
        MatchRule::Proxy {
            contains,
            excludes,
            condition,
        } => {
            let allowed = match condition {
                ProxyCondition::FinancialInstitution => ctx.is_financial_institution,
            };
            if !allowed {
                return None;
            }
            labels
                .iter()
                .filter(eligible)
                .find(|l| keyword_hit(&l.normalized, contains, excludes))
                .map(|l| (l, RuleKind::Proxy))
        }
    }
}

fn keyword_hit(label: &str, contains: &str, excludes: &[&str]) -> bool {
    contains_words(label, contains) && !excludes.iter().any(|x| contains_words(label, x))
}

/// Unresolved mapping for a value that does not fit once scaled to millions.
fn overflowed(field: CanonicalField, origin: &str, note: Option<String>) -> FieldMapping {
    let overflow = format!("value from {origin} overflows when converted to millions");
    let note = match note {
        Some(existing) => format!("{existing}; {overflow}"),
        None => overflow,
    };
    FieldMapping::unresolved(field, Some(note))
}

/// Apply the identities until no further canonical field resolves.
/// Values stay in the source unit.
fn infer_missing(
    hits: &BTreeMap<Concept, Hit<'_>>,
    unit: ReportingUnit,
) -> BTreeMap<CanonicalField, (Money, &'static str)> {
    let mut values: BTreeMap<Concept, Money> = hits.iter().map(|(c, h)| (*c, h.value)).collect();
    let mut inferred = BTreeMap::new();

    loop {
        let mut progressed = false;
        for identity in IDENTITIES {
            let target = Concept::Canonical(identity.target);
            if values.contains_key(&target) {
                continue;
            }
            let (Some(left), Some(right)) = (
                values.get(&identity.left).copied(),
                values.get(&identity.right).copied(),
            ) else {
                continue;
            };
            let value = match identity.op {
                IdentityOp::Sum => left.checked_add(right),
                IdentityOp::Difference => left.checked_sub(right),
                IdentityOp::AbsoluteProduct => left.checked_mul(right).map(|p| unit.from_absolute(p)),
            };
            let Some(value) = value else {
                debug!(field = identity.target.name(), formula = identity.formula, "identity overflowed");
                continue;
            };
            trace!(field = identity.target.name(), formula = identity.formula, %value, "inferred");
            values.insert(target, value);
            inferred.insert(identity.target, (value, identity.formula));
            progressed = true;
        }
        if !progressed {
            break;
        }
    }
    inferred
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalization::schema::Provenance;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn raw(pairs: &[(&str, Money)]) -> BTreeMap<String, Money> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn resolve(pairs: &[(&str, Money)]) -> FieldResolution {
        resolve_fields(&raw(pairs), ReportingUnit::Millions, &ResolutionContext::default())
    }

    #[test]
    fn test_xbrl_tags_are_exact_matches() {
        let res = resolve(&[
            ("us-gaap:Assets", dec!(792.2)),
            ("us-gaap:AssetsCurrent", dec!(453.0)),
            ("us-gaap:LiabilitiesCurrent", dec!(289.6)),
        ]);
        let ta = res.mapping(CanonicalField::TotalAssets).unwrap();
        assert_eq!(ta.provenance, Provenance::ExactMatch);
        assert_eq!(ta.value, Some(dec!(792.2)));
        assert_eq!(ta.source_label.as_deref(), Some("us-gaap:Assets"));
        assert_eq!(res.value(CanonicalField::CurrentAssets), Some(dec!(453)));
        assert_eq!(res.value(CanonicalField::CurrentLiabilities), Some(dec!(289.6)));
    }

    #[test]
    fn test_translated_label_is_synonym_match() {
        let res = resolve(&[("Bilanzsumme", dec!(1000)), ("Umsatzerlöse", dec!(400))]);
        let ta = res.mapping(CanonicalField::TotalAssets).unwrap();
        assert_eq!(ta.provenance, Provenance::SynonymMatch);
        assert_eq!(ta.rule, Some(RuleKind::Synonym));
        assert_eq!(res.value(CanonicalField::Sales), Some(dec!(400)));
    }

    #[test]
    fn test_sales_keyword_priority_prefers_total_revenue() {
        let res = resolve(&[
            ("Operating Revenue", dec!(450)),
            ("Total Revenue (Reported)", dec!(500)),
        ]);
        let sales = res.mapping(CanonicalField::Sales).unwrap();
        assert_eq!(sales.rule, Some(RuleKind::Keyword));
        assert_eq!(sales.source_label.as_deref(), Some("Total Revenue (Reported)"));
        assert_eq!(sales.value, Some(dec!(500)));
    }

    #[test]
    fn test_interest_income_proxy_only_for_financials() {
        let pairs = raw(&[("Interest Income", dec!(120))]);
        let plain = resolve_fields(&pairs, ReportingUnit::Millions, &ResolutionContext::default());
        assert_eq!(
            plain.mapping(CanonicalField::Sales).unwrap().provenance,
            Provenance::Unresolved
        );

        let bank_ctx = ResolutionContext {
            is_financial_institution: true,
        };
        let bank = resolve_fields(&pairs, ReportingUnit::Millions, &bank_ctx);
        let sales = bank.mapping(CanonicalField::Sales).unwrap();
        assert_eq!(sales.rule, Some(RuleKind::Proxy));
        assert_eq!(sales.provenance, Provenance::SynonymMatch);
        assert_eq!(sales.value, Some(dec!(120)));
    }

    #[test]
    fn test_retained_earnings_inferred_from_equity_and_apic() {
        let res = resolve(&[
            ("StockholdersEquity", dec!(500)),
            ("AdditionalPaidInCapital", dec!(300)),
        ]);
        let re = res.mapping(CanonicalField::RetainedEarnings).unwrap();
        assert_eq!(re.provenance, Provenance::Inferred);
        assert_eq!(re.value, Some(dec!(200)));
        assert_eq!(
            re.formula.as_deref(),
            Some("book_value_equity - additional_paid_in_capital")
        );
        assert!(re.source_label.is_none());
    }

    #[test]
    fn test_zero_retained_earnings_falls_back_to_inference() {
        let res = resolve(&[
            ("RetainedEarnings", dec!(0)),
            ("StockholdersEquity", dec!(500)),
            ("AdditionalPaidInCapital", dec!(350)),
        ]);
        let re = res.mapping(CanonicalField::RetainedEarnings).unwrap();
        assert_eq!(re.provenance, Provenance::Inferred);
        assert_eq!(re.value, Some(dec!(150)));
        assert!(re.note.as_deref().unwrap().contains("'RetainedEarnings'"));
    }

    #[test]
    fn test_zero_retained_earnings_without_fallback_is_unresolved() {
        let res = resolve(&[("Retained Earnings", dec!(0)), ("Total Assets", dec!(100))]);
        let re = res.mapping(CanonicalField::RetainedEarnings).unwrap();
        assert_eq!(re.provenance, Provenance::Unresolved);
        assert_eq!(re.value, None);
        assert!(re.note.is_some());
    }

    #[test]
    fn test_zero_is_accepted_for_trusted_fields() {
        let res = resolve(&[("Current Liabilities", dec!(0))]);
        assert_eq!(res.value(CanonicalField::CurrentLiabilities), Some(dec!(0)));
    }

    #[test]
    fn test_market_value_from_shares_and_price() {
        let res = resolve_fields(
            &raw(&[
                ("SharesOutstanding", dec!(100_000_000)),
                ("SharePrice", dec!(12.82)),
            ]),
            ReportingUnit::Units,
            &ResolutionContext::default(),
        );
        let mve = res.mapping(CanonicalField::MarketValueEquity).unwrap();
        assert_eq!(mve.provenance, Provenance::Inferred);
        assert_eq!(mve.value, Some(dec!(1282)));
    }

    #[test]
    fn test_inference_chains_through_inferred_fields() {
        // Book equity is inferred first, then retained earnings from it.
        let res = resolve(&[
            ("Total Assets", dec!(1000)),
            ("Total Liabilities", dec!(600)),
            ("Additional Paid-In Capital", dec!(250)),
        ]);
        assert_eq!(res.value(CanonicalField::BookValueEquity), Some(dec!(400)));
        assert_eq!(res.value(CanonicalField::RetainedEarnings), Some(dec!(150)));
    }

    #[test]
    fn test_combined_totals_line_is_not_claimed() {
        let res = resolve(&[("Total Liabilities And Stockholders Equity", dec!(792.2))]);
        assert_eq!(res.value(CanonicalField::TotalLiabilities), None);
        assert_eq!(res.value(CanonicalField::BookValueEquity), None);
        assert_eq!(
            res.unmatched_labels,
            vec!["Total Liabilities And Stockholders Equity".to_string()]
        );
    }

    #[test]
    fn test_values_converted_to_millions() {
        let res = resolve_fields(
            &raw(&[("Total Assets", dec!(792_200_000))]),
            ReportingUnit::Units,
            &ResolutionContext::default(),
        );
        assert_eq!(res.value(CanonicalField::TotalAssets), Some(dec!(792.2)));
    }

    #[test]
    fn test_overflowing_value_is_unresolved_with_note() {
        let res = resolve_fields(
            &raw(&[("Total Assets", Decimal::MAX), ("Total Liabilities", dec!(600))]),
            ReportingUnit::Billions,
            &ResolutionContext::default(),
        );
        let ta = res.mapping(CanonicalField::TotalAssets).unwrap();
        assert!(!ta.is_resolved());
        assert!(ta.note.as_deref().unwrap().contains("overflows"));
        assert_eq!(res.value(CanonicalField::TotalLiabilities), Some(dec!(600_000)));
    }

    #[test]
    fn test_overflowing_identity_is_skipped() {
        let res = resolve(&[("Total Assets", Decimal::MAX), ("Total Liabilities", Decimal::MIN)]);
        assert_eq!(res.value(CanonicalField::TotalAssets), Some(Decimal::MAX));
        assert_eq!(res.value(CanonicalField::BookValueEquity), None);
    }

    #[test]
    fn test_every_field_has_a_mapping() {
        let res = resolve(&[]);
        assert_eq!(res.mappings.len(), CanonicalField::ALL.len());
        for m in &res.mappings {
            assert_eq!(m.provenance, Provenance::Unresolved);
            assert!(m.value.is_none());
        }
    }

    #[test]
    fn test_non_date_period_key_rejected() {
        let source = RawSource {
            name: "market_data".into(),
            unit: ReportingUnit::Millions,
            periods: BTreeMap::from([("Q1-2024".to_string(), BTreeMap::new())]),
        };
        match resolve_source(&source, &ResolutionContext::default()).unwrap_err() {
            DistressError::InvalidPeriodKey { source_name, key } => {
                assert_eq!(source_name, "market_data");
                assert_eq!(key, "Q1-2024");
            }
            other => panic!("Expected InvalidPeriodKey, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_period_after_trim_rejected() {
        let source = RawSource {
            name: "sec_edgar".into(),
            unit: ReportingUnit::Millions,
            periods: BTreeMap::from([
                ("2024-03-31".to_string(), BTreeMap::new()),
                (" 2024-03-31".to_string(), BTreeMap::new()),
            ]),
        };
        assert!(resolve_source(&source, &ResolutionContext::default()).is_err());
    }
}
