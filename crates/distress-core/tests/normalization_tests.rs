use std::collections::BTreeMap;

use chrono::NaiveDate;
use distress_core::config::AnalysisConfig;
use distress_core::normalization::reconciler::reconcile_sources;
use distress_core::normalization::resolver::{
    resolve_fields, resolve_source, RawSource, ResolutionContext,
};
use distress_core::normalization::schema::{CanonicalField, Provenance, RuleKind};
use distress_core::{DistressError, Money, ReportingUnit};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

// ===========================================================================
// Helpers
// ===========================================================================

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn raw(pairs: &[(&str, Money)]) -> BTreeMap<String, Money> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn source(name: &str, unit: ReportingUnit, periods: &[(&str, &[(&str, Money)])]) -> RawSource {
    RawSource {
        name: name.to_string(),
        unit,
        periods: periods
            .iter()
            .map(|(date, pairs)| (date.to_string(), raw(pairs)))
            .collect(),
    }
}

fn edgar_filing() -> RawSource {
    source(
        "sec_edgar",
        ReportingUnit::Thousands,
        &[(
            "2024-12-31",
            &[
                ("us-gaap:Assets", dec!(792_200)),
                ("us-gaap:AssetsCurrent", dec!(453_000)),
                ("us-gaap:LiabilitiesCurrent", dec!(289_600)),
                ("us-gaap:Liabilities", dec!(409_300)),
                ("us-gaap:RetainedEarningsAccumulatedDeficit", dec!(-70_800)),
                ("us-gaap:OperatingIncomeLoss", dec!(-59_100)),
                ("us-gaap:Revenues", dec!(259_800)),
                ("us-gaap:StockholdersEquity", dec!(382_900)),
                ("us-gaap:CommonStockValue", dec!(12)),
            ],
        )],
    )
}

// ===========================================================================
// Field Resolver tests
// ===========================================================================

#[test]
fn test_filing_resolves_every_balance_sheet_field_in_millions() {
    let resolved = resolve_source(&edgar_filing(), &ResolutionContext::default()).unwrap();
    let period = &resolved.periods[&d("2024-12-31")];

    assert_eq!(period.value(CanonicalField::TotalAssets), Some(dec!(792.2)));
    assert_eq!(period.value(CanonicalField::CurrentAssets), Some(dec!(453)));
    assert_eq!(period.value(CanonicalField::RetainedEarnings), Some(dec!(-70.8)));
    assert_eq!(period.value(CanonicalField::Ebit), Some(dec!(-59.1)));
    assert_eq!(period.value(CanonicalField::Sales), Some(dec!(259.8)));
    assert_eq!(period.value(CanonicalField::BookValueEquity), Some(dec!(382.9)));
    assert_eq!(period.value(CanonicalField::MarketValueEquity), None);
    assert_eq!(
        period.mapping(CanonicalField::MarketValueEquity).unwrap().provenance,
        Provenance::Unresolved
    );
    assert_eq!(period.unmatched_labels, vec!["us-gaap:CommonStockValue".to_string()]);
}

#[test]
fn test_every_canonical_field_has_exactly_one_mapping() {
    let res = resolve_fields(
        &raw(&[("Total Assets", dec!(10))]),
        ReportingUnit::Millions,
        &ResolutionContext::default(),
    );
    assert_eq!(res.mappings.len(), CanonicalField::ALL.len());
    let fields: Vec<CanonicalField> = res.mappings.iter().map(|m| m.field).collect();
    assert_eq!(fields, CanonicalField::ALL.to_vec());
}

#[test]
fn test_zero_retained_earnings_is_replaced_by_inference() {
    let res = resolve_fields(
        &raw(&[
            ("RetainedEarnings", dec!(0)),
            ("StockholdersEquity", dec!(500)),
            ("AdditionalPaidInCapital", dec!(620)),
        ]),
        ReportingUnit::Millions,
        &ResolutionContext::default(),
    );
    let re = res.mapping(CanonicalField::RetainedEarnings).unwrap();
    assert_eq!(re.value, Some(dec!(-120)));
    assert_eq!(re.provenance, Provenance::Inferred);
    assert_eq!(re.formula.as_deref(), Some("book_value_equity - additional_paid_in_capital"));
    assert!(re.note.as_deref().unwrap().contains("'RetainedEarnings'"));
}

#[test]
fn test_zero_ebit_without_fallback_stays_unresolved() {
    let res = resolve_fields(
        &raw(&[("Operating Income", dec!(0))]),
        ReportingUnit::Millions,
        &ResolutionContext::default(),
    );
    let ebit = res.mapping(CanonicalField::Ebit).unwrap();
    assert_eq!(ebit.value, None);
    assert_eq!(ebit.provenance, Provenance::Unresolved);
    assert!(ebit.note.is_some());
}

#[test]
fn test_zero_sales_is_accepted_at_face_value() {
    let res = resolve_fields(
        &raw(&[("Revenues", dec!(0))]),
        ReportingUnit::Millions,
        &ResolutionContext::default(),
    );
    let sales = res.mapping(CanonicalField::Sales).unwrap();
    assert_eq!(sales.value, Some(dec!(0)));
    assert_eq!(sales.provenance, Provenance::ExactMatch);
}

#[test]
fn test_market_value_inferred_from_share_count_and_price() {
    let res = resolve_fields(
        &raw(&[
            ("sharesOutstanding", dec!(100_000_000)),
            ("regularMarketPrice", dec!(12.82)),
        ]),
        ReportingUnit::Units,
        &ResolutionContext::default(),
    );
    let mve = res.mapping(CanonicalField::MarketValueEquity).unwrap();
    assert_eq!(mve.value, Some(dec!(1282)));
    assert_eq!(mve.rule, Some(RuleKind::Inferred));
    assert_eq!(mve.formula.as_deref(), Some("shares_outstanding * share_price"));
}

#[test]
fn test_large_billions_filing_scales_without_panicking() {
    let res = resolve_fields(
        &raw(&[
            ("Total Assets", dec!(100_000_000_000_000_000_000)),
            ("Total Liabilities", Money::MAX),
        ]),
        ReportingUnit::Billions,
        &ResolutionContext::default(),
    );
    assert_eq!(
        res.value(CanonicalField::TotalAssets),
        Some(dec!(100_000_000_000_000_000_000_000))
    );
    let tl = res.mapping(CanonicalField::TotalLiabilities).unwrap();
    assert_eq!(tl.provenance, Provenance::Unresolved);
    assert!(tl.note.as_deref().unwrap().contains("'Total Liabilities'"));
    // total_assets - total_liabilities does not fit either
    assert_eq!(res.value(CanonicalField::BookValueEquity), None);
}

#[test]
fn test_invalid_period_key_is_an_error() {
    let bad = source("sec_edgar", ReportingUnit::Millions, &[("FY2024", &[("Assets", dec!(1))])]);
    let err = resolve_source(&bad, &ResolutionContext::default()).unwrap_err();
    match err {
        DistressError::InvalidPeriodKey { source_name, key } => {
            assert_eq!(source_name, "sec_edgar");
            assert_eq!(key, "FY2024");
        }
        other => panic!("Expected InvalidPeriodKey, got {other:?}"),
    }
}

// ===========================================================================
// Source Reconciler tests
// ===========================================================================

#[test]
fn test_reconcile_merges_filing_with_market_data() {
    let ctx = ResolutionContext::default();
    let market = source(
        "market_data",
        ReportingUnit::Units,
        &[
            (
                "2024-12-31",
                &[
                    ("sharesOutstanding", dec!(100_000_000)),
                    ("regularMarketPrice", dec!(12.82)),
                    ("totalRevenue", dec!(262_000_000)),
                ],
            ),
            ("2025-03-31", &[("totalRevenue", dec!(70_000_000))]),
        ],
    );
    let sources = vec![
        resolve_source(&market, &ctx).unwrap(),
        resolve_source(&edgar_filing(), &ctx).unwrap(),
    ];
    let periods = reconcile_sources(&sources, &AnalysisConfig::default()).unwrap();

    assert_eq!(periods.len(), 2);
    let year_end = &periods[0];
    assert_eq!(year_end.record.period_end, d("2024-12-31"));
    assert_eq!(year_end.record.sales, Some(dec!(259.8)));
    assert_eq!(year_end.record.market_value_equity, Some(dec!(1282)));
    assert_eq!(
        year_end.provenance[&CanonicalField::Sales].source.as_deref(),
        Some("sec_edgar")
    );
    assert_eq!(
        year_end.provenance[&CanonicalField::MarketValueEquity].source.as_deref(),
        Some("market_data")
    );
    assert_eq!(year_end.warnings.len(), 1);
    assert!(year_end.warnings[0].starts_with("Source discrepancy for sales on 2024-12-31"));
    assert_eq!(year_end.source_mappings.len(), 2);

    let quarter = &periods[1];
    assert_eq!(quarter.record.period_end, d("2025-03-31"));
    assert_eq!(quarter.record.sales, Some(dec!(70)));
    assert_eq!(quarter.record.total_assets, None);
    assert!(quarter.warnings.is_empty());
}

#[test]
fn test_reconcile_respects_configured_priority() {
    let ctx = ResolutionContext::default();
    let a = source("vendor_a", ReportingUnit::Millions, &[("2024-06-30", &[("Revenue", dec!(100))])]);
    let b = source("vendor_b", ReportingUnit::Millions, &[("2024-06-30", &[("Revenue", dec!(100.2))])]);
    let sources = vec![resolve_source(&a, &ctx).unwrap(), resolve_source(&b, &ctx).unwrap()];

    let config = AnalysisConfig {
        source_priority: vec!["vendor_b".into(), "vendor_a".into()],
        ..AnalysisConfig::default()
    };
    let periods = reconcile_sources(&sources, &config).unwrap();
    assert_eq!(periods[0].record.sales, Some(dec!(100.2)));
    // 0.2 / 100.2 is inside the default tolerance
    assert!(periods[0].warnings.is_empty());
}

#[test]
fn test_reconcile_rejects_empty_and_duplicate_sources() {
    let config = AnalysisConfig::default();
    assert!(matches!(
        reconcile_sources(&[], &config),
        Err(DistressError::InsufficientData(_))
    ));

    let ctx = ResolutionContext::default();
    let s = resolve_source(&edgar_filing(), &ctx).unwrap();
    assert!(matches!(
        reconcile_sources(&[s.clone(), s], &config),
        Err(DistressError::InvalidInput { .. })
    ));
}
