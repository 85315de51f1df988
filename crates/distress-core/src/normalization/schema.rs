//! Canonical line items, resolution provenance and the normalized
//! per-period record every downstream stage consumes.
//!
//! Canonical values are always millions of the reporting currency rounded
//! to [`CANONICAL_PRECISION`](crate::types::CANONICAL_PRECISION) places.
//! An absent value means "unresolved", never zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// The fixed set of line items the scoring formulas require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    TotalAssets,
    CurrentAssets,
    CurrentLiabilities,
    TotalLiabilities,
    RetainedEarnings,
    Ebit,
    Sales,
    BookValueEquity,
    MarketValueEquity,
}

impl CanonicalField {
    /// Every canonical field, in canonical order.
    pub const ALL: [CanonicalField; 9] = [
        Self::TotalAssets,
        Self::CurrentAssets,
        Self::CurrentLiabilities,
        Self::TotalLiabilities,
        Self::RetainedEarnings,
        Self::Ebit,
        Self::Sales,
        Self::BookValueEquity,
        Self::MarketValueEquity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::TotalAssets => "total_assets",
            Self::CurrentAssets => "current_assets",
            Self::CurrentLiabilities => "current_liabilities",
            Self::TotalLiabilities => "total_liabilities",
            Self::RetainedEarnings => "retained_earnings",
            Self::Ebit => "ebit",
            Self::Sales => "sales",
            Self::BookValueEquity => "book_value_equity",
            Self::MarketValueEquity => "market_value_equity",
        }
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Line items that are never part of a canonical record but feed the
/// inference identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxiliaryConcept {
    AdditionalPaidInCapital,
    NoncurrentAssets,
    NoncurrentLiabilities,
    PretaxIncome,
    InterestExpense,
    GrossProfit,
    CostOfRevenue,
    SharesOutstanding,
    SharePrice,
}

impl AuxiliaryConcept {
    pub const ALL: [AuxiliaryConcept; 9] = [
        Self::AdditionalPaidInCapital,
        Self::NoncurrentAssets,
        Self::NoncurrentLiabilities,
        Self::PretaxIncome,
        Self::InterestExpense,
        Self::GrossProfit,
        Self::CostOfRevenue,
        Self::SharesOutstanding,
        Self::SharePrice,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::AdditionalPaidInCapital => "additional_paid_in_capital",
            Self::NoncurrentAssets => "noncurrent_assets",
            Self::NoncurrentLiabilities => "noncurrent_liabilities",
            Self::PretaxIncome => "pretax_income",
            Self::InterestExpense => "interest_expense",
            Self::GrossProfit => "gross_profit",
            Self::CostOfRevenue => "cost_of_revenue",
            Self::SharesOutstanding => "shares_outstanding",
            Self::SharePrice => "share_price",
        }
    }
}

/// Anything the resolver can look up: a canonical field or an auxiliary
/// operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Concept {
    Canonical(CanonicalField),
    Auxiliary(AuxiliaryConcept),
}

impl Concept {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Canonical(f) => f.name(),
            Self::Auxiliary(a) => a.name(),
        }
    }
}

/// How a canonical value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    ExactMatch,
    SynonymMatch,
    Inferred,
    Unresolved,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExactMatch => write!(f, "exact-match"),
            Self::SynonymMatch => write!(f, "synonym-match"),
            Self::Inferred => write!(f, "inferred"),
            Self::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// The rule variant that produced a match. Keyword and proxy hits are
/// reported with `SynonymMatch` provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Exact,
    Synonym,
    Keyword,
    Proxy,
    Inferred,
}

impl RuleKind {
    pub fn provenance(&self) -> Provenance {
        match self {
            Self::Exact => Provenance::ExactMatch,
            Self::Synonym | Self::Keyword | Self::Proxy => Provenance::SynonymMatch,
            Self::Inferred => Provenance::Inferred,
        }
    }
}

/// Resolution result for one canonical field of one source and period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub field: CanonicalField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_label: Option<String>,
    /// Millions, canonical precision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Money>,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<RuleKind>,
    /// Identity used when the value was inferred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl FieldMapping {
    pub fn unresolved(field: CanonicalField, note: Option<String>) -> Self {
        Self {
            field,
            source_label: None,
            value: None,
            provenance: Provenance::Unresolved,
            rule: None,
            formula: None,
            note,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.provenance != Provenance::Unresolved && self.value.is_some()
    }
}

/// One reporting period's normalized financials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub period_end: NaiveDate,
    pub total_assets: Option<Money>,
    pub current_assets: Option<Money>,
    pub current_liabilities: Option<Money>,
    pub total_liabilities: Option<Money>,
    pub retained_earnings: Option<Money>,
    pub ebit: Option<Money>,
    pub sales: Option<Money>,
    pub book_value_equity: Option<Money>,
    pub market_value_equity: Option<Money>,
}

impl CanonicalRecord {
    /// A record with every field unresolved.
    pub fn empty(period_end: NaiveDate) -> Self {
        Self {
            period_end,
            total_assets: None,
            current_assets: None,
            current_liabilities: None,
            total_liabilities: None,
            retained_earnings: None,
            ebit: None,
            sales: None,
            book_value_equity: None,
            market_value_equity: None,
        }
    }

    /// Build a record from resolved `(field, value)` pairs.
    pub fn from_values(
        period_end: NaiveDate,
        values: impl IntoIterator<Item = (CanonicalField, Money)>,
    ) -> Self {
        values
            .into_iter()
            .fold(Self::empty(period_end), |record, (field, value)| {
                record.with_field(field, Some(value))
            })
    }

    /// A new record identical to this one except for `field`.
    pub fn with_field(mut self, field: CanonicalField, value: Option<Money>) -> Self {
        *self.slot_mut(field) = value;
        self
    }

    pub fn get(&self, field: CanonicalField) -> Option<Money> {
        match field {
            CanonicalField::TotalAssets => self.total_assets,
            CanonicalField::CurrentAssets => self.current_assets,
            CanonicalField::CurrentLiabilities => self.current_liabilities,
            CanonicalField::TotalLiabilities => self.total_liabilities,
            CanonicalField::RetainedEarnings => self.retained_earnings,
            CanonicalField::Ebit => self.ebit,
            CanonicalField::Sales => self.sales,
            CanonicalField::BookValueEquity => self.book_value_equity,
            CanonicalField::MarketValueEquity => self.market_value_equity,
        }
    }

    /// Fields with no value, in canonical order.
    pub fn unresolved_fields(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    fn slot_mut(&mut self, field: CanonicalField) -> &mut Option<Money> {
        match field {
            CanonicalField::TotalAssets => &mut self.total_assets,
            CanonicalField::CurrentAssets => &mut self.current_assets,
            CanonicalField::CurrentLiabilities => &mut self.current_liabilities,
            CanonicalField::TotalLiabilities => &mut self.total_liabilities,
            CanonicalField::RetainedEarnings => &mut self.retained_earnings,
            CanonicalField::Ebit => &mut self.ebit,
            CanonicalField::Sales => &mut self.sales,
            CanonicalField::BookValueEquity => &mut self.book_value_equity,
            CanonicalField::MarketValueEquity => &mut self.market_value_equity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    #[test]
    fn test_record_from_values() {
        let record = CanonicalRecord::from_values(
            date(),
            [
                (CanonicalField::TotalAssets, dec!(792.2)),
                (CanonicalField::Sales, dec!(259.8)),
            ],
        );
        assert_eq!(record.get(CanonicalField::TotalAssets), Some(dec!(792.2)));
        assert_eq!(record.sales, Some(dec!(259.8)));
        assert_eq!(record.ebit, None);
        assert_eq!(record.unresolved_fields().len(), 7);
    }

    #[test]
    fn test_with_field_leaves_original_untouched() {
        let original = CanonicalRecord::empty(date());
        let updated = original.clone().with_field(CanonicalField::Ebit, Some(dec!(-59.1)));
        assert_eq!(original.ebit, None);
        assert_eq!(updated.ebit, Some(dec!(-59.1)));
    }

    #[test]
    fn test_provenance_serializes_kebab_case() {
        let json = serde_json::to_string(&Provenance::SynonymMatch).unwrap();
        assert_eq!(json, "\"synonym-match\"");
        assert_eq!(RuleKind::Keyword.provenance(), Provenance::SynonymMatch);
        assert_eq!(RuleKind::Proxy.provenance(), Provenance::SynonymMatch);
    }

    #[test]
    fn test_canonical_order_matches_ord() {
        let mut sorted = CanonicalField::ALL;
        sorted.sort();
        assert_eq!(sorted, CanonicalField::ALL);
    }
}
