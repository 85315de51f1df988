//! Prioritized matching rules per canonical field and auxiliary concept.
//!
//! Rules are evaluated strictly in the order listed. All terms are written
//! in normalized label form (see [`normalize_label`]): lowercase, words
//! separated by single spaces, no punctuation, camelCase split.

use crate::normalization::schema::{AuxiliaryConcept, CanonicalField, Concept};

// ---------------------------------------------------------------------------
// Rule types
// ---------------------------------------------------------------------------

/// Condition a proxy rule needs before it may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyCondition {
    FinancialInstitution,
}

#[derive(Debug, Clone, Copy)]
pub enum MatchRule {
    /// Canonical labels: the field name and the primary filing tag.
    Exact(&'static [&'static str]),
    /// Abbreviations, alternate tags and translated terms.
    Synonym(&'static [&'static str]),
    /// Whole-word containment, rejected when any exclusion is present.
    Keyword {
        contains: &'static str,
        excludes: &'static [&'static str],
    },
    /// Domain-specific stand-in, only applied when the condition holds.
    Proxy {
        contains: &'static str,
        excludes: &'static [&'static str],
        condition: ProxyCondition,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityOp {
    Sum,
    Difference,
    /// Product of a count and a per-unit price; the result is an absolute
    /// currency amount rather than an amount in the source's unit.
    AbsoluteProduct,
}

/// An algebraic identity used to infer an unresolved canonical field.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub target: CanonicalField,
    pub left: Concept,
    pub op: IdentityOp,
    pub right: Concept,
    pub formula: &'static str,
}

// ---------------------------------------------------------------------------
// Label normalization
// ---------------------------------------------------------------------------

/// Canonicalize a raw label for matching.
///
/// `us-gaap:AssetsCurrent`, `Assets_Current` and ` assets  current ` all
/// normalize to `assets current`.
pub fn normalize_label(raw: &str) -> String {
    let without_namespace = raw.rsplit(':').next().unwrap_or(raw);
    let chars: Vec<char> = without_namespace.chars().collect();
    let mut spaced = String::with_capacity(chars.len() + 8);

    for (i, &c) in chars.iter().enumerate() {
        if c == '\'' || c == '’' {
            continue;
        }
        if !c.is_alphanumeric() {
            spaced.push(' ');
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                spaced.push(' ');
            }
        }
        spaced.extend(c.to_lowercase());
    }

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whole-word containment on normalized labels.
pub fn contains_words(label: &str, words: &str) -> bool {
    format!(" {label} ").contains(&format!(" {words} "))
}

// ---------------------------------------------------------------------------
// Canonical field rules
// ---------------------------------------------------------------------------

const TOTAL_ASSETS: &[MatchRule] = &[
    MatchRule::Exact(&["total assets", "assets"]),
    MatchRule::Synonym(&[
        "ta",
        "total asset",
        "assets total",
        "sum of assets",
        "activo total",
        "total activos",
        "actif total",
        "total de l actif",
        "bilanzsumme",
        "summe aktiva",
        "totale attivo",
        "ativo total",
        "資産合計",
        "总资产",
        "资产总计",
    ]),
    MatchRule::Keyword {
        contains: "total assets",
        excludes: &["current", "noncurrent", "non", "other", "average", "segment"],
    },
];

const CURRENT_ASSETS: &[MatchRule] = &[
    MatchRule::Exact(&["current assets", "assets current", "total current assets"]),
    MatchRule::Synonym(&[
        "ca",
        "tca",
        "current asset",
        "actifs courants",
        "actif circulant",
        "activo corriente",
        "activo circulante",
        "umlaufvermögen",
        "kurzfristige vermögenswerte",
        "attività correnti",
        "ativo circulante",
        "流動資産合計",
        "流动资产合计",
    ]),
    MatchRule::Keyword {
        contains: "current assets",
        excludes: &["non", "noncurrent", "other", "prepaid"],
    },
];

const CURRENT_LIABILITIES: &[MatchRule] = &[
    MatchRule::Exact(&[
        "current liabilities",
        "liabilities current",
        "total current liabilities",
    ]),
    MatchRule::Synonym(&[
        "cl",
        "tcl",
        "current liability",
        "passifs courants",
        "passif circulant",
        "pasivo corriente",
        "pasivo circulante",
        "kurzfristige verbindlichkeiten",
        "passività correnti",
        "passivo circulante",
        "流動負債合計",
        "流动负债合计",
    ]),
    MatchRule::Keyword {
        contains: "current liabilities",
        excludes: &["non", "noncurrent", "other", "accrued"],
    },
];

const TOTAL_LIABILITIES: &[MatchRule] = &[
    MatchRule::Exact(&["total liabilities", "liabilities"]),
    MatchRule::Synonym(&[
        "tl",
        "total liab",
        "total liabilities net minority interest",
        "pasivo total",
        "total pasivo",
        "total des passifs",
        "passif total",
        "verbindlichkeiten gesamt",
        "summe verbindlichkeiten",
        "totale passività",
        "passivo total",
        "負債合計",
        "负债合计",
    ]),
    MatchRule::Keyword {
        contains: "total liabilities",
        excludes: &["and", "equity", "current", "noncurrent", "non", "other"],
    },
];

const RETAINED_EARNINGS: &[MatchRule] = &[
    MatchRule::Exact(&[
        "retained earnings",
        "retained earnings accumulated deficit",
    ]),
    MatchRule::Synonym(&[
        "re",
        "accumulated deficit",
        "retained deficit",
        "accumulated earnings",
        "earned surplus",
        "résultats non distribués",
        "bénéfices non répartis",
        "utilidades retenidas",
        "resultados acumulados",
        "gewinnrücklagen",
        "utili portati a nuovo",
        "lucros acumulados",
        "利益剰余金",
        "留存收益",
        "未分配利润",
    ]),
    MatchRule::Keyword {
        contains: "retained earnings",
        excludes: &["adjustment", "appropriated", "statement", "other"],
    },
    MatchRule::Keyword {
        contains: "accumulated deficit",
        excludes: &["other"],
    },
];

const EBIT: &[MatchRule] = &[
    MatchRule::Exact(&["ebit", "operating income loss", "operating income"]),
    MatchRule::Synonym(&[
        "earnings before interest and taxes",
        "earnings before interest and tax",
        "operating profit",
        "operating profit loss",
        "income from operations",
        "total operating income as reported",
        "résultat d exploitation",
        "resultado operativo",
        "resultado de explotación",
        "betriebsergebnis",
        "risultato operativo",
        "営業利益",
        "营业利润",
    ]),
    MatchRule::Keyword {
        contains: "operating income",
        excludes: &["non", "nonoperating", "other", "expense", "expenses", "per share"],
    },
    MatchRule::Keyword {
        contains: "operating profit",
        excludes: &["margin", "other"],
    },
    MatchRule::Keyword {
        contains: "ebit",
        excludes: &["margin"],
    },
];

const SALES: &[MatchRule] = &[
    MatchRule::Exact(&["sales", "revenues", "revenue", "total revenue"]),
    MatchRule::Synonym(&[
        "net sales",
        "turnover",
        "sales revenue net",
        "revenue from contract with customer excluding assessed tax",
        "revenue from contract with customer including assessed tax",
        "chiffre d affaires",
        "ventas",
        "ingresos",
        "umsatzerlöse",
        "umsatz",
        "ricavi",
        "receita",
        "売上高",
        "营业收入",
        "营业总收入",
    ]),
    MatchRule::Keyword {
        contains: "total revenue",
        excludes: &["cost", "per share", "growth"],
    },
    MatchRule::Keyword {
        contains: "revenue",
        excludes: &["cost", "deferred", "unearned", "per share", "other", "growth"],
    },
    MatchRule::Keyword {
        contains: "operating revenue",
        excludes: &["cost", "per share"],
    },
    MatchRule::Keyword {
        contains: "sales",
        excludes: &["cost", "costs", "marketable", "per share", "proceeds", "selling", "of"],
    },
    MatchRule::Proxy {
        contains: "total interest income",
        excludes: &["expense", "non", "noninterest"],
        condition: ProxyCondition::FinancialInstitution,
    },
    MatchRule::Proxy {
        contains: "interest income",
        excludes: &["expense", "non", "noninterest", "other"],
        condition: ProxyCondition::FinancialInstitution,
    },
];

const BOOK_VALUE_EQUITY: &[MatchRule] = &[
    MatchRule::Exact(&[
        "book value equity",
        "stockholders equity",
        "total stockholders equity",
        "shareholders equity",
        "total equity",
    ]),
    MatchRule::Synonym(&[
        "bve",
        "total shareholders equity",
        "stockholders equity including portion attributable to noncontrolling interest",
        "common stock equity",
        "total equity gross minority interest",
        "equity",
        "net assets",
        "capitaux propres",
        "patrimonio neto",
        "eigenkapital",
        "patrimonio netto",
        "patrimônio líquido",
        "純資産合計",
        "股东权益合计",
        "所有者权益合计",
    ]),
    MatchRule::Keyword {
        contains: "stockholders equity",
        excludes: &["liabilities", "other", "statement", "per share"],
    },
    MatchRule::Keyword {
        contains: "shareholders equity",
        excludes: &["liabilities", "other", "statement", "per share"],
    },
    MatchRule::Keyword {
        contains: "total equity",
        excludes: &["liabilities"],
    },
];

const MARKET_VALUE_EQUITY: &[MatchRule] = &[
    MatchRule::Exact(&[
        "market value equity",
        "market cap",
        "market capitalization",
    ]),
    MatchRule::Synonym(&[
        "mve",
        "market capitalisation",
        "mkt cap",
        "marketcap",
        "equity market value",
        "market value of equity",
        "capitalisation boursière",
        "capitalización bursátil",
        "marktkapitalisierung",
        "capitalizzazione di mercato",
        "時価総額",
        "市值",
    ]),
    MatchRule::Keyword {
        contains: "market cap",
        excludes: &["change", "growth"],
    },
    MatchRule::Keyword {
        contains: "market capitalization",
        excludes: &["change", "growth"],
    },
];

// ---------------------------------------------------------------------------
// Auxiliary concept rules
// ---------------------------------------------------------------------------

const ADDITIONAL_PAID_IN_CAPITAL: &[MatchRule] = &[
    MatchRule::Exact(&[
        "additional paid in capital",
        "additional paid in capital common stock",
    ]),
    MatchRule::Synonym(&[
        "apic",
        "capital surplus",
        "share premium",
        "capital in excess of par value",
    ]),
    MatchRule::Keyword {
        contains: "paid in capital",
        excludes: &["other"],
    },
];

const NONCURRENT_ASSETS: &[MatchRule] = &[
    MatchRule::Exact(&[
        "noncurrent assets",
        "assets noncurrent",
        "non current assets",
        "total non current assets",
    ]),
    MatchRule::Keyword {
        contains: "non current assets",
        excludes: &["other"],
    },
    MatchRule::Keyword {
        contains: "noncurrent assets",
        excludes: &["other"],
    },
];

const NONCURRENT_LIABILITIES: &[MatchRule] = &[
    MatchRule::Exact(&[
        "noncurrent liabilities",
        "liabilities noncurrent",
        "non current liabilities",
        "total non current liabilities net minority interest",
    ]),
    MatchRule::Keyword {
        contains: "non current liabilities",
        excludes: &["other"],
    },
    MatchRule::Keyword {
        contains: "noncurrent liabilities",
        excludes: &["other"],
    },
];

const PRETAX_INCOME: &[MatchRule] = &[
    MatchRule::Exact(&[
        "pretax income",
        "income loss from continuing operations before income taxes extraordinary items noncontrolling interest",
    ]),
    MatchRule::Synonym(&[
        "ebt",
        "pre tax income",
        "income before taxes",
        "earnings before taxes",
        "income before income taxes",
    ]),
    MatchRule::Keyword {
        contains: "before income taxes",
        excludes: &["per share"],
    },
];

const INTEREST_EXPENSE: &[MatchRule] = &[
    MatchRule::Exact(&["interest expense"]),
    MatchRule::Synonym(&["interest expense debt", "finance costs", "interest expense non operating"]),
    MatchRule::Keyword {
        contains: "interest expense",
        excludes: &["income", "net"],
    },
];

const GROSS_PROFIT: &[MatchRule] = &[
    MatchRule::Exact(&["gross profit"]),
    MatchRule::Keyword {
        contains: "gross profit",
        excludes: &["margin"],
    },
];

const COST_OF_REVENUE: &[MatchRule] = &[
    MatchRule::Exact(&[
        "cost of revenue",
        "cost of goods and services sold",
        "cost of goods sold",
        "cost of sales",
    ]),
    MatchRule::Synonym(&["cogs", "reconciled cost of revenue"]),
    MatchRule::Keyword {
        contains: "cost of revenue",
        excludes: &[],
    },
    MatchRule::Keyword {
        contains: "cost of goods",
        excludes: &[],
    },
];

const SHARES_OUTSTANDING: &[MatchRule] = &[
    MatchRule::Exact(&[
        "shares outstanding",
        "common stock shares outstanding",
        "ordinary shares number",
    ]),
    MatchRule::Synonym(&["share issued", "dei entity common stock shares outstanding"]),
    MatchRule::Keyword {
        contains: "shares outstanding",
        excludes: &["weighted", "diluted", "treasury"],
    },
];

const SHARE_PRICE: &[MatchRule] = &[
    MatchRule::Exact(&["share price", "close", "last price"]),
    MatchRule::Synonym(&["stock price", "closing price", "regular market price", "current price"]),
    MatchRule::Keyword {
        contains: "closing price",
        excludes: &[],
    },
    MatchRule::Keyword {
        contains: "share price",
        excludes: &["target"],
    },
];

/// Ordered rules for any concept.
pub fn rules_for(concept: Concept) -> &'static [MatchRule] {
    match concept {
        Concept::Canonical(field) => match field {
            CanonicalField::TotalAssets => TOTAL_ASSETS,
            CanonicalField::CurrentAssets => CURRENT_ASSETS,
            CanonicalField::CurrentLiabilities => CURRENT_LIABILITIES,
            CanonicalField::TotalLiabilities => TOTAL_LIABILITIES,
            CanonicalField::RetainedEarnings => RETAINED_EARNINGS,
            CanonicalField::Ebit => EBIT,
            CanonicalField::Sales => SALES,
            CanonicalField::BookValueEquity => BOOK_VALUE_EQUITY,
            CanonicalField::MarketValueEquity => MARKET_VALUE_EQUITY,
        },
        Concept::Auxiliary(aux) => match aux {
            AuxiliaryConcept::AdditionalPaidInCapital => ADDITIONAL_PAID_IN_CAPITAL,
            AuxiliaryConcept::NoncurrentAssets => NONCURRENT_ASSETS,
            AuxiliaryConcept::NoncurrentLiabilities => NONCURRENT_LIABILITIES,
            AuxiliaryConcept::PretaxIncome => PRETAX_INCOME,
            AuxiliaryConcept::InterestExpense => INTEREST_EXPENSE,
            AuxiliaryConcept::GrossProfit => GROSS_PROFIT,
            AuxiliaryConcept::CostOfRevenue => COST_OF_REVENUE,
            AuxiliaryConcept::SharesOutstanding => SHARES_OUTSTANDING,
            AuxiliaryConcept::SharePrice => SHARE_PRICE,
        },
    }
}

// ---------------------------------------------------------------------------
// Identities and distrust list
// ---------------------------------------------------------------------------

use AuxiliaryConcept as Aux;
use CanonicalField as F;

/// Inference identities, tried in order until no further field resolves.
pub const IDENTITIES: &[Identity] = &[
    Identity {
        target: F::RetainedEarnings,
        left: Concept::Canonical(F::BookValueEquity),
        op: IdentityOp::Difference,
        right: Concept::Auxiliary(Aux::AdditionalPaidInCapital),
        formula: "book_value_equity - additional_paid_in_capital",
    },
    Identity {
        target: F::TotalLiabilities,
        left: Concept::Canonical(F::TotalAssets),
        op: IdentityOp::Difference,
        right: Concept::Canonical(F::BookValueEquity),
        formula: "total_assets - book_value_equity",
    },
    Identity {
        target: F::BookValueEquity,
        left: Concept::Canonical(F::TotalAssets),
        op: IdentityOp::Difference,
        right: Concept::Canonical(F::TotalLiabilities),
        formula: "total_assets - total_liabilities",
    },
    Identity {
        target: F::CurrentAssets,
        left: Concept::Canonical(F::TotalAssets),
        op: IdentityOp::Difference,
        right: Concept::Auxiliary(Aux::NoncurrentAssets),
        formula: "total_assets - noncurrent_assets",
    },
    Identity {
        target: F::CurrentLiabilities,
        left: Concept::Canonical(F::TotalLiabilities),
        op: IdentityOp::Difference,
        right: Concept::Auxiliary(Aux::NoncurrentLiabilities),
        formula: "total_liabilities - noncurrent_liabilities",
    },
    Identity {
        target: F::Ebit,
        left: Concept::Auxiliary(Aux::PretaxIncome),
        op: IdentityOp::Sum,
        right: Concept::Auxiliary(Aux::InterestExpense),
        formula: "pretax_income + interest_expense",
    },
    Identity {
        target: F::Sales,
        left: Concept::Auxiliary(Aux::GrossProfit),
        op: IdentityOp::Sum,
        right: Concept::Auxiliary(Aux::CostOfRevenue),
        formula: "gross_profit + cost_of_revenue",
    },
    Identity {
        target: F::MarketValueEquity,
        left: Concept::Auxiliary(Aux::SharesOutstanding),
        op: IdentityOp::AbsoluteProduct,
        right: Concept::Auxiliary(Aux::SharePrice),
        formula: "shares_outstanding * share_price",
    },
];

/// Fields where a literal zero from a direct match is historically a
/// reporting gap rather than a real value.
pub const ZERO_DISTRUSTED: &[CanonicalField] = &[F::RetainedEarnings, F::Ebit];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_xbrl_tag() {
        assert_eq!(normalize_label("us-gaap:AssetsCurrent"), "assets current");
        assert_eq!(
            normalize_label("us-gaap:RetainedEarningsAccumulatedDeficit"),
            "retained earnings accumulated deficit"
        );
        assert_eq!(normalize_label("ifrs-full:Revenue"), "revenue");
    }

    #[test]
    fn test_normalize_market_data_labels() {
        assert_eq!(normalize_label("Total Assets"), "total assets");
        assert_eq!(normalize_label("Stockholders' Equity"), "stockholders equity");
        assert_eq!(normalize_label("  Net_Sales  "), "net sales");
        assert_eq!(normalize_label("marketCap"), "market cap");
        assert_eq!(normalize_label("EBIT"), "ebit");
        assert_eq!(normalize_label("EBITMargin"), "ebit margin");
    }

    #[test]
    fn test_normalize_keeps_non_latin_scripts() {
        assert_eq!(normalize_label("Umsatzerlöse"), "umsatzerlöse");
        assert_eq!(normalize_label("資産合計"), "資産合計");
    }

    #[test]
    fn test_contains_words_respects_boundaries() {
        assert!(contains_words("total revenue net", "total revenue"));
        assert!(!contains_words("ebitda", "ebit"));
        assert!(!contains_words("prepaid expenses", "re"));
    }

    #[test]
    fn test_every_concept_has_rules() {
        for field in CanonicalField::ALL {
            assert!(!rules_for(Concept::Canonical(field)).is_empty(), "{field}");
        }
        for aux in AuxiliaryConcept::ALL {
            assert!(!rules_for(Concept::Auxiliary(aux)).is_empty(), "{}", aux.name());
        }
    }

    #[test]
    fn test_rule_terms_are_normalized() {
        let all = CanonicalField::ALL
            .into_iter()
            .map(Concept::Canonical)
            .chain(AuxiliaryConcept::ALL.into_iter().map(Concept::Auxiliary));
        for concept in all {
            for rule in rules_for(concept) {
                let terms: Vec<&str> = match rule {
                    MatchRule::Exact(t) | MatchRule::Synonym(t) => t.to_vec(),
                    MatchRule::Keyword { contains, excludes }
                    | MatchRule::Proxy {
                        contains, excludes, ..
                    } => std::iter::once(*contains).chain(excludes.iter().copied()).collect(),
                };
                for term in terms {
                    assert_eq!(normalize_label(term), term, "term not normalized: {term}");
                }
            }
        }
    }
}
