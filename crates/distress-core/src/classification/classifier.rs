//! Company classification: industry category from SIC code, listing
//! status, emerging-market flag and maturity stage.
//!
//! Classification never fails. Every missing input resolves to a
//! documented default and adds a warning to the profile.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classification::regions::is_emerging_market;
use crate::config::AnalysisConfig;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Company metadata as delivered by the metadata fetcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Four-digit SIC code.
    #[serde(default)]
    pub industry_code: Option<u32>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub listing_date: Option<NaiveDate>,
    #[serde(default)]
    pub founding_year: Option<i32>,
    /// ISO 3166 code or English country name.
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndustryCategory {
    Manufacturing,
    Technology,
    Financial,
    Utility,
    Transportation,
    Trade,
    Resources,
    Construction,
    Services,
    PublicAdministration,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaturityStage {
    EarlyStage,
    Growth,
    Mature,
}

impl std::fmt::Display for MaturityStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EarlyStage => write!(f, "early-stage"),
            Self::Growth => write!(f, "growth"),
            Self::Mature => write!(f, "mature"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub industry_code: Option<u32>,
    pub industry_category: IndustryCategory,
    pub is_public: bool,
    pub is_emerging_market: bool,
    pub maturity_stage: MaturityStage,
    /// Whole years since listing (or founding); `None` when unknown.
    pub age_years: Option<u32>,
    pub warnings: Vec<String>,
}

/// An inclusive SIC code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SicRange {
    pub low: u32,
    pub high: u32,
    pub category: IndustryCategory,
    pub label: &'static str,
}

impl SicRange {
    pub fn contains(&self, code: u32) -> bool {
        (self.low..=self.high).contains(&code)
    }
}

// ---------------------------------------------------------------------------
// SIC ranges (inclusive on both ends)
// ---------------------------------------------------------------------------

pub const MANUFACTURING_RANGE: SicRange = SicRange {
    low: 2000,
    high: 3999,
    category: IndustryCategory::Manufacturing,
    label: "manufacturing",
};

/// Non-manufacturing ranges. Sub-ranges precede the ranges enclosing them.
pub const NON_MANUFACTURING_RANGES: &[SicRange] = &[
    SicRange {
        low: 7370,
        high: 7379,
        category: IndustryCategory::Technology,
        label: "computer programming, data processing and software",
    },
    SicRange {
        low: 100,
        high: 999,
        category: IndustryCategory::Resources,
        label: "agriculture, forestry and fishing",
    },
    SicRange {
        low: 1000,
        high: 1499,
        category: IndustryCategory::Resources,
        label: "mining",
    },
    SicRange {
        low: 1500,
        high: 1799,
        category: IndustryCategory::Construction,
        label: "construction",
    },
    SicRange {
        low: 4000,
        high: 4899,
        category: IndustryCategory::Transportation,
        label: "transportation and communications",
    },
    SicRange {
        low: 4900,
        high: 4999,
        category: IndustryCategory::Utility,
        label: "electric, gas and sanitary services",
    },
    SicRange {
        low: 5000,
        high: 5199,
        category: IndustryCategory::Trade,
        label: "wholesale trade",
    },
    SicRange {
        low: 5200,
        high: 5999,
        category: IndustryCategory::Trade,
        label: "retail trade",
    },
    SicRange {
        low: 6000,
        high: 6799,
        category: IndustryCategory::Financial,
        label: "finance, insurance and real estate",
    },
    SicRange {
        low: 7000,
        high: 8999,
        category: IndustryCategory::Services,
        label: "services",
    },
    SicRange {
        low: 9100,
        high: 9729,
        category: IndustryCategory::PublicAdministration,
        label: "public administration",
    },
];

/// Industries whose growth phase runs longer (pharma/biotech, computer
/// hardware, electronics, software, commercial research).
const RD_INTENSIVE_RANGES: &[(u32, u32)] = &[
    (2833, 2836),
    (3570, 3579),
    (3660, 3679),
    (7370, 7379),
    (8731, 8731),
];

pub fn is_manufacturing(code: u32) -> bool {
    MANUFACTURING_RANGE.contains(code)
}

/// The first non-manufacturing range containing `code`.
pub fn non_manufacturing_range(code: u32) -> Option<&'static SicRange> {
    NON_MANUFACTURING_RANGES.iter().find(|r| r.contains(code))
}

pub fn industry_category(code: u32) -> IndustryCategory {
    if is_manufacturing(code) {
        return IndustryCategory::Manufacturing;
    }
    non_manufacturing_range(code)
        .map(|r| r.category)
        .unwrap_or(IndustryCategory::Unknown)
}

fn is_rd_intensive(code: u32) -> bool {
    RD_INTENSIVE_RANGES
        .iter()
        .any(|(low, high)| (*low..=*high).contains(&code))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive a [`CompanyProfile`] from fetched metadata.
///
/// `as_of` is the reference date for the company's age; it is normally the
/// latest period end under analysis.
pub fn classify_company(
    metadata: &CompanyMetadata,
    as_of: Option<NaiveDate>,
    config: &AnalysisConfig,
) -> CompanyProfile {
    let mut warnings = Vec::new();

    let industry_category = match metadata.industry_code {
        Some(code) => {
            let category = industry_category(code);
            if category == IndustryCategory::Unknown {
                warnings.push(format!(
                    "Industry code {code} is outside every recognised SIC range."
                ));
            }
            category
        }
        None => {
            warnings.push("Industry code missing; industry category is unknown.".to_string());
            IndustryCategory::Unknown
        }
    };

    let is_public = match metadata.is_public {
        Some(flag) => flag,
        None => {
            let inferred = metadata.listing_date.is_some();
            warnings.push(format!(
                "Listing status missing; assumed {} from {} listing date.",
                if inferred { "public" } else { "private" },
                if inferred { "the presence of a" } else { "the absence of a" },
            ));
            inferred
        }
    };

    let is_emerging_market = match metadata.country.as_deref().map(str::trim) {
        Some(country) if !country.is_empty() => is_emerging_market(country),
        _ => {
            warnings.push(
                "Country/region missing; emerging-market flag defaulted to false.".to_string(),
            );
            false
        }
    };

    let (maturity_stage, age_years) = derive_maturity(metadata, as_of, config, &mut warnings);

    for w in &warnings {
        warn!(company = metadata.name.as_deref().unwrap_or("-"), "{w}");
    }
    debug!(
        ?industry_category,
        is_public,
        is_emerging_market,
        %maturity_stage,
        "classified company"
    );

    CompanyProfile {
        industry_code: metadata.industry_code,
        industry_category,
        is_public,
        is_emerging_market,
        maturity_stage,
        age_years,
        warnings,
    }
}

/// Whole years elapsed from `start` to `end`, or `None` when `start` is
/// later than `end`.
pub fn whole_years_between(start: NaiveDate, end: NaiveDate) -> Option<u32> {
    if start > end {
        return None;
    }
    let mut years = end.year() - start.year();
    if (end.month(), end.day()) < (start.month(), start.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn derive_maturity(
    metadata: &CompanyMetadata,
    as_of: Option<NaiveDate>,
    config: &AnalysisConfig,
    warnings: &mut Vec<String>,
) -> (MaturityStage, Option<u32>) {
    let start = metadata.listing_date.or_else(|| {
        metadata
            .founding_year
            .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
    });

    let Some(start) = start else {
        warnings.push(
            "No listing or founding date; maturity stage defaulted to mature.".to_string(),
        );
        return (MaturityStage::Mature, None);
    };
    let Some(as_of) = as_of else {
        warnings.push(
            "No reference date to measure company age; maturity stage defaulted to mature."
                .to_string(),
        );
        return (MaturityStage::Mature, None);
    };
    let Some(age) = whole_years_between(start, as_of) else {
        warnings.push(format!(
            "Listing/founding date {start} is after the reference date {as_of}; \
             maturity stage defaulted to mature."
        ));
        return (MaturityStage::Mature, None);
    };

    let m = &config.maturity;
    let growth_limit = match metadata.industry_code {
        Some(code) if is_rd_intensive(code) => m.extended_growth_years,
        _ => m.growth_years,
    };

    let stage = if age < m.early_stage_years {
        MaturityStage::EarlyStage
    } else if age < growth_limit {
        MaturityStage::Growth
    } else {
        MaturityStage::Mature
    };
    (stage, Some(age))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn us_manufacturer() -> CompanyMetadata {
        CompanyMetadata {
            name: Some("Acme Industrial".into()),
            industry_code: Some(3711),
            is_public: Some(true),
            listing_date: Some(d(1995, 6, 1)),
            founding_year: Some(1980),
            country: Some("US".into()),
        }
    }

    #[test]
    fn test_mature_public_manufacturer() {
        let p = classify_company(&us_manufacturer(), Some(d(2024, 3, 31)), &AnalysisConfig::default());
        assert_eq!(p.industry_category, IndustryCategory::Manufacturing);
        assert!(p.is_public);
        assert!(!p.is_emerging_market);
        assert_eq!(p.maturity_stage, MaturityStage::Mature);
        assert_eq!(p.age_years, Some(28));
        assert!(p.warnings.is_empty());
    }

    #[test]
    fn test_no_dates_defaults_to_mature_with_warning() {
        let meta = CompanyMetadata {
            listing_date: None,
            founding_year: None,
            ..us_manufacturer()
        };
        let p = classify_company(&meta, Some(d(2024, 3, 31)), &AnalysisConfig::default());
        assert_eq!(p.maturity_stage, MaturityStage::Mature);
        assert_eq!(p.age_years, None);
        assert!(p.warnings.iter().any(|w| w.contains("defaulted to mature")));
    }

    #[test]
    fn test_maturity_thresholds() {
        let config = AnalysisConfig::default();
        let as_of = d(2024, 3, 31);
        let stage = |listed: NaiveDate, code: u32| {
            let meta = CompanyMetadata {
                industry_code: Some(code),
                listing_date: Some(listed),
                ..us_manufacturer()
            };
            classify_company(&meta, Some(as_of), &config).maturity_stage
        };
        assert_eq!(stage(d(2022, 1, 1), 3711), MaturityStage::EarlyStage);
        assert_eq!(stage(d(2021, 3, 31), 3711), MaturityStage::Growth);
        assert_eq!(stage(d(2014, 3, 31), 3711), MaturityStage::Mature);
        // Software keeps its growth stage longer.
        assert_eq!(stage(d(2014, 3, 31), 7372), MaturityStage::Growth);
        assert_eq!(stage(d(2009, 3, 31), 7372), MaturityStage::Mature);
    }

    #[test]
    fn test_founding_year_used_without_listing_date() {
        let meta = CompanyMetadata {
            listing_date: None,
            founding_year: Some(2020),
            ..us_manufacturer()
        };
        let p = classify_company(&meta, Some(d(2024, 3, 31)), &AnalysisConfig::default());
        assert_eq!(p.age_years, Some(4));
        assert_eq!(p.maturity_stage, MaturityStage::Growth);
    }

    #[test]
    fn test_emerging_market_country() {
        let meta = CompanyMetadata {
            country: Some("Brazil".into()),
            ..us_manufacturer()
        };
        let p = classify_company(&meta, Some(d(2024, 3, 31)), &AnalysisConfig::default());
        assert!(p.is_emerging_market);
    }

    #[test]
    fn test_missing_country_defaults_false_with_warning() {
        let meta = CompanyMetadata {
            country: None,
            ..us_manufacturer()
        };
        let p = classify_company(&meta, Some(d(2024, 3, 31)), &AnalysisConfig::default());
        assert!(!p.is_emerging_market);
        assert!(p.warnings.iter().any(|w| w.contains("emerging-market")));
    }

    #[test]
    fn test_missing_listing_status_inferred_from_listing_date() {
        let meta = CompanyMetadata {
            is_public: None,
            ..us_manufacturer()
        };
        let p = classify_company(&meta, Some(d(2024, 3, 31)), &AnalysisConfig::default());
        assert!(p.is_public);
        assert_eq!(p.warnings.len(), 1);
    }

    #[test]
    fn test_industry_categories() {
        assert_eq!(industry_category(2000), IndustryCategory::Manufacturing);
        assert_eq!(industry_category(3999), IndustryCategory::Manufacturing);
        assert_eq!(industry_category(7372), IndustryCategory::Technology);
        assert_eq!(industry_category(7011), IndustryCategory::Services);
        assert_eq!(industry_category(6021), IndustryCategory::Financial);
        assert_eq!(industry_category(4911), IndustryCategory::Utility);
        assert_eq!(industry_category(1850), IndustryCategory::Unknown);
        assert_eq!(industry_category(9999), IndustryCategory::Unknown);
    }

    #[test]
    fn test_whole_years_between() {
        assert_eq!(whole_years_between(d(2020, 6, 30), d(2024, 6, 29)), Some(3));
        assert_eq!(whole_years_between(d(2020, 6, 30), d(2024, 6, 30)), Some(4));
        assert_eq!(whole_years_between(d(2025, 1, 1), d(2024, 1, 1)), None);
    }
}
