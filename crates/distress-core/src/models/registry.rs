//! Static table of Z-Score model variants.
//!
//! The standard registry is built once per process and shared by
//! reference. Custom registries (e.g. loaded from a JSON definitions file)
//! go through [`ModelRegistry::from_definitions`], which enforces the same
//! invariants.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::normalization::schema::CanonicalField;
use crate::{DistressError, DistressResult};

pub const MODEL_PUBLIC_MANUFACTURING: &str = "public-manufacturing";
pub const MODEL_PRIVATE_MANUFACTURING: &str = "private-manufacturing";
pub const MODEL_PUBLIC_SERVICE: &str = "public-service";
pub const MODEL_PRIVATE_SERVICE: &str = "private-service";
pub const MODEL_EMERGING_MARKET: &str = "emerging-market";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Ratio identifiers, in the conventional X1..X5 order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RatioId {
    /// X1: (current_assets - current_liabilities) / total_assets
    #[serde(rename = "liquidity_ratio")]
    Liquidity,
    /// X2: retained_earnings / total_assets
    #[serde(rename = "reinvestment_ratio")]
    Reinvestment,
    /// X3: ebit / total_assets
    #[serde(rename = "profitability_ratio")]
    Profitability,
    /// X4: equity / total_liabilities
    #[serde(rename = "leverage_ratio")]
    Leverage,
    /// X5: sales / total_assets
    #[serde(rename = "turnover_ratio")]
    Turnover,
}

impl RatioId {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Liquidity => "liquidity_ratio",
            Self::Reinvestment => "reinvestment_ratio",
            Self::Profitability => "profitability_ratio",
            Self::Leverage => "leverage_ratio",
            Self::Turnover => "turnover_ratio",
        }
    }

    /// Canonical fields the ratio reads under the given equity basis.
    pub fn inputs(&self, basis: EquityBasis) -> &'static [CanonicalField] {
        use CanonicalField as F;
        match self {
            Self::Liquidity => &[F::CurrentAssets, F::CurrentLiabilities, F::TotalAssets],
            Self::Reinvestment => &[F::RetainedEarnings, F::TotalAssets],
            Self::Profitability => &[F::Ebit, F::TotalAssets],
            Self::Leverage => match basis {
                EquityBasis::Market => &[F::MarketValueEquity, F::TotalLiabilities],
                EquityBasis::Book => &[F::BookValueEquity, F::TotalLiabilities],
            },
            Self::Turnover => &[F::Sales, F::TotalAssets],
        }
    }
}

impl std::fmt::Display for RatioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which equity figure the leverage ratio uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquityBasis {
    Market,
    Book,
}

impl EquityBasis {
    pub fn field(&self) -> CanonicalField {
        match self {
            Self::Market => CanonicalField::MarketValueEquity,
            Self::Book => CanonicalField::BookValueEquity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneThresholds {
    /// Scores at or below this are in the distress zone.
    pub distress_upper: Decimal,
    /// Scores strictly above this are in the safe zone.
    pub safe_lower: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub model_key: String,
    #[serde(default)]
    pub description: String,
    pub coefficients: BTreeMap<RatioId, Decimal>,
    #[serde(default)]
    pub intercept: Decimal,
    pub equity_basis: EquityBasis,
    /// Derived from the coefficients and equity basis when omitted.
    #[serde(default)]
    pub required_fields: BTreeSet<CanonicalField>,
    pub thresholds: ZoneThresholds,
}

impl ModelDefinition {
    pub fn new(
        model_key: &str,
        description: &str,
        coefficients: &[(RatioId, Decimal)],
        intercept: Decimal,
        equity_basis: EquityBasis,
        thresholds: ZoneThresholds,
    ) -> Self {
        let coefficients: BTreeMap<RatioId, Decimal> = coefficients.iter().copied().collect();
        let required_fields = derive_required_fields(&coefficients, equity_basis);
        Self {
            model_key: model_key.to_string(),
            description: description.to_string(),
            coefficients,
            intercept,
            equity_basis,
            required_fields,
            thresholds,
        }
    }

    /// Required fields when the leverage ratio is computed on `basis`.
    ///
    /// Extra fields declared on the definition are always kept.
    pub fn required_fields_for(&self, basis: EquityBasis) -> BTreeSet<CanonicalField> {
        let default_derived = derive_required_fields(&self.coefficients, self.equity_basis);
        let extras = self.required_fields.difference(&default_derived).copied();
        derive_required_fields(&self.coefficients, basis)
            .into_iter()
            .chain(extras)
            .collect()
    }

    pub fn uses_ratio(&self, ratio: RatioId) -> bool {
        self.coefficients.contains_key(&ratio)
    }

    pub fn validate(&self) -> DistressResult<()> {
        let invalid = |reason: &str| DistressError::InvalidModel {
            model_key: self.model_key.clone(),
            reason: reason.to_string(),
        };
        if self.model_key.trim().is_empty() {
            return Err(invalid("Model key cannot be empty."));
        }
        if self.coefficients.is_empty() {
            return Err(invalid("At least one ratio coefficient is required."));
        }
        if self.thresholds.distress_upper >= self.thresholds.safe_lower {
            return Err(invalid("distress_upper must be strictly below safe_lower."));
        }
        let derived = derive_required_fields(&self.coefficients, self.equity_basis);
        if !derived.is_subset(&self.required_fields) {
            return Err(invalid(
                "required_fields must include every input of the model's ratios.",
            ));
        }
        Ok(())
    }
}

fn derive_required_fields(
    coefficients: &BTreeMap<RatioId, Decimal>,
    basis: EquityBasis,
) -> BTreeSet<CanonicalField> {
    coefficients
        .keys()
        .flat_map(|r| r.inputs(basis).iter().copied())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelDefinition>,
    aliases: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Coefficients
// ---------------------------------------------------------------------------

// Original Z-Score (public manufacturing)
const Z_COEFFICIENTS: [(RatioId, Decimal); 5] = [
    (RatioId::Liquidity, dec!(1.2)),
    (RatioId::Reinvestment, dec!(1.4)),
    (RatioId::Profitability, dec!(3.3)),
    (RatioId::Leverage, dec!(0.6)),
    (RatioId::Turnover, dec!(1.0)),
];

// Z'-Score (private manufacturing)
const ZP_COEFFICIENTS: [(RatioId, Decimal); 5] = [
    (RatioId::Liquidity, dec!(0.717)),
    (RatioId::Reinvestment, dec!(0.847)),
    (RatioId::Profitability, dec!(3.107)),
    (RatioId::Leverage, dec!(0.420)),
    (RatioId::Turnover, dec!(0.998)),
];

// Z''-Score (non-manufacturing, service and emerging markets)
const ZPP_COEFFICIENTS: [(RatioId, Decimal); 4] = [
    (RatioId::Liquidity, dec!(6.56)),
    (RatioId::Reinvestment, dec!(3.26)),
    (RatioId::Profitability, dec!(6.72)),
    (RatioId::Leverage, dec!(1.05)),
];

const EM_INTERCEPT: Decimal = dec!(3.25);

const Z_THRESHOLDS: ZoneThresholds = ZoneThresholds {
    distress_upper: dec!(1.81),
    safe_lower: dec!(2.99),
};
const ZP_THRESHOLDS: ZoneThresholds = ZoneThresholds {
    distress_upper: dec!(1.23),
    safe_lower: dec!(2.90),
};
const ZPP_THRESHOLDS: ZoneThresholds = ZoneThresholds {
    distress_upper: dec!(1.10),
    safe_lower: dec!(2.60),
};
const EM_THRESHOLDS: ZoneThresholds = ZoneThresholds {
    distress_upper: dec!(4.15),
    safe_lower: dec!(5.85),
};

const STANDARD_ALIASES: &[(&str, &str)] = &[
    ("original", MODEL_PUBLIC_MANUFACTURING),
    ("z-prime", MODEL_PRIVATE_MANUFACTURING),
    ("z-double-prime", MODEL_PRIVATE_SERVICE),
    ("non-manufacturing", MODEL_PUBLIC_SERVICE),
    ("technology", MODEL_PUBLIC_SERVICE),
    ("em", MODEL_EMERGING_MARKET),
];

static STANDARD: Lazy<ModelRegistry> = Lazy::new(ModelRegistry::build_standard);

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl ModelRegistry {
    /// The built-in registry, constructed on first use.
    pub fn standard() -> &'static ModelRegistry {
        &STANDARD
    }

    /// Build a registry from arbitrary definitions and aliases.
    ///
    /// Missing `required_fields` are derived; every definition is
    /// validated, keys must be unique and aliases must point at a model.
    pub fn from_definitions(
        definitions: Vec<ModelDefinition>,
        aliases: BTreeMap<String, String>,
    ) -> DistressResult<Self> {
        let mut models = BTreeMap::new();
        for mut def in definitions {
            if def.required_fields.is_empty() {
                def.required_fields = derive_required_fields(&def.coefficients, def.equity_basis);
            }
            def.validate()?;
            let key = def.model_key.clone();
            if models.insert(key.clone(), def).is_some() {
                return Err(DistressError::InvalidModel {
                    model_key: key,
                    reason: "Duplicate model key.".into(),
                });
            }
        }
        for (alias, target) in &aliases {
            if models.contains_key(alias) {
                return Err(DistressError::InvalidModel {
                    model_key: alias.clone(),
                    reason: "Alias shadows a model key.".into(),
                });
            }
            if !models.contains_key(target) {
                return Err(DistressError::InvalidModel {
                    model_key: alias.clone(),
                    reason: format!("Alias points at unknown model '{target}'."),
                });
            }
        }
        Ok(Self { models, aliases })
    }

    /// Look up a model by key or alias.
    pub fn get(&self, key: &str) -> DistressResult<&ModelDefinition> {
        let resolved = self.aliases.get(key).map(String::as_str).unwrap_or(key);
        self.models
            .get(resolved)
            .ok_or_else(|| DistressError::UnknownModel(key.to_string()))
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.models.values()
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    fn build_standard() -> Self {
        let definitions = vec![
            ModelDefinition::new(
                MODEL_PUBLIC_MANUFACTURING,
                "Original Z-Score: public manufacturing, market equity, five ratios",
                &Z_COEFFICIENTS,
                Decimal::ZERO,
                EquityBasis::Market,
                Z_THRESHOLDS,
            ),
            ModelDefinition::new(
                MODEL_PRIVATE_MANUFACTURING,
                "Z'-Score: private manufacturing, book equity, five ratios",
                &ZP_COEFFICIENTS,
                Decimal::ZERO,
                EquityBasis::Book,
                ZP_THRESHOLDS,
            ),
            ModelDefinition::new(
                MODEL_PUBLIC_SERVICE,
                "Z''-Score: public non-manufacturing, market equity, four ratios",
                &ZPP_COEFFICIENTS,
                Decimal::ZERO,
                EquityBasis::Market,
                ZPP_THRESHOLDS,
            ),
            ModelDefinition::new(
                MODEL_PRIVATE_SERVICE,
                "Z''-Score: private non-manufacturing, book equity, four ratios",
                &ZPP_COEFFICIENTS,
                Decimal::ZERO,
                EquityBasis::Book,
                ZPP_THRESHOLDS,
            ),
            ModelDefinition::new(
                MODEL_EMERGING_MARKET,
                "Emerging-market Z''-Score: book equity, four ratios, 3.25 intercept",
                &ZPP_COEFFICIENTS,
                EM_INTERCEPT,
                EquityBasis::Book,
                EM_THRESHOLDS,
            ),
        ];
        let models = definitions
            .into_iter()
            .map(|d| (d.model_key.clone(), d))
            .collect();
        let aliases = STANDARD_ALIASES
            .iter()
            .map(|(a, t)| (a.to_string(), t.to_string()))
            .collect();
        Self { models, aliases }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_standard_thresholds_are_ordered() {
        for model in ModelRegistry::standard().models() {
            assert!(
                model.thresholds.distress_upper < model.thresholds.safe_lower,
                "{}",
                model.model_key
            );
            assert!(model.validate().is_ok());
        }
    }

    #[test]
    fn test_standard_registry_contents() {
        let registry = ModelRegistry::standard();
        assert_eq!(registry.models().count(), 5);
        let z = registry.get(MODEL_PUBLIC_MANUFACTURING).unwrap();
        assert_eq!(z.coefficients.len(), 5);
        assert_eq!(z.coefficients[&RatioId::Leverage], dec!(0.6));
        assert_eq!(z.equity_basis, EquityBasis::Market);
        assert!(z.required_fields.contains(&CanonicalField::MarketValueEquity));
        assert!(!z.required_fields.contains(&CanonicalField::BookValueEquity));

        let em = registry.get(MODEL_EMERGING_MARKET).unwrap();
        assert_eq!(em.intercept, dec!(3.25));
        assert!(!em.uses_ratio(RatioId::Turnover));
        assert!(!em.required_fields.contains(&CanonicalField::Sales));
    }

    #[test]
    fn test_aliases_share_coefficients() {
        let registry = ModelRegistry::standard();
        let original = registry.get("original").unwrap();
        assert_eq!(original.model_key, MODEL_PUBLIC_MANUFACTURING);
        let service = registry.get(MODEL_PRIVATE_SERVICE).unwrap();
        let em = registry.get("em").unwrap();
        assert_eq!(service.coefficients, em.coefficients);
        assert_ne!(service.intercept, em.intercept);
    }

    #[test]
    fn test_unknown_model() {
        match ModelRegistry::standard().get("springate").unwrap_err() {
            DistressError::UnknownModel(key) => assert_eq!(key, "springate"),
            other => panic!("Expected UnknownModel, got {other:?}"),
        }
    }

    #[test]
    fn test_required_fields_follow_equity_basis_override() {
        let z = ModelRegistry::standard().get(MODEL_PUBLIC_MANUFACTURING).unwrap();
        let book = z.required_fields_for(EquityBasis::Book);
        assert!(book.contains(&CanonicalField::BookValueEquity));
        assert!(!book.contains(&CanonicalField::MarketValueEquity));
        assert_eq!(book.len(), 8);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let bad = ModelDefinition::new(
            "inverted",
            "",
            &ZPP_COEFFICIENTS,
            Decimal::ZERO,
            EquityBasis::Book,
            ZoneThresholds {
                distress_upper: dec!(2.6),
                safe_lower: dec!(2.6),
            },
        );
        match ModelRegistry::from_definitions(vec![bad], BTreeMap::new()).unwrap_err() {
            DistressError::InvalidModel { model_key, .. } => assert_eq!(model_key, "inverted"),
            other => panic!("Expected InvalidModel, got {other:?}"),
        }
    }

    #[test]
    fn test_from_definitions_json_derives_required_fields() {
        let json = r#"[{
            "model_key": "custom",
            "coefficients": {"liquidity_ratio": "1.0", "leverage_ratio": "0.5"},
            "equity_basis": "book",
            "thresholds": {"distress_upper": "1.0", "safe_lower": "2.0"}
        }]"#;
        let defs: Vec<ModelDefinition> = serde_json::from_str(json).unwrap();
        let registry = ModelRegistry::from_definitions(defs, BTreeMap::new()).unwrap();
        let custom = registry.get("custom").unwrap();
        assert_eq!(custom.intercept, Decimal::ZERO);
        assert_eq!(
            custom.required_fields.iter().copied().collect::<Vec<_>>(),
            vec![
                CanonicalField::TotalAssets,
                CanonicalField::CurrentAssets,
                CanonicalField::CurrentLiabilities,
                CanonicalField::TotalLiabilities,
                CanonicalField::BookValueEquity,
            ]
        );
    }

    #[test]
    fn test_dangling_alias_rejected() {
        let aliases = BTreeMap::from([("x".to_string(), "missing".to_string())]);
        assert!(ModelRegistry::from_definitions(vec![], aliases).is_err());
    }
}
