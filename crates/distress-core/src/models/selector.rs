//! Model selection decision tree.
//!
//! First match wins:
//! 1. emerging market => `emerging-market`
//! 2. SIC 2000-3999 => `public-manufacturing` / `private-manufacturing`
//! 3. any enumerated non-manufacturing range => `public-service` / `private-service`
//! 4. otherwise => `public-manufacturing`, with a warning

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classification::classifier::{is_manufacturing, non_manufacturing_range, CompanyProfile};
use crate::models::registry::{
    ModelDefinition, ModelRegistry, MODEL_EMERGING_MARKET, MODEL_PRIVATE_MANUFACTURING,
    MODEL_PRIVATE_SERVICE, MODEL_PUBLIC_MANUFACTURING, MODEL_PUBLIC_SERVICE,
};
use crate::DistressResult;

/// Which branch of the decision tree fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRule {
    EmergingMarket,
    Manufacturing,
    NonManufacturing,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSelection {
    pub model_key: String,
    pub rule: SelectionRule,
    pub reason: String,
    pub warnings: Vec<String>,
}

/// Pick exactly one model key for a company profile.
pub fn select_model(profile: &CompanyProfile) -> ModelSelection {
    let listing = if profile.is_public { "public" } else { "private" };

    let selection = if profile.is_emerging_market {
        ModelSelection {
            model_key: MODEL_EMERGING_MARKET.to_string(),
            rule: SelectionRule::EmergingMarket,
            reason: "Company is domiciled in an emerging market.".to_string(),
            warnings: Vec::new(),
        }
    } else if let Some(code) = profile.industry_code.filter(|c| is_manufacturing(*c)) {
        let key = if profile.is_public {
            MODEL_PUBLIC_MANUFACTURING
        } else {
            MODEL_PRIVATE_MANUFACTURING
        };
        ModelSelection {
            model_key: key.to_string(),
            rule: SelectionRule::Manufacturing,
            reason: format!("SIC {code} is in the manufacturing range; company is {listing}."),
            warnings: Vec::new(),
        }
    } else if let Some((code, range)) = profile
        .industry_code
        .and_then(|c| non_manufacturing_range(c).map(|r| (c, r)))
    {
        let key = if profile.is_public {
            MODEL_PUBLIC_SERVICE
        } else {
            MODEL_PRIVATE_SERVICE
        };
        ModelSelection {
            model_key: key.to_string(),
            rule: SelectionRule::NonManufacturing,
            reason: format!(
                "SIC {code} is in the {} range ({}-{}); company is {listing}.",
                range.label, range.low, range.high
            ),
            warnings: Vec::new(),
        }
    } else {
        let detail = match profile.industry_code {
            Some(code) => format!("SIC {code} is not in any recognised range"),
            None => "industry code is missing".to_string(),
        };
        let message = format!(
            "Model selection fell back to {MODEL_PUBLIC_MANUFACTURING} because the {detail}; \
             this is a defensive default, not a calibrated choice."
        );
        warn!("{message}");
        ModelSelection {
            model_key: MODEL_PUBLIC_MANUFACTURING.to_string(),
            rule: SelectionRule::Fallback,
            reason: format!("Defensive default: {detail}."),
            warnings: vec![message],
        }
    };

    debug!(model = %selection.model_key, rule = ?selection.rule, "selected model");
    selection
}

/// Select a model and fetch its definition from `registry`.
pub fn select_model_definition<'r>(
    profile: &CompanyProfile,
    registry: &'r ModelRegistry,
) -> DistressResult<(ModelSelection, &'r ModelDefinition)> {
    let selection = select_model(profile);
    let model = registry.get(&selection.model_key)?;
    Ok((selection, model))
}
