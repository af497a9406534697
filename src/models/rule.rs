use super::{IrrigationSystem, Message, NutrientKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Conjunctive rule condition. Every clause that is set must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph_gte: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lime_pct_gte: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub om_pct_lt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ec_ds_m_gte: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sand_pct_gte: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irrigation_is: Option<IrrigationSystem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRule {
    pub id: String,
    /// Kept for the settings editor; the global layer-3 preference decides.
    #[serde(default)]
    pub enabled_by_default: bool,
    pub applies_to: Vec<NutrientKey>,
    #[serde(default)]
    pub condition: RuleCondition,
    #[serde(default)]
    pub multiplier_by_nutrient: BTreeMap<NutrientKey, f64>,
    pub message: Message,
    /// Emits its message without touching the dose.
    #[serde(default)]
    pub warning_only: bool,
}

impl AdjustmentRule {
    pub fn applies_to(&self, nutrient: NutrientKey) -> bool {
        self.applies_to.contains(&nutrient)
    }

    pub fn multiplier(&self, nutrient: NutrientKey) -> f64 {
        self.multiplier_by_nutrient
            .get(&nutrient)
            .copied()
            .unwrap_or(1.0)
    }
}
