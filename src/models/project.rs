use super::{
    EcUnit, FarmingPractice, IrrigationSystem, PriceCatalog, Precision, SoilNutrientUnit,
};
use crate::error::{FertiplanError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Micronutrient {
    Fe,
    Mn,
    Zn,
    Cu,
    B,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilMeasurements {
    #[serde(default)]
    pub ph: Option<f64>,
    #[serde(default)]
    pub ec_value: Option<f64>,
    #[serde(default)]
    pub ec_unit: Option<EcUnit>,
    #[serde(default)]
    pub lime_pct: Option<f64>,
    #[serde(default)]
    pub om_pct: Option<f64>,
    #[serde(default)]
    pub sand_pct: Option<f64>,
    #[serde(default)]
    pub clay_pct: Option<f64>,
    #[serde(default)]
    pub silt_pct: Option<f64>,
    /// Olsen phosphorus.
    #[serde(default)]
    pub p_olsen_value: Option<f64>,
    #[serde(default)]
    pub p_olsen_unit: SoilNutrientUnit,
    #[serde(default)]
    pub k_available_value: Option<f64>,
    #[serde(default)]
    pub k_available_unit: SoilNutrientUnit,
    #[serde(default)]
    pub micros_ppm: BTreeMap<Micronutrient, Option<f64>>,
}

/// Leaf tissue analysis. Advisory only: it never changes a dose here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeafAnalysis {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub n_pct: Option<f64>,
    #[serde(default)]
    pub p_pct: Option<f64>,
    #[serde(default)]
    pub k_pct: Option<f64>,
    #[serde(default)]
    pub micros_ppm: BTreeMap<Micronutrient, Option<f64>>,
    /// Requests leaf-based dose correction from an outside collaborator.
    #[serde(default)]
    pub enable_leaf_correction_advanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub enable_layer3_adjustments: bool,
    #[serde(default)]
    pub avoid_chloride: bool,
    pub p_source_product_id: String,
    pub k_source_product_id: String,
    pub n_source_product_id: String,
    #[serde(default)]
    pub precision: Precision,
    pub schedule_preset_id: String,
    pub start_month: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            enable_layer3_adjustments: false,
            avoid_chloride: false,
            p_source_product_id: "dap".into(),
            k_source_product_id: "k2so4".into(),
            n_source_product_id: "urea".into(),
            precision: Precision::Tenth,
            schedule_preset_id: "classic".into(),
            start_month: "March".into(),
        }
    }
}

/// An alternative preference and price set to compare against the base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub label: String,
    pub prefs: Preferences,
    #[serde(default)]
    pub prices: PriceCatalog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInput {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub project_name: String,
    pub region: String,
    pub crop: String,
    pub farming: FarmingPractice,
    #[serde(default)]
    pub allow_farming_fallback: bool,
    pub irrigation: IrrigationSystem,
    pub area_da: f64,
    #[serde(default)]
    pub tree_count: Option<u32>,
    #[serde(default)]
    pub soil: SoilMeasurements,
    #[serde(default)]
    pub leaf: Option<LeafAnalysis>,
    #[serde(default)]
    pub prefs: Preferences,
    #[serde(default)]
    pub prices: PriceCatalog,
    #[serde(default)]
    pub scenarios: BTreeMap<String, Scenario>,
}

impl ProjectInput {
    pub fn new(id: &str, region: &str, crop: &str, farming: FarmingPractice, area_da: f64) -> Self {
        Self {
            id: id.to_string(),
            created_at: None,
            project_name: String::new(),
            region: region.to_string(),
            crop: crop.to_string(),
            farming,
            allow_farming_fallback: false,
            irrigation: IrrigationSystem::Dry,
            area_da,
            tree_count: None,
            soil: SoilMeasurements::default(),
            leaf: None,
            prefs: Preferences::default(),
            prices: PriceCatalog::new(),
            scenarios: BTreeMap::new(),
        }
    }

    pub fn with_soil(mut self, soil: SoilMeasurements) -> Self {
        self.soil = soil;
        self
    }

    pub fn with_prefs(mut self, prefs: Preferences) -> Self {
        self.prefs = prefs;
        self
    }

    pub fn with_irrigation(mut self, irrigation: IrrigationSystem) -> Self {
        self.irrigation = irrigation;
        self
    }

    pub fn with_trees(mut self, count: u32) -> Self {
        self.tree_count = Some(count);
        self
    }

    /// Tree count that can divide a quantity; zero counts as absent.
    pub fn trees(&self) -> Option<u32> {
        self.tree_count.filter(|&n| n > 0)
    }

    /// This project with a named scenario's preferences and prices swapped in.
    pub fn with_scenario(&self, name: &str) -> Result<Self> {
        let scenario = self
            .scenarios
            .get(name)
            .ok_or_else(|| FertiplanError::NotFound(format!("scenario '{}'", name)))?;
        let mut input = self.clone();
        input.prefs = scenario.prefs.clone();
        input.prices = scenario.prices.clone();
        Ok(input)
    }
}
