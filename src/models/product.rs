use super::NutrientKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Policy tags that can exclude a product from a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionTag {
    /// Carries chloride; excluded when the grower avoids chloride.
    Chloride,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerProduct {
    pub id: String,
    pub name: String,
    /// Mass fraction (0-1) of each nutrient.
    pub nutrients: BTreeMap<NutrientKey, f64>,
    /// Sulfur fraction, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sulfur: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusion: Option<ExclusionTag>,
    /// Hidden from default pickers but still selectable.
    #[serde(default)]
    pub optional: bool,
}

impl FertilizerProduct {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            nutrients: BTreeMap::new(),
            sulfur: None,
            exclusion: None,
            optional: false,
        }
    }

    pub fn with_nutrient(mut self, key: NutrientKey, fraction: f64) -> Self {
        self.nutrients.insert(key, fraction);
        self
    }

    pub fn with_sulfur(mut self, fraction: f64) -> Self {
        self.sulfur = Some(fraction);
        self
    }

    pub fn with_exclusion(mut self, tag: ExclusionTag) -> Self {
        self.exclusion = Some(tag);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Fraction of `key`, 0 when the product does not carry it.
    pub fn fraction(&self, key: NutrientKey) -> f64 {
        self.nutrients.get(&key).copied().unwrap_or(0.0)
    }

    pub fn is_chloride_bearing(&self) -> bool {
        self.exclusion == Some(ExclusionTag::Chloride)
    }
}

/// product id -> price per kg; `None` when no price is known.
pub type PriceCatalog = BTreeMap<String, Option<f64>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_defaults_to_zero() {
        let urea = FertilizerProduct::new("urea", "Urea").with_nutrient(NutrientKey::N, 0.46);
        assert_eq!(urea.fraction(NutrientKey::N), 0.46);
        assert_eq!(urea.fraction(NutrientKey::K2O), 0.0);
        assert!(!urea.is_chloride_bearing());
    }

    #[test]
    fn exclusion_tag_round_trips_through_yaml() {
        let kcl = FertilizerProduct::new("kcl", "KCl")
            .with_nutrient(NutrientKey::K2O, 0.6)
            .with_exclusion(ExclusionTag::Chloride)
            .optional();
        let yaml = serde_yaml::to_string(&kcl).unwrap();
        assert!(yaml.contains("exclusion: chloride"));
        let back: FertilizerProduct = serde_yaml::from_str(&yaml).unwrap();
        assert!(back.is_chloride_bearing());
        assert!(back.optional);
    }
}
