use super::NutrientKey;
use crate::error::{FertiplanError, Result};
use crate::logic::calculations::normalize_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropMeta {
    /// alternate name -> canonical crop name
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// crop -> nutrient -> range in kg/da
    #[serde(default)]
    pub maintenance_ranges: BTreeMap<String, BTreeMap<NutrientKey, MaintenanceRange>>,
    /// Perennial and orchard crops.
    #[serde(default)]
    pub orchard_crops: Vec<String>,
}

impl CropMeta {
    /// Re-key aliases by their normalized form and check every range.
    pub fn validated(mut self) -> Result<Self> {
        self.aliases = self
            .aliases
            .into_iter()
            .map(|(alias, canonical)| (normalize_name(&alias), canonical))
            .collect();

        for (crop, ranges) in &self.maintenance_ranges {
            for (nutrient, r) in ranges {
                if !(r.min.is_finite() && r.max.is_finite()) || r.min > r.max {
                    return Err(FertiplanError::InvalidData(format!(
                        "maintenance range for {} / {} has min {} above max {}",
                        crop, nutrient, r.min, r.max
                    )));
                }
            }
        }

        Ok(self)
    }

    /// Canonical crop for an already-normalized name.
    pub fn alias_for(&self, normalized: &str) -> Option<&str> {
        self.aliases.get(normalized).map(String::as_str)
    }

    pub fn range(&self, crop: &str, nutrient: NutrientKey) -> Option<MaintenanceRange> {
        self.maintenance_ranges
            .get(crop)
            .and_then(|r| r.get(&nutrient))
            .copied()
    }

    pub fn is_orchard(&self, crop: &str) -> bool {
        let wanted = normalize_name(crop);
        self.orchard_crops
            .iter()
            .any(|c| normalize_name(c) == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_are_rekeyed_by_normalized_name() {
        let mut meta = CropMeta::default();
        meta.aliases.insert("ZEYTIN ".into(), "Zeytin".into());
        meta.aliases.insert("Olive".into(), "Zeytin".into());
        let meta = meta.validated().unwrap();
        assert_eq!(meta.alias_for("zeytin"), Some("Zeytin"));
        assert_eq!(meta.alias_for("olive"), Some("Zeytin"));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut meta = CropMeta::default();
        meta.maintenance_ranges.insert(
            "Zeytin".into(),
            BTreeMap::from([(NutrientKey::N, MaintenanceRange { min: 16.0, max: 8.0 })]),
        );
        assert!(meta.validated().is_err());
    }

    #[test]
    fn orchard_check_is_normalized() {
        let meta = CropMeta {
            orchard_crops: vec!["Bağ".into()],
            ..CropMeta::default()
        };
        assert!(meta.is_orchard("BAG"));
        assert!(!meta.is_orchard("Buğday"));
    }
}
