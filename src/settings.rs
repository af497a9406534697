//! Reference-data bundle: tables, product catalog, prices, presets, crop
//! metadata and adjustment rules. Loaded once and validated up front.

use crate::error::{FertiplanError, Result};
use crate::logic::calculations::fold_turkish;
use crate::logic::schedule::validate_fractions;
use crate::models::{
    AdjustmentRule, Bucket, CropMeta, EcUnit, FertilizerProduct, NutrientKey, PerNutrient,
    Precision, PriceCatalog, ProjectInput, RawReferenceTable, ReferenceTable, SchedulePreset,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// A reference table given inline or as a path to its own JSON/YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableSource {
    Path(PathBuf),
    Inline(Box<RawReferenceTable>),
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UiDefaults {
    #[serde(default)]
    pub precision: Precision,
    #[serde(default)]
    pub ec_unit: EcUnit,
}

/// The settings file as written on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
    pub reference_tables: PerNutrient<TableSource>,
    #[serde(default)]
    pub fertilizer_catalog: Vec<FertilizerProduct>,
    #[serde(default)]
    pub price_catalog: PriceCatalog,
    #[serde(default)]
    pub schedule_presets: Vec<SchedulePreset>,
    #[serde(default)]
    pub crop_meta: CropMeta,
    #[serde(default)]
    pub adjustment_rules: Vec<AdjustmentRule>,
    #[serde(default)]
    pub ui: UiDefaults,
}

/// Validated settings, read-only for the duration of a computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub reference_tables: PerNutrient<ReferenceTable>,
    pub fertilizer_catalog: Vec<FertilizerProduct>,
    pub price_catalog: PriceCatalog,
    pub schedule_presets: Vec<SchedulePreset>,
    pub crop_meta: CropMeta,
    pub adjustment_rules: Vec<AdjustmentRule>,
    pub ui: UiDefaults,
}

/// Parse a JSON or YAML file, chosen by extension (YAML when unsure).
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        FertiplanError::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(serde_json::from_str(&contents)?)
    } else {
        Ok(serde_yaml::from_str(&contents)?)
    }
}

/// Read a project file and fill what it leaves out from the settings:
/// `prefs.precision` from `default_precision`, `prices` from the settings
/// price catalog, and the EC unit from `ui.ec_unit` when only a value is given.
pub fn load_project(
    path: &Path,
    settings: &Settings,
    default_precision: Precision,
) -> Result<ProjectInput> {
    let value: serde_yaml::Value = read_document(path)?;
    let has_precision = value
        .get("prefs")
        .and_then(|prefs| prefs.get("precision"))
        .is_some();
    let has_prices = value.get("prices").is_some();

    let mut input: ProjectInput = serde_yaml::from_value(value)?;
    if !has_precision {
        input.prefs.precision = default_precision;
    }
    if !has_prices {
        input.prices = settings.price_catalog.clone();
    }
    if input.soil.ec_value.is_some() && input.soil.ec_unit.is_none() {
        input.soil.ec_unit = Some(settings.ui.ec_unit);
    }
    tracing::debug!("Loaded project {} from {}", input.id, path.display());
    Ok(input)
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let document: SettingsDocument = read_document(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let settings = Self::from_document(document, base_dir)?;
        tracing::info!(
            "Loaded settings from {} ({} products, {} rules, {} presets)",
            path.display(),
            settings.fertilizer_catalog.len(),
            settings.adjustment_rules.len(),
            settings.schedule_presets.len()
        );
        Ok(settings)
    }

    /// Validate a document; relative table paths resolve against `base_dir`.
    pub fn from_document(document: SettingsDocument, base_dir: &Path) -> Result<Self> {
        let sources = &document.reference_tables;
        let reference_tables = PerNutrient::new(
            load_table(NutrientKey::N, &sources.n, base_dir)?,
            load_table(NutrientKey::P2O5, &sources.p2o5, base_dir)?,
            load_table(NutrientKey::K2O, &sources.k2o, base_dir)?,
        );

        validate_catalog(&document.fertilizer_catalog)?;
        validate_rules(&document.adjustment_rules)?;
        check_presets(&document.schedule_presets);

        Ok(Self {
            reference_tables,
            fertilizer_catalog: document.fertilizer_catalog,
            price_catalog: document.price_catalog,
            schedule_presets: document.schedule_presets,
            crop_meta: document.crop_meta.validated()?,
            adjustment_rules: document.adjustment_rules,
            ui: document.ui,
        })
    }

    pub fn product(&self, id: &str) -> Option<&FertilizerProduct> {
        self.fertilizer_catalog.iter().find(|p| p.id == id)
    }

    /// Preset by id, falling back to the first preset.
    pub fn preset(&self, id: &str) -> Option<&SchedulePreset> {
        self.schedule_presets
            .iter()
            .find(|p| p.id == id)
            .or_else(|| self.schedule_presets.first())
    }

    /// Every region named by any of the three tables.
    pub fn regions(&self) -> Vec<String> {
        let names = self
            .reference_tables
            .iter()
            .flat_map(|(_, t)| t.regions().map(str::to_string));
        sorted_unique(names)
    }

    /// Every crop present in any region table.
    pub fn crops(&self) -> Vec<String> {
        let names = self
            .reference_tables
            .iter()
            .flat_map(|(_, t)| t.crop_names().map(str::to_string));
        sorted_unique(names)
    }
}

fn load_table(
    nutrient: NutrientKey,
    source: &TableSource,
    base_dir: &Path,
) -> Result<ReferenceTable> {
    let raw = match source {
        TableSource::Inline(raw) => (**raw).clone(),
        TableSource::Path(p) => {
            let full = if p.is_absolute() {
                p.clone()
            } else {
                base_dir.join(p)
            };
            read_document::<RawReferenceTable>(&full)?
        }
    };
    ReferenceTable::from_raw(raw)
        .map_err(|e| FertiplanError::InvalidData(format!("{} reference table: {}", nutrient, e)))
}

fn sorted_unique(names: impl Iterator<Item = String>) -> Vec<String> {
    let set: BTreeSet<String> = names.collect();
    let mut out: Vec<String> = set.into_iter().collect();
    out.sort_by(|a, b| fold_turkish(a).cmp(&fold_turkish(b)).then_with(|| a.cmp(b)));
    out
}

fn validate_catalog(catalog: &[FertilizerProduct]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for product in catalog {
        if !seen.insert(product.id.as_str()) {
            return Err(FertiplanError::InvalidData(format!(
                "duplicate product id '{}'",
                product.id
            )));
        }
        for (nutrient, fraction) in &product.nutrients {
            if !(0.0..=1.0).contains(fraction) {
                return Err(FertiplanError::InvalidData(format!(
                    "product '{}' has {} fraction {} outside 0-1",
                    product.id, nutrient, fraction
                )));
            }
        }
    }
    Ok(())
}

fn validate_rules(rules: &[AdjustmentRule]) -> Result<()> {
    for rule in rules {
        for (nutrient, m) in &rule.multiplier_by_nutrient {
            if !m.is_finite() || *m <= 0.0 {
                return Err(FertiplanError::InvalidData(format!(
                    "rule '{}' has non-positive {} multiplier {}",
                    rule.id, nutrient, m
                )));
            }
        }
    }
    Ok(())
}

/// Bad fraction sums are tolerated: the schedule builder falls back to a
/// single application. Only log them here.
fn check_presets(presets: &[SchedulePreset]) {
    for preset in presets {
        for bucket in [Bucket::P, Bucket::K, Bucket::N] {
            if !validate_fractions(preset.buckets.get(bucket)) {
                tracing::warn!(
                    "Schedule preset '{}' bucket {} fractions do not sum to 1",
                    preset.id,
                    bucket.as_str()
                );
            }
            if let Some(steps) = preset.sandy_overrides.as_ref().and_then(|o| o.get(bucket)) {
                if !validate_fractions(steps) {
                    tracing::warn!(
                        "Schedule preset '{}' sandy override {} fractions do not sum to 1",
                        preset.id,
                        bucket.as_str()
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BinSpec;
    use crate::seed;
    use std::io::Write;

    #[test]
    fn seed_document_validates() {
        let settings = seed::demo_settings();
        assert!(settings.product("dap").is_some());
        assert_eq!(settings.preset("missing").map(|p| p.id.as_str()), Some("classic"));
        assert_eq!(settings.preset("drip6").map(|p| p.id.as_str()), Some("drip6"));
    }

    #[test]
    fn regions_and_crops_are_sorted_and_unique() {
        let settings = seed::demo_settings();
        let regions = settings.regions();
        assert_eq!(regions, vec!["Akdeniz".to_string(), "Ege".to_string()]);
        let crops = settings.crops();
        let mut expected = crops.clone();
        expected.dedup();
        assert_eq!(crops, expected);
        assert!(crops.contains(&"Buğday".to_string()));
        let bugday = crops.iter().position(|c| c == "Buğday").unwrap();
        let zeytin = crops.iter().position(|c| c == "Zeytin").unwrap();
        assert!(bugday < zeytin);
    }

    #[test]
    fn bad_bin_in_document_is_fatal() {
        let mut doc = seed::settings_document();
        if let TableSource::Inline(raw) = &mut doc.reference_tables.k2o {
            raw.bins = BinSpec::List(vec!["0-ten".into()]);
        }
        let err = Settings::from_document(doc, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("K2O reference table"));
    }

    #[test]
    fn out_of_range_fraction_is_rejected() {
        let mut doc = seed::settings_document();
        doc.fertilizer_catalog[0]
            .nutrients
            .insert(NutrientKey::N, 46.0);
        assert!(matches!(
            Settings::from_document(doc, Path::new(".")),
            Err(FertiplanError::InvalidData(_))
        ));
    }

    #[test]
    fn loads_yaml_with_table_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = seed::settings_document();

        let n_table = match &doc.reference_tables.n {
            TableSource::Inline(raw) => (**raw).clone(),
            TableSource::Path(_) => unreachable!(),
        };
        let table_path = dir.path().join("N_tables.json");
        std::fs::write(&table_path, serde_json::to_string(&n_table).unwrap()).unwrap();
        doc.reference_tables.n = TableSource::Path(PathBuf::from("N_tables.json"));

        let settings_path = dir.path().join("settings.yaml");
        let mut file = std::fs::File::create(&settings_path).unwrap();
        file.write_all(serde_yaml::to_string(&doc).unwrap().as_bytes())
            .unwrap();

        let settings = Settings::load(&settings_path).unwrap();
        assert_eq!(
            settings.reference_tables.n,
            ReferenceTable::from_raw(n_table).unwrap()
        );
    }

    #[test]
    fn project_precision_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        std::fs::write(
            &path,
            r#"{"id": "p1", "region": "Ege", "crop": "Zeytin", "farming": "Kuru",
                "irrigation": "Damla", "area_da": 12.5,
                "soil": {"om_pct": 1.5, "p_olsen_value": 4, "k_available_value": 30}}"#,
        )
        .unwrap();
        let settings = seed::demo_settings();
        let input = load_project(&path, &settings, Precision::Hundredth).unwrap();
        assert_eq!(input.prefs.precision, Precision::Hundredth);
        assert_eq!(input.prefs.p_source_product_id, "dap");
        assert_eq!(input.soil.p_olsen_value, Some(4.0));

        let path = dir.path().join("project.yaml");
        std::fs::write(
            &path,
            "id: p2\nregion: Ege\ncrop: Zeytin\nfarming: irrigated\nirrigation: drip\narea_da: 3\nprefs:\n  p_source_product_id: map\n  k_source_product_id: k2so4\n  n_source_product_id: urea\n  precision: 0.1\n  schedule_preset_id: drip6\n  start_month: April\n",
        )
        .unwrap();
        let input = load_project(&path, &settings, Precision::Hundredth).unwrap();
        assert_eq!(input.prefs.precision, Precision::Tenth);
        assert_eq!(input.prefs.p_source_product_id, "map");
    }

    #[test]
    fn project_without_prices_uses_settings_catalog() {
        let mut settings = seed::demo_settings();
        settings.price_catalog.insert("dap".into(), Some(20.0));
        settings.price_catalog.insert("urea".into(), Some(15.0));
        settings.ui.ec_unit = EcUnit::UsPerCm;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.yaml");
        std::fs::write(
            &path,
            "id: p3\nregion: Ege\ncrop: Zeytin\nfarming: rain_fed\nirrigation: dry\narea_da: 10\nsoil:\n  ec_value: 2500\n  om_pct: 1.5\n  p_olsen_value: 4\n  k_available_value: 30\n",
        )
        .unwrap();
        let input = load_project(&path, &settings, Precision::Tenth).unwrap();
        assert_eq!(input.prices.get("dap"), Some(&Some(20.0)));
        assert_eq!(input.soil.ec_unit, Some(EcUnit::UsPerCm));

        let rec = crate::compute_recommendation(&input, &settings);
        assert!(rec.cost.available);
        // dap 13 kg/da * 10 da * 20 + urea 21 kg/da * 10 da * 15
        assert!((rec.cost.total_cost.unwrap() - 5750.0).abs() < 1e-9);

        std::fs::write(
            &path,
            "id: p4\nregion: Ege\ncrop: Zeytin\nfarming: rain_fed\nirrigation: dry\narea_da: 10\nprices: {}\n",
        )
        .unwrap();
        let input = load_project(&path, &settings, Precision::Tenth).unwrap();
        assert!(input.prices.is_empty());
    }

    #[test]
    fn missing_table_file_is_a_config_error() {
        let mut doc = seed::settings_document();
        doc.reference_tables.p2o5 = TableSource::Path(PathBuf::from("nope.json"));
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Settings::from_document(doc, dir.path()),
            Err(FertiplanError::Config(_))
        ));
    }
}
