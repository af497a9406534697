//! Default reference data: product catalog, schedule presets, crop metadata,
//! adjustment rules and a small set of demo tables. `fertiplan init` writes
//! these to disk as a starting point.

use crate::error::{FertiplanError, Result};
use crate::models::{
    AdjustmentRule, ApplicationStep, BinSpec, BucketOverrides, BucketSteps, CropMeta, CropNode,
    DoseCells, ExclusionTag, FarmingPractice, FertilizerProduct, IrrigationSystem,
    MaintenanceRange, Message, NutrientKey, PerNutrient, PriceCatalog, RawReferenceTable,
    RegionTable, RuleCondition, SchedulePreset, TableMeta,
};
use crate::settings::{SettingsDocument, TableSource, UiDefaults};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub fn default_catalog() -> Vec<FertilizerProduct> {
    use NutrientKey::{K2O, N, P2O5};
    vec![
        FertilizerProduct::new("urea", "Üre").with_nutrient(N, 0.46),
        FertilizerProduct::new("as", "Amonyum Sülfat")
            .with_nutrient(N, 0.21)
            .with_sulfur(0.24),
        FertilizerProduct::new("an", "Amonyum Nitrat").with_nutrient(N, 0.33),
        FertilizerProduct::new("can", "CAN").with_nutrient(N, 0.26),
        FertilizerProduct::new("tsp", "TSP").with_nutrient(P2O5, 0.46),
        FertilizerProduct::new("dap", "DAP")
            .with_nutrient(N, 0.18)
            .with_nutrient(P2O5, 0.46),
        FertilizerProduct::new("map", "MAP")
            .with_nutrient(N, 0.12)
            .with_nutrient(P2O5, 0.61),
        FertilizerProduct::new("k2so4", "Potasyum Sülfat (K2SO4)").with_nutrient(K2O, 0.5),
        FertilizerProduct::new("kno3", "Potasyum Nitrat (KNO3)")
            .with_nutrient(N, 0.13)
            .with_nutrient(K2O, 0.46),
        FertilizerProduct::new("kcl", "Potasyum Klorür (KCl)")
            .with_nutrient(K2O, 0.6)
            .with_exclusion(ExclusionTag::Chloride)
            .optional(),
    ]
}

/// Every catalog product with an unknown price.
pub fn default_prices(catalog: &[FertilizerProduct]) -> PriceCatalog {
    catalog.iter().map(|p| (p.id.clone(), None)).collect()
}

fn steps(pairs: &[(&str, f64)]) -> Vec<ApplicationStep> {
    pairs
        .iter()
        .map(|(label, fraction)| ApplicationStep::new(label, *fraction))
        .collect()
}

pub fn default_presets() -> Vec<SchedulePreset> {
    let sixth = 1.0 / 6.0;
    vec![
        SchedulePreset {
            id: "classic".into(),
            name: "Classic (base + top dressing)".into(),
            buckets: BucketSteps {
                p: steps(&[("Base", 1.0)]),
                k: steps(&[("Base", 0.6), ("Top dressing", 0.4)]),
                n: steps(&[("Base", 0.4), ("Top dressing 1", 0.3), ("Top dressing 2", 0.3)]),
            },
            sandy_overrides: Some(BucketOverrides {
                k: Some(steps(&[("Base", 0.5), ("Top dressing", 0.5)])),
                ..BucketOverrides::default()
            }),
        },
        SchedulePreset {
            id: "drip6".into(),
            name: "Drip fertigation (6 applications)".into(),
            buckets: BucketSteps {
                p: steps(&[("Base", 1.0)]),
                k: steps(&[
                    ("F1", sixth),
                    ("F2", sixth),
                    ("F3", sixth),
                    ("F4", sixth),
                    ("F5", sixth),
                    ("F6", sixth),
                ]),
                n: steps(&[
                    ("F1", 0.1),
                    ("F2", 0.15),
                    ("F3", 0.2),
                    ("F4", 0.2),
                    ("F5", 0.2),
                    ("F6", 0.15),
                ]),
            },
            sandy_overrides: None,
        },
        SchedulePreset {
            id: "orchard4".into(),
            name: "Orchard (4 stages)".into(),
            buckets: BucketSteps {
                p: steps(&[("Pre-bloom", 0.6), ("Fruit set", 0.4)]),
                k: steps(&[
                    ("Pre-bloom", 0.2),
                    ("Fruit set", 0.3),
                    ("Fruit growth", 0.4),
                    ("Post-harvest", 0.1),
                ]),
                n: steps(&[
                    ("Pre-bloom", 0.3),
                    ("Fruit set", 0.3),
                    ("Fruit growth", 0.3),
                    ("Post-harvest", 0.1),
                ]),
            },
            sandy_overrides: None,
        },
    ]
}

pub fn default_crop_meta() -> CropMeta {
    let ranges = |n: (f64, f64), p: (f64, f64), k: (f64, f64)| {
        BTreeMap::from([
            (NutrientKey::N, MaintenanceRange { min: n.0, max: n.1 }),
            (NutrientKey::P2O5, MaintenanceRange { min: p.0, max: p.1 }),
            (NutrientKey::K2O, MaintenanceRange { min: k.0, max: k.1 }),
        ])
    };

    CropMeta {
        aliases: BTreeMap::from([
            ("zeytın".to_string(), "Zeytin".to_string()),
            ("olive".to_string(), "Zeytin".to_string()),
        ]),
        maintenance_ranges: BTreeMap::from([
            ("Zeytin".to_string(), ranges((8.0, 16.0), (3.0, 10.0), (4.0, 12.0))),
            ("Buğday".to_string(), ranges((12.0, 22.0), (6.0, 14.0), (0.0, 14.0))),
            ("Mısır".to_string(), ranges((18.0, 30.0), (8.0, 18.0), (4.0, 18.0))),
            ("Patates".to_string(), ranges((14.0, 26.0), (10.0, 20.0), (6.0, 22.0))),
        ]),
        orchard_crops: ["Zeytin", "Elma", "Armut", "Narenciye", "Bağ"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
    }
}

pub fn default_rules() -> Vec<AdjustmentRule> {
    use NutrientKey::{K2O, N, P2O5};
    vec![
        AdjustmentRule {
            id: "ph_high_p_fix".into(),
            enabled_by_default: false,
            applies_to: vec![P2O5],
            condition: RuleCondition {
                ph_gte: Some(7.8),
                ..RuleCondition::default()
            },
            multiplier_by_nutrient: BTreeMap::from([(P2O5, 1.1)]),
            message: Message::new(
                "High pH: raise phosphorus slightly and consider band placement.",
                "pH >= 7.8: P fixation risk (calcium phosphates). P2O5 target raised 10%; band placement advised.",
            ),
            warning_only: false,
        },
        AdjustmentRule {
            id: "lime_high_p_fix_microlock".into(),
            enabled_by_default: false,
            applies_to: vec![P2O5],
            condition: RuleCondition {
                lime_pct_gte: Some(15.0),
                ..RuleCondition::default()
            },
            multiplier_by_nutrient: BTreeMap::from([(P2O5, 1.1)]),
            message: Message::new(
                "High lime: raise phosphorus slightly; watch for Zn/Fe/Mn lock-up.",
                "Lime >= 15%: P fixation risk. P2O5 target raised 10%. Zn/Fe/Mn uptake may be restricted.",
            ),
            warning_only: false,
        },
        AdjustmentRule {
            id: "om_low_n".into(),
            enabled_by_default: false,
            applies_to: vec![N],
            condition: RuleCondition {
                om_pct_lt: Some(2.0),
                ..RuleCondition::default()
            },
            multiplier_by_nutrient: BTreeMap::from([(N, 1.1)]),
            message: Message::new(
                "Low organic matter: raise nitrogen slightly and split it.",
                "OM < 2%: low mineralization. N target raised 10%; split application advised.",
            ),
            warning_only: false,
        },
        AdjustmentRule {
            id: "salinity_warning".into(),
            enabled_by_default: false,
            applies_to: vec![N, P2O5, K2O],
            condition: RuleCondition {
                ec_ds_m_gte: Some(2.0),
                ..RuleCondition::default()
            },
            multiplier_by_nutrient: BTreeMap::new(),
            message: Message::new(
                "Salinity risk: prefer sulfate forms and avoid chloride.",
                "EC >= 2 dS/m: salinity risk. Avoid chloride-bearing sources; sulfate forms preferred.",
            ),
            warning_only: true,
        },
        AdjustmentRule {
            id: "drip_preset_hint".into(),
            enabled_by_default: false,
            applies_to: vec![N, P2O5, K2O],
            condition: RuleCondition {
                irrigation_is: Some(IrrigationSystem::Drip),
                ..RuleCondition::default()
            },
            multiplier_by_nutrient: BTreeMap::new(),
            message: Message::new(
                "Drip irrigation: the fertigation plan is available.",
                "Irrigation is drip: the 6-application fertigation preset may be preferred.",
            ),
            warning_only: true,
        },
    ]
}

fn cells(bins: &[&str], doses: &[Option<f64>]) -> DoseCells {
    bins.iter()
        .zip(doses)
        .map(|(bin, dose)| (bin.to_string(), *dose))
        .collect()
}

/// Rain-fed doses always; irrigated doses when given (empty means no data).
fn crop(bins: &[&str], rain_fed: &[Option<f64>], irrigated: &[Option<f64>]) -> CropNode {
    let mut node = CropNode::new();
    node.insert(FarmingPractice::RainFed, cells(bins, rain_fed));
    if !irrigated.is_empty() {
        node.insert(FarmingPractice::Irrigated, cells(bins, irrigated));
    }
    node
}

fn demo_table(
    version: &str,
    bins: &[&str],
    tables: Vec<(&str, Vec<(&str, CropNode)>)>,
) -> RawReferenceTable {
    let tables_by_region_table: BTreeMap<String, RegionTable> = tables
        .into_iter()
        .map(|(key, crops)| {
            let crops = crops
                .into_iter()
                .map(|(name, node)| (name.to_string(), node))
                .collect();
            (key.to_string(), crops)
        })
        .collect();

    RawReferenceTable {
        meta: Some(TableMeta {
            preferred_table_order: Vec::new(),
            extra: BTreeMap::from([(
                "version".to_string(),
                serde_json::Value::String(version.to_string()),
            )]),
        }),
        bins: BinSpec::List(bins.iter().map(|b| b.to_string()).collect()),
        supported_region_tables: tables_by_region_table.keys().cloned().collect(),
        tables_by_region_table,
    }
}

/// Demo N table keyed by organic matter %.
pub fn demo_n_table() -> RawReferenceTable {
    let bins = ["0-1", "1-2", "2-3", "3+"];
    let d = |v: [f64; 4]| v.map(Some);
    demo_table(
        "demo-N",
        &bins,
        vec![
            (
                "Akdeniz|table3",
                vec![
                    ("Buğday", crop(&bins, &d([16.0, 14.0, 12.0, 10.0]), &d([20.0, 18.0, 16.0, 14.0]))),
                    ("Mısır", crop(&bins, &d([20.0, 18.0, 16.0, 14.0]), &d([26.0, 24.0, 22.0, 20.0]))),
                    ("Narenciye", crop(&bins, &d([18.0, 16.0, 14.0, 12.0]), &[])),
                ],
            ),
            (
                "Ege|table16",
                vec![
                    ("Buğday", crop(&bins, &d([16.0, 14.0, 12.0, 10.0]), &[])),
                    ("Zeytin", crop(&bins, &d([14.0, 12.0, 10.0, 8.0]), &d([16.0, 14.0, 12.0, 10.0]))),
                ],
            ),
            (
                "Ege|table18",
                vec![
                    ("Pamuk", crop(&bins, &d([18.0, 16.0, 14.0, 12.0]), &d([22.0, 20.0, 18.0, 16.0]))),
                    ("Zeytin", crop(&bins, &d([15.0, 13.0, 11.0, 9.0]), &[])),
                ],
            ),
        ],
    )
}

/// Demo P2O5 table keyed by Olsen P (kg/da).
pub fn demo_p_table() -> RawReferenceTable {
    let bins = ["0-2.5", "2.5-5", "5-8", "8+"];
    demo_table(
        "demo-P2O5",
        &bins,
        vec![
            (
                "Akdeniz|table3",
                vec![
                    ("Buğday", crop(&bins, &[Some(12.0), Some(9.0), Some(6.0), None], &[])),
                    ("Mısır", crop(&bins, &[Some(14.0), Some(11.0), Some(8.0), None], &[])),
                    ("Narenciye", crop(&bins, &[Some(10.0), Some(8.0), Some(5.0), None], &[])),
                ],
            ),
            (
                "Ege|table16",
                vec![
                    ("Buğday", crop(&bins, &[Some(12.0), Some(9.0), Some(6.0), None], &[])),
                    (
                        "Zeytin",
                        crop(
                            &bins,
                            &[Some(8.0), Some(6.0), Some(4.0), None],
                            &[Some(9.0), Some(7.0), Some(5.0), None],
                        ),
                    ),
                ],
            ),
            (
                "Ege|table18",
                vec![
                    ("Pamuk", crop(&bins, &[Some(10.0), Some(8.0), Some(6.0), None], &[])),
                    ("Zeytin", crop(&bins, &[Some(9.0), Some(7.0), Some(5.0), None], &[])),
                ],
            ),
        ],
    )
}

/// Demo K2O table keyed by available K (kg/da).
pub fn demo_k_table() -> RawReferenceTable {
    let bins = ["0-20", "20-40", "40+"];
    demo_table(
        "demo-K2O",
        &bins,
        vec![
            (
                "Akdeniz|table3",
                vec![
                    ("Buğday", crop(&bins, &[Some(8.0), Some(5.0), None], &[])),
                    ("Mısır", crop(&bins, &[Some(12.0), Some(8.0), None], &[])),
                    ("Narenciye", crop(&bins, &[Some(14.0), Some(10.0), Some(6.0)], &[])),
                ],
            ),
            (
                "Ege|table16",
                vec![
                    ("Buğday", crop(&bins, &[Some(8.0), Some(5.0), None], &[])),
                    (
                        "Zeytin",
                        crop(
                            &bins,
                            &[Some(10.0), Some(8.0), None],
                            &[Some(12.0), Some(10.0), None],
                        ),
                    ),
                ],
            ),
            (
                "Ege|table18",
                vec![
                    ("Pamuk", crop(&bins, &[Some(12.0), Some(9.0), Some(5.0)], &[])),
                    ("Zeytin", crop(&bins, &[Some(11.0), Some(9.0), None], &[])),
                ],
            ),
        ],
    )
}

/// The full seed bundle with the demo tables inline.
pub fn settings_document() -> SettingsDocument {
    let catalog = default_catalog();
    SettingsDocument {
        reference_tables: PerNutrient::new(
            TableSource::Inline(Box::new(demo_n_table())),
            TableSource::Inline(Box::new(demo_p_table())),
            TableSource::Inline(Box::new(demo_k_table())),
        ),
        price_catalog: default_prices(&catalog),
        fertilizer_catalog: catalog,
        schedule_presets: default_presets(),
        crop_meta: default_crop_meta(),
        adjustment_rules: default_rules(),
        ui: UiDefaults::default(),
    }
}

#[cfg(test)]
pub fn demo_settings() -> crate::settings::Settings {
    crate::settings::Settings::from_document(settings_document(), Path::new("."))
        .expect("seed settings validate")
}

/// Table file names written next to the settings file by [`write_seed`].
pub const TABLE_FILES: [(NutrientKey, &str); 3] = [
    (NutrientKey::N, "N_tables.json"),
    (NutrientKey::P2O5, "P_tables.json"),
    (NutrientKey::K2O, "K_tables.json"),
];

/// Write the seed settings to `settings_path`, with each demo table in its
/// own JSON file beside it. Refuses to overwrite unless `force` is set.
pub fn write_seed(settings_path: &Path, force: bool) -> Result<Vec<PathBuf>> {
    if settings_path.exists() && !force {
        return Err(FertiplanError::Config(format!(
            "{} already exists (use --force to overwrite)",
            settings_path.display()
        )));
    }
    let dir = settings_path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut document = settings_document();
    let mut written = Vec::new();
    for (nutrient, file_name) in TABLE_FILES {
        let table = match nutrient {
            NutrientKey::N => demo_n_table(),
            NutrientKey::P2O5 => demo_p_table(),
            NutrientKey::K2O => demo_k_table(),
        };
        let path = dir.join(file_name);
        std::fs::write(&path, serde_json::to_string_pretty(&table)?)?;
        written.push(path);

        let source = TableSource::Path(PathBuf::from(file_name));
        match nutrient {
            NutrientKey::N => document.reference_tables.n = source,
            NutrientKey::P2O5 => document.reference_tables.p2o5 = source,
            NutrientKey::K2O => document.reference_tables.k2o = source,
        }
    }

    let yaml = serde_yaml::to_string(&document)?;
    let content = format!(
        "# Fertiplan reference settings\n# Generated by `fertiplan init`\n\n{}",
        yaml
    );
    std::fs::write(settings_path, content)?;
    written.push(settings_path.to_path_buf());

    tracing::info!("Wrote seed settings to {}", settings_path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::schedule::validate_fractions;
    use crate::models::Bucket;
    use crate::settings::Settings;

    #[test]
    fn presets_have_valid_fractions() {
        for preset in default_presets() {
            for bucket in [Bucket::P, Bucket::K, Bucket::N] {
                assert!(
                    validate_fractions(preset.buckets.get(bucket)),
                    "{} {}",
                    preset.id,
                    bucket.as_str()
                );
            }
        }
    }

    #[test]
    fn prices_start_unknown() {
        let catalog = default_catalog();
        let prices = default_prices(&catalog);
        assert_eq!(prices.len(), catalog.len());
        assert!(prices.values().all(Option::is_none));
    }

    #[test]
    fn only_kcl_carries_chloride() {
        let chloride: Vec<_> = default_catalog()
            .into_iter()
            .filter(|p| p.is_chloride_bearing())
            .map(|p| p.id)
            .collect();
        assert_eq!(chloride, vec!["kcl"]);
    }

    #[test]
    fn written_seed_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let written = write_seed(&path, false).unwrap();
        assert_eq!(written.len(), 4);

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, demo_settings());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        write_seed(&path, false).unwrap();
        assert!(matches!(
            write_seed(&path, false),
            Err(FertiplanError::Config(_))
        ));
        assert!(write_seed(&path, true).is_ok());
    }
}
