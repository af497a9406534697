use super::binning::match_bin;
use super::calculations::{normalize_name, parse_table_number, table_id};
use crate::models::{
    CropMatchStrategy, CropMeta, CropNode, ExplainabilityTrace, FarmingPractice, Message,
    NutrientKey, ReferenceTable, RegionTable, TraceStatus,
};

const NOT_IN_TABLE: &str = "Not found in the reference table.";
const NO_PRACTICE_DATA: &str = "No recommendation for this farming practice.";

/// Everything a single nutrient lookup needs.
#[derive(Debug, Clone, Copy)]
pub struct LookupRequest<'a> {
    pub nutrient: NutrientKey,
    pub table: &'a ReferenceTable,
    pub crop_meta: &'a CropMeta,
    pub region: &'a str,
    pub crop: &'a str,
    pub farming: FarmingPractice,
    pub allow_farming_fallback: bool,
    pub soil_value: Option<f64>,
    pub soil_unit_label: &'a str,
}

/// Weighted crop-name match count of one region table: exact hits count
/// twice, normalized hits once.
fn crop_score(region_table: Option<&RegionTable>, crop: &str, crop_norm: &str) -> usize {
    let Some(crops) = region_table else {
        return 0;
    };
    let mut exact = 0;
    let mut normalized = 0;
    for name in crops.keys() {
        if name == crop {
            exact += 1;
        }
        if normalize_name(name) == crop_norm {
            normalized += 1;
        }
    }
    exact * 2 + normalized
}

/// Pick the region table key for `region`. Candidates come from the preferred
/// order list when it names any of the region's keys, else from the
/// supported list. Best crop score wins; ties go to the lower table number.
pub fn select_region_table_key<'a>(
    table: &'a ReferenceTable,
    region: &str,
    crop: &str,
) -> Option<&'a str> {
    let prefix = format!("{}|", region);
    let keys: Vec<&str> = table
        .supported_region_tables
        .iter()
        .map(String::as_str)
        .filter(|k| k.starts_with(&prefix))
        .collect();
    if keys.is_empty() {
        return None;
    }

    let preferred: Vec<&str> = table
        .preferred_table_order
        .iter()
        .map(String::as_str)
        .filter(|k| keys.contains(k))
        .collect();
    let candidates = if preferred.is_empty() { keys } else { preferred };

    let crop_norm = normalize_name(crop);
    let score = |k: &str| crop_score(table.tables.get(k), crop, &crop_norm);

    let mut best = candidates[0];
    let mut best_score = score(best);
    for &key in &candidates[1..] {
        let s = score(key);
        if s > best_score || (s == best_score && parse_table_number(key) < parse_table_number(best))
        {
            best = key;
            best_score = s;
        }
    }

    tracing::debug!(
        "Region table for {} / {}: {} (score {}, {} candidates)",
        region,
        crop,
        best,
        best_score,
        candidates.len()
    );
    Some(best)
}

/// Resolve `crop` to a key of `region_table`: exact, then normalized, then
/// through the alias list (exact, then normalized on the alias).
pub fn resolve_crop<'a>(
    crop: &str,
    region_table: &'a RegionTable,
    crop_meta: &CropMeta,
) -> Option<(&'a str, CropMatchStrategy)> {
    if let Some((key, _)) = region_table.get_key_value(crop) {
        return Some((key.as_str(), CropMatchStrategy::Exact));
    }

    let find_normalized = |wanted: &str| {
        region_table
            .keys()
            .find(|k| normalize_name(k) == wanted)
            .map(String::as_str)
    };

    let crop_norm = normalize_name(crop);
    if let Some(key) = find_normalized(&crop_norm) {
        return Some((key, CropMatchStrategy::Normalized));
    }

    let alias = crop_meta.alias_for(&crop_norm)?;
    if let Some((key, _)) = region_table.get_key_value(alias) {
        return Some((key.as_str(), CropMatchStrategy::Alias));
    }
    find_normalized(&normalize_name(alias)).map(|key| (key, CropMatchStrategy::Alias))
}

/// Look up the base dose for one nutrient and explain how it was found.
pub fn lookup_base_dose(req: &LookupRequest<'_>) -> ExplainabilityTrace {
    let mut trace = ExplainabilityTrace::new(req.nutrient);
    trace.farming_requested = Some(req.farming);

    let Some(soil_value) = req.soil_value else {
        return trace.blocked(None);
    };

    let Some(key) = select_region_table_key(req.table, req.region, req.crop) else {
        return trace.blocked(Some(Message::new(
            NOT_IN_TABLE,
            format!("No region table key for region \"{}\".", req.region),
        )));
    };
    trace.region_table_key = Some(key.to_string());
    trace.table_id = table_id(key);

    let Some(region_table) = req.table.tables.get(key) else {
        return trace.blocked(Some(Message::new(
            NOT_IN_TABLE,
            format!("Region table \"{}\" is listed but has no data.", key),
        )));
    };

    let Some((crop_key, strategy)) = resolve_crop(req.crop, region_table, req.crop_meta) else {
        return trace.blocked(Some(Message::new(
            NOT_IN_TABLE,
            format!(
                "No crop match for \"{}\" in {} (exact, normalized and alias all failed).",
                req.crop, key
            ),
        )));
    };
    tracing::debug!("{}: crop {} resolved as {} ({:?})", req.nutrient, req.crop, crop_key, strategy);
    trace.crop_matched = Some(crop_key.to_string());
    trace.crop_match_strategy = Some(strategy);

    let crop_node: &CropNode = &region_table[crop_key];
    let (farming_used, cells) = match crop_node.get(&req.farming) {
        Some(cells) => (req.farming, cells),
        None => {
            let other = req.farming.other();
            match crop_node.get(&other) {
                Some(cells) if req.allow_farming_fallback => {
                    trace.farming_fallback_used = true;
                    (other, cells)
                }
                Some(_) => {
                    return trace.blocked(Some(Message::new(
                        NO_PRACTICE_DATA,
                        format!(
                            "Only {} data exists for {}; using it needs the farming fallback permission.",
                            other, crop_key
                        ),
                    )));
                }
                None => {
                    return trace.blocked(Some(Message::new(
                        NO_PRACTICE_DATA,
                        format!(
                            "No {} data for {} and no other practice to fall back to.",
                            req.farming, crop_key
                        ),
                    )));
                }
            }
        }
    };
    trace.farming_used = Some(farming_used);
    trace.soil_value_used = Some(soil_value);
    trace.soil_unit_used = Some(req.soil_unit_label.to_string());

    let Some(bin) = match_bin(soil_value, &req.table.bins) else {
        let bins: Vec<&str> = req.table.bins.iter().map(|b| b.raw.as_str()).collect();
        return trace.blocked(Some(Message::new(
            "No match in the reference table.",
            format!("No bin matches value {}; bins: {:?}.", soil_value, bins),
        )));
    };
    tracing::debug!("{}: soil value {} matched bin {}", req.nutrient, soil_value, bin.raw);
    trace.bin = Some(bin.raw.clone());

    match cells.get(&bin.raw) {
        None => trace.blocked(Some(Message::new(
            NO_PRACTICE_DATA,
            format!(
                "Table cell missing: crop={}, practice={}, bin={}.",
                crop_key, farming_used, bin.raw
            ),
        ))),
        Some(None) => {
            trace.status = TraceStatus::Ok;
            trace.base_dose_kg_da = Some(0.0);
            trace.messages.push(Message::new(
                "Soil level is sufficient; no extra fertilizer is recommended.",
                format!(
                    "Table cell is null: no fertilizer needed in this range. crop={}, practice={}, bin={}.",
                    crop_key, farming_used, bin.raw
                ),
            ));
            trace
        }
        Some(Some(dose)) => {
            trace.status = TraceStatus::Ok;
            trace.base_dose_kg_da = Some(*dose);
            trace
        }
    }
}
