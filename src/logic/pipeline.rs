use super::balancer::balance_fertilizers;
use super::calculations::round_to;
use super::clamp::apply_range_clamp;
use super::cost::compute_cost;
use super::lookup::{lookup_base_dose, LookupRequest};
use super::rules::{apply_adjustments, AdvisoryEngine};
use super::schedule::{build_schedule, fill_schedule_totals, ScheduledProduct};
use crate::error::Result;
use crate::models::{
    BalanceResult, Bucket, EngineResult, ExplainabilityTrace, Message, NutrientKey, PerNutrient,
    ProjectInput, Recommendation, ScheduleResult, SoilNutrientUnit, TraceStatus, Warnings,
};
use crate::settings::Settings;

/// Sand % at or above which a soil is treated as sandy.
pub const SANDY_SAND_PCT: f64 = 60.0;

pub const N_SOIL_LABEL: &str = "OM% (N table bins)";
pub const P_SOIL_LABEL: &str = "Olsen P (kg/da)";
pub const K_SOIL_LABEL: &str = "Available K (kg/da)";

const PPM_REFUSAL: &str =
    "ppm was given: converting to kg/da needs sampling depth and bulk density.";

/// Soil value a nutrient's table is keyed by, or the trace that stops it.
fn soil_signal(
    nutrient: NutrientKey,
    input: &ProjectInput,
) -> std::result::Result<(f64, &'static str), ExplainabilityTrace> {
    let soil = &input.soil;
    let (value, unit, label, farmer) = match nutrient {
        NutrientKey::N => (
            soil.om_pct,
            SoilNutrientUnit::KgPerDa,
            N_SOIL_LABEL,
            "Organic matter % is required for nitrogen.",
        ),
        NutrientKey::P2O5 => (
            soil.p_olsen_value,
            soil.p_olsen_unit,
            P_SOIL_LABEL,
            "Olsen P (kg/da) is required for phosphorus.",
        ),
        NutrientKey::K2O => (
            soil.k_available_value,
            soil.k_available_unit,
            K_SOIL_LABEL,
            "Available K (kg/da) is required for potassium.",
        ),
    };

    let Some(value) = value else {
        return Err(ExplainabilityTrace::halted(
            nutrient,
            TraceStatus::Missing,
            Message::new(farmer, format!("No {} measurement was provided.", label)),
        ));
    };

    if unit == SoilNutrientUnit::Ppm {
        tracing::warn!("{}: refusing ppm soil value without bulk density", nutrient);
        return Err(ExplainabilityTrace::halted(
            nutrient,
            TraceStatus::Blocked,
            Message::new(farmer, PPM_REFUSAL),
        ));
    }

    Ok((value, label))
}

/// Layers 1-3 for one nutrient.
fn nutrient_trace(
    nutrient: NutrientKey,
    input: &ProjectInput,
    settings: &Settings,
    warnings: &mut Warnings,
) -> ExplainabilityTrace {
    let base = match soil_signal(nutrient, input) {
        Err(halted) => halted,
        Ok((value, label)) => lookup_base_dose(&LookupRequest {
            nutrient,
            table: settings.reference_tables.get(nutrient),
            crop_meta: &settings.crop_meta,
            region: &input.region,
            crop: &input.crop,
            farming: input.farming,
            allow_farming_fallback: input.allow_farming_fallback,
            soil_value: Some(value),
            soil_unit_label: label,
        }),
    };
    let clamped = apply_range_clamp(&input.crop, &settings.crop_meta, base);
    apply_adjustments(input, &settings.adjustment_rules, clamped, warnings)
}

fn bucket_for(product_id: &str, input: &ProjectInput) -> Bucket {
    if product_id == input.prefs.p_source_product_id {
        Bucket::P
    } else if product_id == input.prefs.k_source_product_id {
        Bucket::K
    } else {
        Bucket::N
    }
}

fn schedule_for(
    input: &ProjectInput,
    settings: &Settings,
    balance: &BalanceResult,
) -> Option<ScheduleResult> {
    let preset = settings.preset(&input.prefs.schedule_preset_id)?;
    let is_sandy = input.soil.sand_pct.unwrap_or(0.0) >= SANDY_SAND_PCT;

    let products: Vec<ScheduledProduct> = balance
        .lines
        .iter()
        .filter(|l| l.kg_da > 0.0)
        .map(|l| ScheduledProduct {
            product_id: l.product_id.clone(),
            product_name: l.product_name.clone(),
            kg_da: l.kg_da,
            bucket: bucket_for(&l.product_id, input),
        })
        .collect();

    let schedule = build_schedule(preset, &input.prefs.start_month, is_sandy, &products);
    Some(fill_schedule_totals(schedule, input.area_da))
}

/// Run the whole pipeline for one project.
pub fn compute_recommendation(input: &ProjectInput, settings: &Settings) -> Recommendation {
    tracing::info!(
        "Computing recommendation for {} ({} / {} / {})",
        input.id,
        input.region,
        input.crop,
        input.farming.as_str()
    );

    let mut warnings = Warnings::new();
    let explain =
        PerNutrient::from_fn(|nutrient| nutrient_trace(nutrient, input, settings, &mut warnings));

    for message in AdvisoryEngine::new().evaluate(input, settings) {
        warnings.push(&message);
    }

    // Balancing uses the unrounded final doses.
    let targets: PerNutrient<Option<f64>> = PerNutrient::from_fn(|n| {
        let trace = explain.get(n);
        if trace.is_ok() {
            trace.current_dose()
        } else {
            None
        }
    });
    let blocked = PerNutrient::from_fn(|n| !explain.get(n).is_ok());

    let balance = balance_fertilizers(input, settings, &targets, &blocked);
    let cost = compute_cost(&balance.lines, &input.prices, input.area_da);
    let schedule = schedule_for(input, settings, &balance);

    let precision = input.prefs.precision;
    let display_targets = targets
        .iter()
        .filter_map(|(n, t)| t.map(|dose| (n, round_to(dose, precision))))
        .collect();

    tracing::info!(
        "Recommendation for {} done ({} product lines{})",
        input.id,
        balance.lines.len(),
        if balance.blocked { ", blocked" } else { "" }
    );

    Recommendation {
        project_id: input.id.clone(),
        project_name: input.project_name.clone(),
        created_at: input.created_at,
        scenario: None,
        engine: EngineResult {
            targets: display_targets,
            explain,
            warnings,
        },
        balance,
        cost,
        schedule,
    }
}

/// Run the pipeline with a named scenario's preferences and prices.
pub fn compute_scenario(
    input: &ProjectInput,
    settings: &Settings,
    scenario: &str,
) -> Result<Recommendation> {
    let variant = input.with_scenario(scenario)?;
    let mut recommendation = compute_recommendation(&variant, settings);
    recommendation.scenario = Some(scenario.to_string());
    Ok(recommendation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        EcUnit, FarmingPractice, IrrigationSystem, Preferences, Scenario, SoilMeasurements,
    };
    use crate::seed;

    fn soil() -> SoilMeasurements {
        SoilMeasurements {
            om_pct: Some(1.5),
            p_olsen_value: Some(4.0),
            k_available_value: Some(30.0),
            ..SoilMeasurements::default()
        }
    }

    fn olive_project() -> ProjectInput {
        ProjectInput::new("olive-1", "Ege", "Zeytin", FarmingPractice::RainFed, 10.0)
            .with_soil(soil())
    }

    #[test]
    fn end_to_end_without_adjustments() {
        let settings = seed::demo_settings();
        let rec = compute_recommendation(&olive_project(), &settings);

        assert_eq!(rec.engine.targets[&NutrientKey::N], 12.0);
        assert_eq!(rec.engine.targets[&NutrientKey::P2O5], 6.0);
        assert_eq!(rec.engine.targets[&NutrientKey::K2O], 8.0);
        assert_eq!(
            rec.engine.explain.n.region_table_key.as_deref(),
            Some("Ege|table16")
        );
        assert_eq!(rec.engine.explain.n.soil_unit_used.as_deref(), Some(N_SOIL_LABEL));

        assert!(!rec.is_blocked());
        let kg: Vec<f64> = rec.balance.lines.iter().map(|l| l.kg_da).collect();
        assert_eq!(kg, vec![13.0, 16.0, 21.0]);

        assert!(!rec.cost.available);
        assert_eq!(rec.cost.total_cost, None);

        let schedule = rec.schedule.unwrap();
        assert_eq!(schedule.preset_id, "classic");
        assert_eq!(schedule.plans.len(), 3);
        // urea: 21 kg/da * 0.4 * 10 da
        assert!((schedule.plans[2].applications[0].total_kg - 84.0).abs() < 1e-9);
        assert!((schedule.plans[2].total_kg - 210.0).abs() < 1e-9);
    }

    #[test]
    fn layer3_adjusts_before_balancing() {
        let settings = seed::demo_settings();
        let mut project = olive_project();
        project.prefs.enable_layer3_adjustments = true;
        project.soil.ph = Some(8.0);
        project.soil.lime_pct = Some(20.0);

        let rec = compute_recommendation(&project, &settings);
        // P: 6 * 1.1 * 1.1 = 7.26; N: 12 * 1.1 (OM < 2)
        assert_eq!(rec.engine.targets[&NutrientKey::P2O5], 7.3);
        assert_eq!(rec.engine.targets[&NutrientKey::N], 13.2);
        assert_eq!(rec.engine.explain.p2o5.adjustments.len(), 2);
        // 7.26 / 0.46 = 15.78 -> 15.8, from the unrounded target
        assert_eq!(rec.balance.lines[0].kg_da, 15.8);
        // band placement advisory
        assert!(!rec.engine.warnings.farmer.is_empty());
    }

    #[test]
    fn missing_measurement_marks_nutrient_missing() {
        let settings = seed::demo_settings();
        let mut project = olive_project();
        project.soil.k_available_value = None;

        let rec = compute_recommendation(&project, &settings);
        assert_eq!(rec.engine.explain.k2o.status, TraceStatus::Missing);
        assert_eq!(rec.engine.explain.k2o.messages.len(), 1);
        assert!(!rec.engine.targets.contains_key(&NutrientKey::K2O));
        let ids: Vec<&str> = rec.balance.lines.iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(ids, vec!["dap", "urea"]);
    }

    #[test]
    fn ppm_unit_is_refused() {
        let settings = seed::demo_settings();
        let mut project = olive_project();
        project.soil.p_olsen_unit = SoilNutrientUnit::Ppm;

        let rec = compute_recommendation(&project, &settings);
        let p = &rec.engine.explain.p2o5;
        assert_eq!(p.status, TraceStatus::Blocked);
        assert_eq!(p.messages[0].expert, PPM_REFUSAL);
        assert!(p.base_dose_kg_da.is_none());
    }

    #[test]
    fn everything_blocked_gives_blocked_balance() {
        let settings = seed::demo_settings();
        let project = ProjectInput::new("x", "Karadeniz", "Çay", FarmingPractice::RainFed, 5.0)
            .with_soil(soil());
        let rec = compute_recommendation(&project, &settings);
        assert!(rec.is_blocked());
        assert!(rec.engine.targets.is_empty());
        assert!(rec.balance.messages.is_empty());
        assert!(rec.schedule.unwrap().plans.is_empty());
    }

    #[test]
    fn sandy_soil_uses_override() {
        let settings = seed::demo_settings();
        let mut project = olive_project();
        project.soil.sand_pct = Some(65.0);
        let rec = compute_recommendation(&project, &settings);
        let k_plan = &rec.schedule.unwrap().plans[1];
        assert_eq!(k_plan.product_id, "k2so4");
        assert_eq!(k_plan.applications[0].fraction, 0.5);
    }

    #[test]
    fn salinity_and_drip_warnings_repeat_per_nutrient() {
        let settings = seed::demo_settings();
        let mut project = olive_project().with_irrigation(IrrigationSystem::Drip);
        project.prefs.enable_layer3_adjustments = true;
        project.soil.om_pct = Some(3.5);
        project.soil.ec_value = Some(2500.0);
        project.soil.ec_unit = Some(EcUnit::UsPerCm);

        let rec = compute_recommendation(&project, &settings);
        // two warning-only rules, three nutrients each
        assert_eq!(rec.engine.warnings.farmer.len(), 6);
        assert_eq!(rec.engine.warnings.expert.len(), 6);
    }

    #[test]
    fn scenario_swaps_preferences_and_prices() {
        let settings = seed::demo_settings();
        let mut project = olive_project();
        project.scenarios.insert(
            "B".into(),
            Scenario {
                label: "MAP + KNO3".into(),
                prefs: Preferences {
                    p_source_product_id: "map".into(),
                    k_source_product_id: "kno3".into(),
                    ..Preferences::default()
                },
                prices: [("map".to_string(), Some(30.0))].into_iter().collect(),
            },
        );

        let rec = compute_scenario(&project, &settings, "B").unwrap();
        assert_eq!(rec.scenario.as_deref(), Some("B"));
        assert_eq!(rec.balance.lines[0].product_id, "map");
        assert!(rec.cost.available);

        assert!(compute_scenario(&project, &settings, "C").is_err());
    }

    #[test]
    fn identical_inputs_serialize_identically() {
        let settings = seed::demo_settings();
        let mut project = olive_project();
        project.prefs.enable_layer3_adjustments = true;
        project.soil.ph = Some(7.9);

        let a = serde_json::to_string(&compute_recommendation(&project, &settings)).unwrap();
        let b = serde_json::to_string(&compute_recommendation(&project, &settings)).unwrap();
        assert_eq!(a, b);
    }
}
