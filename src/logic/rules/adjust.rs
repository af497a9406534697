use super::SoilSignals;
use crate::logic::calculations::clamp;
use crate::models::{AdjustmentRecord, AdjustmentRule, ExplainabilityTrace, ProjectInput, Warnings};

/// Bounds on a single rule's multiplier.
pub const RULE_MULTIPLIER_MIN: f64 = 0.8;
pub const RULE_MULTIPLIER_MAX: f64 = 1.2;
/// Bounds on the product of every dose-changing rule for one nutrient.
pub const COMBINED_MULTIPLIER_MIN: f64 = 0.75;
pub const COMBINED_MULTIPLIER_MAX: f64 = 1.25;

/// Layer 3: conditional, capped multiplicative adjustments.
///
/// Rules run in declared order. Warning-only rules add their message to
/// `warnings` and log a ×1 record. Every other rule moves the running
/// combined multiplier, and the dose is scaled by the step between the
/// previous and the newly capped combined value, so later rules see the cap
/// that earlier rules already used up.
pub fn apply_adjustments(
    input: &ProjectInput,
    rules: &[AdjustmentRule],
    trace: ExplainabilityTrace,
    warnings: &mut Warnings,
) -> ExplainabilityTrace {
    if !trace.is_ok() {
        return trace;
    }
    let base = trace.current_dose().unwrap_or(0.0);

    if !input.prefs.enable_layer3_adjustments {
        return ExplainabilityTrace {
            adjustments: Vec::new(),
            final_dose_kg_da: Some(base),
            ..trace
        };
    }

    let nutrient = trace.nutrient;
    let signals = SoilSignals::from_input(input);
    let mut applied = Vec::new();
    let mut combined = 1.0;
    let mut current = base;

    for rule in rules
        .iter()
        .filter(|r| r.applies_to(nutrient) && signals.satisfies(&r.condition))
    {
        if rule.warning_only {
            warnings.push(&rule.message);
            applied.push(AdjustmentRecord {
                nutrient,
                rule_id: rule.id.clone(),
                multiplier: 1.0,
                before: current,
                after: current,
                message: rule.message.clone(),
                warning_only: true,
            });
            continue;
        }

        let before = current;
        let per_rule = clamp(rule.multiplier(nutrient), RULE_MULTIPLIER_MIN, RULE_MULTIPLIER_MAX);
        let next_combined = clamp(
            combined * per_rule,
            COMBINED_MULTIPLIER_MIN,
            COMBINED_MULTIPLIER_MAX,
        );
        let effective = next_combined / combined;

        current = before * effective;
        combined = next_combined;
        tracing::debug!(
            "{}: rule {} x{:.4} ({} -> {})",
            nutrient,
            rule.id,
            effective,
            before,
            current
        );

        applied.push(AdjustmentRecord {
            nutrient,
            rule_id: rule.id.clone(),
            multiplier: effective,
            before,
            after: current,
            message: rule.message.clone(),
            warning_only: false,
        });
    }

    ExplainabilityTrace {
        adjustments: applied,
        final_dose_kg_da: Some(current),
        ..trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        FarmingPractice, Message, NutrientKey, Preferences, RuleCondition, SoilMeasurements,
        TraceStatus,
    };
    use std::collections::BTreeMap;

    fn rule(id: &str, multiplier: f64) -> AdjustmentRule {
        AdjustmentRule {
            id: id.into(),
            enabled_by_default: false,
            applies_to: vec![NutrientKey::P2O5],
            condition: RuleCondition::default(),
            multiplier_by_nutrient: BTreeMap::from([(NutrientKey::P2O5, multiplier)]),
            message: Message::new(format!("{id} farmer"), format!("{id} expert")),
            warning_only: false,
        }
    }

    fn warning(id: &str) -> AdjustmentRule {
        AdjustmentRule {
            warning_only: true,
            multiplier_by_nutrient: BTreeMap::new(),
            ..rule(id, 1.0)
        }
    }

    fn input(layer3: bool) -> ProjectInput {
        ProjectInput::new("p", "Ege", "Zeytin", FarmingPractice::RainFed, 10.0).with_prefs(
            Preferences {
                enable_layer3_adjustments: layer3,
                ..Preferences::default()
            },
        )
    }

    fn trace(dose: f64) -> ExplainabilityTrace {
        let mut t = ExplainabilityTrace::new(NutrientKey::P2O5);
        t.status = TraceStatus::Ok;
        t.base_dose_kg_da = Some(dose);
        t.final_dose_kg_da = Some(dose);
        t
    }

    #[test]
    fn disabled_layer_passes_through() {
        let mut w = Warnings::new();
        let t = apply_adjustments(&input(false), &[rule("a", 1.1)], trace(10.0), &mut w);
        assert_eq!(t.final_dose_kg_da, Some(10.0));
        assert!(t.adjustments.is_empty());
        assert!(w.is_empty());
    }

    #[test]
    fn per_rule_multiplier_is_capped() {
        let mut w = Warnings::new();
        let t = apply_adjustments(&input(true), &[rule("big", 1.5)], trace(10.0), &mut w);
        assert!((t.final_dose_kg_da.unwrap() - 12.0).abs() < 1e-9);
        assert!((t.adjustments[0].multiplier - 1.2).abs() < 1e-12);

        let t = apply_adjustments(&input(true), &[rule("small", 0.5)], trace(10.0), &mut w);
        assert!((t.final_dose_kg_da.unwrap() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn combined_cap_uses_delta_multiplier() {
        let mut w = Warnings::new();
        let rules = [rule("a", 1.1), rule("b", 1.1), rule("c", 1.2)];
        let t = apply_adjustments(&input(true), &rules, trace(10.0), &mut w);

        let m: Vec<f64> = t.adjustments.iter().map(|a| a.multiplier).collect();
        assert!((m[0] - 1.1).abs() < 1e-12);
        assert!((m[1] - 1.1).abs() < 1e-12);
        // 1.21 * 1.2 = 1.452 is capped at 1.25, so the step is 1.25 / 1.21.
        assert!((m[2] - 1.25 / 1.21).abs() < 1e-12);
        assert!((t.final_dose_kg_da.unwrap() - 12.5).abs() < 1e-9);
        assert!((t.adjustments[2].before - 12.1).abs() < 1e-9);
    }

    #[test]
    fn rule_order_matters_once_capped() {
        let mut w = Warnings::new();
        let up_first = [rule("up", 1.2), rule("up2", 1.2), rule("down", 0.8)];
        let down_first = [rule("down", 0.8), rule("up", 1.2), rule("up2", 1.2)];
        let a = apply_adjustments(&input(true), &up_first, trace(10.0), &mut w);
        let b = apply_adjustments(&input(true), &down_first, trace(10.0), &mut w);
        // 1.2 * 1.2 caps at 1.25, then * 0.8 = 1.0
        assert!((a.final_dose_kg_da.unwrap() - 10.0).abs() < 1e-9);
        // 0.8 * 1.2 * 1.2 = 1.152, never capped
        assert!((b.final_dose_kg_da.unwrap() - 11.52).abs() < 1e-9);
    }

    #[test]
    fn warning_only_rule_logs_without_changing_dose() {
        let mut w = Warnings::new();
        let rules = [warning("salt"), rule("a", 1.1)];
        let t = apply_adjustments(&input(true), &rules, trace(10.0), &mut w);
        assert_eq!(w.farmer, vec!["salt farmer"]);
        assert_eq!(w.expert, vec!["salt expert"]);
        assert!(t.adjustments[0].warning_only);
        assert_eq!(t.adjustments[0].multiplier, 1.0);
        assert_eq!(t.adjustments[0].before, t.adjustments[0].after);
        assert!((t.final_dose_kg_da.unwrap() - 11.0).abs() < 1e-9);
    }

    #[test]
    fn unmet_condition_and_other_nutrients_are_skipped() {
        let mut w = Warnings::new();
        let mut needs_ph = rule("ph", 1.1);
        needs_ph.condition.ph_gte = Some(7.8);
        let mut n_only = rule("n", 1.1);
        n_only.applies_to = vec![NutrientKey::N];

        let project = input(true).with_soil(SoilMeasurements {
            ph: Some(7.0),
            ..SoilMeasurements::default()
        });
        let t = apply_adjustments(&project, &[needs_ph, n_only], trace(10.0), &mut w);
        assert!(t.adjustments.is_empty());
        assert_eq!(t.final_dose_kg_da, Some(10.0));
    }

    #[test]
    fn missing_multiplier_defaults_to_one() {
        let mut w = Warnings::new();
        let mut r = rule("none", 1.0);
        r.multiplier_by_nutrient.clear();
        let t = apply_adjustments(&input(true), &[r], trace(10.0), &mut w);
        assert_eq!(t.adjustments[0].multiplier, 1.0);
        assert_eq!(t.final_dose_kg_da, Some(10.0));
    }
}
