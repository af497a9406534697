pub mod adjust;
pub mod band_placement;
pub mod chloride;
pub mod engine;
pub mod leaf;

pub use adjust::apply_adjustments;
pub use engine::AdvisoryEngine;

use super::calculations::ec_to_ds_m;
use crate::models::{IrrigationSystem, Message, ProjectInput, RuleCondition};
use crate::settings::Settings;

/// EC at or above this (dS/m) is treated as a salinity risk.
pub const SALINITY_EC_DS_M: f64 = 2.0;

/// Trait for advisory checks that warn without changing any dose
pub trait Advisory: Send + Sync {
    /// Unique identifier for this advisory
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Evaluate the advisory and return a message if its conditions are met
    fn evaluate(&self, input: &ProjectInput, settings: &Settings) -> Option<Message>;
}

/// Soil and site values that rule conditions test against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilSignals {
    pub ph: Option<f64>,
    pub lime_pct: Option<f64>,
    pub om_pct: Option<f64>,
    pub ec_ds_m: Option<f64>,
    pub sand_pct: Option<f64>,
    pub irrigation: IrrigationSystem,
}

impl SoilSignals {
    pub fn from_input(input: &ProjectInput) -> Self {
        let soil = &input.soil;
        // EC needs both a value and its unit.
        let ec_ds_m = match (soil.ec_value, soil.ec_unit) {
            (Some(v), Some(unit)) => Some(ec_to_ds_m(v, unit)),
            _ => None,
        };
        Self {
            ph: soil.ph,
            lime_pct: soil.lime_pct,
            om_pct: soil.om_pct,
            ec_ds_m,
            sand_pct: soil.sand_pct,
            irrigation: input.irrigation,
        }
    }

    /// All set clauses hold. A clause on a value we do not have fails.
    pub fn satisfies(&self, c: &RuleCondition) -> bool {
        fn at_least(value: Option<f64>, threshold: Option<f64>) -> bool {
            match threshold {
                None => true,
                Some(t) => value.map_or(false, |v| v >= t),
            }
        }

        let om_ok = match c.om_pct_lt {
            None => true,
            Some(t) => self.om_pct.map_or(false, |v| v < t),
        };
        let irrigation_ok = c.irrigation_is.map_or(true, |i| i == self.irrigation);

        at_least(self.ph, c.ph_gte)
            && at_least(self.lime_pct, c.lime_pct_gte)
            && om_ok
            && at_least(self.ec_ds_m, c.ec_ds_m_gte)
            && at_least(self.sand_pct, c.sand_pct_gte)
            && irrigation_ok
    }

    pub fn salinity_risk(&self) -> bool {
        self.ec_ds_m.map_or(false, |ec| ec >= SALINITY_EC_DS_M)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EcUnit, FarmingPractice, SoilMeasurements};

    fn signals(soil: SoilMeasurements) -> SoilSignals {
        let input = ProjectInput::new("p", "Ege", "Zeytin", FarmingPractice::RainFed, 1.0)
            .with_soil(soil)
            .with_irrigation(IrrigationSystem::Drip);
        SoilSignals::from_input(&input)
    }

    #[test]
    fn empty_condition_always_holds() {
        let s = signals(SoilMeasurements::default());
        assert!(s.satisfies(&RuleCondition::default()));
    }

    #[test]
    fn missing_value_fails_clause() {
        let s = signals(SoilMeasurements::default());
        let c = RuleCondition {
            ph_gte: Some(7.8),
            ..RuleCondition::default()
        };
        assert!(!s.satisfies(&c));
        let c = RuleCondition {
            om_pct_lt: Some(2.0),
            ..RuleCondition::default()
        };
        assert!(!s.satisfies(&c));
    }

    #[test]
    fn clauses_are_conjunctive() {
        let s = signals(SoilMeasurements {
            ph: Some(8.1),
            lime_pct: Some(10.0),
            ..SoilMeasurements::default()
        });
        let c = RuleCondition {
            ph_gte: Some(7.8),
            lime_pct_gte: Some(15.0),
            ..RuleCondition::default()
        };
        assert!(!s.satisfies(&c));
        let c = RuleCondition {
            ph_gte: Some(7.8),
            irrigation_is: Some(IrrigationSystem::Drip),
            ..RuleCondition::default()
        };
        assert!(s.satisfies(&c));
    }

    #[test]
    fn ec_without_unit_is_unknown() {
        let s = signals(SoilMeasurements {
            ec_value: Some(3.0),
            ..SoilMeasurements::default()
        });
        assert_eq!(s.ec_ds_m, None);
        assert!(!s.salinity_risk());

        let s = signals(SoilMeasurements {
            ec_value: Some(2000.0),
            ec_unit: Some(EcUnit::UsPerCm),
            ..SoilMeasurements::default()
        });
        assert!(s.salinity_risk());
    }
}
