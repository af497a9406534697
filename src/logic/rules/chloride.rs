use super::{Advisory, SoilSignals};
use crate::models::{Message, ProjectInput};
use crate::settings::Settings;

/// Chloride source advisory
///
/// Fires when the chosen K source carries chloride and either the user asked
/// to avoid chloride or the soil EC indicates salinity risk.
pub struct ChlorideSourceAdvisory;

impl Advisory for ChlorideSourceAdvisory {
    fn id(&self) -> &'static str {
        "chloride_source"
    }

    fn name(&self) -> &'static str {
        "Chloride-Bearing K Source"
    }

    fn evaluate(&self, input: &ProjectInput, settings: &Settings) -> Option<Message> {
        let source = settings.product(&input.prefs.k_source_product_id)?;
        if !source.is_chloride_bearing() {
            return None;
        }

        let salinity = SoilSignals::from_input(input).salinity_risk();
        if !input.prefs.avoid_chloride && !salinity {
            return None;
        }

        Some(Message::new(
            format!(
                "{} contains chloride. Choose a chloride-free potassium source.",
                source.name
            ),
            format!(
                "K source '{}' is chloride-bearing; avoid_chloride={}, salinity risk={}. \
                 Prefer K2SO4 or KNO3.",
                source.id, input.prefs.avoid_chloride, salinity
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EcUnit, FarmingPractice, Preferences, SoilMeasurements};
    use crate::seed;

    fn input(k_source: &str, avoid: bool, ec: Option<f64>) -> ProjectInput {
        ProjectInput::new("p", "Ege", "Zeytin", FarmingPractice::RainFed, 1.0)
            .with_prefs(Preferences {
                k_source_product_id: k_source.into(),
                avoid_chloride: avoid,
                ..Preferences::default()
            })
            .with_soil(SoilMeasurements {
                ec_value: ec,
                ec_unit: ec.map(|_| EcUnit::DsPerM),
                ..SoilMeasurements::default()
            })
    }

    #[test]
    fn chloride_free_source_is_silent() {
        let settings = seed::demo_settings();
        assert!(ChlorideSourceAdvisory
            .evaluate(&input("k2so4", true, Some(5.0)), &settings)
            .is_none());
    }

    #[test]
    fn kcl_needs_avoidance_or_salinity() {
        let settings = seed::demo_settings();
        assert!(ChlorideSourceAdvisory
            .evaluate(&input("kcl", false, Some(1.0)), &settings)
            .is_none());
        assert!(ChlorideSourceAdvisory
            .evaluate(&input("kcl", true, None), &settings)
            .is_some());
        assert!(ChlorideSourceAdvisory
            .evaluate(&input("kcl", false, Some(2.0)), &settings)
            .is_some());
    }

    #[test]
    fn unknown_source_is_silent() {
        let settings = seed::demo_settings();
        assert!(ChlorideSourceAdvisory
            .evaluate(&input("mystery", true, None), &settings)
            .is_none());
    }
}
