use super::{
    band_placement::BandPlacementAdvisory, chloride::ChlorideSourceAdvisory,
    leaf::LeafAnalysisAdvisory, Advisory,
};
use crate::models::{Message, ProjectInput};
use crate::settings::Settings;

/// Runs the advisory checks in a fixed order.
pub struct AdvisoryEngine {
    advisories: Vec<Box<dyn Advisory>>,
}

impl AdvisoryEngine {
    pub fn new() -> Self {
        let advisories: Vec<Box<dyn Advisory>> = vec![
            Box::new(LeafAnalysisAdvisory),
            Box::new(ChlorideSourceAdvisory),
            Box::new(BandPlacementAdvisory),
        ];

        Self { advisories }
    }

    pub fn evaluate(&self, input: &ProjectInput, settings: &Settings) -> Vec<Message> {
        self.advisories
            .iter()
            .filter_map(|a| a.evaluate(input, settings))
            .collect()
    }

    pub fn list_advisories(&self) -> Vec<(&'static str, &'static str)> {
        self.advisories.iter().map(|a| (a.id(), a.name())).collect()
    }
}

impl Default for AdvisoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FarmingPractice, LeafAnalysis, Preferences, SoilMeasurements};
    use crate::seed;

    #[test]
    fn lists_in_evaluation_order() {
        let ids: Vec<_> = AdvisoryEngine::new()
            .list_advisories()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["leaf_advisory", "chloride_source", "band_placement"]);
    }

    #[test]
    fn messages_follow_advisory_order() {
        let settings = seed::demo_settings();
        let mut input = ProjectInput::new("p", "Ege", "Zeytin", FarmingPractice::RainFed, 1.0)
            .with_soil(SoilMeasurements {
                ph: Some(8.0),
                lime_pct: Some(20.0),
                ..SoilMeasurements::default()
            })
            .with_prefs(Preferences {
                k_source_product_id: "kcl".into(),
                avoid_chloride: true,
                ..Preferences::default()
            });
        input.leaf = Some(LeafAnalysis {
            enabled: true,
            ..LeafAnalysis::default()
        });

        let engine = AdvisoryEngine::new();
        let messages = engine.evaluate(&input, &settings);
        assert_eq!(messages.len(), 3);
        assert_eq!(
            Some(messages[2].clone()),
            BandPlacementAdvisory.evaluate(&input, &settings)
        );
    }
}
