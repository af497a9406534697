use super::Advisory;
use crate::models::{Message, ProjectInput};
use crate::settings::Settings;

const HIGH_PH: f64 = 7.8;
const HIGH_LIME_PCT: f64 = 15.0;

/// Band placement hint for P on alkaline, calcareous soils
///
/// Conditions:
/// - pH >= 7.8
/// - Lime >= 15%
pub struct BandPlacementAdvisory;

impl Advisory for BandPlacementAdvisory {
    fn id(&self) -> &'static str {
        "band_placement"
    }

    fn name(&self) -> &'static str {
        "Phosphorus Band Placement"
    }

    fn evaluate(&self, input: &ProjectInput, _settings: &Settings) -> Option<Message> {
        let ph = input.soil.ph.unwrap_or(0.0);
        let lime = input.soil.lime_pct.unwrap_or(0.0);
        if ph < HIGH_PH || lime < HIGH_LIME_PCT {
            return None;
        }

        Some(Message::new(
            "High pH and lime: place phosphorus in bands near the roots instead of broadcasting.",
            format!(
                "pH {:.1} and lime {:.1}% favour P fixation; band placement improves P availability.",
                ph, lime
            ),
        ))
    }
}
