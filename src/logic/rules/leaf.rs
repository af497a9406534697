use super::Advisory;
use crate::models::{Message, ProjectInput};
use crate::settings::Settings;

/// Leaf analysis advisory
///
/// Leaf values never change target doses. When leaf analysis is enabled the
/// farmer is told it is advisory; the expert text depends on whether the
/// advanced correction flag is set.
pub struct LeafAnalysisAdvisory;

impl Advisory for LeafAnalysisAdvisory {
    fn id(&self) -> &'static str {
        "leaf_advisory"
    }

    fn name(&self) -> &'static str {
        "Leaf Analysis Advisory"
    }

    fn evaluate(&self, input: &ProjectInput, _settings: &Settings) -> Option<Message> {
        let leaf = input.leaf.as_ref().filter(|l| l.enabled)?;

        let expert = if leaf.enable_leaf_correction_advanced {
            "Advanced leaf correction was requested but is not applied; targets remain soil-based."
        } else {
            "Leaf analysis does not modify target doses (advanced correction is off)."
        };

        Some(Message::new(
            "Leaf analysis is used for warnings and hints only.",
            expert,
        ))
    }
}
