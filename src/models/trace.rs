use super::{FarmingPractice, Message, NutrientKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    Ok,
    Blocked,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropMatchStrategy {
    Exact,
    Normalized,
    Alias,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClampRecord {
    pub before: f64,
    pub after: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRecord {
    pub nutrient: NutrientKey,
    pub rule_id: String,
    /// Effective multiplier applied to the running dose.
    pub multiplier: f64,
    pub before: f64,
    pub after: f64,
    pub message: Message,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub warning_only: bool,
}

/// Everything decided for one nutrient, from table lookup to final dose.
///
/// Each layer consumes the previous trace and returns a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainabilityTrace {
    pub nutrient: NutrientKey,
    pub status: TraceStatus,
    pub messages: Vec<Message>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_table_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_value_used: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_unit_used: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_matched: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_match_strategy: Option<CropMatchStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farming_requested: Option<FarmingPractice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farming_used: Option<FarmingPractice>,
    #[serde(default)]
    pub farming_fallback_used: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dose_kg_da: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clamped: Option<ClampRecord>,
    #[serde(default)]
    pub adjustments: Vec<AdjustmentRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_dose_kg_da: Option<f64>,
}

impl ExplainabilityTrace {
    pub fn new(nutrient: NutrientKey) -> Self {
        Self {
            nutrient,
            status: TraceStatus::Missing,
            messages: Vec::new(),
            region_table_key: None,
            table_id: None,
            bin: None,
            soil_value_used: None,
            soil_unit_used: None,
            crop_matched: None,
            crop_match_strategy: None,
            farming_requested: None,
            farming_used: None,
            farming_fallback_used: false,
            base_dose_kg_da: None,
            clamped: None,
            adjustments: Vec::new(),
            final_dose_kg_da: None,
        }
    }

    /// A trace that stops before lookup, e.g. a missing soil measurement.
    pub fn halted(nutrient: NutrientKey, status: TraceStatus, message: Message) -> Self {
        Self {
            status,
            messages: vec![message],
            ..Self::new(nutrient)
        }
    }

    pub fn blocked(mut self, message: Option<Message>) -> Self {
        self.status = TraceStatus::Blocked;
        self.messages.extend(message);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == TraceStatus::Ok
    }

    /// Current working dose: final if a layer has set it, else the base dose.
    pub fn current_dose(&self) -> Option<f64> {
        self.final_dose_kg_da.or(self.base_dose_kg_da)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halted_trace_carries_message() {
        let t = ExplainabilityTrace::halted(
            NutrientKey::P2O5,
            TraceStatus::Missing,
            Message::new("need P", "Olsen P missing"),
        );
        assert_eq!(t.status, TraceStatus::Missing);
        assert_eq!(t.messages.len(), 1);
        assert!(!t.is_ok());
    }

    #[test]
    fn current_dose_prefers_final() {
        let mut t = ExplainabilityTrace::new(NutrientKey::N);
        assert_eq!(t.current_dose(), None);
        t.base_dose_kg_da = Some(10.0);
        assert_eq!(t.current_dose(), Some(10.0));
        t.final_dose_kg_da = Some(12.0);
        assert_eq!(t.current_dose(), Some(12.0));
    }

    #[test]
    fn serializes_status_snake_case() {
        let t = ExplainabilityTrace::new(NutrientKey::K2O).blocked(None);
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"status\":\"blocked\""));
        assert!(json.contains("\"nutrient\":\"K2O\""));
        assert!(!json.contains("region_table_key"));
    }
}
