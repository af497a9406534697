use super::{ExplainabilityTrace, NutrientKey, PerNutrient, Warnings};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancedLine {
    pub product_id: String,
    pub product_name: String,
    pub kg_da: f64,
    pub total_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kg_per_tree: Option<f64>,
    /// Nutrient kg/da this line supplies.
    pub contributes: BTreeMap<NutrientKey, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceTotals {
    pub kg_da: f64,
    pub total_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceResult {
    pub blocked: bool,
    pub messages: Warnings,
    pub lines: Vec<BalancedLine>,
    pub totals: BalanceTotals,
    /// Nitrogen still to supply after the P and K products' share.
    pub remaining_n_kg_da: f64,
}

impl BalanceResult {
    pub fn blocked(messages: Warnings) -> Self {
        Self {
            blocked: true,
            messages,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub product_id: String,
    pub product_name: String,
    pub kg_da: f64,
    pub total_kg: f64,
    pub unit_price_per_kg: Option<f64>,
    pub line_cost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MostExpensive {
    pub product_id: String,
    pub product_name: String,
    pub line_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostResult {
    /// False when no line has a known price; aggregates are then `None`.
    pub available: bool,
    pub cost_per_da: Option<f64>,
    pub total_cost: Option<f64>,
    pub most_expensive: Option<MostExpensive>,
    pub lines: Vec<CostLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledApplication {
    pub label: String,
    pub fraction: f64,
    pub kg_da: f64,
    pub total_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPlan {
    pub product_id: String,
    pub product_name: String,
    pub applications: Vec<ScheduledApplication>,
    pub total_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub preset_id: String,
    pub preset_name: String,
    pub start_month: String,
    pub plans: Vec<ProductPlan>,
    pub messages: Warnings,
}

/// Nutrient layer output: display targets, traces, and warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResult {
    /// Final targets rounded for display; blocked nutrients are absent.
    pub targets: BTreeMap<NutrientKey, f64>,
    pub explain: PerNutrient<ExplainabilityTrace>,
    pub warnings: Warnings,
}

/// A complete dosing recommendation for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    pub engine: EngineResult,
    pub balance: BalanceResult,
    pub cost: CostResult,
    pub schedule: Option<ScheduleResult>,
}

impl Recommendation {
    pub fn is_blocked(&self) -> bool {
        self.balance.blocked
    }
}
