use crate::models::{
    ApplicationStep, Bucket, ProductPlan, ScheduleResult, ScheduledApplication, SchedulePreset,
    Warnings,
};

const FRACTION_TOLERANCE: f64 = 1e-9;
pub const SINGLE_APPLICATION: &str = "Single application";

/// A product to be split into applications.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledProduct {
    pub product_id: String,
    pub product_name: String,
    pub kg_da: f64,
    pub bucket: Bucket,
}

/// Fractions sum to 1 within tolerance.
pub fn validate_fractions(steps: &[ApplicationStep]) -> bool {
    let sum: f64 = steps.iter().map(|s| s.fraction).sum();
    (sum - 1.0).abs() < FRACTION_TOLERANCE
}

fn steps_for<'a>(preset: &'a SchedulePreset, bucket: Bucket, is_sandy: bool) -> &'a [ApplicationStep] {
    let sandy = if is_sandy {
        preset.sandy_overrides.as_ref().and_then(|o| o.get(bucket))
    } else {
        None
    };
    sandy.unwrap_or_else(|| preset.buckets.get(bucket))
}

/// Split each product's kg/da into timed applications.
///
/// Totals are left at zero; [`fill_schedule_totals`] fills them once the
/// area is known.
pub fn build_schedule(
    preset: &SchedulePreset,
    start_month: &str,
    is_sandy: bool,
    products: &[ScheduledProduct],
) -> ScheduleResult {
    let single = [ApplicationStep::new(SINGLE_APPLICATION, 1.0)];

    let plans = products
        .iter()
        .map(|product| {
            let mut steps = steps_for(preset, product.bucket, is_sandy);
            if !validate_fractions(steps) {
                tracing::debug!(
                    "Preset {} bucket {} invalid, using a single application",
                    preset.id,
                    product.bucket.as_str()
                );
                steps = &single[..];
            }

            ProductPlan {
                product_id: product.product_id.clone(),
                product_name: product.product_name.clone(),
                applications: steps
                    .iter()
                    .map(|step| ScheduledApplication {
                        label: step.label.clone(),
                        fraction: step.fraction,
                        kg_da: product.kg_da * step.fraction,
                        total_kg: 0.0,
                    })
                    .collect(),
                total_kg: 0.0,
            }
        })
        .collect();

    ScheduleResult {
        preset_id: preset.id.clone(),
        preset_name: preset.name.clone(),
        start_month: start_month.to_string(),
        plans,
        messages: Warnings::new(),
    }
}

/// Fill per-application and per-plan total kg from the project area.
pub fn fill_schedule_totals(schedule: ScheduleResult, area_da: f64) -> ScheduleResult {
    let plans = schedule
        .plans
        .into_iter()
        .map(|plan| {
            let applications: Vec<ScheduledApplication> = plan
                .applications
                .into_iter()
                .map(|app| ScheduledApplication {
                    total_kg: app.kg_da * area_da,
                    ..app
                })
                .collect();
            let total_kg = applications.iter().map(|a| a.total_kg).sum();
            ProductPlan {
                applications,
                total_kg,
                ..plan
            }
        })
        .collect();

    ScheduleResult { plans, ..schedule }
}
