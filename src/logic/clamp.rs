use super::calculations::clamp;
use crate::models::{ClampRecord, CropMeta, ExplainabilityTrace};

/// Layer 2: bound the base dose to the crop's maintenance range.
///
/// The range is looked up under `crop` first, then under the crop name the
/// table lookup resolved to. Non-ok traces pass through untouched.
pub fn apply_range_clamp(
    crop: &str,
    crop_meta: &CropMeta,
    trace: ExplainabilityTrace,
) -> ExplainabilityTrace {
    if !trace.is_ok() {
        return trace;
    }
    let Some(before) = trace.base_dose_kg_da else {
        return trace;
    };

    let range = crop_meta.range(crop, trace.nutrient).or_else(|| {
        trace
            .crop_matched
            .as_deref()
            .and_then(|matched| crop_meta.range(matched, trace.nutrient))
    });

    let Some(range) = range else {
        return ExplainabilityTrace {
            final_dose_kg_da: Some(before),
            ..trace
        };
    };

    let after = clamp(before, range.min, range.max);
    let clamped = if after != before {
        tracing::debug!(
            "{}: clamped {} to {} (range {}-{})",
            trace.nutrient,
            before,
            after,
            range.min,
            range.max
        );
        Some(ClampRecord {
            before,
            after,
            min: range.min,
            max: range.max,
        })
    } else {
        None
    };

    ExplainabilityTrace {
        clamped,
        final_dose_kg_da: Some(after),
        ..trace
    }
}
