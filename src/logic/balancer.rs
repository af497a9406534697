use super::calculations::round_to;
use crate::models::{
    BalanceResult, BalanceTotals, BalancedLine, FertilizerProduct, Message, NutrientKey,
    PerNutrient, Precision, ProjectInput, Warnings,
};
use crate::settings::Settings;
use std::collections::BTreeMap;

fn blocked_with(message: Message) -> BalanceResult {
    let mut messages = Warnings::new();
    messages.push(&message);
    tracing::warn!("Balancer blocked: {}", message.expert);
    BalanceResult::blocked(messages)
}

fn zero_fraction(bucket: &str, nutrient: NutrientKey, product: &FertilizerProduct) -> Message {
    Message::new(
        format!("The selected {} fertilizer contains no {}.", bucket, nutrient),
        format!("{} source '{}' has a zero {} fraction", bucket, product.id, nutrient),
    )
}

/// Nutrient kg/da supplied by `kg_da` of `product`, for each nutrient it carries.
fn contributions(product: &FertilizerProduct, kg_da: f64) -> BTreeMap<NutrientKey, f64> {
    product
        .nutrients
        .iter()
        .filter(|(_, fraction)| **fraction > 0.0)
        .map(|(&key, &fraction)| (key, fraction * kg_da))
        .collect()
}

fn line(
    product: &FertilizerProduct,
    kg_da: f64,
    input: &ProjectInput,
    precision: Precision,
) -> BalancedLine {
    let total = kg_da * input.area_da;
    BalancedLine {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        kg_da,
        total_kg: round_to(total, precision),
        kg_per_tree: input
            .trees()
            .map(|trees| round_to(total / f64::from(trees), precision)),
        contributes: contributions(product, kg_da),
    }
}

/// Convert nutrient targets into product quantities.
///
/// Products are sized in the order P, K, N. Nitrogen carried by the P and K
/// products is subtracted from the N target before the N product is sized.
/// Every quantity is rounded as soon as it is computed.
pub fn balance_fertilizers(
    input: &ProjectInput,
    settings: &Settings,
    targets: &PerNutrient<Option<f64>>,
    blocked: &PerNutrient<bool>,
) -> BalanceResult {
    if blocked.iter().all(|(_, &b)| b) {
        return BalanceResult::blocked(Warnings::new());
    }

    let prefs = &input.prefs;
    let precision = prefs.precision;
    let (Some(p_product), Some(k_product), Some(n_product)) = (
        settings.product(&prefs.p_source_product_id),
        settings.product(&prefs.k_source_product_id),
        settings.product(&prefs.n_source_product_id),
    ) else {
        return blocked_with(Message::new(
            "Fertilizer selection is incomplete.",
            format!(
                "Source product not found in catalog (P '{}', K '{}', N '{}')",
                prefs.p_source_product_id, prefs.k_source_product_id, prefs.n_source_product_id
            ),
        ));
    };

    if prefs.avoid_chloride && k_product.is_chloride_bearing() {
        return blocked_with(Message::new(
            format!("{} cannot be used while avoiding chloride.", k_product.name),
            format!(
                "K source '{}' is chloride-bearing and avoid_chloride is on",
                k_product.id
            ),
        ));
    }

    let mut lines = Vec::new();
    let mut n_target = targets.n.unwrap_or(0.0);

    let carriers = [
        (NutrientKey::P2O5, "P", p_product),
        (NutrientKey::K2O, "K", k_product),
    ];
    for (nutrient, bucket, product) in carriers {
        if *blocked.get(nutrient) {
            continue;
        }
        let fraction = product.fraction(nutrient);
        if fraction <= 0.0 {
            return blocked_with(zero_fraction(bucket, nutrient, product));
        }

        let target = targets.get(nutrient).unwrap_or(0.0);
        let kg_da = round_to(target / fraction, precision);
        let n_supplied = product.fraction(NutrientKey::N) * kg_da;
        n_target = (n_target - n_supplied).max(0.0);
        tracing::debug!(
            "{} source {}: {} kg/da, supplies {} N",
            bucket,
            product.id,
            kg_da,
            n_supplied
        );
        lines.push(line(product, kg_da, input, precision));
    }

    if !blocked.n {
        let fraction = n_product.fraction(NutrientKey::N);
        if fraction <= 0.0 {
            return blocked_with(zero_fraction("N", NutrientKey::N, n_product));
        }
        let kg_da = if n_target <= 0.0 {
            0.0
        } else {
            round_to(n_target / fraction, precision)
        };
        lines.push(line(n_product, kg_da, input, precision));
    }

    let totals = BalanceTotals {
        kg_da: round_to(lines.iter().map(|l| l.kg_da).sum(), precision),
        total_kg: round_to(lines.iter().map(|l| l.total_kg).sum(), precision),
    };

    BalanceResult {
        blocked: false,
        messages: Warnings::new(),
        lines,
        totals,
        remaining_n_kg_da: n_target,
    }
}
