use crate::models::{BalancedLine, CostLine, CostResult, MostExpensive, PriceCatalog};

/// Price the balanced lines.
///
/// With no priced line at all the result is unavailable and every aggregate
/// is `None`, never zero. Unpriced lines are reported but left out of totals.
pub fn compute_cost(lines: &[BalancedLine], prices: &PriceCatalog, area_da: f64) -> CostResult {
    let cost_lines: Vec<CostLine> = lines
        .iter()
        .map(|l| {
            let unit = prices.get(&l.product_id).copied().flatten();
            CostLine {
                product_id: l.product_id.clone(),
                product_name: l.product_name.clone(),
                kg_da: l.kg_da,
                total_kg: l.total_kg,
                unit_price_per_kg: unit,
                line_cost: unit.map(|price| l.total_kg * price),
            }
        })
        .collect();

    if cost_lines.iter().all(|c| c.unit_price_per_kg.is_none()) {
        return CostResult {
            available: false,
            cost_per_da: None,
            total_cost: None,
            most_expensive: None,
            lines: cost_lines,
        };
    }

    let total: f64 = cost_lines.iter().filter_map(|c| c.line_cost).sum();
    let kg_da_sum: f64 = lines.iter().map(|l| l.kg_da).sum();
    let per_area_divisor = if area_da == 0.0 { 1.0 } else { area_da };
    let cost_per_da = (kg_da_sum > 0.0).then(|| total / per_area_divisor);

    let mut most_expensive: Option<MostExpensive> = None;
    for c in &cost_lines {
        let Some(cost) = c.line_cost else { continue };
        if most_expensive.as_ref().map_or(true, |m| cost > m.line_cost) {
            most_expensive = Some(MostExpensive {
                product_id: c.product_id.clone(),
                product_name: c.product_name.clone(),
                line_cost: cost,
            });
        }
    }

    CostResult {
        available: true,
        cost_per_da,
        total_cost: Some(total),
        most_expensive,
        lines: cost_lines,
    }
}
