use crate::models::{EcUnit, Precision};
use std::sync::OnceLock;

/// Bound `n` to `[min, max]`.
pub fn clamp(n: f64, min: f64, max: f64) -> f64 {
    n.min(max).max(min)
}

/// Round to the precision step, half away from zero.
pub fn round_to(n: f64, precision: Precision) -> f64 {
    let inv = precision.inverse();
    (n * inv).round() / inv
}

/// Convert an electrical conductivity reading to dS/m.
/// 1 dS/m = 1000 µS/cm
pub fn ec_to_ds_m(value: f64, unit: EcUnit) -> f64 {
    match unit {
        EcUnit::DsPerM => value,
        EcUnit::UsPerCm => value / 1000.0,
    }
}

/// Lowercase with Turkish letters folded to their ASCII base.
///
/// `str::to_lowercase` turns `İ` into `i` plus a combining dot, so the
/// Turkish capitals are folded before the generic lowercase runs.
pub fn fold_turkish(s: &str) -> String {
    s.chars()
        .flat_map(|c| {
            let folded = match c {
                'İ' | 'I' | 'ı' => 'i',
                'Ş' | 'ş' => 's',
                'Ğ' | 'ğ' => 'g',
                'Ü' | 'ü' => 'u',
                'Ö' | 'ö' => 'o',
                'Ç' | 'ç' => 'c',
                other => other,
            };
            folded.to_lowercase()
        })
        .collect()
}

/// Canonical form used to compare crop names: trimmed, inner whitespace
/// collapsed to one space, folded.
pub fn normalize_name(s: &str) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    fold_turkish(&collapsed)
}

fn table_number_re() -> &'static regex_lite::Regex {
    static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex_lite::Regex::new(r"(?i)\|table(\d+)").expect("table number pattern is valid")
    })
}

/// Numeric id embedded in a `region|tableNN` key. Keys without one sort last.
pub fn parse_table_number(region_table_key: &str) -> u64 {
    table_number_re()
        .captures(region_table_key)
        .and_then(|cap| cap[1].parse::<u64>().ok())
        .unwrap_or(u64::MAX)
}

/// `tableNN` label for a region table key, if it carries one.
pub fn table_id(region_table_key: &str) -> Option<String> {
    table_number_re()
        .captures(region_table_key)
        .map(|cap| format!("table{}", &cap[1]))
}
