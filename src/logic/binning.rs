//! String-encoded soil bins.
//!
//! A bin is written as `"<min>-<max>"` (both ends inclusive), `"<min>+"`
//! (inclusive minimum, no maximum) or `"<value>"` (exact match). A decimal
//! comma is accepted in place of the decimal point.

use crate::error::{FertiplanError, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BinShape {
    Range { min: f64, max: f64 },
    AtLeast { min: f64 },
    Exact { value: f64 },
}

/// A parsed bin that remembers the string it came from; the raw string is
/// the key into the dose table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub raw: String,
    pub shape: BinShape,
}

impl Bin {
    pub fn parse(raw: &str) -> Result<Self> {
        let s = raw.trim();
        let shape = if let Some(min) = s.strip_suffix('+') {
            BinShape::AtLeast {
                min: parse_number(raw, min)?,
            }
        } else if let Some((a, b)) = s.split_once('-') {
            BinShape::Range {
                min: parse_number(raw, a)?,
                max: parse_number(raw, b)?,
            }
        } else {
            BinShape::Exact {
                value: parse_number(raw, s)?,
            }
        };

        Ok(Self {
            raw: raw.to_string(),
            shape,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        match self.shape {
            BinShape::Range { min, max } => value >= min && value <= max,
            BinShape::AtLeast { min } => value >= min,
            BinShape::Exact { value: v } => value == v,
        }
    }
}

fn parse_number(raw: &str, token: &str) -> Result<f64> {
    let token = token.trim();
    token
        .replacen(',', ".", 1)
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| FertiplanError::InvalidBin {
            raw: raw.to_string(),
            token: token.to_string(),
        })
}

/// Parse a list of bin strings, keeping their order.
pub fn parse_bins<S: AsRef<str>>(raws: &[S]) -> Result<Vec<Bin>> {
    raws.iter().map(|r| Bin::parse(r.as_ref())).collect()
}

/// First bin, in the order given, that contains `value`.
///
/// Order is significant: a value on the boundary shared by two ranges
/// resolves to whichever range comes first, even if a later one also holds.
pub fn match_bin(value: f64, bins: &[Bin]) -> Option<&Bin> {
    bins.iter().find(|b| b.contains(value))
}
