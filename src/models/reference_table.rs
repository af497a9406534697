use super::FarmingPractice;
use crate::error::{FertiplanError, Result};
use crate::logic::binning::{parse_bins, Bin};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// bin string -> dose in kg/da; `None` means the soil already holds enough.
pub type DoseCells = BTreeMap<String, Option<f64>>;
pub type CropNode = BTreeMap<FarmingPractice, DoseCells>;
/// crop name -> farming practice -> cells
pub type RegionTable = BTreeMap<String, CropNode>;

/// Bins are either one ordered list or named groups. Groups are merged in
/// ascending key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BinSpec {
    List(Vec<String>),
    Grouped(BTreeMap<String, Vec<String>>),
}

impl BinSpec {
    pub fn ordered(&self) -> Vec<String> {
        match self {
            BinSpec::List(bins) => bins.clone(),
            BinSpec::Grouped(groups) => groups.values().flatten().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    #[serde(
        rename = "preferredTableOrder",
        alias = "preferred_table_order",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub preferred_table_order: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A reference table exactly as it is stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReferenceTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<TableMeta>,
    pub bins: BinSpec,
    pub supported_region_tables: Vec<String>,
    #[serde(rename = "tables_by_regionTable", alias = "tables_by_region_table")]
    pub tables_by_region_table: BTreeMap<String, RegionTable>,
}

/// A validated reference table. Bins are parsed once here so a malformed
/// definition fails at load, never during a lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    pub bins: Vec<Bin>,
    pub supported_region_tables: Vec<String>,
    pub preferred_table_order: Vec<String>,
    pub tables: BTreeMap<String, RegionTable>,
}

impl ReferenceTable {
    pub fn from_raw(raw: RawReferenceTable) -> Result<Self> {
        let bins = parse_bins(&raw.bins.ordered())?;

        for key in &raw.supported_region_tables {
            match key.split_once('|') {
                Some((region, table)) if !region.is_empty() && !table.is_empty() => {}
                _ => {
                    return Err(FertiplanError::InvalidData(format!(
                        "region table key '{}' is not of the form 'region|tableId'",
                        key
                    )))
                }
            }
        }

        for (key, crops) in &raw.tables_by_region_table {
            for (crop, practices) in crops {
                for (practice, cells) in practices {
                    for (bin, dose) in cells {
                        if let Some(d) = dose {
                            if !d.is_finite() || *d < 0.0 {
                                return Err(FertiplanError::InvalidData(format!(
                                    "dose {} at {} / {} / {} / {} must be a non-negative number",
                                    d, key, crop, practice, bin
                                )));
                            }
                        }
                    }
                }
            }
        }

        let preferred_table_order = raw
            .meta
            .map(|m| m.preferred_table_order)
            .unwrap_or_default();

        Ok(Self {
            bins,
            supported_region_tables: raw.supported_region_tables,
            preferred_table_order,
            tables: raw.tables_by_region_table,
        })
    }

    /// Regions named by the supported `region|tableId` keys.
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.supported_region_tables
            .iter()
            .filter_map(|k| k.split('|').next())
            .filter(|r| !r.is_empty())
    }

    pub fn crop_names(&self) -> impl Iterator<Item = &str> {
        self.tables
            .values()
            .flat_map(|crops| crops.keys().map(String::as_str))
    }
}
