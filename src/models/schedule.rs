use serde::{Deserialize, Serialize};

/// Scheduling category of a product line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bucket {
    P,
    K,
    N,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::P => "P",
            Bucket::K => "K",
            Bucket::N => "N",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationStep {
    pub label: String,
    pub fraction: f64,
}

impl ApplicationStep {
    pub fn new(label: &str, fraction: f64) -> Self {
        Self {
            label: label.to_string(),
            fraction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BucketSteps {
    #[serde(rename = "P")]
    pub p: Vec<ApplicationStep>,
    #[serde(rename = "K")]
    pub k: Vec<ApplicationStep>,
    #[serde(rename = "N")]
    pub n: Vec<ApplicationStep>,
}

impl BucketSteps {
    pub fn get(&self, bucket: Bucket) -> &[ApplicationStep] {
        match bucket {
            Bucket::P => &self.p,
            Bucket::K => &self.k,
            Bucket::N => &self.n,
        }
    }
}

/// Per-bucket overrides; a missing bucket keeps the default steps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BucketOverrides {
    #[serde(rename = "P", default, skip_serializing_if = "Option::is_none")]
    pub p: Option<Vec<ApplicationStep>>,
    #[serde(rename = "K", default, skip_serializing_if = "Option::is_none")]
    pub k: Option<Vec<ApplicationStep>>,
    #[serde(rename = "N", default, skip_serializing_if = "Option::is_none")]
    pub n: Option<Vec<ApplicationStep>>,
}

impl BucketOverrides {
    pub fn get(&self, bucket: Bucket) -> Option<&[ApplicationStep]> {
        match bucket {
            Bucket::P => self.p.as_deref(),
            Bucket::K => self.k.as_deref(),
            Bucket::N => self.n.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePreset {
    pub id: String,
    pub name: String,
    pub buckets: BucketSteps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandy_overrides: Option<BucketOverrides>,
}
