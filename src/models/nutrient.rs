use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NutrientKey {
    N,
    P2O5,
    K2O,
}

impl NutrientKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientKey::N => "N",
            NutrientKey::P2O5 => "P2O5",
            NutrientKey::K2O => "K2O",
        }
    }
}

impl std::fmt::Display for NutrientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One value per nutrient, always in N, P2O5, K2O order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerNutrient<T> {
    #[serde(rename = "N")]
    pub n: T,
    #[serde(rename = "P2O5", alias = "P")]
    pub p2o5: T,
    #[serde(rename = "K2O", alias = "K")]
    pub k2o: T,
}

impl<T> PerNutrient<T> {
    pub fn new(n: T, p2o5: T, k2o: T) -> Self {
        Self { n, p2o5, k2o }
    }

    pub fn from_fn(mut f: impl FnMut(NutrientKey) -> T) -> Self {
        Self {
            n: f(NutrientKey::N),
            p2o5: f(NutrientKey::P2O5),
            k2o: f(NutrientKey::K2O),
        }
    }

    pub fn get(&self, key: NutrientKey) -> &T {
        match key {
            NutrientKey::N => &self.n,
            NutrientKey::P2O5 => &self.p2o5,
            NutrientKey::K2O => &self.k2o,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NutrientKey, &T)> {
        [
            (NutrientKey::N, &self.n),
            (NutrientKey::P2O5, &self.p2o5),
            (NutrientKey::K2O, &self.k2o),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FarmingPractice {
    #[serde(rename = "irrigated", alias = "Sulu", alias = "Irrigated")]
    Irrigated,
    #[serde(rename = "rain_fed", alias = "Kuru", alias = "RainFed")]
    RainFed,
}

impl FarmingPractice {
    pub fn as_str(&self) -> &'static str {
        match self {
            FarmingPractice::Irrigated => "Irrigated",
            FarmingPractice::RainFed => "Rain-fed",
        }
    }

    /// The other practice; irrigated and rain-fed are each other's fallback.
    pub fn other(&self) -> Self {
        match self {
            FarmingPractice::Irrigated => FarmingPractice::RainFed,
            FarmingPractice::RainFed => FarmingPractice::Irrigated,
        }
    }
}

impl std::fmt::Display for FarmingPractice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrrigationSystem {
    #[serde(rename = "drip", alias = "Damla")]
    Drip,
    #[serde(rename = "sprinkler", alias = "Yağmurlama")]
    Sprinkler,
    #[serde(rename = "furrow", alias = "Salma")]
    Furrow,
    #[serde(rename = "dry", alias = "Kuru", alias = "none")]
    Dry,
}

impl IrrigationSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            IrrigationSystem::Drip => "Drip",
            IrrigationSystem::Sprinkler => "Sprinkler",
            IrrigationSystem::Furrow => "Furrow",
            IrrigationSystem::Dry => "Dry",
        }
    }
}

impl std::fmt::Display for IrrigationSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EcUnit {
    #[default]
    #[serde(rename = "dS/m")]
    DsPerM,
    #[serde(rename = "uS/cm", alias = "µS/cm")]
    UsPerCm,
}

/// Unit a soil P or K measurement was reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SoilNutrientUnit {
    #[default]
    #[serde(rename = "kg/da")]
    KgPerDa,
    #[serde(rename = "ppm")]
    Ppm,
}

impl SoilNutrientUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoilNutrientUnit::KgPerDa => "kg/da",
            SoilNutrientUnit::Ppm => "ppm",
        }
    }
}

/// Rounding step for kg quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum Precision {
    #[default]
    Tenth,
    Hundredth,
}

impl Precision {
    pub fn step(&self) -> f64 {
        match self {
            Precision::Tenth => 0.1,
            Precision::Hundredth => 0.01,
        }
    }

    pub(crate) fn inverse(&self) -> f64 {
        match self {
            Precision::Tenth => 10.0,
            Precision::Hundredth => 100.0,
        }
    }
}

impl TryFrom<f64> for Precision {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if (value - 0.1).abs() < 1e-12 {
            Ok(Precision::Tenth)
        } else if (value - 0.01).abs() < 1e-12 {
            Ok(Precision::Hundredth)
        } else {
            Err(format!("unsupported precision {} (expected 0.1 or 0.01)", value))
        }
    }
}

impl From<Precision> for f64 {
    fn from(p: Precision) -> f64 {
        p.step()
    }
}

/// A farmer-tier and expert-tier rendering of the same message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub farmer: String,
    pub expert: String,
}

impl Message {
    pub fn new(farmer: impl Into<String>, expert: impl Into<String>) -> Self {
        Self {
            farmer: farmer.into(),
            expert: expert.into(),
        }
    }
}

/// Parallel farmer/expert message lists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Warnings {
    pub farmer: Vec<String>,
    pub expert: Vec<String>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: &Message) {
        self.farmer.push(message.farmer.clone());
        self.expert.push(message.expert.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.farmer.is_empty() && self.expert.is_empty()
    }
}
