//! Deterministic fertilizer dosing: table lookup, range clamping, capped rule
//! adjustments, product balancing, scheduling and costing, with a trace of
//! every decision.

pub mod config;
pub mod error;
pub mod logic;
pub mod models;
pub mod seed;
pub mod settings;

pub use error::{FertiplanError, Result};
pub use logic::{compute_recommendation, compute_scenario};
pub use settings::Settings;
