pub mod balancer;
pub mod binning;
pub mod calculations;
pub mod clamp;
pub mod cost;
pub mod lookup;
pub mod pipeline;
pub mod rules;
pub mod schedule;

pub use pipeline::{compute_recommendation, compute_scenario};
pub use rules::AdvisoryEngine;
