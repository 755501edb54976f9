// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod onsets;
pub mod report;
pub mod scoring;
pub mod strategy;

pub use crate::config::TrackerConfig;
pub use crate::core::engine::{TactusHypothesisTracker, TrackerMap};
pub use crate::core::tracker::HypothesisTracker;
pub use crate::core::types::{Hypothesis, TrackerName};
pub use crate::error::TactusError;
pub use crate::scoring::ExpErrorStrategy;
pub use crate::strategy::{Correction, HypothesisStrategy};

/// A tracking engine with the default scoring strategy and parameters.
pub fn default_tht() -> TactusHypothesisTracker<ExpErrorStrategy> {
    TactusHypothesisTracker::new(ExpErrorStrategy::default(), TrackerConfig::default())
}
