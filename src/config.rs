// File: src/config.rs
use crate::error::TactusError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Numeric parameters of a tracking run. Times are in the unit of the onsets
/// (milliseconds for the command-line tool).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Two trackers are redundant when their similarity exceeds `1 - similarity_epsilon`.
    pub similarity_epsilon: f64,
    /// Shortest period a generated hypothesis may have.
    pub min_delta: f64,
    /// Longest period a generated hypothesis may have.
    pub max_delta: f64,
    /// Beam width: trackers kept after each step.
    pub max_hypotheses: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            similarity_epsilon: 0.005,
            min_delta: 187.5, // 320 bpm
            max_delta: 1000.0, // 60 bpm
            max_hypotheses: 30,
        }
    }
}

impl TrackerConfig {
    /// Reads a JSON config file. Missing fields take their default value.
    pub fn from_file(path: &Path) -> Result<Self, TactusError> {
        let raw = fs::read_to_string(path)?;
        let config: TrackerConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects parameter sets the engine cannot interpret.
    ///
    /// `min_delta > max_delta` is accepted: it simply never generates hypotheses.
    pub fn validate(&self) -> Result<(), TactusError> {
        if !(self.similarity_epsilon > 0.0 && self.similarity_epsilon <= 1.0) {
            return Err(TactusError::InvalidConfig(format!(
                "similarity_epsilon must be in (0, 1], got {}",
                self.similarity_epsilon
            )));
        }
        if !self.min_delta.is_finite() || self.min_delta < 0.0 {
            return Err(TactusError::InvalidConfig(format!(
                "min_delta must be a non-negative number, got {}",
                self.min_delta
            )));
        }
        if self.max_delta.is_nan() {
            return Err(TactusError::InvalidConfig("max_delta must be a number".to_string()));
        }
        Ok(())
    }
}
