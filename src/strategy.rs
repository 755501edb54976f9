// File: src/strategy.rs
use crate::core::playback::OngoingPlayback;
use crate::core::tracker::HypothesisTracker;
use crate::core::types::Hypothesis;

/// The result of correcting a hypothesis against the revealed onsets.
pub trait Correction {
    /// The hypothesis the tracker should adopt after this correction.
    fn new_hypothesis(&self) -> Hypothesis;
}

impl Correction for Hypothesis {
    fn new_hypothesis(&self) -> Hypothesis {
        *self
    }
}

/// The pluggable behavior of the tracking engine.
///
/// Implementations decide how a hypothesis is corrected, how confident we are
/// in it and how alike two hypotheses are. Errors are returned to the caller
/// of [`TactusHypothesisTracker::run`](crate::core::engine::TactusHypothesisTracker::run)
/// unchanged.
pub trait HypothesisStrategy {
    type Correction: Correction;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Confidence in the tracker's current hypothesis. Higher is better.
    fn evaluate(
        &self,
        tracker: &HypothesisTracker<'_, Self::Correction>,
        play: &OngoingPlayback<'_>,
    ) -> Result<f64, Self::Error>;

    fn correct(
        &self,
        tracker: &HypothesisTracker<'_, Self::Correction>,
        play: &OngoingPlayback<'_>,
    ) -> Result<Self::Correction, Self::Error>;

    /// Similarity in `[0, 1]`, where 1 means both trackers predict the same pulse.
    fn similarity(
        &self,
        a: &HypothesisTracker<'_, Self::Correction>,
        b: &HypothesisTracker<'_, Self::Correction>,
        play: &OngoingPlayback<'_>,
    ) -> Result<f64, Self::Error>;
}
