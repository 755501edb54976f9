// File: src/scoring.rs
//! Default correction, evaluation and similarity for onset times in milliseconds.
//!
//! * **Correction** fits `t = rho + delta * k` by least squares to the most
//!   recent revealed onsets that fall close to a predicted beat.
//! * **Evaluation** sums a Gaussian-shaped score of each onset's distance to
//!   its nearest predicted beat, scaled by the share of predicted beats that
//!   actually received an onset.
//! * **Similarity** compares the projected beats of two trackers over the
//!   revealed part of the playback.

use crate::core::playback::OngoingPlayback;
use crate::core::tracker::HypothesisTracker;
use crate::core::types::Hypothesis;
use crate::strategy::{Correction, HypothesisStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("Onset {index} is not a finite number: {value}")]
    NonFiniteOnset { index: usize, value: f64 },
}

/// What a least-squares correction did to a hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearCorrection {
    pub previous: Hypothesis,
    pub corrected: Hypothesis,
    /// Onsets close enough to a beat to take part in the fit.
    pub matched_onsets: usize,
}

impl LinearCorrection {
    pub fn unchanged(h: Hypothesis) -> Self {
        Self { previous: h, corrected: h, matched_onsets: 0 }
    }
}

impl Correction for LinearCorrection {
    fn new_hypothesis(&self) -> Hypothesis {
        self.corrected
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpErrorStrategy {
    /// Max distance to a beat, as a fraction of the period, for an onset to count as a hit.
    pub tolerance: f64,
    /// Steepness of the score as an onset drifts away from its beat.
    pub decay: f64,
    /// Number of most recent onsets used by the correction.
    pub window: usize,
    /// Trackers projecting more beats than this over the revealed span are
    /// treated as dissimilar to everything.
    pub max_beats: usize,
}

impl Default for ExpErrorStrategy {
    fn default() -> Self {
        Self { tolerance: 0.2, decay: 8.0, window: 6, max_beats: 4096 }
    }
}

impl ExpErrorStrategy {
    fn score(&self, relative_error: f64) -> f64 {
        (-self.decay * relative_error * relative_error).exp()
    }

    /// Revealed onsets from the tracker's first originating onset on, with their indices.
    fn tracked_onsets(
        tracker: &HypothesisTracker<'_, LinearCorrection>,
        play: &OngoingPlayback<'_>,
    ) -> Result<Vec<(usize, f64)>, ScoringError> {
        let start = tracker.name().0;
        let onsets = play.discovered_onsets();
        let mut tracked = Vec::with_capacity(onsets.len().saturating_sub(start));
        for (index, &value) in onsets.iter().enumerate().skip(start) {
            if !value.is_finite() {
                return Err(ScoringError::NonFiniteOnset { index, value });
            }
            tracked.push((index, value));
        }
        Ok(tracked)
    }

    /// `(beat index, relative error)` of `t` against `h`.
    fn locate(h: Hypothesis, t: f64) -> (i64, f64) {
        let position = h.beat_position(t);
        let k = position.round();
        (k as i64, (position - k).abs())
    }

    fn one_way_similarity(&self, beats: impl Iterator<Item = f64>, other: Hypothesis, unit: f64) -> f64 {
        let (total, count) = beats.fold((0.0, 0usize), |(total, count), b| {
            (total + self.score((b - other.nearest_beat(b)).abs() / unit), count + 1)
        });
        total / count as f64
    }
}

fn is_degenerate(h: Hypothesis) -> bool {
    !h.rho.is_finite() || !h.delta.is_finite() || h.delta <= 0.0
}

impl HypothesisStrategy for ExpErrorStrategy {
    type Correction = LinearCorrection;
    type Error = ScoringError;

    fn evaluate(
        &self,
        tracker: &HypothesisTracker<'_, LinearCorrection>,
        play: &OngoingPlayback<'_>,
    ) -> Result<f64, ScoringError> {
        let h = tracker.current();
        let onsets = Self::tracked_onsets(tracker, play)?;
        if is_degenerate(h) || onsets.is_empty() {
            return Ok(0.0);
        }

        let mut score = 0.0;
        let mut hit_beats = BTreeSet::new();
        for &(_, t) in &onsets {
            let (k, error) = Self::locate(h, t);
            score += self.score(error);
            if error <= self.tolerance {
                hit_beats.insert(k);
            }
        }

        let first = onsets[0].1;
        let last = onsets[onsets.len() - 1].1;
        let expected = (h.beat_position(last).floor() - h.beat_position(first).ceil() + 1.0).max(1.0);
        let coverage = (hit_beats.len() as f64 / expected).min(1.0);
        Ok(score * coverage)
    }

    fn correct(
        &self,
        tracker: &HypothesisTracker<'_, LinearCorrection>,
        play: &OngoingPlayback<'_>,
    ) -> Result<LinearCorrection, ScoringError> {
        let h = tracker.current();
        let onsets = Self::tracked_onsets(tracker, play)?;
        if is_degenerate(h) {
            return Ok(LinearCorrection::unchanged(h));
        }

        let recent = &onsets[onsets.len().saturating_sub(self.window)..];
        let points: Vec<(f64, f64)> = recent
            .iter()
            .filter_map(|&(_, t)| {
                let (k, error) = Self::locate(h, t);
                (error <= self.tolerance).then_some((k as f64, t))
            })
            .collect();

        // at least two distinct beats are needed to fit a period
        if points.len() < 2 {
            return Ok(LinearCorrection { matched_onsets: points.len(), ..LinearCorrection::unchanged(h) });
        }

        let n = points.len() as f64;
        let mean_k = points.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_t = points.iter().map(|p| p.1).sum::<f64>() / n;
        let var_k: f64 = points.iter().map(|p| (p.0 - mean_k).powi(2)).sum();
        let cov: f64 = points.iter().map(|p| (p.0 - mean_k) * (p.1 - mean_t)).sum();

        let delta = cov / var_k;
        let corrected = Hypothesis::new(mean_t - delta * mean_k, delta);
        if var_k <= 0.0 || is_degenerate(corrected) {
            return Ok(LinearCorrection { matched_onsets: points.len(), ..LinearCorrection::unchanged(h) });
        }
        Ok(LinearCorrection { previous: h, corrected, matched_onsets: points.len() })
    }

    fn similarity(
        &self,
        a: &HypothesisTracker<'_, LinearCorrection>,
        b: &HypothesisTracker<'_, LinearCorrection>,
        play: &OngoingPlayback<'_>,
    ) -> Result<f64, ScoringError> {
        let (ha, hb) = (a.current(), b.current());
        if is_degenerate(ha) || is_degenerate(hb) {
            return Ok(0.0);
        }
        let count_a = a.projected_beat_count(play);
        let count_b = b.projected_beat_count(play);
        if count_a == 0 || count_b == 0 || count_a > self.max_beats || count_b > self.max_beats {
            return Ok(0.0);
        }

        let unit = ha.delta.min(hb.delta);
        let a_to_b = self.one_way_similarity(a.projected_beats(play), hb, unit);
        let b_to_a = self.one_way_similarity(b.projected_beats(play), ha, unit);
        Ok(a_to_b.min(b_to_a))
    }
}
