use crate::config::TrackerConfig;
use crate::core::playback::OngoingPlayback;
use crate::core::tracker::HypothesisTracker;
use crate::core::types::TrackerName;
use crate::strategy::HypothesisStrategy;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace};

/// Trackers produced by one run, keyed by their origin onset pair.
pub type TrackerMap<'a, C> = HashMap<TrackerName, HypothesisTracker<'a, C>>;

/// Result of removing near-duplicate trackers.
#[derive(Debug)]
pub struct TrimOutcome<'a, C> {
    /// Surviving trackers, in their original order.
    pub kept: Vec<HypothesisTracker<'a, C>>,
    /// `(trimmed, representative)` name pairs.
    pub trimmed: Vec<(TrackerName, TrackerName)>,
}

/// What happened during one step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSummary {
    pub discovered_index: usize,
    pub created: usize,
    pub trimmed: usize,
    pub dropped: usize,
    pub remaining: usize,
}

/// Receives a summary after every step of a run.
pub trait StepObserver {
    fn on_step(&mut self, summary: &StepSummary);
}

impl<F: FnMut(&StepSummary)> StepObserver for F {
    fn on_step(&mut self, summary: &StepSummary) {
        self(summary)
    }
}

/// Generates and maintains pulse hypothesis trackers for a sequence of onsets.
///
/// At every revealed onset new trackers are created from onset pairs within
/// the configured period range. All trackers are then corrected and scored,
/// near-duplicates are trimmed, and only the `max_hypotheses` most confident
/// trackers are carried to the next step.
pub struct TactusHypothesisTracker<S> {
    strategy: S,
    config: TrackerConfig,
}

impl<S: HypothesisStrategy> TactusHypothesisTracker<S> {
    pub fn new(strategy: S, config: TrackerConfig) -> Self {
        Self { strategy, config }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn run<'a>(&self, onset_times: &'a [f64]) -> Result<TrackerMap<'a, S::Correction>, S::Error> {
        self.run_with_observer(onset_times, |_: &StepSummary| {})
    }

    pub fn run_with_observer<'a, O: StepObserver>(
        &self,
        onset_times: &'a [f64],
        mut observer: O,
    ) -> Result<TrackerMap<'a, S::Correction>, S::Error> {
        debug!(onsets = onset_times.len(), "Started tracking");
        let mut play = OngoingPlayback::new(onset_times);
        let mut trackers: Vec<HypothesisTracker<'a, S::Correction>> = Vec::new();

        while play.advance() {
            let new_trackers = self.generate(&play);
            let created = new_trackers.len();
            debug!(step = play.discovered_index(), created, "New step");
            trackers.extend(new_trackers);

            for tracker in trackers.iter_mut() {
                tracker.update(&play, &self.strategy)?;
            }

            let TrimOutcome { kept, trimmed } = self.trim_similar(trackers, &play)?;
            let (best, others) = self.split_k_best(kept);
            trackers = best;

            let summary = StepSummary {
                discovered_index: play.discovered_index(),
                created,
                trimmed: trimmed.len(),
                dropped: others.len(),
                remaining: trackers.len(),
            };
            debug!(
                step = summary.discovered_index,
                trimmed = summary.trimmed,
                dropped = summary.dropped,
                remaining = summary.remaining,
                "End of step"
            );
            observer.on_step(&summary);
        }

        Ok(trackers.into_iter().map(|t| (t.name(), t)).collect())
    }

    /// Trackers whose origin ends at the newest revealed onset and whose
    /// period lies within `[min_delta, max_delta]`, in increasing start index.
    pub fn generate<'a>(&self, play: &OngoingPlayback<'a>) -> Vec<HypothesisTracker<'a, S::Correction>> {
        let Some(end_index) = play.discovered_index().checked_sub(1) else {
            return vec![];
        };
        let onset_times = play.onset_times();
        (0..end_index)
            .filter(|&k| {
                let delta = onset_times[end_index] - onset_times[k];
                self.config.min_delta <= delta && delta <= self.config.max_delta
            })
            .map(|k| HypothesisTracker::new(k, end_index, onset_times))
            .collect()
    }

    /// Greedily partitions `trackers` into kept representatives and trackers
    /// redundant with them.
    ///
    /// Trackers are expected in generation order. The first remaining tracker
    /// becomes a representative and every later tracker too similar to it is
    /// trimmed; the rest are compared against the next representative.
    pub fn trim_similar<'a>(
        &self,
        trackers: Vec<HypothesisTracker<'a, S::Correction>>,
        play: &OngoingPlayback<'_>,
    ) -> Result<TrimOutcome<'a, S::Correction>, S::Error> {
        let threshold = 1.0 - self.config.similarity_epsilon;
        let mut kept = Vec::new();
        let mut trimmed = Vec::new();
        let mut remaining: VecDeque<_> = trackers.into();

        while let Some(representative) = remaining.pop_front() {
            let mut next_remaining = VecDeque::with_capacity(remaining.len());
            for candidate in remaining.drain(..) {
                let similarity = self.strategy.similarity(&representative, &candidate, play)?;
                if similarity > threshold {
                    trace!(trimmed = ?candidate.name(), by = ?representative.name(), similarity, "Trimmed");
                    trimmed.push((candidate.name(), representative.name()));
                } else {
                    next_remaining.push_back(candidate);
                }
            }
            kept.push(representative);
            remaining = next_remaining;
        }

        Ok(TrimOutcome { kept, trimmed })
    }

    /// Splits trackers into the `max_hypotheses` most confident and the rest.
    /// Ties go to the earlier tracker. Both halves keep generation order.
    pub fn split_k_best<'a>(
        &self,
        trackers: Vec<HypothesisTracker<'a, S::Correction>>,
    ) -> (Vec<HypothesisTracker<'a, S::Correction>>, Vec<HypothesisTracker<'a, S::Correction>>) {
        let mut ranking: Vec<(usize, f64)> = trackers
            .iter()
            .enumerate()
            .map(|(idx, t)| (idx, t.confidence()))
            .collect();
        // stable: equal confidences stay in generation order
        ranking.sort_by(|(_, a), (_, b)| b.total_cmp(a));

        let mut is_best = vec![false; trackers.len()];
        for &(idx, _) in ranking.iter().take(self.config.max_hypotheses) {
            is_best[idx] = true;
        }

        let mut best = Vec::new();
        let mut others = Vec::new();
        for (tracker, keep) in trackers.into_iter().zip(is_best) {
            if keep {
                best.push(tracker);
            } else {
                others.push(tracker);
            }
        }
        (best, others)
    }
}
