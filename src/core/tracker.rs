// File: src/core/tracker.rs
use crate::core::playback::OngoingPlayback;
use crate::core::types::{hypothesis_from_index, Hypothesis, TrackerName};
use crate::strategy::{Correction, HypothesisStrategy};

/// Holds the evolution of a single pulse hypothesis.
///
/// The tracker is named after the two onset indices that originated it. `beta`
/// is the hypothesis spanned by those onsets and never changes; `current` is
/// replaced on every [`update`](Self::update). Each update appends exactly one
/// entry to both the correction and the confidence history, keyed by the
/// playback's discovered index.
#[derive(Debug, Clone)]
pub struct HypothesisTracker<'a, C> {
    name: TrackerName,
    beta: Hypothesis,
    current: Hypothesis,
    onset_times: &'a [f64],
    corrections: Vec<(usize, C)>,
    confidences: Vec<(usize, f64)>,
}

impl<'a, C: Correction> HypothesisTracker<'a, C> {
    pub fn new(start_idx: usize, end_idx: usize, onset_times: &'a [f64]) -> Self {
        let beta = hypothesis_from_index(start_idx, end_idx, onset_times);
        Self {
            name: (start_idx, end_idx),
            beta,
            current: beta,
            onset_times,
            corrections: Vec::new(),
            confidences: Vec::new(),
        }
    }

    /// Corrects the hypothesis and then scores the corrected state.
    pub fn update<S>(&mut self, play: &OngoingPlayback<'_>, strategy: &S) -> Result<(), S::Error>
    where
        S: HypothesisStrategy<Correction = C>,
    {
        let correction = strategy.correct(self, play)?;
        self.current = correction.new_hypothesis();
        self.corrections.push((play.discovered_index(), correction));

        let confidence = strategy.evaluate(self, play)?;
        self.confidences.push((play.discovered_index(), confidence));
        Ok(())
    }
}

impl<'a, C> HypothesisTracker<'a, C> {
    pub fn name(&self) -> TrackerName {
        self.name
    }

    pub fn beta(&self) -> Hypothesis {
        self.beta
    }

    pub fn current(&self) -> Hypothesis {
        self.current
    }

    pub fn rho(&self) -> f64 {
        self.current.rho
    }

    pub fn delta(&self) -> f64 {
        self.current.delta
    }

    pub fn onset_times(&self) -> &'a [f64] {
        self.onset_times
    }

    pub fn corrections(&self) -> &[(usize, C)] {
        &self.corrections
    }

    pub fn confidences(&self) -> &[(usize, f64)] {
        &self.confidences
    }

    /// Latest confidence value.
    ///
    /// Panics if the tracker was never updated. The engine updates every
    /// tracker on the step it is created, so this only fires on misuse.
    pub fn confidence(&self) -> f64 {
        match self.try_confidence() {
            Some(conf) => conf,
            None => panic!("tracker {:?} has no confidence before its first update", self.name),
        }
    }

    pub fn try_confidence(&self) -> Option<f64> {
        self.confidences.last().map(|&(_, conf)| conf)
    }

    /// The two onset times that produced this tracker.
    pub fn origin_onsets(&self) -> (f64, f64) {
        (self.beta.rho, self.beta.rho + self.beta.delta)
    }

    /// Every beat the current hypothesis predicts between the first onset and
    /// the last onset revealed by `play`.
    ///
    /// Allocates one value per beat; check [`projected_beat_count`](Self::projected_beat_count)
    /// first when the period may be tiny relative to the revealed span.
    pub fn projection(&self, play: &OngoingPlayback<'_>) -> Vec<f64> {
        self.projected_beats(play).collect()
    }

    /// Lazy form of [`projection`](Self::projection).
    pub fn projected_beats(&self, play: &OngoingPlayback<'_>) -> impl Iterator<Item = f64> + '_ {
        let (lo, hi) = self.beat_range(play).unwrap_or((0, -1));
        let current = self.current;
        (lo..=hi).map(move |k| current.beat(k))
    }

    /// Number of beats in the projection, computed without building it.
    pub fn projected_beat_count(&self, play: &OngoingPlayback<'_>) -> usize {
        match self.beat_range(play) {
            Some((lo, hi)) if hi >= lo => {
                usize::try_from(hi.saturating_sub(lo)).unwrap_or(usize::MAX).saturating_add(1)
            }
            _ => 0,
        }
    }

    /// First and last beat index inside the revealed span.
    fn beat_range(&self, play: &OngoingPlayback<'_>) -> Option<(i64, i64)> {
        let onsets = play.discovered_onsets();
        let (&first, &last) = (onsets.first()?, onsets.last()?);
        let Hypothesis { rho, delta } = self.current;
        if !rho.is_finite() || !delta.is_finite() || delta <= 0.0 {
            return None;
        }
        let lo = self.current.beat_position(first).ceil() as i64;
        let hi = self.current.beat_position(last).floor() as i64;
        Some((lo, hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::convert::Infallible;

    /// Shifts rho by one on every correction and reports the rho it sees as confidence.
    struct ShiftStrategy {
        seen_by_correct: RefCell<Vec<f64>>,
    }

    impl HypothesisStrategy for ShiftStrategy {
        type Correction = Hypothesis;
        type Error = Infallible;

        fn evaluate(&self, t: &HypothesisTracker<'_, Hypothesis>, _: &OngoingPlayback<'_>) -> Result<f64, Infallible> {
            Ok(t.rho())
        }

        fn correct(&self, t: &HypothesisTracker<'_, Hypothesis>, _: &OngoingPlayback<'_>) -> Result<Hypothesis, Infallible> {
            self.seen_by_correct.borrow_mut().push(t.rho());
            Ok(Hypothesis::new(t.rho() + 1.0, t.delta()))
        }

        fn similarity(
            &self,
            _: &HypothesisTracker<'_, Hypothesis>,
            _: &HypothesisTracker<'_, Hypothesis>,
            _: &OngoingPlayback<'_>,
        ) -> Result<f64, Infallible> {
            Ok(0.0)
        }
    }

    #[test]
    fn new_tracker_starts_at_beta() {
        let onsets = [100.0, 600.0];
        let tracker: HypothesisTracker<'_, Hypothesis> = HypothesisTracker::new(0, 1, &onsets);
        assert_eq!(tracker.name(), (0, 1));
        assert_eq!(tracker.beta(), Hypothesis::new(100.0, 500.0));
        assert_eq!(tracker.current(), tracker.beta());
        assert_eq!(tracker.origin_onsets(), (100.0, 600.0));
        assert!(tracker.try_confidence().is_none());
    }

    #[test]
    fn update_scores_the_corrected_hypothesis() {
        let onsets = [0.0, 500.0, 1000.0];
        let strategy = ShiftStrategy { seen_by_correct: RefCell::new(vec![]) };
        let mut play = OngoingPlayback::new(&onsets);
        let mut tracker = HypothesisTracker::new(0, 1, &onsets);

        play.advance();
        play.advance();
        tracker.update(&play, &strategy).unwrap();
        play.advance();
        tracker.update(&play, &strategy).unwrap();

        assert_eq!(*strategy.seen_by_correct.borrow(), vec![0.0, 1.0]);
        assert_eq!(tracker.confidences(), &[(2, 1.0), (3, 2.0)]);
        assert_eq!(tracker.corrections().len(), 2);
        assert_eq!(tracker.current(), tracker.corrections()[1].1);
        assert_eq!(tracker.beta(), Hypothesis::new(0.0, 500.0));
        assert_eq!(tracker.confidence(), 2.0);
    }

    #[test]
    #[should_panic(expected = "no confidence")]
    fn confidence_before_update_panics() {
        let onsets = [0.0, 500.0];
        let tracker: HypothesisTracker<'_, Hypothesis> = HypothesisTracker::new(0, 1, &onsets);
        tracker.confidence();
    }

    #[test]
    fn projection_covers_revealed_range() {
        let onsets = [100.0, 600.0, 1100.0, 1600.0];
        let tracker: HypothesisTracker<'_, Hypothesis> = HypothesisTracker::new(1, 2, &onsets);
        let mut play = OngoingPlayback::new(&onsets);
        for _ in 0..3 {
            play.advance();
        }
        assert_eq!(tracker.projection(&play), vec![100.0, 600.0, 1100.0]);
    }

    #[test]
    fn beat_count_matches_projection_without_building_it() {
        let onsets = [100.0, 600.0, 1100.0, 1600.0];
        let tracker: HypothesisTracker<'_, Hypothesis> = HypothesisTracker::new(1, 2, &onsets);
        let mut play = OngoingPlayback::new(&onsets);
        assert_eq!(tracker.projected_beat_count(&play), 0);
        while play.advance() {}
        assert_eq!(tracker.projected_beat_count(&play), tracker.projection(&play).len());

        let dense = [0.0, 0.00002, 2000.0];
        let tiny: HypothesisTracker<'_, Hypothesis> = HypothesisTracker::new(0, 1, &dense);
        let mut play = OngoingPlayback::new(&dense);
        while play.advance() {}
        assert!(tiny.projected_beat_count(&play) > 10_000_000);
        assert_eq!(tiny.projected_beats(&play).take(3).count(), 3);
    }
}
