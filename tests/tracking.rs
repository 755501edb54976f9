use std::convert::Infallible;
use tht_core::core::playback::OngoingPlayback;
use tht_core::report::RunReport;
use tht_core::{
    default_tht, ExpErrorStrategy, Hypothesis, HypothesisStrategy, HypothesisTracker,
    TactusHypothesisTracker, TrackerConfig, TrackerName,
};

type Tracker<'a> = HypothesisTracker<'a, Hypothesis>;

/// Keeps hypotheses unchanged, never trims, and scores with a plain function.
struct ConstStrategy {
    confidence: fn(TrackerName, usize) -> f64,
}

impl HypothesisStrategy for ConstStrategy {
    type Correction = Hypothesis;
    type Error = Infallible;

    fn evaluate(&self, t: &Tracker<'_>, play: &OngoingPlayback<'_>) -> Result<f64, Infallible> {
        Ok((self.confidence)(t.name(), play.discovered_index()))
    }

    fn correct(&self, t: &Tracker<'_>, _: &OngoingPlayback<'_>) -> Result<Hypothesis, Infallible> {
        Ok(t.current())
    }

    fn similarity(&self, _: &Tracker<'_>, _: &Tracker<'_>, _: &OngoingPlayback<'_>) -> Result<f64, Infallible> {
        Ok(0.0)
    }
}

fn config(min_delta: f64, max_delta: f64, max_hypotheses: usize) -> TrackerConfig {
    TrackerConfig { similarity_epsilon: 0.01, min_delta, max_delta, max_hypotheses }
}

fn sorted_keys<C>(map: &tht_core::TrackerMap<'_, C>) -> Vec<TrackerName> {
    let mut keys: Vec<_> = map.keys().copied().collect();
    keys.sort();
    keys
}

#[test]
fn three_onsets_yield_both_short_periods() {
    let onsets = [0.0, 500.0, 1000.0];
    let tht = TactusHypothesisTracker::new(ConstStrategy { confidence: |_, _| 1.0 }, config(400.0, 600.0, 10));
    let trackers = tht.run(&onsets).unwrap();

    assert_eq!(sorted_keys(&trackers), vec![(0, 1), (1, 2)]);

    let first = &trackers[&(0, 1)];
    assert_eq!(first.beta(), Hypothesis::new(0.0, 500.0));
    assert_eq!(first.confidences(), &[(2, 1.0), (3, 1.0)]);
    assert_eq!(first.corrections().len(), 2);

    let second = &trackers[&(1, 2)];
    assert_eq!(second.origin_onsets(), (500.0, 1000.0));
    assert_eq!(second.confidences(), &[(3, 1.0)]);
}

#[test]
fn beam_of_one_never_revives_a_dropped_tracker() {
    let onsets = [0.0, 100.0, 200.0, 300.0];
    let confidence = |name: TrackerName, step: usize| match (name, step) {
        ((0, 1), 4) => 100.0,
        ((0, 1), _) => 1.0,
        ((1, 2), _) => 2.0,
        _ => 0.0,
    };
    let tht = TactusHypothesisTracker::new(ConstStrategy { confidence }, config(100.0, 100.0, 1));
    let trackers = tht.run(&onsets).unwrap();

    assert_eq!(sorted_keys(&trackers), vec![(1, 2)]);
    assert_eq!(trackers[&(1, 2)].confidences(), &[(3, 2.0), (4, 2.0)]);
}

#[test]
fn short_inputs_produce_no_trackers() {
    let tht = TactusHypothesisTracker::new(ConstStrategy { confidence: |_, _| 1.0 }, config(0.0, 1e9, 10));
    assert!(tht.run(&[]).unwrap().is_empty());
    assert!(tht.run(&[42.0]).unwrap().is_empty());
}

#[test]
fn inverted_period_range_generates_nothing() {
    let onsets = [0.0, 500.0, 1000.0, 1500.0];
    let tht = TactusHypothesisTracker::new(ConstStrategy { confidence: |_, _| 1.0 }, config(600.0, 400.0, 10));
    assert!(tht.run(&onsets).unwrap().is_empty());
}

#[test]
fn zero_beam_width_empties_the_population() {
    let onsets = [0.0, 500.0, 1000.0, 1500.0];
    let tht = TactusHypothesisTracker::new(ConstStrategy { confidence: |_, _| 1.0 }, config(0.0, 1e9, 0));
    assert!(tht.run(&onsets).unwrap().is_empty());
}

#[test]
fn default_tracker_finds_the_pulse_of_a_steady_sequence() {
    let onsets: Vec<f64> = (0..17).map(|i| i as f64 * 500.0).collect();
    let tht = default_tht();
    let trackers = tht.run(&onsets).unwrap();
    let report = RunReport::from_run(tht.config(), onsets.len(), &trackers);

    let best = &report.trackers[0];
    assert_eq!(best.name, (0, 1));
    assert!((best.current.delta - 500.0).abs() < 1e-6);
    assert!(best.current.rho.abs() < 1e-6);
    assert!(report.trackers.len() <= tht.config().max_hypotheses);
}

#[test]
fn repeated_runs_are_identical() {
    let onsets = [
        0.0, 480.0, 1010.0, 1250.0, 1490.0, 2005.0, 2500.0, 2740.0, 3020.0, 3490.0, 4000.0, 4510.0,
    ];
    let tht = TactusHypothesisTracker::new(ExpErrorStrategy::default(), TrackerConfig::default());

    let first = RunReport::from_run(tht.config(), onsets.len(), &tht.run(&onsets).unwrap());
    let second = RunReport::from_run(tht.config(), onsets.len(), &tht.run(&onsets).unwrap());
    assert!(!first.trackers.is_empty());
    assert_eq!(first, second);
}

#[test]
fn strategy_errors_reach_the_caller() {
    let onsets = [0.0, 500.0, f64::NAN, 1500.0];
    let result = default_tht().run(&onsets);
    assert!(matches!(
        result,
        Err(tht_core::scoring::ScoringError::NonFiniteOnset { index: 2, .. })
    ));
}

#[test]
fn near_coincident_onsets_finish_quickly() {
    let onsets = [0.0, 0.00002, 2000.0];
    let tht = TactusHypothesisTracker::new(ExpErrorStrategy::default(), config(0.0, 5000.0, 10));
    let trackers = tht.run(&onsets).unwrap();

    assert!(trackers.contains_key(&(0, 1)));
    assert!(trackers.contains_key(&(0, 2)));
}
