// File: src/core/types.rs
use serde::{Deserialize, Serialize};

/// The origin of a tracker: the `(start_idx, end_idx)` onset pair it was
/// generated from. Also used as the tracker's unique name.
pub type TrackerName = (usize, usize);

/// A pulse hypothesis. All beat predictions are `rho + delta * k` for some integer k.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Phase, in the same unit as the onset times.
    pub rho: f64,
    /// Period, in the same unit as the onset times.
    pub delta: f64,
}

impl Hypothesis {
    pub fn new(rho: f64, delta: f64) -> Self {
        Self { rho, delta }
    }

    /// The predicted beat with index `k`.
    pub fn beat(&self, k: i64) -> f64 {
        self.rho + self.delta * k as f64
    }

    /// The (possibly fractional) beat index of time `t`.
    pub fn beat_position(&self, t: f64) -> f64 {
        (t - self.rho) / self.delta
    }

    /// The predicted beat closest to `t`.
    pub fn nearest_beat(&self, t: f64) -> f64 {
        self.beat(self.beat_position(t).round() as i64)
    }
}

impl From<(f64, f64)> for Hypothesis {
    fn from((rho, delta): (f64, f64)) -> Self {
        Self { rho, delta }
    }
}

/// Builds the initial hypothesis spanned by two onsets: phase at the first one
/// and period equal to the distance between them.
///
/// Panics if either index is out of bounds of `onset_times`.
pub fn hypothesis_from_index(start_idx: usize, end_idx: usize, onset_times: &[f64]) -> Hypothesis {
    let rho = onset_times[start_idx];
    Hypothesis {
        rho,
        delta: onset_times[end_idx] - rho,
    }
}
