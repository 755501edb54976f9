// File: src/core/playback.rs

/// A cursor that reveals a fixed onset sequence one onset at a time.
///
/// Nothing is revealed on construction. Every successful [`advance`](Self::advance)
/// reveals one more onset, so after `n` advances the revealed onsets are
/// `onset_times[..n]` and `discovered_index() == n`.
#[derive(Debug, Clone, Copy)]
pub struct OngoingPlayback<'a> {
    onset_times: &'a [f64],
    discovered_index: usize,
}

impl<'a> OngoingPlayback<'a> {
    pub fn new(onset_times: &'a [f64]) -> Self {
        Self {
            onset_times,
            discovered_index: 0,
        }
    }

    /// Reveals the next onset. Returns `false` once the sequence is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.discovered_index < self.onset_times.len() {
            self.discovered_index += 1;
            true
        } else {
            false
        }
    }

    /// Number of onsets revealed so far.
    pub fn discovered_index(&self) -> usize {
        self.discovered_index
    }

    /// The full sequence, including onsets that are not revealed yet.
    pub fn onset_times(&self) -> &'a [f64] {
        self.onset_times
    }

    pub fn discovered_onsets(&self) -> &'a [f64] {
        &self.onset_times[..self.discovered_index]
    }

    pub fn last_discovered_onset(&self) -> Option<f64> {
        self.discovered_onsets().last().copied()
    }
}
