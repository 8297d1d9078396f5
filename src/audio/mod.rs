pub mod clip;
pub mod silence;

pub use clip::AudioClip;
pub use silence::{detect_nonsilent, expand_intervals, total_interval_duration};

/// A non-silent time range within one chunk's local timeline, in milliseconds.
///
/// Intervals are half-open: `[start_ms, stop_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start_ms: u64,
    pub stop_ms: u64,
}

impl Interval {
    pub fn new(start_ms: u64, stop_ms: u64) -> Self {
        Self { start_ms, stop_ms }
    }

    /// Length of this interval in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.stop_ms.saturating_sub(self.start_ms)
    }
}
