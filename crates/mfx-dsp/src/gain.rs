//! Smoothed input/output gain

use mfx_core::{Sample, db_to_gain};

use crate::LinearSmoother;

/// Gain applied to both channels with a per-sample ramp
#[derive(Debug, Clone)]
pub struct GainStage {
    gain: LinearSmoother,
}

impl GainStage {
    pub fn new() -> Self {
        Self {
            gain: LinearSmoother::new(1.0),
        }
    }

    /// Set the ramp time. Any ramp in flight completes immediately.
    pub fn reset(&mut self, sample_rate: f64, ramp_seconds: f64) {
        self.gain.reset(sample_rate, ramp_seconds);
    }

    /// Ramp towards `db`
    #[inline]
    pub fn set_gain_db(&mut self, db: f64) {
        self.gain.set_target(db_to_gain(db));
    }

    /// Jump to `db` without ramping
    pub fn snap_to_db(&mut self, db: f64) {
        self.gain.set_current_and_target(db_to_gain(db));
    }

    /// Current linear gain
    #[inline]
    pub fn gain(&self) -> f64 {
        self.gain.current()
    }

    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.gain.is_smoothing()
    }

    pub fn process_stereo(&mut self, left: &mut [Sample], right: &mut [Sample]) {
        debug_assert_eq!(left.len(), right.len());
        if !self.gain.is_smoothing() {
            let g = self.gain.target();
            for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                *l *= g;
                *r *= g;
            }
            return;
        }

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let g = self.gain.next_value();
            *l *= g;
            *r *= g;
        }
    }

    pub fn process_mono(&mut self, block: &mut [Sample]) {
        for sample in block.iter_mut() {
            *sample *= self.gain.next_value();
        }
    }
}

impl Default for GainStage {
    fn default() -> Self {
        Self::new()
    }
}
