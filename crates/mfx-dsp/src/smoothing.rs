//! Linear parameter smoothing
//!
//! A new target starts a straight ramp from the current value that lands
//! exactly on the target after the configured number of samples. The ramp
//! can be advanced one sample at a time or in whole chunks.

/// Linear ramp towards a target value
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSmoother {
    current: f64,
    target: f64,
    /// Per-sample increment of the active ramp
    step: f64,
    /// Samples left in the active ramp
    countdown: usize,
    /// Ramp length for a new target
    ramp_samples: usize,
}

impl LinearSmoother {
    pub fn new(initial: f64) -> Self {
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            countdown: 0,
            ramp_samples: 0,
        }
    }

    /// Set the ramp length and finish any ramp in flight
    pub fn reset(&mut self, sample_rate: f64, ramp_seconds: f64) {
        let samples = (ramp_seconds.max(0.0) * sample_rate.max(0.0)).floor();
        self.ramp_samples = if samples.is_finite() { samples as usize } else { 0 };
        self.set_current_and_target(self.target);
    }

    /// Jump straight to `value` without ramping
    #[inline]
    pub fn set_current_and_target(&mut self, value: f64) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.countdown = 0;
    }

    /// Start a ramp to `value`. Repeating the current target keeps the ramp going.
    #[inline]
    pub fn set_target(&mut self, value: f64) {
        if value == self.target {
            return;
        }
        if self.ramp_samples == 0 {
            self.set_current_and_target(value);
            return;
        }

        self.target = value;
        self.countdown = self.ramp_samples;
        self.step = (self.target - self.current) / self.countdown as f64;
    }

    /// Advance one sample and return the new current value
    #[inline]
    pub fn next_value(&mut self) -> f64 {
        if self.countdown == 0 {
            return self.target;
        }

        self.countdown -= 1;
        if self.countdown == 0 {
            self.current = self.target;
        } else {
            self.current += self.step;
        }
        self.current
    }

    /// Advance `samples` at once and return the new current value
    #[inline]
    pub fn skip(&mut self, samples: usize) -> f64 {
        if samples >= self.countdown {
            self.current = self.target;
            self.countdown = 0;
            return self.current;
        }

        self.countdown -= samples;
        self.current += self.step * samples as f64;
        self.current
    }

    #[inline]
    pub fn current(&self) -> f64 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.countdown > 0
    }

    #[inline]
    pub fn ramp_samples(&self) -> usize {
        self.ramp_samples
    }
}

impl Default for LinearSmoother {
    fn default() -> Self {
        Self::new(0.0)
    }
}
