//! Modulated delay chorus

use mfx_core::Sample;
use std::f64::consts::TAU;

use crate::{EffectUnit, MonoProcessor, ProcessContext, ProcessSpec, process_unless_bypassed, valid_sample_rate};

/// Longest centre delay the parameter allows
const MAX_CENTRE_DELAY_MS: f64 = 100.0;
/// Delay swing at full depth, either side of the centre
const MAX_DEPTH_MS: f64 = 20.0;
const MAX_FEEDBACK: f64 = 0.99;

/// Chorus built on a fractional delay line swept by a sine LFO
#[derive(Debug, Clone)]
pub struct Chorus {
    sample_rate: f64,

    rate_hz: f64,
    depth: f64,
    centre_delay_ms: f64,
    feedback: f64,
    mix: f64,

    buffer: Vec<Sample>,
    write_pos: usize,
    lfo_phase: f64,
    lfo_increment: f64,
}

impl Chorus {
    pub fn new() -> Self {
        let mut chorus = Self {
            sample_rate: valid_sample_rate(0.0),
            rate_hz: 0.2,
            depth: 0.05,
            centre_delay_ms: 7.0,
            feedback: 0.0,
            mix: 0.05,
            buffer: Vec::new(),
            write_pos: 0,
            lfo_phase: 0.0,
            lfo_increment: 0.0,
        };
        chorus.update_increment();
        chorus
    }

    pub fn set_rate(&mut self, hz: f64) {
        self.rate_hz = hz.max(0.0);
        self.update_increment();
    }

    /// Modulation depth, 0-1
    pub fn set_depth(&mut self, depth: f64) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    pub fn set_centre_delay_ms(&mut self, ms: f64) {
        self.centre_delay_ms = ms.clamp(0.0, MAX_CENTRE_DELAY_MS);
    }

    /// Feedback amount, -1 to 1
    pub fn set_feedback(&mut self, amount: f64) {
        self.feedback = amount.clamp(-MAX_FEEDBACK, MAX_FEEDBACK);
    }

    /// Dry/wet, 0-1
    pub fn set_mix(&mut self, mix: f64) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    /// Delay line length in samples (0 before `prepare`)
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn update_increment(&mut self) {
        self.lfo_increment = TAU * self.rate_hz / self.sample_rate;
    }

    /// Linear interpolation between the two samples around `pos`
    #[inline]
    fn read_interpolated(&self, pos: f64) -> Sample {
        let len = self.buffer.len();
        let pos = pos.rem_euclid(len as f64);
        let index = pos as usize;
        let frac = pos - index as f64;

        let s0 = self.buffer[index % len];
        let s1 = self.buffer[(index + 1) % len];
        s0 + (s1 - s0) * frac
    }
}

impl Default for Chorus {
    fn default() -> Self {
        Self::new()
    }
}

impl MonoProcessor for Chorus {
    #[inline]
    fn process_sample(&mut self, input: Sample) -> Sample {
        let len = self.buffer.len();
        if len < 4 {
            return input;
        }

        let lfo = self.lfo_phase.sin();
        self.lfo_phase += self.lfo_increment;
        if self.lfo_phase >= TAU {
            self.lfo_phase -= TAU;
        }

        let delay_ms = self.centre_delay_ms + self.depth * MAX_DEPTH_MS * lfo;
        let delay_samples = (delay_ms * 0.001 * self.sample_rate).clamp(1.0, (len - 2) as f64);
        let delayed = self.read_interpolated(self.write_pos as f64 - delay_samples);

        self.buffer[self.write_pos] = input + self.feedback * delayed;
        self.write_pos = (self.write_pos + 1) % len;

        input * (1.0 - self.mix) + delayed * self.mix
    }
}

impl EffectUnit for Chorus {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = valid_sample_rate(spec.sample_rate);
        self.update_increment();

        let max_ms = MAX_CENTRE_DELAY_MS + MAX_DEPTH_MS;
        let capacity = (max_ms * 0.001 * self.sample_rate).ceil() as usize + 4;
        self.buffer = vec![0.0; capacity];
        log::debug!("Chorus delay line: {capacity} samples at {} Hz", self.sample_rate);

        self.reset();
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        process_unless_bypassed(self, ctx);
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.lfo_phase = 0.0;
    }
}
