//! Six-stage allpass phaser
//!
//! A sine LFO sweeps the break frequency of a chain of first-order allpass
//! stages around the centre frequency. The allpass coefficient is refreshed
//! every `COEFF_UPDATE_INTERVAL` samples rather than every sample.

use mfx_core::Sample;
use std::f64::consts::{PI, TAU};

use crate::{EffectUnit, MonoProcessor, ProcessContext, ProcessSpec, process_unless_bypassed, valid_sample_rate};

const NUM_STAGES: usize = 6;
const COEFF_UPDATE_INTERVAL: usize = 8;
const MIN_FREQUENCY_HZ: f64 = 20.0;
/// Octaves swept either side of the centre at full depth
const SWEEP_OCTAVES: f64 = 2.0;
const MAX_FEEDBACK: f64 = 0.99;

/// First-order allpass section
#[derive(Debug, Clone, Copy, Default)]
struct AllpassStage {
    z: f64,
}

impl AllpassStage {
    #[inline(always)]
    fn process(&mut self, input: f64, coeff: f64) -> f64 {
        let output = coeff * input + self.z;
        self.z = input - coeff * output;
        output
    }
}

#[derive(Debug, Clone)]
pub struct Phaser {
    sample_rate: f64,

    rate_hz: f64,
    depth: f64,
    centre_hz: f64,
    feedback: f64,
    mix: f64,

    stages: [AllpassStage; NUM_STAGES],
    coeff: f64,
    lfo_phase: f64,
    lfo_increment: f64,
    samples_until_update: usize,
    last_output: f64,
}

impl Phaser {
    pub fn new() -> Self {
        let mut phaser = Self {
            sample_rate: valid_sample_rate(0.0),
            rate_hz: 0.2,
            depth: 0.05,
            centre_hz: 1000.0,
            feedback: 0.0,
            mix: 0.05,
            stages: [AllpassStage::default(); NUM_STAGES],
            coeff: 0.0,
            lfo_phase: 0.0,
            lfo_increment: 0.0,
            samples_until_update: 0,
            last_output: 0.0,
        };
        phaser.update_increment();
        phaser
    }

    pub fn set_rate(&mut self, hz: f64) {
        self.rate_hz = hz.max(0.0);
        self.update_increment();
    }

    /// Sweep depth, 0-1
    pub fn set_depth(&mut self, depth: f64) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    pub fn set_centre_frequency(&mut self, hz: f64) {
        self.centre_hz = hz.max(MIN_FREQUENCY_HZ);
    }

    /// Feedback amount, -1 to 1
    pub fn set_feedback(&mut self, amount: f64) {
        self.feedback = amount.clamp(-MAX_FEEDBACK, MAX_FEEDBACK);
    }

    /// Dry/wet, 0-1
    pub fn set_mix(&mut self, mix: f64) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    fn update_increment(&mut self) {
        self.lfo_increment = TAU * self.rate_hz / self.sample_rate;
    }

    fn update_coeff(&mut self) {
        let lfo = self.lfo_phase.sin();
        let max_freq = (self.sample_rate * 0.45).max(MIN_FREQUENCY_HZ);
        let freq = (self.centre_hz * (SWEEP_OCTAVES * self.depth * lfo).exp2())
            .min(max_freq)
            .max(MIN_FREQUENCY_HZ);
        let t = (PI * freq / self.sample_rate).tan();
        self.coeff = (t - 1.0) / (t + 1.0);
    }
}

impl Default for Phaser {
    fn default() -> Self {
        Self::new()
    }
}

impl MonoProcessor for Phaser {
    #[inline]
    fn process_sample(&mut self, input: Sample) -> Sample {
        if self.samples_until_update == 0 {
            self.update_coeff();
            self.samples_until_update = COEFF_UPDATE_INTERVAL;
        }
        self.samples_until_update -= 1;

        self.lfo_phase += self.lfo_increment;
        if self.lfo_phase >= TAU {
            self.lfo_phase -= TAU;
        }

        let mut wet = input + self.feedback * self.last_output;
        for stage in self.stages.iter_mut() {
            wet = stage.process(wet, self.coeff);
        }
        self.last_output = wet;

        input * (1.0 - self.mix) + wet * self.mix
    }
}

impl EffectUnit for Phaser {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = valid_sample_rate(spec.sample_rate);
        self.update_increment();
        self.reset();
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        process_unless_bypassed(self, ctx);
    }

    fn reset(&mut self) {
        self.stages = [AllpassStage::default(); NUM_STAGES];
        self.lfo_phase = 0.0;
        self.samples_until_update = 0;
        self.last_output = 0.0;
    }
}
