//! Four-pole ladder filter with input drive
//!
//! Each pole is a one-pole lowpass with a small feed-forward term. Resonance
//! feeds the saturated last stage back to the input. The six responses are
//! built by mixing the input and the four pole outputs.

use mfx_core::{LadderMode, Sample};
use std::f64::consts::TAU;

use crate::saturation::drive_compensation;
use crate::{EffectUnit, MonoProcessor, ProcessContext, ProcessSpec, process_unless_bypassed, valid_sample_rate};

const MIN_CUTOFF_HZ: f64 = 20.0;

/// Output mix and feedback compensation for one response
#[derive(Debug, Clone, Copy, PartialEq)]
struct ModeMix {
    taps: [f64; 5],
    comp: f64,
}

impl ModeMix {
    fn for_mode(mode: LadderMode) -> Self {
        let (taps, comp) = match mode {
            LadderMode::Lpf12 => ([0.0, 0.0, 1.0, 0.0, 0.0], 0.5),
            LadderMode::Hpf12 => ([1.0, -2.0, 1.0, 0.0, 0.0], 0.0),
            LadderMode::Bpf12 => ([0.0, 0.0, -1.0, 1.0, 0.0], 0.5),
            LadderMode::Lpf24 => ([0.0, 0.0, 0.0, 0.0, 1.0], 0.5),
            LadderMode::Hpf24 => ([1.0, -4.0, 6.0, -4.0, 1.0], 0.0),
            LadderMode::Bpf24 => ([0.0, 0.0, 1.0, -2.0, 1.0], 0.5),
        };
        Self { taps, comp }
    }
}

#[derive(Debug, Clone)]
pub struct LadderFilter {
    sample_rate: f64,
    mode: LadderMode,
    mix: ModeMix,

    cutoff_hz: f64,
    resonance: f64,
    drive: f64,

    // Derived per-sample constants
    a1: f64,
    b0: f64,
    b1: f64,
    scaled_resonance: f64,
    gain: f64,
    drive2: f64,
    gain2: f64,

    state: [f64; 5],
}

impl LadderFilter {
    pub fn new() -> Self {
        let mut filter = Self {
            sample_rate: valid_sample_rate(0.0),
            mode: LadderMode::default(),
            mix: ModeMix::for_mode(LadderMode::default()),
            cutoff_hz: 20000.0,
            resonance: 0.0,
            drive: 1.0,
            a1: 0.0,
            b0: 0.0,
            b1: 0.0,
            scaled_resonance: 0.0,
            gain: 0.0,
            drive2: 0.0,
            gain2: 0.0,
            state: [0.0; 5],
        };
        filter.update_cutoff();
        filter.update_resonance();
        filter.update_drive();
        filter
    }

    pub fn set_mode(&mut self, mode: LadderMode) {
        if mode != self.mode {
            self.mode = mode;
            self.mix = ModeMix::for_mode(mode);
        }
    }

    pub fn set_cutoff(&mut self, hz: f64) {
        let hz = hz.max(MIN_CUTOFF_HZ);
        if hz != self.cutoff_hz {
            self.cutoff_hz = hz;
            self.update_cutoff();
        }
    }

    /// Resonance, 0-1
    pub fn set_resonance(&mut self, resonance: f64) {
        let resonance = resonance.clamp(0.0, 1.0);
        if resonance != self.resonance {
            self.resonance = resonance;
            self.update_resonance();
        }
    }

    /// Input drive, 1 or more
    pub fn set_drive(&mut self, drive: f64) {
        let drive = drive.max(1.0);
        if drive != self.drive {
            self.drive = drive;
            self.update_drive();
        }
    }

    fn update_cutoff(&mut self) {
        self.a1 = (self.cutoff_hz * -TAU / self.sample_rate).exp();
        let g = 1.0 - self.a1;
        self.b0 = g * 0.769_230_769_23;
        self.b1 = g * 0.230_769_230_76;
    }

    fn update_resonance(&mut self) {
        // 0-1 maps onto 0.1-1
        self.scaled_resonance = 0.1 + self.resonance * 0.9;
    }

    fn update_drive(&mut self) {
        self.gain = drive_compensation(self.drive);
        self.drive2 = self.drive * 0.04 + 0.96;
        self.gain2 = drive_compensation(self.drive2);
    }
}

impl Default for LadderFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl MonoProcessor for LadderFilter {
    #[inline]
    fn process_sample(&mut self, input: Sample) -> Sample {
        let s = &mut self.state;
        let (a1, b0, b1) = (self.a1, self.b0, self.b1);

        let dx = self.gain * (self.drive * input).tanh();
        let a = dx
            + self.scaled_resonance
                * -4.0
                * (self.gain2 * (self.drive2 * s[4]).tanh() - dx * self.mix.comp);

        let b = b1 * s[0] + a1 * s[1] + b0 * a;
        let c = b1 * s[1] + a1 * s[2] + b0 * b;
        let d = b1 * s[2] + a1 * s[3] + b0 * c;
        let e = b1 * s[3] + a1 * s[4] + b0 * d;

        *s = [a, b, c, d, e];

        let t = &self.mix.taps;
        a * t[0] + b * t[1] + c * t[2] + d * t[3] + e * t[4]
    }
}

impl EffectUnit for LadderFilter {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = valid_sample_rate(spec.sample_rate);
        self.update_cutoff();
        self.reset();
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        process_unless_bypassed(self, ctx);
    }

    fn reset(&mut self) {
        self.state = [0.0; 5];
    }
}
