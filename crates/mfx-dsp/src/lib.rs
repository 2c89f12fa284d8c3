//! mfx-dsp: Effect units for the multi-effect chain
//!
//! Every unit processes one channel in place and keeps its own state.
//!
//! ## Modules
//! - `biquad` - TDF-II biquad and RBJ coefficient sets
//! - `smoothing` - Linear parameter ramp
//! - `gain` - Smoothed stereo gain stage
//! - `phaser` - Six-stage allpass phaser
//! - `chorus` - Modulated delay chorus
//! - `saturation` - Overdrive soft clipper
//! - `ladder` - Four-pole ladder filter with drive
//! - `general_filter` - Peak/bandpass/notch/allpass biquad unit
//! - `analysis` - Block RMS

pub mod analysis;
pub mod biquad;
pub mod chorus;
pub mod gain;
pub mod general_filter;
pub mod ladder;
pub mod phaser;
pub mod saturation;
pub mod smoothing;

pub use analysis::block_rms;
pub use chorus::Chorus;
pub use gain::GainStage;
pub use general_filter::{GeneralFilter, general_filter_coeffs};
pub use ladder::LadderFilter;
pub use phaser::Phaser;
pub use saturation::Overdrive;
pub use smoothing::LinearSmoother;

use mfx_core::Sample;

// ============ Effect Unit Contract ============

/// Processing environment handed to `EffectUnit::prepare`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    pub sample_rate: f64,
    pub maximum_block_size: usize,
    pub num_channels: usize,
}

impl ProcessSpec {
    /// Single-channel spec, the only layout effect units accept
    pub fn mono(sample_rate: f64, maximum_block_size: usize) -> Self {
        Self {
            sample_rate,
            maximum_block_size,
            num_channels: 1,
        }
    }
}

/// In-place processing context for one call
#[derive(Debug)]
pub struct ProcessContext<'a> {
    pub block: &'a mut [Sample],
    /// When set, the unit must leave the block and its own state untouched
    pub is_bypassed: bool,
}

impl<'a> ProcessContext<'a> {
    /// Context whose output replaces its input
    pub fn replacing(block: &'a mut [Sample]) -> Self {
        Self {
            block,
            is_bypassed: false,
        }
    }
}

/// One effect in the chain
pub trait EffectUnit: Send {
    /// Allocate and size internal state. Control thread only.
    fn prepare(&mut self, spec: &ProcessSpec);

    /// Process `ctx.block` in place. Real-time safe.
    fn process(&mut self, ctx: &mut ProcessContext<'_>);

    /// Clear internal state (delay lines, filter memory, LFO phase)
    fn reset(&mut self);
}

// ============ Sample Processors ============

/// Per-sample mono building block
pub trait MonoProcessor: Send {
    /// Process a single sample
    fn process_sample(&mut self, input: Sample) -> Sample;

    /// Process a block of samples
    fn process_block(&mut self, buffer: &mut [Sample]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}

/// Run a per-sample processor as an effect unit body
#[inline]
pub(crate) fn process_unless_bypassed<P: MonoProcessor>(unit: &mut P, ctx: &mut ProcessContext<'_>) {
    if ctx.is_bypassed {
        return;
    }
    unit.process_block(ctx.block);
}

/// Sample rate fallback for units used before `prepare`
pub(crate) const DEFAULT_SAMPLE_RATE: f64 = 48000.0;

/// Sanitize a sample rate handed to `prepare`
#[inline]
pub(crate) fn valid_sample_rate(sample_rate: f64) -> f64 {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        sample_rate
    } else {
        DEFAULT_SAMPLE_RATE
    }
}
