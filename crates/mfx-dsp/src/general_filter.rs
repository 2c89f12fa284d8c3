//! General-purpose biquad unit
//!
//! Coefficients are pushed in from outside; the unit itself never decides
//! when to recompute them.

use mfx_core::{GeneralFilterMode, Sample};

use crate::biquad::{BiquadCoeffs, BiquadTDF2};
use crate::{EffectUnit, MonoProcessor, ProcessContext, ProcessSpec, process_unless_bypassed};

/// Coefficients for one general filter setting
pub fn general_filter_coeffs(
    mode: GeneralFilterMode,
    freq: f64,
    quality: f64,
    gain_db: f64,
    sample_rate: f64,
) -> BiquadCoeffs {
    match mode {
        GeneralFilterMode::Peak => BiquadCoeffs::peaking(freq, quality, gain_db, sample_rate),
        GeneralFilterMode::Bandpass => BiquadCoeffs::bandpass(freq, quality, sample_rate),
        GeneralFilterMode::Notch => BiquadCoeffs::notch(freq, quality, sample_rate),
        GeneralFilterMode::Allpass => BiquadCoeffs::allpass(freq, quality, sample_rate),
    }
}

/// Peak/bandpass/notch/allpass filter
#[derive(Debug, Clone)]
pub struct GeneralFilter {
    filter: BiquadTDF2,
}

impl GeneralFilter {
    pub fn new() -> Self {
        Self {
            filter: BiquadTDF2::new(),
        }
    }

    /// Install new coefficients. Filter memory is kept; callers reset when needed.
    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.filter.set_coeffs(coeffs);
    }

    #[inline]
    pub fn coeffs(&self) -> &BiquadCoeffs {
        self.filter.coeffs()
    }

    #[inline]
    pub fn is_clear(&self) -> bool {
        self.filter.is_clear()
    }
}

impl Default for GeneralFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl MonoProcessor for GeneralFilter {
    #[inline(always)]
    fn process_sample(&mut self, input: Sample) -> Sample {
        self.filter.process_sample(input)
    }
}

impl EffectUnit for GeneralFilter {
    fn prepare(&mut self, _spec: &ProcessSpec) {
        self.reset();
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        process_unless_bypassed(self, ctx);
    }

    fn reset(&mut self) {
        self.filter.reset();
    }
}
