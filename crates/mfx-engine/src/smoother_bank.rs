//! Per-chunk parameter smoothing
//!
//! One `LinearSmoother` per continuous effect parameter. The bank is
//! retargeted from the live parameter values once per chunk and advanced by
//! the chunk length, so the DSP sees at most one parameter step per chunk.

use mfx_core::{ParamId, ParamStore};
use mfx_dsp::LinearSmoother;

/// Continuous effect parameters that are smoothed before reaching the DSP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SmoothedParam {
    PhaserRate,
    PhaserDepth,
    PhaserCentreFreq,
    PhaserFeedback,
    PhaserMix,
    ChorusRate,
    ChorusDepth,
    ChorusCentreDelay,
    ChorusFeedback,
    ChorusMix,
    OverdriveSaturation,
    LadderCutoff,
    LadderResonance,
    LadderDrive,
    FilterFreq,
    FilterQuality,
    FilterGain,
}

impl SmoothedParam {
    pub const COUNT: usize = 17;

    pub const ALL: [SmoothedParam; Self::COUNT] = [
        SmoothedParam::PhaserRate,
        SmoothedParam::PhaserDepth,
        SmoothedParam::PhaserCentreFreq,
        SmoothedParam::PhaserFeedback,
        SmoothedParam::PhaserMix,
        SmoothedParam::ChorusRate,
        SmoothedParam::ChorusDepth,
        SmoothedParam::ChorusCentreDelay,
        SmoothedParam::ChorusFeedback,
        SmoothedParam::ChorusMix,
        SmoothedParam::OverdriveSaturation,
        SmoothedParam::LadderCutoff,
        SmoothedParam::LadderResonance,
        SmoothedParam::LadderDrive,
        SmoothedParam::FilterFreq,
        SmoothedParam::FilterQuality,
        SmoothedParam::FilterGain,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The live parameter this smoother follows
    pub const fn param_id(self) -> ParamId {
        match self {
            SmoothedParam::PhaserRate => ParamId::PhaserRateHz,
            SmoothedParam::PhaserDepth => ParamId::PhaserDepthPercent,
            SmoothedParam::PhaserCentreFreq => ParamId::PhaserCenterFreqHz,
            SmoothedParam::PhaserFeedback => ParamId::PhaserFeedbackPercent,
            SmoothedParam::PhaserMix => ParamId::PhaserMixPercent,
            SmoothedParam::ChorusRate => ParamId::ChorusRateHz,
            SmoothedParam::ChorusDepth => ParamId::ChorusDepthPercent,
            SmoothedParam::ChorusCentreDelay => ParamId::ChorusCenterDelayMs,
            SmoothedParam::ChorusFeedback => ParamId::ChorusFeedbackPercent,
            SmoothedParam::ChorusMix => ParamId::ChorusMixPercent,
            SmoothedParam::OverdriveSaturation => ParamId::OverdriveSaturation,
            SmoothedParam::LadderCutoff => ParamId::LadderFilterCutoffHz,
            SmoothedParam::LadderResonance => ParamId::LadderFilterResonance,
            SmoothedParam::LadderDrive => ParamId::LadderFilterDrive,
            SmoothedParam::FilterFreq => ParamId::GeneralFilterFreqHz,
            SmoothedParam::FilterQuality => ParamId::GeneralFilterQuality,
            SmoothedParam::FilterGain => ParamId::GeneralFilterGain,
        }
    }
}

/// Float parameters smoothed elsewhere (per sample, by the gain stages)
fn is_gain_param(id: ParamId) -> bool {
    matches!(id, ParamId::InputGain | ParamId::OutputGain)
}

/// Number of float parameters that need a smoother in the bank
fn smoothed_param_count() -> usize {
    ParamId::ALL
        .iter()
        .filter(|id| id.is_continuous() && !is_gain_param(**id))
        .count()
}

/// Smoothers for every continuous effect parameter
#[derive(Debug, Clone)]
pub struct ParamSmootherBank {
    smoothers: [LinearSmoother; SmoothedParam::COUNT],
}

impl ParamSmootherBank {
    pub fn new() -> Self {
        debug_assert_eq!(
            SmoothedParam::COUNT,
            smoothed_param_count(),
            "every continuous effect parameter needs exactly one smoother"
        );

        Self {
            smoothers: std::array::from_fn(|i| {
                LinearSmoother::new(SmoothedParam::ALL[i].param_id().spec().kind.default_value())
            }),
        }
    }

    /// Set the ramp time of every smoother. Called from `prepare`.
    pub fn reset(&mut self, sample_rate: f64, ramp_seconds: f64) {
        for smoother in self.smoothers.iter_mut() {
            smoother.reset(sample_rate, ramp_seconds);
        }
    }

    /// Snap current and target to the live values, so nothing ramps in from stale state
    pub fn initialize(&mut self, params: &ParamStore) {
        for (smoother, param) in self.smoothers.iter_mut().zip(SmoothedParam::ALL) {
            smoother.set_current_and_target(params.get(param.param_id()));
        }
    }

    /// Follow the live values and advance by one chunk
    #[inline]
    pub fn retarget(&mut self, params: &ParamStore, chunk_samples: usize) {
        for (smoother, param) in self.smoothers.iter_mut().zip(SmoothedParam::ALL) {
            smoother.set_target(params.get(param.param_id()));
            smoother.skip(chunk_samples);
        }
    }

    #[inline]
    pub fn current(&self, param: SmoothedParam) -> f64 {
        self.smoothers[param.index()].current()
    }

    #[inline]
    pub fn target(&self, param: SmoothedParam) -> f64 {
        self.smoothers[param.index()].target()
    }

    /// True while any parameter is still ramping
    pub fn is_smoothing(&self) -> bool {
        self.smoothers.iter().any(LinearSmoother::is_smoothing)
    }
}

impl Default for ParamSmootherBank {
    fn default() -> Self {
        Self::new()
    }
}
