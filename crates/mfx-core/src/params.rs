//! Parameter types for the effect chain
//!
//! Parameters are identified by a stable `ParamId` enum. The id indexes a
//! static spec table and the `ParamStore` value array, so the audio thread
//! never compares strings.

use serde::{Deserialize, Serialize};
use portable_atomic::{AtomicF64, Ordering};

use crate::{EffectKind, GeneralFilterMode, LadderMode};

// ============ Parameter Ids ============

/// Every parameter the chain reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ParamId {
    PhaserRateHz,
    PhaserDepthPercent,
    PhaserCenterFreqHz,
    PhaserFeedbackPercent,
    PhaserMixPercent,
    PhaserBypass,

    ChorusRateHz,
    ChorusDepthPercent,
    ChorusCenterDelayMs,
    ChorusFeedbackPercent,
    ChorusMixPercent,
    ChorusBypass,

    OverdriveSaturation,
    OverdriveBypass,

    LadderFilterMode,
    LadderFilterCutoffHz,
    LadderFilterResonance,
    LadderFilterDrive,
    LadderFilterBypass,

    GeneralFilterMode,
    GeneralFilterFreqHz,
    GeneralFilterQuality,
    GeneralFilterGain,
    GeneralFilterBypass,

    InputGain,
    OutputGain,
}

const PHASER_PARAMS: [ParamId; 6] = [
    ParamId::PhaserRateHz,
    ParamId::PhaserDepthPercent,
    ParamId::PhaserCenterFreqHz,
    ParamId::PhaserFeedbackPercent,
    ParamId::PhaserMixPercent,
    ParamId::PhaserBypass,
];

const CHORUS_PARAMS: [ParamId; 6] = [
    ParamId::ChorusRateHz,
    ParamId::ChorusDepthPercent,
    ParamId::ChorusCenterDelayMs,
    ParamId::ChorusFeedbackPercent,
    ParamId::ChorusMixPercent,
    ParamId::ChorusBypass,
];

const OVERDRIVE_PARAMS: [ParamId; 2] = [ParamId::OverdriveSaturation, ParamId::OverdriveBypass];

const LADDER_PARAMS: [ParamId; 5] = [
    ParamId::LadderFilterMode,
    ParamId::LadderFilterCutoffHz,
    ParamId::LadderFilterResonance,
    ParamId::LadderFilterDrive,
    ParamId::LadderFilterBypass,
];

const GENERAL_FILTER_PARAMS: [ParamId; 5] = [
    ParamId::GeneralFilterMode,
    ParamId::GeneralFilterFreqHz,
    ParamId::GeneralFilterQuality,
    ParamId::GeneralFilterGain,
    ParamId::GeneralFilterBypass,
];

impl ParamId {
    pub const COUNT: usize = 26;

    /// All ids in declaration order
    pub const ALL: [ParamId; Self::COUNT] = [
        ParamId::PhaserRateHz,
        ParamId::PhaserDepthPercent,
        ParamId::PhaserCenterFreqHz,
        ParamId::PhaserFeedbackPercent,
        ParamId::PhaserMixPercent,
        ParamId::PhaserBypass,
        ParamId::ChorusRateHz,
        ParamId::ChorusDepthPercent,
        ParamId::ChorusCenterDelayMs,
        ParamId::ChorusFeedbackPercent,
        ParamId::ChorusMixPercent,
        ParamId::ChorusBypass,
        ParamId::OverdriveSaturation,
        ParamId::OverdriveBypass,
        ParamId::LadderFilterMode,
        ParamId::LadderFilterCutoffHz,
        ParamId::LadderFilterResonance,
        ParamId::LadderFilterDrive,
        ParamId::LadderFilterBypass,
        ParamId::GeneralFilterMode,
        ParamId::GeneralFilterFreqHz,
        ParamId::GeneralFilterQuality,
        ParamId::GeneralFilterGain,
        ParamId::GeneralFilterBypass,
        ParamId::InputGain,
        ParamId::OutputGain,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn spec(self) -> &'static ParamSpec {
        &PARAM_SPECS[self.index()]
    }

    /// Parameters shown on the panel of one effect
    pub fn for_kind(kind: EffectKind) -> &'static [ParamId] {
        match kind {
            EffectKind::Phase => &PHASER_PARAMS,
            EffectKind::Chorus => &CHORUS_PARAMS,
            EffectKind::Overdrive => &OVERDRIVE_PARAMS,
            EffectKind::LadderFilter => &LADDER_PARAMS,
            EffectKind::GeneralFilter => &GENERAL_FILTER_PARAMS,
        }
    }

    /// Bypass switch of one effect
    pub fn bypass_for(kind: EffectKind) -> ParamId {
        match kind {
            EffectKind::Phase => ParamId::PhaserBypass,
            EffectKind::Chorus => ParamId::ChorusBypass,
            EffectKind::Overdrive => ParamId::OverdriveBypass,
            EffectKind::LadderFilter => ParamId::LadderFilterBypass,
            EffectKind::GeneralFilter => ParamId::GeneralFilterBypass,
        }
    }

    /// Look up an id by its key. Control side only.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.spec().key == key)
    }

    #[inline]
    pub fn is_continuous(self) -> bool {
        matches!(self.spec().kind, ParamKind::Float(_))
    }
}

// ============ Parameter Specs ============

/// Parameter skew
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamSkew {
    Linear,
    Logarithmic,
}

/// Parameter range specification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub skew: ParamSkew,
}

impl ParamRange {
    pub const fn linear(min: f64, max: f64, default: f64) -> Self {
        Self {
            min,
            max,
            default,
            skew: ParamSkew::Linear,
        }
    }

    pub const fn logarithmic(min: f64, max: f64, default: f64) -> Self {
        Self {
            min,
            max,
            default,
            skew: ParamSkew::Logarithmic,
        }
    }

    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Map `normalized` (0..1) onto the range, following the skew
    pub fn denormalize(&self, normalized: f64) -> f64 {
        let (lo, hi) = (self.skew.warp(self.min), self.skew.warp(self.max));
        self.skew.unwarp(lo + normalized.clamp(0.0, 1.0) * (hi - lo))
    }

    /// Position of `value` within the range as 0..1
    pub fn normalize(&self, value: f64) -> f64 {
        let (lo, hi) = (self.skew.warp(self.min), self.skew.warp(self.max));
        (self.skew.warp(self.clamp(value)) - lo) / (hi - lo)
    }
}

impl ParamSkew {
    /// Into the domain where the control moves linearly
    #[inline]
    fn warp(self, value: f64) -> f64 {
        match self {
            ParamSkew::Linear => value,
            ParamSkew::Logarithmic => value.ln(),
        }
    }

    #[inline]
    fn unwarp(self, value: f64) -> f64 {
        match self {
            ParamSkew::Linear => value,
            ParamSkew::Logarithmic => value.exp(),
        }
    }
}

/// What kind of value a parameter holds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// Continuous value, smoothed before reaching the DSP
    Float(ParamRange),
    /// Index into a list of choices
    Choice {
        choices: &'static [&'static str],
        default: usize,
    },
    /// On/off switch
    Bool { default: bool },
}

impl ParamKind {
    /// Default as stored in a `ParamStore`
    pub fn default_value(&self) -> f64 {
        match *self {
            ParamKind::Float(range) => range.default,
            ParamKind::Choice { default, .. } => default as f64,
            ParamKind::Bool { default } => {
                if default {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Clamp a raw value into what this parameter can hold
    pub fn sanitize(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.default_value();
        }
        match *self {
            ParamKind::Float(range) => range.clamp(value),
            ParamKind::Choice { choices, .. } => {
                value.round().clamp(0.0, choices.len().saturating_sub(1) as f64)
            }
            ParamKind::Bool { .. } => {
                if value >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Static description of one parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub id: ParamId,
    /// Stable snake_case key
    pub key: &'static str,
    /// Display name
    pub name: &'static str,
    pub kind: ParamKind,
}

const fn float(id: ParamId, key: &'static str, name: &'static str, range: ParamRange) -> ParamSpec {
    ParamSpec {
        id,
        key,
        name,
        kind: ParamKind::Float(range),
    }
}

const fn bypass(id: ParamId, key: &'static str, name: &'static str) -> ParamSpec {
    ParamSpec {
        id,
        key,
        name,
        kind: ParamKind::Bool { default: false },
    }
}

/// Spec table, indexed by `ParamId::index()`
static PARAM_SPECS: [ParamSpec; ParamId::COUNT] = [
    float(ParamId::PhaserRateHz, "phaser_rate_hz", "Phaser Rate Hz", ParamRange::linear(0.01, 2.0, 0.2)),
    float(ParamId::PhaserDepthPercent, "phaser_depth", "Phaser Depth %", ParamRange::linear(0.0, 1.0, 0.05)),
    float(ParamId::PhaserCenterFreqHz, "phaser_center_freq_hz", "Phaser Center Freq Hz", ParamRange::logarithmic(20.0, 20000.0, 1000.0)),
    float(ParamId::PhaserFeedbackPercent, "phaser_feedback", "Phaser Feedback %", ParamRange::linear(-1.0, 1.0, 0.0)),
    float(ParamId::PhaserMixPercent, "phaser_mix", "Phaser Mix %", ParamRange::linear(0.0, 1.0, 0.05)),
    bypass(ParamId::PhaserBypass, "phaser_bypass", "Phaser Bypass"),
    float(ParamId::ChorusRateHz, "chorus_rate_hz", "Chorus Rate Hz", ParamRange::linear(0.01, 100.0, 0.2)),
    float(ParamId::ChorusDepthPercent, "chorus_depth", "Chorus Depth %", ParamRange::linear(0.0, 1.0, 0.05)),
    float(ParamId::ChorusCenterDelayMs, "chorus_center_delay_ms", "Chorus Center Delay ms", ParamRange::linear(1.0, 100.0, 7.0)),
    float(ParamId::ChorusFeedbackPercent, "chorus_feedback", "Chorus Feedback %", ParamRange::linear(-1.0, 1.0, 0.0)),
    float(ParamId::ChorusMixPercent, "chorus_mix", "Chorus Mix %", ParamRange::linear(0.0, 1.0, 0.05)),
    bypass(ParamId::ChorusBypass, "chorus_bypass", "Chorus Bypass"),
    float(ParamId::OverdriveSaturation, "overdrive_saturation", "OverDrive Saturation", ParamRange::linear(1.0, 100.0, 1.0)),
    bypass(ParamId::OverdriveBypass, "overdrive_bypass", "OverDrive Bypass"),
    ParamSpec {
        id: ParamId::LadderFilterMode,
        key: "ladder_mode",
        name: "Ladder Filter Mode",
        kind: ParamKind::Choice {
            choices: &LadderMode::NAMES,
            default: 0,
        },
    },
    float(ParamId::LadderFilterCutoffHz, "ladder_cutoff_hz", "Ladder Filter Cutoff Hz", ParamRange::logarithmic(20.0, 20000.0, 20000.0)),
    float(ParamId::LadderFilterResonance, "ladder_resonance", "Ladder Filter Resonance", ParamRange::linear(0.0, 1.0, 0.0)),
    float(ParamId::LadderFilterDrive, "ladder_drive", "Ladder Filter Drive", ParamRange::linear(1.0, 100.0, 1.0)),
    bypass(ParamId::LadderFilterBypass, "ladder_bypass", "Ladder Filter Bypass"),
    ParamSpec {
        id: ParamId::GeneralFilterMode,
        key: "filter_mode",
        name: "General Filter Mode",
        kind: ParamKind::Choice {
            choices: &GeneralFilterMode::NAMES,
            default: 0,
        },
    },
    float(ParamId::GeneralFilterFreqHz, "filter_freq_hz", "General Filter Freq Hz", ParamRange::logarithmic(20.0, 20000.0, 750.0)),
    float(ParamId::GeneralFilterQuality, "filter_quality", "General Filter Quality", ParamRange::linear(0.1, 10.0, 1.0)),
    float(ParamId::GeneralFilterGain, "filter_gain_db", "General Filter Gain", ParamRange::linear(-24.0, 24.0, 0.0)),
    bypass(ParamId::GeneralFilterBypass, "filter_bypass", "General Filter Bypass"),
    float(ParamId::InputGain, "input_gain_db", "Input Gain", ParamRange::linear(-18.0, 18.0, 0.0)),
    float(ParamId::OutputGain, "output_gain_db", "Output Gain", ParamRange::linear(-18.0, 18.0, 0.0)),
];

// ============ Parameter Store ============

/// Live parameter values shared between the control and audio threads
///
/// Writers clamp into the parameter's range, so readers never see an
/// out-of-range value.
#[derive(Debug)]
pub struct ParamStore {
    values: [AtomicF64; ParamId::COUNT],
}

impl ParamStore {
    /// Store with every parameter at its default
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|i| AtomicF64::new(PARAM_SPECS[i].kind.default_value())),
        }
    }

    /// Current raw value (continuous read)
    #[inline]
    pub fn get(&self, id: ParamId) -> f64 {
        self.values[id.index()].load(Ordering::Relaxed)
    }

    /// Selected choice index
    #[inline]
    pub fn get_index(&self, id: ParamId) -> usize {
        self.get(id).max(0.0) as usize
    }

    /// Switch state
    #[inline]
    pub fn get_bool(&self, id: ParamId) -> bool {
        self.get(id) >= 0.5
    }

    /// Set a value, clamped to what the parameter can hold
    pub fn set(&self, id: ParamId, value: f64) {
        self.store(id, id.spec().kind.sanitize(value));
    }

    /// Set a continuous parameter from a normalized 0-1 value
    pub fn set_normalized(&self, id: ParamId, normalized: f64) {
        match id.spec().kind {
            ParamKind::Float(range) => self.set(id, range.denormalize(normalized)),
            ParamKind::Choice { choices, .. } => {
                let last = choices.len().saturating_sub(1) as f64;
                self.set(id, normalized.clamp(0.0, 1.0) * last);
            }
            ParamKind::Bool { .. } => self.set(id, normalized),
        }
    }

    pub fn set_index(&self, id: ParamId, index: usize) {
        self.set(id, index as f64);
    }

    pub fn set_bool(&self, id: ParamId, on: bool) {
        self.set(id, if on { 1.0 } else { 0.0 });
    }

    /// Restore every parameter to its default
    pub fn reset_to_defaults(&self) {
        for id in ParamId::ALL {
            self.store(id, id.spec().kind.default_value());
        }
    }

    #[inline]
    fn store(&self, id: ParamId, value: f64) {
        self.values[id.index()].store(value, Ordering::Relaxed);
    }

    /// Handles for the parameters of one effect, in panel order
    pub fn handles_for_kind(&self, kind: EffectKind) -> Vec<ParamHandle<'_>> {
        ParamId::for_kind(kind)
            .iter()
            .map(|&id| ParamHandle {
                spec: id.spec(),
                value: &self.values[id.index()],
            })
            .collect()
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed view of one parameter: its spec plus its live value
#[derive(Debug, Clone, Copy)]
pub struct ParamHandle<'a> {
    pub spec: &'static ParamSpec,
    value: &'a AtomicF64,
}

impl ParamHandle<'_> {
    #[inline]
    pub fn id(&self) -> ParamId {
        self.spec.id
    }

    #[inline]
    pub fn get(&self) -> f64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: f64) {
        self.value.store(self.spec.kind.sanitize(value), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_table_matches_ids() {
        for (i, id) in ParamId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(id.spec().id, *id);
        }
    }

    #[test]
    fn test_keys_are_unique() {
        for id in ParamId::ALL {
            assert_eq!(ParamId::from_key(id.spec().key), Some(id));
        }
        assert_eq!(ParamId::from_key("nope"), None);
    }

    #[test]
    fn test_defaults() {
        let store = ParamStore::new();
        assert_eq!(store.get(ParamId::PhaserCenterFreqHz), 1000.0);
        assert_eq!(store.get(ParamId::ChorusCenterDelayMs), 7.0);
        assert_eq!(store.get(ParamId::LadderFilterCutoffHz), 20000.0);
        assert_eq!(store.get_index(ParamId::GeneralFilterMode), 0);
        assert!(!store.get_bool(ParamId::OverdriveBypass));
    }

    #[test]
    fn test_writes_are_clamped() {
        let store = ParamStore::new();

        store.set(ParamId::GeneralFilterQuality, 50.0);
        assert_eq!(store.get(ParamId::GeneralFilterQuality), 10.0);

        store.set(ParamId::LadderFilterMode, 17.0);
        assert_eq!(store.get_index(ParamId::LadderFilterMode), 5);

        store.set(ParamId::ChorusBypass, 0.7);
        assert!(store.get_bool(ParamId::ChorusBypass));

        store.set(ParamId::InputGain, f64::NAN);
        assert_eq!(store.get(ParamId::InputGain), 0.0);
    }

    #[test]
    fn test_normalized_log_range() {
        let store = ParamStore::new();
        store.set_normalized(ParamId::GeneralFilterFreqHz, 0.0);
        assert!((store.get(ParamId::GeneralFilterFreqHz) - 20.0).abs() < 1e-9);
        store.set_normalized(ParamId::GeneralFilterFreqHz, 1.0);
        assert!((store.get(ParamId::GeneralFilterFreqHz) - 20000.0).abs() < 1e-6);

        let range = ParamRange::logarithmic(20.0, 20000.0, 1000.0);
        let n = range.normalize(632.455_532);
        assert!((n - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_skews_map_through_one_path() {
        let linear = ParamRange::linear(-18.0, 18.0, 0.0);
        assert_eq!(linear.denormalize(0.5), 0.0);
        assert_eq!(linear.normalize(9.0), 0.75);
        assert_eq!(linear.denormalize(2.0), 18.0);
        assert_eq!(linear.normalize(-40.0), 0.0);

        let log = ParamRange::logarithmic(20.0, 20000.0, 1000.0);
        for n in [0.0, 0.25, 0.5, 0.9, 1.0] {
            assert!((log.normalize(log.denormalize(n)) - n).abs() < 1e-12);
        }
        assert!(log.denormalize(0.0) >= 20.0 - 1e-9);
    }

    #[test]
    fn test_handles_for_kind() {
        let store = ParamStore::new();
        let handles = store.handles_for_kind(EffectKind::LadderFilter);
        let ids: Vec<ParamId> = handles.iter().map(|h| h.id()).collect();
        assert_eq!(ids, LADDER_PARAMS.to_vec());

        handles[2].set(0.5);
        assert_eq!(store.get(ParamId::LadderFilterResonance), 0.5);
    }

    #[test]
    fn test_every_param_belongs_to_one_panel_or_is_global() {
        let mut owners = [0usize; ParamId::COUNT];
        for kind in EffectKind::ALL {
            for id in ParamId::for_kind(kind) {
                owners[id.index()] += 1;
            }
            assert_eq!(
                ParamId::for_kind(kind).last().copied(),
                Some(ParamId::bypass_for(kind))
            );
        }
        for id in ParamId::ALL {
            let expected = match id {
                ParamId::InputGain | ParamId::OutputGain => 0,
                _ => 1,
            };
            assert_eq!(owners[id.index()], expected, "{id:?}");
        }
    }
}
