//! Effect kinds and per-effect mode choices

use serde::{Deserialize, Serialize};

use crate::OrderError;

/// One tag per effect unit in the chain, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EffectKind {
    Phase = 0,
    Chorus = 1,
    Overdrive = 2,
    LadderFilter = 3,
    GeneralFilter = 4,
}

impl EffectKind {
    /// Number of effect kinds. Sizes every per-kind and per-slot array.
    pub const COUNT: usize = 5;

    /// All kinds in declaration order
    pub const ALL: [EffectKind; Self::COUNT] = [
        EffectKind::Phase,
        EffectKind::Chorus,
        EffectKind::Overdrive,
        EffectKind::LadderFilter,
        EffectKind::GeneralFilter,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Phase => "Phase",
            EffectKind::Chorus => "Chorus",
            EffectKind::Overdrive => "Overdrive",
            EffectKind::LadderFilter => "Ladder Filter",
            EffectKind::GeneralFilter => "General Filter",
        }
    }

    /// Lower-case identifier, used by command-line tools
    pub fn key(self) -> &'static str {
        match self {
            EffectKind::Phase => "phase",
            EffectKind::Chorus => "chorus",
            EffectKind::Overdrive => "overdrive",
            EffectKind::LadderFilter => "ladder",
            EffectKind::GeneralFilter => "filter",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl TryFrom<i64> for EffectKind {
    type Error = OrderError;

    fn try_from(tag: i64) -> Result<Self, Self::Error> {
        usize::try_from(tag)
            .ok()
            .and_then(Self::from_index)
            .ok_or(OrderError::InvalidKind(tag))
    }
}

// ============ Mode Choices ============

/// Ladder filter response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LadderMode {
    #[default]
    Lpf12,
    Hpf12,
    Bpf12,
    Lpf24,
    Hpf24,
    Bpf24,
}

impl LadderMode {
    pub const ALL: [LadderMode; 6] = [
        LadderMode::Lpf12,
        LadderMode::Hpf12,
        LadderMode::Bpf12,
        LadderMode::Lpf24,
        LadderMode::Hpf24,
        LadderMode::Bpf24,
    ];

    pub const NAMES: [&'static str; 6] = ["LPF12", "HPF12", "BPF12", "LPF24", "HPF24", "BPF24"];

    /// Out-of-range indices fall back to the default mode
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }
}

/// General (biquad) filter response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeneralFilterMode {
    #[default]
    Peak,
    Bandpass,
    Notch,
    Allpass,
}

impl GeneralFilterMode {
    pub const ALL: [GeneralFilterMode; 4] = [
        GeneralFilterMode::Peak,
        GeneralFilterMode::Bandpass,
        GeneralFilterMode::Notch,
        GeneralFilterMode::Allpass,
    ];

    pub const NAMES: [&'static str; 4] = ["Peak", "Bandpass", "Notch", "Allpass"];

    /// Out-of-range indices fall back to the default mode
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }
}
