//! Single-channel effect chain
//!
//! Owns one live instance of every effect. The processing order only
//! decides the sequence the instances run in; reordering never creates,
//! destroys or resets a unit.

use mfx_core::{
    EffectKind, EffectOrder, GeneralFilterMode, LadderMode, MfxError, MfxResult, ParamId,
    ParamStore, Sample,
};
use mfx_dsp::{
    Chorus, EffectUnit, GeneralFilter, LadderFilter, Overdrive, Phaser, ProcessContext,
    ProcessSpec, general_filter_coeffs,
};

use crate::smoother_bank::{ParamSmootherBank, SmoothedParam};

// ============ Slot Table ============

/// What runs in one slot of the chain for the current chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotState {
    pub kind: EffectKind,
    pub bypassed: bool,
}

/// Per-slot processing table, rebuilt every chunk
pub type SlotTable = [Option<SlotState>; EffectKind::COUNT];

// ============ Filter Coefficient Cache ============

/// The four values the general filter's coefficients depend on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    pub mode: GeneralFilterMode,
    pub freq: f64,
    pub quality: f64,
    pub gain_db: f64,
}

/// Remembers the settings the current coefficients were built from
#[derive(Debug, Clone, Default)]
pub struct FilterCoeffCache {
    cached: Option<FilterSettings>,
    recomputations: u64,
}

impl FilterCoeffCache {
    /// Record `settings`; true when they differ from the cached ones
    #[inline]
    pub fn update(&mut self, settings: FilterSettings) -> bool {
        if self.cached == Some(settings) {
            return false;
        }
        self.cached = Some(settings);
        self.recomputations += 1;
        true
    }

    /// Force the next `update` to report a change
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

// ============ Mono Channel ============

pub struct MonoChannel {
    phaser: Phaser,
    chorus: Chorus,
    overdrive: Overdrive,
    ladder: LadderFilter,
    general_filter: GeneralFilter,

    filter_cache: FilterCoeffCache,
    sample_rate: f64,
}

impl MonoChannel {
    pub fn new() -> Self {
        Self {
            phaser: Phaser::new(),
            chorus: Chorus::new(),
            overdrive: Overdrive::new(),
            ladder: LadderFilter::new(),
            general_filter: GeneralFilter::new(),
            filter_cache: FilterCoeffCache::default(),
            sample_rate: 0.0,
        }
    }

    /// Prepare every unit once. Only mono specs are accepted.
    pub fn prepare(&mut self, spec: &ProcessSpec) -> MfxResult<()> {
        debug_assert_eq!(spec.num_channels, 1, "mono channel prepared with a multichannel spec");
        if spec.num_channels != 1 {
            return Err(MfxError::ChannelCount {
                expected: 1,
                actual: spec.num_channels,
            });
        }

        for kind in EffectKind::ALL {
            self.unit_mut(kind).prepare(spec);
        }
        self.sample_rate = spec.sample_rate;
        self.filter_cache.invalidate();
        Ok(())
    }

    /// Push smoothed values and choice selections into every unit
    pub fn update_dsp_from_params(&mut self, smoothers: &ParamSmootherBank, params: &ParamStore) {
        use SmoothedParam as P;

        self.phaser.set_rate(smoothers.current(P::PhaserRate));
        self.phaser.set_depth(smoothers.current(P::PhaserDepth));
        self.phaser.set_centre_frequency(smoothers.current(P::PhaserCentreFreq));
        self.phaser.set_feedback(smoothers.current(P::PhaserFeedback));
        self.phaser.set_mix(smoothers.current(P::PhaserMix));

        self.chorus.set_rate(smoothers.current(P::ChorusRate));
        self.chorus.set_depth(smoothers.current(P::ChorusDepth));
        self.chorus.set_centre_delay_ms(smoothers.current(P::ChorusCentreDelay));
        self.chorus.set_feedback(smoothers.current(P::ChorusFeedback));
        self.chorus.set_mix(smoothers.current(P::ChorusMix));

        self.overdrive.set_drive(smoothers.current(P::OverdriveSaturation));

        self.ladder.set_mode(LadderMode::from_index(params.get_index(ParamId::LadderFilterMode)));
        self.ladder.set_cutoff(smoothers.current(P::LadderCutoff));
        self.ladder.set_resonance(smoothers.current(P::LadderResonance));
        self.ladder.set_drive(smoothers.current(P::LadderDrive));

        let settings = FilterSettings {
            mode: GeneralFilterMode::from_index(params.get_index(ParamId::GeneralFilterMode)),
            freq: smoothers.current(P::FilterFreq),
            quality: smoothers.current(P::FilterQuality),
            gain_db: smoothers.current(P::FilterGain),
        };
        self.update_general_filter(settings);
    }

    fn update_general_filter(&mut self, settings: FilterSettings) {
        if self.sample_rate <= 0.0 || !self.filter_cache.update(settings) {
            return;
        }

        let coeffs = general_filter_coeffs(
            settings.mode,
            settings.freq,
            settings.quality,
            settings.gain_db,
            self.sample_rate,
        );
        self.general_filter.set_coeffs(coeffs);
        // Old state does not belong to the new response
        self.general_filter.reset();
    }

    /// Map each slot of `order` to its kind and live bypass switch
    pub fn slot_table(order: &EffectOrder, params: &ParamStore) -> SlotTable {
        let mut table: SlotTable = [None; EffectKind::COUNT];
        for (slot, kind) in table.iter_mut().zip(order.iter()) {
            *slot = Some(SlotState {
                kind,
                bypassed: params.get_bool(ParamId::bypass_for(kind)),
            });
        }
        table
    }

    /// Run `block` through every slot of `order` in sequence
    pub fn process(&mut self, block: &mut [Sample], order: &EffectOrder, params: &ParamStore) {
        let table = Self::slot_table(order, params);
        let mut ctx = ProcessContext::replacing(block);

        for slot in table.iter().flatten() {
            ctx.is_bypassed = slot.bypassed;
            self.process_slot(slot.kind, &mut ctx);
        }
    }

    #[inline]
    fn process_slot(&mut self, kind: EffectKind, ctx: &mut ProcessContext<'_>) {
        match kind {
            EffectKind::Phase => self.phaser.process(ctx),
            EffectKind::Chorus => self.chorus.process(ctx),
            EffectKind::Overdrive => self.overdrive.process(ctx),
            EffectKind::LadderFilter => self.ladder.process(ctx),
            EffectKind::GeneralFilter => self.general_filter.process(ctx),
        }
    }

    /// The live unit for `kind`. Control-side access only.
    fn unit_mut(&mut self, kind: EffectKind) -> &mut dyn EffectUnit {
        match kind {
            EffectKind::Phase => &mut self.phaser,
            EffectKind::Chorus => &mut self.chorus,
            EffectKind::Overdrive => &mut self.overdrive,
            EffectKind::LadderFilter => &mut self.ladder,
            EffectKind::GeneralFilter => &mut self.general_filter,
        }
    }

    /// Clear the state of every unit
    pub fn reset(&mut self) {
        for kind in EffectKind::ALL {
            self.unit_mut(kind).reset();
        }
    }

    /// How many times the general filter's coefficients were rebuilt
    pub fn coefficient_recomputations(&self) -> u64 {
        self.filter_cache.recomputations()
    }
}

impl Default for MonoChannel {
    fn default() -> Self {
        Self::new()
    }
}
