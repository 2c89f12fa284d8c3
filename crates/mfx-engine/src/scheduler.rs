//! Chain scheduler
//!
//! Audio-thread driver for the whole chain. Each block:
//! 1. Drain pending orders, keep only the newest
//! 2. Acknowledge the working order to the control side when asked, or
//!    when it just changed
//! 3. Input gain
//! 4. Effects, chunk by chunk: retarget smoothers, push parameters into
//!    both channels, process both channel slices with the same order
//! 5. Output gain
//! 6. Meters and analyzer tap
//!
//! Nothing on this path allocates, locks or logs.

use mfx_core::{
    EffectKind, EffectOrder, EngineConfig, MIN_SAMPLE_RATE, MfxError, MfxResult, ParamHandle, ParamId,
    ParamStore, Sample,
};
use mfx_dsp::{GainStage, ProcessSpec, block_rms};
use portable_atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::analyzer_tap::{AnalyzerReader, AnalyzerWriter, analyzer_tap};
use crate::meters::{ChainMeters, MeterSnapshot};
use crate::mono_channel::MonoChannel;
use crate::order_channel::{OrderReceiver, OrderSender, order_channel};
use crate::smoother_bank::ParamSmootherBank;

/// State both threads touch
struct SharedState {
    /// Control side wants the working order echoed back
    publish_requested: AtomicBool,
    meters: ChainMeters,
}

// ═══════════════════════════════════════════════════════════════════════════
// AUDIO SIDE
// ═══════════════════════════════════════════════════════════════════════════

pub struct ChainScheduler {
    config: EngineConfig,
    params: Arc<ParamStore>,
    shared: Arc<SharedState>,

    order_rx: OrderReceiver<EffectOrder>,
    ack_tx: OrderSender<EffectOrder>,
    working_order: EffectOrder,

    smoothers: ParamSmootherBank,
    left: MonoChannel,
    right: MonoChannel,
    input_gain: GainStage,
    output_gain: GainStage,
    analyzer: AnalyzerWriter,

    sample_rate: f64,
    max_block_size: usize,
    prepared: bool,
}

impl ChainScheduler {
    /// Build the scheduler and its control-side handle
    pub fn new(config: EngineConfig, params: Arc<ParamStore>) -> MfxResult<(Self, ChainController)> {
        config.validate()?;

        let (order_tx, order_rx) = order_channel(config.order_channel_capacity);
        let (ack_tx, ack_rx) = order_channel(config.order_channel_capacity);
        let (analyzer_writer, analyzer_reader) = analyzer_tap(config.analyzer_capacity);
        let shared = Arc::new(SharedState {
            publish_requested: AtomicBool::new(false),
            meters: ChainMeters::new(),
        });

        log::debug!(
            "Chain scheduler: chunk {} samples, ramp {} s, order capacity {}, analyzer {} frames",
            config.chunk_size,
            config.smoothing_ramp_seconds,
            config.order_channel_capacity,
            config.analyzer_capacity
        );

        let controller = ChainController {
            params: Arc::clone(&params),
            shared: Arc::clone(&shared),
            order_tx,
            ack_rx,
            analyzer: analyzer_reader,
            last_known_order: EffectOrder::identity(),
        };

        let scheduler = Self {
            config,
            params,
            shared,
            order_rx,
            ack_tx,
            working_order: EffectOrder::identity(),
            smoothers: ParamSmootherBank::new(),
            left: MonoChannel::new(),
            right: MonoChannel::new(),
            input_gain: GainStage::new(),
            output_gain: GainStage::new(),
            analyzer: analyzer_writer,
            sample_rate: 0.0,
            max_block_size: 0,
            prepared: false,
        };

        Ok((scheduler, controller))
    }

    /// Size everything for a stream. Control thread, before processing starts.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) -> MfxResult<()> {
        if !sample_rate.is_finite() || sample_rate < MIN_SAMPLE_RATE {
            return Err(MfxError::InvalidSampleRate(sample_rate));
        }
        if max_block_size == 0 {
            return Err(MfxError::InvalidBlockSize(max_block_size));
        }

        let spec = ProcessSpec::mono(sample_rate, max_block_size);
        self.left.prepare(&spec)?;
        self.right.prepare(&spec)?;

        let ramp = self.config.smoothing_ramp_seconds;
        self.smoothers.reset(sample_rate, ramp);
        self.smoothers.initialize(&self.params);
        self.input_gain.reset(sample_rate, ramp);
        self.output_gain.reset(sample_rate, ramp);
        self.snap_gains();
        self.shared.meters.clear();

        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.prepared = true;

        log::info!(
            "Chain prepared: {sample_rate} Hz, up to {max_block_size} samples per block, order {}",
            self.working_order
        );
        Ok(())
    }

    fn snap_gains(&mut self) {
        self.input_gain.snap_to_db(self.params.get(ParamId::InputGain));
        self.output_gain.snap_to_db(self.params.get(ParamId::OutputGain));
    }

    /// Adopt the newest pending order and acknowledge it if needed
    fn sync_order(&mut self) {
        let adopted = match self.order_rx.drain_latest() {
            Some(order) => {
                self.working_order = order;
                true
            }
            None => false,
        };

        let publish = &self.shared.publish_requested;
        let requested = publish.load(Ordering::Acquire) && publish.swap(false, Ordering::AcqRel);

        if adopted || requested {
            self.ack_tx.push(self.working_order);
        }
    }

    /// Process one stereo block in place
    pub fn process_stereo(&mut self, left: &mut [Sample], right: &mut [Sample]) {
        debug_assert_eq!(left.len(), right.len(), "channel lengths differ");
        debug_assert!(self.prepared, "process called before prepare");
        if !self.prepared {
            return;
        }

        let len = left.len().min(right.len());
        let (left, right) = (&mut left[..len], &mut right[..len]);

        self.sync_order();

        self.input_gain.set_gain_db(self.params.get(ParamId::InputGain));
        self.input_gain.process_stereo(left, right);
        self.shared.meters.store_pre(block_rms(left), block_rms(right));

        let chunk_size = self.config.chunk_size.max(1);
        let mut start = 0;
        while start < len {
            let end = (start + chunk_size).min(len);

            self.smoothers.retarget(&self.params, end - start);
            self.left.update_dsp_from_params(&self.smoothers, &self.params);
            self.right.update_dsp_from_params(&self.smoothers, &self.params);

            self.left.process(&mut left[start..end], &self.working_order, &self.params);
            self.right.process(&mut right[start..end], &self.working_order, &self.params);

            start = end;
        }

        self.output_gain.set_gain_db(self.params.get(ParamId::OutputGain));
        self.output_gain.process_stereo(left, right);
        self.shared.meters.store_post(block_rms(left), block_rms(right));

        self.analyzer.push_block(left, right);
    }

    /// Process one mono block in place, using the left channel's state
    pub fn process_mono(&mut self, block: &mut [Sample]) {
        debug_assert!(self.prepared, "process called before prepare");
        if !self.prepared {
            return;
        }

        self.sync_order();

        self.input_gain.set_gain_db(self.params.get(ParamId::InputGain));
        self.input_gain.process_mono(block);
        let pre = block_rms(block);
        self.shared.meters.store_pre(pre, pre);

        let chunk_size = self.config.chunk_size.max(1);
        for chunk in block.chunks_mut(chunk_size) {
            self.smoothers.retarget(&self.params, chunk.len());
            self.left.update_dsp_from_params(&self.smoothers, &self.params);
            self.left.process(chunk, &self.working_order, &self.params);
        }

        self.output_gain.set_gain_db(self.params.get(ParamId::OutputGain));
        self.output_gain.process_mono(block);
        let post = block_rms(block);
        self.shared.meters.store_post(post, post);

        let block: &[Sample] = block;
        self.analyzer.push_block(block, block);
    }

    /// Clear all effect state and snap every smoother to the live values
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.smoothers.initialize(&self.params);
        self.snap_gains();
        self.shared.meters.clear();
    }

    /// Order the audio thread is currently using
    #[inline]
    pub fn current_order(&self) -> EffectOrder {
        self.working_order
    }

    #[inline]
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// True while any parameter ramp is in flight
    pub fn is_smoothing(&self) -> bool {
        self.smoothers.is_smoothing()
            || self.input_gain.is_smoothing()
            || self.output_gain.is_smoothing()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Coefficient rebuilds of the general filter, per channel
    pub fn coefficient_recomputations(&self) -> (u64, u64) {
        (
            self.left.coefficient_recomputations(),
            self.right.coefficient_recomputations(),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CONTROL SIDE
// ═══════════════════════════════════════════════════════════════════════════

/// Control-thread handle to a running chain
pub struct ChainController {
    params: Arc<ParamStore>,
    shared: Arc<SharedState>,
    order_tx: OrderSender<EffectOrder>,
    ack_rx: OrderReceiver<EffectOrder>,
    analyzer: AnalyzerReader,
    last_known_order: EffectOrder,
}

impl ChainController {
    /// Propose a new processing order. Takes effect at the next block.
    pub fn push_order(&mut self, order: EffectOrder) {
        self.order_tx.push(order);
        self.last_known_order = order;
    }

    /// Newest order the audio thread has acknowledged, if any arrived
    pub fn try_read_current_order(&mut self) -> Option<EffectOrder> {
        let order = self.ack_rx.drain_latest()?;
        self.last_known_order = order;
        Some(order)
    }

    /// Ask the audio thread to echo its working order at the next block
    pub fn request_current_order(&self) {
        self.shared.publish_requested.store(true, Ordering::Release);
    }

    /// Restore a persisted order. Malformed payloads fall back to identity.
    pub fn restore_order_payload(&mut self, payload: &[i64]) -> EffectOrder {
        let order = EffectOrder::from_payload_or_identity(payload);
        log::debug!("Restoring effect order: {order}");
        self.push_order(order);
        self.request_current_order();
        order
    }

    /// Payload of the last order pushed or acknowledged, for persistence
    pub fn order_payload(&self) -> [i64; EffectKind::COUNT] {
        self.last_known_order.to_payload()
    }

    pub fn last_known_order(&self) -> EffectOrder {
        self.last_known_order
    }

    /// Orders discarded because the audio thread had not drained them yet
    pub fn dropped_orders(&self) -> u64 {
        self.order_tx.dropped()
    }

    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    /// Parameters shown on one effect's panel
    pub fn handles_for_kind(&self, kind: EffectKind) -> Vec<ParamHandle<'_>> {
        self.params.handles_for_kind(kind)
    }

    pub fn meters(&self) -> MeterSnapshot {
        self.shared.meters.snapshot()
    }

    /// Drain post-chain samples for analysis; returns frames read
    pub fn read_analyzer(&mut self, left_out: &mut [f32], right_out: &mut [f32]) -> usize {
        self.analyzer.read(left_out, right_out)
    }

    pub fn analyzer_overflow(&self) -> u64 {
        self.analyzer.overflow_count()
    }
}
