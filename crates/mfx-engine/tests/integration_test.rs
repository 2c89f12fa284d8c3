//! End-to-End Chain Integration Tests
//!
//! Drives a `ChainScheduler` from a `ChainController` the way a host and an
//! editor would.
//! Verifies:
//! - Latest-wins order handoff and acknowledgement
//! - Orders are always full permutations
//! - Bit-identical output for identical input, order and settled parameters
//! - Smoothers land exactly on target after the ramp
//! - Silence stays silent through any order and bypass combination
//! - General filter coefficients are rebuilt only when their inputs change
//! - Cross-thread operation with a live control thread

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use approx::assert_relative_eq;
use mfx_core::EffectKind::*;
use mfx_core::{EffectKind, EffectOrder, EngineConfig, ParamId, ParamStore};
use mfx_engine::{ChainController, ChainScheduler, MonoChannel, ParamSmootherBank, SmoothedParam};

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK_SIZE: usize = 256;
const CHUNK_SIZE: usize = 64;

fn engine_with(params: Arc<ParamStore>, config: EngineConfig) -> (ChainScheduler, ChainController) {
    let (mut scheduler, controller) = ChainScheduler::new(config, params).unwrap();
    scheduler.prepare(SAMPLE_RATE, BLOCK_SIZE).unwrap();
    (scheduler, controller)
}

fn engine() -> (ChainScheduler, ChainController) {
    engine_with(Arc::new(ParamStore::new()), EngineConfig::default())
}

/// Generate test sine wave
fn generate_sine(samples: usize, freq: f64) -> Vec<f64> {
    (0..samples)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            0.5 * (2.0 * std::f64::consts::PI * freq * t).sin()
        })
        .collect()
}

/// Non-trivial settings for every effect
fn colourful_params() -> Arc<ParamStore> {
    let params = ParamStore::new();
    params.set(ParamId::PhaserMixPercent, 0.6);
    params.set(ParamId::PhaserDepthPercent, 0.8);
    params.set(ParamId::ChorusMixPercent, 0.4);
    params.set(ParamId::ChorusFeedbackPercent, 0.3);
    params.set(ParamId::OverdriveSaturation, 6.0);
    params.set_index(ParamId::LadderFilterMode, 3);
    params.set(ParamId::LadderFilterCutoffHz, 3000.0);
    params.set(ParamId::LadderFilterResonance, 0.4);
    params.set(ParamId::GeneralFilterGain, 9.0);
    params.set(ParamId::InputGain, -3.0);
    params.set(ParamId::OutputGain, 2.0);
    Arc::new(params)
}

fn run_blocks(scheduler: &mut ChainScheduler, input_l: &[f64], input_r: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut left = input_l.to_vec();
    let mut right = input_r.to_vec();
    for (l, r) in left.chunks_mut(BLOCK_SIZE).zip(right.chunks_mut(BLOCK_SIZE)) {
        scheduler.process_stereo(l, r);
    }
    (left, right)
}

fn is_permutation(order: &EffectOrder) -> bool {
    let mut seen = [false; EffectKind::COUNT];
    for kind in order.iter() {
        if std::mem::replace(&mut seen[kind.index()], true) {
            return false;
        }
    }
    seen.iter().all(|&s| s)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORDER HANDOFF
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_latest_order_wins() {
    let (mut scheduler, mut controller) = engine();
    let o1 = EffectOrder::new([Chorus, Phase, Overdrive, LadderFilter, GeneralFilter]).unwrap();
    let o2 = EffectOrder::new([GeneralFilter, Overdrive, Phase, Chorus, LadderFilter]).unwrap();

    controller.push_order(o1);
    controller.push_order(o2);

    let mut left = vec![0.0; BLOCK_SIZE];
    let mut right = vec![0.0; BLOCK_SIZE];
    scheduler.process_stereo(&mut left, &mut right);

    assert_eq!(scheduler.current_order(), o2);
    // O1 is never observed
    assert_eq!(controller.try_read_current_order(), Some(o2));
    assert_eq!(controller.try_read_current_order(), None);
}

#[test]
fn test_more_orders_than_capacity() {
    let config = EngineConfig {
        order_channel_capacity: 2,
        ..EngineConfig::default()
    };
    let (mut scheduler, mut controller) = engine_with(Arc::new(ParamStore::new()), config);

    let mut order = EffectOrder::identity();
    for step in 0..20 {
        order = order.with_swapped(step % EffectKind::COUNT, (step + 2) % EffectKind::COUNT);
        controller.push_order(order);
    }
    assert!(controller.dropped_orders() >= 18);

    let mut block = vec![0.0; BLOCK_SIZE];
    scheduler.process_mono(&mut block);
    assert_eq!(scheduler.current_order(), order);
    assert_eq!(controller.try_read_current_order(), Some(order));
}

#[test]
fn test_working_order_kept_without_updates() {
    let (mut scheduler, mut controller) = engine();
    let order = EffectOrder::identity().with_moved(GeneralFilter, 0);
    controller.push_order(order);

    let mut block = vec![0.0; BLOCK_SIZE];
    for _ in 0..50 {
        scheduler.process_mono(&mut block);
        assert_eq!(scheduler.current_order(), order);
    }
}

#[test]
fn test_request_resyncs_editor() {
    let (mut scheduler, mut controller) = engine();
    let order = EffectOrder::identity().with_swapped(1, 3);
    controller.push_order(order);

    let mut block = vec![0.0; BLOCK_SIZE];
    scheduler.process_mono(&mut block);
    assert_eq!(controller.try_read_current_order(), Some(order));

    // A freshly opened editor asks for the order again
    controller.request_current_order();
    assert_eq!(controller.try_read_current_order(), None);
    scheduler.process_mono(&mut block);
    assert_eq!(controller.try_read_current_order(), Some(order));
}

#[test]
fn test_restore_payloads() {
    let (mut scheduler, mut controller) = engine();
    let saved = [3, 1, 4, 0, 2];
    let restored = controller.restore_order_payload(&saved);
    assert_eq!(restored.to_payload(), saved);

    let mut block = vec![0.0; BLOCK_SIZE];
    scheduler.process_mono(&mut block);
    assert_eq!(scheduler.current_order(), restored);

    // Wrong length falls back to identity
    let fallback = controller.restore_order_payload(&[3, 1, 4]);
    assert_eq!(fallback, EffectOrder::identity());
    scheduler.process_mono(&mut block);
    assert_eq!(scheduler.current_order(), EffectOrder::identity());
    assert_eq!(controller.try_read_current_order(), Some(EffectOrder::identity()));
    assert_eq!(controller.order_payload(), [0, 1, 2, 3, 4]);
}

#[test]
fn test_orders_stay_permutations() {
    let (mut scheduler, mut controller) = engine();
    let mut order = EffectOrder::identity();
    let mut block = vec![0.0; 32];

    for step in 0..100usize {
        order = if step % 3 == 0 {
            order.with_moved(EffectKind::ALL[step % EffectKind::COUNT], (step * 7) % EffectKind::COUNT)
        } else {
            order.with_swapped(step % EffectKind::COUNT, (step / 3) % EffectKind::COUNT)
        };
        controller.push_order(order);
        scheduler.process_mono(&mut block);

        assert!(is_permutation(&scheduler.current_order()));
        let acked = controller.try_read_current_order().unwrap();
        assert!(is_permutation(&acked));
        assert_eq!(acked, order);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DETERMINISM
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_identical_runs_are_bit_identical() {
    let params = colourful_params();
    let input_l = generate_sine(BLOCK_SIZE * 8, 220.0);
    let input_r = generate_sine(BLOCK_SIZE * 8, 330.0);
    let order = EffectOrder::new([LadderFilter, Chorus, GeneralFilter, Overdrive, Phase]).unwrap();

    let (mut a, mut ctrl_a) = engine_with(Arc::clone(&params), EngineConfig::default());
    let (mut b, mut ctrl_b) = engine_with(Arc::clone(&params), EngineConfig::default());
    ctrl_a.push_order(order);
    ctrl_b.push_order(order);

    let out_a = run_blocks(&mut a, &input_l, &input_r);
    let out_b = run_blocks(&mut b, &input_l, &input_r);
    assert_eq!(out_a, out_b);
}

#[test]
fn test_reset_scheduler_repeats_output() {
    let params = colourful_params();
    let input_l = generate_sine(BLOCK_SIZE * 4, 440.0);
    let input_r = generate_sine(BLOCK_SIZE * 4, 550.0);

    let (mut scheduler, _controller) = engine_with(params, EngineConfig::default());
    assert!(!scheduler.is_smoothing());

    let first = run_blocks(&mut scheduler, &input_l, &input_r);
    scheduler.reset();
    let second = run_blocks(&mut scheduler, &input_l, &input_r);

    assert_eq!(first, second);
    assert!(first.0.iter().chain(&first.1).all(|x| x.is_finite()));
}

#[test]
fn test_order_changes_the_sound() {
    let params = colourful_params();
    let input = generate_sine(BLOCK_SIZE * 4, 180.0);

    let (mut a, _) = engine_with(Arc::clone(&params), EngineConfig::default());
    let (mut b, mut ctrl_b) = engine_with(Arc::clone(&params), EngineConfig::default());
    ctrl_b.push_order(EffectOrder::identity().with_swapped(2, 3));

    let out_a = run_blocks(&mut a, &input, &input);
    let out_b = run_blocks(&mut b, &input, &input);
    assert_ne!(out_a.0, out_b.0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// SMOOTHING
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_smoothers_converge_after_ramp() {
    let ramp_seconds = 0.01;
    let params = ParamStore::new();
    let mut bank = ParamSmootherBank::new();
    bank.reset(SAMPLE_RATE, ramp_seconds);
    bank.initialize(&params);

    params.set(ParamId::LadderFilterCutoffHz, 500.0);
    params.set(ParamId::ChorusMixPercent, 0.9);

    let total = (ramp_seconds * SAMPLE_RATE).ceil() as usize;
    let mut advanced = 0;
    while advanced < total {
        let chunk = CHUNK_SIZE.min(total - advanced);
        bank.retarget(&params, chunk);
        advanced += chunk;
    }

    assert_eq!(bank.current(SmoothedParam::LadderCutoff), 500.0);
    assert_eq!(bank.current(SmoothedParam::ChorusMix), 0.9);
    assert!(!bank.is_smoothing());
}

#[test]
fn test_parameter_change_ramps_across_blocks() {
    let params = Arc::new(ParamStore::new());
    let (mut scheduler, _controller) = engine_with(Arc::clone(&params), EngineConfig::default());

    params.set(ParamId::GeneralFilterGain, 12.0);
    let mut block = vec![0.0; BLOCK_SIZE];
    scheduler.process_mono(&mut block);
    assert!(scheduler.is_smoothing());

    // 50 ms at 48 kHz is 2400 samples, under 10 blocks of 256
    for _ in 0..9 {
        scheduler.process_mono(&mut block);
    }
    assert!(!scheduler.is_smoothing());
}

#[test]
fn test_gain_ramp_has_no_step() {
    let params = Arc::new(ParamStore::new());
    for kind in EffectKind::ALL {
        params.set_bool(ParamId::bypass_for(kind), true);
    }
    let (mut scheduler, _controller) = engine_with(Arc::clone(&params), EngineConfig::default());

    params.set(ParamId::OutputGain, 12.0);
    let mut left = vec![1.0; BLOCK_SIZE];
    let mut right = vec![1.0; BLOCK_SIZE];
    scheduler.process_stereo(&mut left, &mut right);

    let max_step = left.windows(2).map(|w| (w[1] - w[0]).abs()).fold(0.0, f64::max);
    assert!(left[0] > 1.0 && left[0] < 1.01);
    assert!(max_step < 0.01);
}

// ═══════════════════════════════════════════════════════════════════════════════
// BYPASS & SILENCE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_reordered_chain_on_silence_is_silent() {
    let (mut scheduler, mut controller) = engine_with(colourful_params(), EngineConfig::default());
    controller.push_order(EffectOrder::new([Chorus, Phase, Overdrive, LadderFilter, GeneralFilter]).unwrap());

    let silence = vec![0.0; BLOCK_SIZE * 4];
    let (left, right) = run_blocks(&mut scheduler, &silence, &silence);
    assert!(left.iter().chain(&right).all(|&x| x == 0.0));

    let meters = controller.meters();
    assert_eq!(meters.left_post, 0.0);
    assert_eq!(meters.right_post_db(), mfx_core::METER_FLOOR_DB);
}

#[test]
fn test_every_bypass_combination_on_silence() {
    let params = colourful_params();
    let (mut scheduler, _controller) = engine_with(Arc::clone(&params), EngineConfig::default());
    let silence = vec![0.0; BLOCK_SIZE];

    for mask in 0u32..(1 << EffectKind::COUNT) {
        for kind in EffectKind::ALL {
            params.set_bool(ParamId::bypass_for(kind), mask & (1 << kind.index()) != 0);
        }
        let (left, right) = run_blocks(&mut scheduler, &silence, &silence);
        assert!(left.iter().chain(&right).all(|&x| x == 0.0), "mask {mask:05b}");
    }
}

#[test]
fn test_fully_bypassed_chain_only_applies_gain() {
    let params = Arc::new(ParamStore::new());
    for kind in EffectKind::ALL {
        params.set_bool(ParamId::bypass_for(kind), true);
    }
    let (mut scheduler, _controller) = engine_with(Arc::clone(&params), EngineConfig::default());

    let input = generate_sine(BLOCK_SIZE * 2, 1000.0);
    let (left, right) = run_blocks(&mut scheduler, &input, &input);
    assert_eq!(left, input);
    assert_eq!(right, input);
}

#[test]
fn test_bypass_toggle_keeps_effect_state() {
    let chorus_only = ParamStore::new();
    chorus_only.set(ParamId::ChorusMixPercent, 0.5);
    chorus_only.set(ParamId::ChorusDepthPercent, 0.7);
    chorus_only.set(ParamId::ChorusFeedbackPercent, 0.4);
    for kind in EffectKind::ALL {
        chorus_only.set_bool(ParamId::bypass_for(kind), kind != Chorus);
    }
    let all_bypassed = ParamStore::new();
    for id in ParamId::ALL {
        all_bypassed.set(id, chorus_only.get(id));
    }
    all_bypassed.set_bool(ParamId::ChorusBypass, true);

    let spec = mfx_dsp::ProcessSpec::mono(SAMPLE_RATE, BLOCK_SIZE);
    let mut bank = ParamSmootherBank::new();
    bank.reset(SAMPLE_RATE, 0.05);
    bank.initialize(&chorus_only);

    let mut steady = MonoChannel::new();
    let mut toggled = MonoChannel::new();
    steady.prepare(&spec).unwrap();
    toggled.prepare(&spec).unwrap();
    steady.update_dsp_from_params(&bank, &chorus_only);
    toggled.update_dsp_from_params(&bank, &chorus_only);

    let order = EffectOrder::identity();
    let first = generate_sine(BLOCK_SIZE, 300.0);
    let second = generate_sine(BLOCK_SIZE, 450.0);

    let mut a = first.clone();
    let mut b = first.clone();
    steady.process(&mut a, &order, &chorus_only);
    toggled.process(&mut b, &order, &chorus_only);
    assert_eq!(a, b);

    // A bypassed block passes through untouched and leaves the delay line alone
    let mut passthrough = vec![0.25; BLOCK_SIZE];
    toggled.process(&mut passthrough, &order, &all_bypassed);
    assert!(passthrough.iter().all(|&x| x == 0.25));

    let mut a = second.clone();
    let mut b = second;
    steady.process(&mut a, &order, &chorus_only);
    toggled.process(&mut b, &order, &chorus_only);
    assert_eq!(a, b);
}

// ═══════════════════════════════════════════════════════════════════════════════
// COEFFICIENT CACHE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_filter_coefficients_built_once_for_steady_settings() {
    let params = Arc::new(ParamStore::new());
    let config = EngineConfig::default().with_chunk_size(CHUNK_SIZE);
    let (mut scheduler, _controller) = engine_with(Arc::clone(&params), config);

    // Two chunks with identical settings
    let mut block = vec![0.1; CHUNK_SIZE * 2];
    scheduler.process_mono(&mut block);
    assert_eq!(scheduler.coefficient_recomputations().0, 1);

    // Many more blocks, still nothing new
    for _ in 0..10 {
        scheduler.process_mono(&mut block);
    }
    assert_eq!(scheduler.coefficient_recomputations().0, 1);

    // A mode switch is not smoothed: exactly one rebuild
    params.set_index(ParamId::GeneralFilterMode, 1);
    scheduler.process_mono(&mut block);
    scheduler.process_mono(&mut block);
    assert_eq!(scheduler.coefficient_recomputations().0, 2);
}

#[test]
fn test_smoothed_frequency_rebuilds_per_chunk_until_settled() {
    let params = Arc::new(ParamStore::new());
    let config = EngineConfig::default().with_chunk_size(CHUNK_SIZE).with_ramp_seconds(0.01);
    let (mut scheduler, _controller) = engine_with(Arc::clone(&params), config);

    let mut block = vec![0.0; BLOCK_SIZE];
    scheduler.process_stereo(&mut block.clone(), &mut block);
    let settled = scheduler.coefficient_recomputations();
    assert_eq!(settled, (1, 1));

    params.set(ParamId::GeneralFilterFreqHz, 2000.0);
    // 480-sample ramp: 8 chunks of 64 cover it
    for _ in 0..4 {
        let mut left = vec![0.0; BLOCK_SIZE];
        scheduler.process_stereo(&mut left, &mut block);
    }
    let (left, right) = scheduler.coefficient_recomputations();
    assert_eq!(left, right);
    assert_eq!(left, 1 + 8);
}

// ═══════════════════════════════════════════════════════════════════════════════
// METERS & ANALYZER
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_meters_report_input_gain() {
    let params = Arc::new(ParamStore::new());
    params.set(ParamId::InputGain, -6.0);
    let (mut scheduler, controller) = engine_with(Arc::clone(&params), EngineConfig::default());

    let mut left = vec![1.0; BLOCK_SIZE];
    let mut right = vec![0.5; BLOCK_SIZE];
    scheduler.process_stereo(&mut left, &mut right);

    let meters = controller.meters();
    assert_relative_eq!(meters.left_pre_db(), -6.0, epsilon = 1e-4);
    assert_relative_eq!(meters.right_pre_db(), -12.0206, epsilon = 1e-3);
}

#[test]
fn test_analyzer_sees_processed_audio() {
    let params = Arc::new(ParamStore::new());
    for kind in EffectKind::ALL {
        params.set_bool(ParamId::bypass_for(kind), true);
    }
    let config = EngineConfig::default().with_analyzer_capacity(BLOCK_SIZE);
    let (mut scheduler, mut controller) = engine_with(params, config);

    let input = generate_sine(BLOCK_SIZE, 750.0);
    run_blocks(&mut scheduler, &input, &input);

    let mut left = vec![0.0f32; BLOCK_SIZE];
    let mut right = vec![0.0f32; BLOCK_SIZE];
    assert_eq!(controller.read_analyzer(&mut left, &mut right), BLOCK_SIZE);
    assert_eq!(left[10], input[10] as f32);
    assert_eq!(right[10], input[10] as f32);

    // A second block with nobody reading fills the ring; a third overflows
    run_blocks(&mut scheduler, &input, &input);
    run_blocks(&mut scheduler, &input, &input);
    assert_eq!(controller.analyzer_overflow(), BLOCK_SIZE as u64);
}

// ═══════════════════════════════════════════════════════════════════════════════
// THREADING
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_control_thread_reorders_while_audio_runs() {
    let params = colourful_params();
    let (mut scheduler, mut controller) = engine_with(Arc::clone(&params), EngineConfig::default());
    let running = Arc::new(AtomicBool::new(true));

    let audio_running = Arc::clone(&running);
    let audio = std::thread::spawn(move || {
        let input = generate_sine(BLOCK_SIZE, 200.0);
        let mut blocks = 0usize;
        while audio_running.load(Ordering::Acquire) || blocks < 10 {
            let mut left = input.clone();
            let mut right = input.clone();
            scheduler.process_stereo(&mut left, &mut right);
            assert!(left.iter().chain(&right).all(|x| x.is_finite()));
            assert!(is_permutation(&scheduler.current_order()));
            blocks += 1;
        }
        // Drain whatever the control thread pushed last
        let mut left = input.clone();
        let mut right = input;
        scheduler.process_stereo(&mut left, &mut right);
        scheduler
    });

    let mut order = EffectOrder::identity();
    for step in 0..500usize {
        order = order.with_swapped(step % EffectKind::COUNT, (step * 3 + 1) % EffectKind::COUNT);
        controller.push_order(order);
        params.set(ParamId::PhaserRateHz, 0.1 + (step % 10) as f64 * 0.1);
        if let Some(acked) = controller.try_read_current_order() {
            assert!(is_permutation(&acked));
        }
    }
    running.store(false, Ordering::Release);

    let scheduler = audio.join().unwrap();
    assert_eq!(scheduler.current_order(), order);

    let mut last = None;
    while let Some(acked) = controller.try_read_current_order() {
        last = Some(acked);
    }
    assert_eq!(last.unwrap_or(controller.last_known_order()), order);
}
