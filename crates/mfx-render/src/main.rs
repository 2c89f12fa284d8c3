//! mfx-render: run a WAV file through the effect chain
//!
//! Usage:
//!   mfx-render in.wav out.wav
//!   mfx-render in.wav out.wav --order chorus,phase,overdrive,ladder,filter
//!   mfx-render in.wav out.wav --set overdrive_saturation=8 --set chorus_bypass=on
//!   mfx-render in.wav out.wav --config engine.json --block-size 512

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mfx_core::{EffectKind, EffectOrder, EngineConfig, OrderError, ParamId, ParamKind, ParamStore, Sample};
use mfx_engine::{ChainController, ChainScheduler};

#[derive(Parser)]
#[command(name = "mfx-render", about = "Render a WAV file through the reorderable effect chain")]
struct Cli {
    /// Input WAV file (mono or stereo)
    input: PathBuf,

    /// Output WAV file (32-bit float)
    output: PathBuf,

    /// Processing order, comma separated (phase, chorus, overdrive, ladder, filter)
    #[arg(short, long)]
    order: Option<String>,

    /// Parameter override as key=value, repeatable
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Engine config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Samples per processing block
    #[arg(short, long, default_value_t = 512)]
    block_size: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.block_size == 0 {
        bail!("--block-size must be at least 1");
    }

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let params = Arc::new(ParamStore::new());
    for assignment in &cli.set {
        let (id, value) = parse_assignment(assignment)?;
        params.set(id, value);
        log::debug!("{} = {}", id.spec().key, params.get(id));
    }

    let order = match &cli.order {
        Some(list) => parse_order(list)?,
        None => EffectOrder::identity(),
    };

    let audio = read_wav(&cli.input)?;
    log::info!(
        "Read {}: {} channel(s), {} Hz, {} frames",
        cli.input.display(),
        audio.channels.len(),
        audio.sample_rate,
        audio.frames()
    );

    let (mut scheduler, mut controller) = ChainScheduler::new(config, Arc::clone(&params))?;
    scheduler
        .prepare(audio.sample_rate as f64, cli.block_size)
        .context("Failed to prepare effect chain")?;
    controller.push_order(order);

    let audio = render(&mut scheduler, &controller, audio, cli.block_size);

    if let Some(acked) = controller.try_read_current_order() {
        log::info!("Rendered with order {acked}");
    }

    write_wav(&cli.output, &audio)?;
    log::info!("Wrote {}", cli.output.display());
    Ok(())
}

// ============ Argument Parsing ============

/// Parse `chorus,phase,...` into a full processing order
fn parse_order(list: &str) -> Result<EffectOrder> {
    let kinds = list
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| EffectKind::from_key(key).with_context(|| format!("Unknown effect '{key}'")))
        .collect::<Result<Vec<_>>>()?;

    let actual = kinds.len();
    let kinds: [EffectKind; EffectKind::COUNT] = kinds.try_into().map_err(|_| OrderError::WrongLength {
        expected: EffectKind::COUNT,
        actual,
    })?;

    Ok(EffectOrder::new(kinds)?)
}

/// Parse `key=value`; switches also accept on/off and true/false
fn parse_assignment(assignment: &str) -> Result<(ParamId, f64)> {
    let (key, value) = assignment
        .split_once('=')
        .with_context(|| format!("Expected key=value, got '{assignment}'"))?;
    let key = key.trim();
    let value = value.trim();

    let id = ParamId::from_key(key).with_context(|| format!("Unknown parameter '{key}'"))?;

    let parsed = match (id.spec().kind, value) {
        (ParamKind::Bool { .. }, "on" | "true") => 1.0,
        (ParamKind::Bool { .. }, "off" | "false") => 0.0,
        _ => value
            .parse::<f64>()
            .with_context(|| format!("Invalid value '{value}' for {key}"))?,
    };
    Ok((id, parsed))
}

// ============ WAV I/O ============

/// Deinterleaved audio
struct Audio {
    channels: Vec<Vec<Sample>>,
    sample_rate: u32,
}

impl Audio {
    fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }
}

fn read_wav(path: &Path) -> Result<Audio> {
    let reader = hound::WavReader::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let spec = reader.spec();
    let num_channels = spec.channels as usize;
    if !(1..=2).contains(&num_channels) {
        bail!("{} has {num_channels} channels; only mono and stereo are supported", path.display());
    }

    let interleaved: Vec<Sample> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as Sample;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as Sample / full_scale))
                .collect::<Result<_, _>>()
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(Sample::from))
            .collect::<Result<_, _>>(),
    }
    .with_context(|| format!("Failed to decode {}", path.display()))?;

    let mut channels = vec![Vec::with_capacity(interleaved.len() / num_channels); num_channels];
    for frame in interleaved.chunks_exact(num_channels) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    Ok(Audio {
        channels,
        sample_rate: spec.sample_rate,
    })
}

fn write_wav(path: &Path, audio: &Audio) -> Result<()> {
    let spec = hound::WavSpec {
        channels: audio.channels.len() as u16,
        sample_rate: audio.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer =
        hound::WavWriter::create(path, spec).with_context(|| format!("Failed to create {}", path.display()))?;
    for frame in 0..audio.frames() {
        for channel in &audio.channels {
            writer.write_sample(channel[frame] as f32)?;
        }
    }
    writer.finalize().with_context(|| format!("Failed to finish {}", path.display()))?;
    Ok(())
}

// ============ Rendering ============

/// Run the whole file through the chain, block by block
fn render(scheduler: &mut ChainScheduler, controller: &ChainController, mut audio: Audio, block_size: usize) -> Audio {
    let mut peak_pre = [f32::NEG_INFINITY; 2];
    let mut peak_post = [f32::NEG_INFINITY; 2];

    let mut track_meters = || {
        let meters = controller.meters();
        peak_pre[0] = peak_pre[0].max(meters.left_pre);
        peak_pre[1] = peak_pre[1].max(meters.right_pre);
        peak_post[0] = peak_post[0].max(meters.left_post);
        peak_post[1] = peak_post[1].max(meters.right_post);
    };

    match audio.channels.as_mut_slice() {
        [mono] => {
            for block in mono.chunks_mut(block_size) {
                scheduler.process_mono(block);
                track_meters();
            }
        }
        [left, right] => {
            for (l, r) in left.chunks_mut(block_size).zip(right.chunks_mut(block_size)) {
                scheduler.process_stereo(l, r);
                track_meters();
            }
        }
        _ => {}
    }

    let db = |rms: f32| mfx_engine::meters::meter_db(rms.max(0.0));
    log::info!(
        "Loudest block RMS in:  L {:.1} dB, R {:.1} dB",
        db(peak_pre[0]),
        db(peak_pre[1])
    );
    log::info!(
        "Loudest block RMS out: L {:.1} dB, R {:.1} dB",
        db(peak_post[0]),
        db(peak_post[1])
    );

    audio
}
