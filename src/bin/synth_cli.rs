use std::f64::consts::TAU;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use synth::{AppConfig, Engine, FakeEngine};

#[derive(Parser, Debug)]
#[command(
    name = "synth_cli",
    about = "Drive the synth output engine from the command line"
)]
struct Cli {
    /// JSON config file (defaults are used for anything it leaves out)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the configured log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a test signal on the default output device
    Tone {
        #[arg(long, default_value_t = 440.0)]
        freq: f64,
        /// Semitones from A4 (440 Hz); overrides --freq
        #[arg(long, allow_hyphen_values = true)]
        semitones: Option<i32>,
        #[arg(long, default_value_t = 0.5)]
        amp: f64,
        #[arg(long, default_value_t = 2.0)]
        seconds: f64,
        /// Override the configured sample rate
        #[arg(long)]
        sample_rate: Option<f64>,
        #[arg(long, value_enum, default_value_t = Waveform::Sine)]
        waveform: Waveform,
    },
    /// Run the hardware-free fake engine and print each tick
    Fake {
        #[arg(long)]
        ticks: Option<u32>,
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Check whether the default output device can carry the mono f32 stream
    Probe {
        #[arg(long)]
        sample_rate: Option<f64>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Waveform {
    Sine,
    Square,
    Triangle,
    Saw,
    Noise,
}

/// Frequency `semitones` away from A4 in equal temperament
fn pitch_from_a4(semitones: i32) -> f64 {
    const PITCH_STANDARD: f64 = 440.0;
    const TWELFTH_ROOT_OF_TWO: f64 = 1.059_463_094_359_295_3;

    PITCH_STANDARD * TWELFTH_ROOT_OF_TWO.powi(semitones)
}

/// Phase-accumulating oscillator; phase runs over 0..1
struct Oscillator {
    waveform: Waveform,
    phase: f64,
    increment: f64,
    rng: StdRng,
}

impl Oscillator {
    fn new(waveform: Waveform, freq: f64, sample_rate: f64) -> Self {
        Self {
            waveform,
            phase: 0.0,
            increment: freq / sample_rate,
            rng: StdRng::seed_from_u64(42),
        }
    }

    fn next_sample(&mut self) -> f64 {
        let p = self.phase;
        let out = match self.waveform {
            Waveform::Sine => (p * TAU).sin(),
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            Waveform::Saw => 2.0 * p - 1.0,
            Waveform::Noise => self.rng.gen_range(-1.0..1.0),
        };

        self.phase = (self.phase + self.increment).rem_euclid(1.0);
        out
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::try_load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    synth::init_logging(&config.logging.level);

    match cli.command {
        Commands::Tone {
            freq,
            semitones,
            amp,
            seconds,
            sample_rate,
            waveform,
        } => {
            if let Some(rate) = sample_rate {
                config.engine.sample_rate = rate;
            }
            let freq = semitones.map(pitch_from_a4).unwrap_or(freq);
            run_tone(&config, freq, amp, seconds, waveform)
        }
        Commands::Fake { ticks, interval_ms } => {
            if let Some(ticks) = ticks {
                config.fake.ticks = ticks;
            }
            if let Some(interval_ms) = interval_ms {
                config.fake.interval_ms = interval_ms;
            }
            run_fake(&config)
        }
        Commands::Probe { sample_rate } => {
            run_probe(sample_rate.unwrap_or(config.engine.sample_rate))
        }
    }
}

fn tone_callback(
    waveform: Waveform,
    freq: f64,
    amp: f64,
    sample_rate: f64,
) -> Box<dyn FnMut(&mut [f32]) + Send> {
    let mut osc = Oscillator::new(waveform, freq, sample_rate);
    Box::new(move |buf: &mut [f32]| {
        for sample in buf {
            *sample = (amp * osc.next_sample()) as f32;
        }
    })
}

fn run_tone(
    config: &AppConfig,
    freq: f64,
    amp: f64,
    seconds: f64,
    waveform: Waveform,
) -> Result<ExitCode> {
    let duration = Duration::try_from_secs_f64(seconds)
        .with_context(|| format!("invalid duration {seconds}"))?;
    let sample_rate = config.engine.sample_rate;

    let mut engine = Engine::with_config(
        &config.engine,
        tone_callback(waveform, freq, amp, sample_rate),
    )
    .context("opening output engine")?;

    let started = Instant::now();
    engine.start().context("starting output engine")?;
    thread::sleep(duration);
    engine.stop().context("stopping output engine")?;
    let elapsed = started.elapsed();

    let stats = engine.stats();
    let backend = engine.backend_name();
    engine.destroy();

    println!(
        "{}",
        json!({
            "backend": backend,
            "sample_rate": sample_rate,
            "freq": freq,
            "seconds": elapsed.as_secs_f64(),
            "callbacks": stats.callbacks,
            "frames": stats.frames,
            "last_frame_count": stats.last_frame_count,
        })
    );

    if stats.callbacks == 0 {
        eprintln!("Warning: the device never requested a buffer");
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::from(0))
}

fn run_fake(config: &AppConfig) -> Result<ExitCode> {
    let mut engine = FakeEngine::with_config(&config.fake, |count| println!("tick {count}"))
        .context("creating fake engine")?;

    engine.start()?;
    engine.stop()?;
    engine.destroy();

    Ok(ExitCode::from(0))
}

#[cfg(not(target_os = "android"))]
fn run_probe(sample_rate: f64) -> Result<ExitCode> {
    let format = synth::StreamFormat::mono_f32(sample_rate)?;
    let probe = synth::engine::probe_default_output(&format).context("probing output device")?;

    println!(
        "{}",
        json!({
            "host": probe.host,
            "device": probe.device,
            "sample_rate": format.sample_rate_hz(),
            "stream_channels": probe.stream_channels,
            "default_channels": probe.default_channels,
            "default_sample_rate": probe.default_sample_rate,
        })
    );

    Ok(if probe.stream_channels.is_some() {
        ExitCode::from(0)
    } else {
        ExitCode::from(2)
    })
}

#[cfg(target_os = "android")]
fn run_probe(_sample_rate: f64) -> Result<ExitCode> {
    anyhow::bail!("probe is only available on desktop hosts")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_cycle(waveform: Waveform) -> Vec<f64> {
        // 4 samples per cycle: phase 0, 0.25, 0.5, 0.75
        let mut osc = Oscillator::new(waveform, 1.0, 4.0);
        (0..5).map(|_| osc.next_sample()).collect()
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_sine_cycle() {
        assert_close(&one_cycle(Waveform::Sine), &[0.0, 1.0, 0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_square_cycle() {
        assert_close(&one_cycle(Waveform::Square), &[1.0, 1.0, -1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_triangle_cycle() {
        assert_close(&one_cycle(Waveform::Triangle), &[-1.0, 0.0, 1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_saw_cycle() {
        assert_close(&one_cycle(Waveform::Saw), &[-1.0, -0.5, 0.0, 0.5, -1.0]);
    }

    #[test]
    fn test_noise_is_bounded_and_seeded() {
        let mut a = Oscillator::new(Waveform::Noise, 440.0, 44_100.0);
        let mut b = Oscillator::new(Waveform::Noise, 440.0, 44_100.0);
        for _ in 0..1_000 {
            let sample = a.next_sample();
            assert!((-1.0..1.0).contains(&sample));
            assert_eq!(sample, b.next_sample());
        }
    }

    #[test]
    fn test_phase_wraps_above_nyquist() {
        let mut osc = Oscillator::new(Waveform::Saw, 3.0, 2.0);
        for _ in 0..10 {
            osc.next_sample();
            assert!((0.0..1.0).contains(&osc.phase));
        }
    }

    #[test]
    fn test_tone_callback_scales_by_amplitude() {
        let mut render = tone_callback(Waveform::Square, 1.0, 0.5, 4.0);
        let mut buf = [0.0f32; 4];
        render(&mut buf[..]);
        assert_eq!(buf, [0.5, 0.5, -0.5, -0.5]);
    }

    #[test]
    fn test_pitch_from_a4() {
        assert_eq!(pitch_from_a4(0), 440.0);
        assert!((pitch_from_a4(12) - 880.0).abs() < 1e-9);
        assert!((pitch_from_a4(-9) - 261.625_565_300_598_6).abs() < 1e-9);
    }
}
