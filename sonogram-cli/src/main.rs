mod audio;
mod export;
mod progress;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sonogram_core::{
    compute_spectrogram, BlockReader, DebugListener, MagnitudeScale, SpectrogramConfig,
    DEFAULT_BLOCK_LENGTH,
};

use crate::progress::ProgressListener;

/// Input used when no path is given.
const DEFAULT_INPUT: &str = "pulpfiction.wav";

#[derive(Parser)]
#[command(name = "sonogram", about = "Render a block-wise FFT spectrogram of an audio file")]
struct Cli {
    /// Input audio file (integer PCM WAV, FLAC, AIFF, or MP3/OGG Vorbis)
    #[arg(default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Output PNG path
    #[arg(short, long, default_value = "items.png")]
    output: PathBuf,

    /// Frames per FFT block (even). Half of it becomes the number of bins.
    #[arg(short, long, default_value_t = DEFAULT_BLOCK_LENGTH)]
    block_length: usize,

    /// Derive the block length from the lowest frequency to resolve, in Hz.
    /// Overrides --block-length.
    #[arg(long)]
    lowest_frequency: Option<f64>,

    /// Magnitude scale
    #[arg(short, long, default_value = "linear", value_parser = ["linear", "log10"])]
    scale: String,

    /// Skip writing the PNG
    #[arg(long)]
    no_png: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log every block instead of showing a progress bar
    #[arg(long)]
    debug: bool,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(if cli.debug { cli.verbose.max(1) } else { cli.verbose });

    let scale: MagnitudeScale = cli.scale.parse().map_err(anyhow::Error::msg)?;

    // 1. Open input
    log::info!("Reading audio file '{}'", cli.input.display());
    let reader = audio::open_reader(&cli.input)?;

    // 2. Fix the block length for the whole run
    let config = match cli.lowest_frequency {
        Some(hz) => SpectrogramConfig::for_lowest_frequency(reader.info().sample_rate, hz, scale),
        None => SpectrogramConfig::new(cli.block_length, scale),
    };

    // 3. Run the block loop
    let spectrogram = if cli.debug {
        compute_spectrogram(reader, &config, DebugListener)
    } else {
        compute_spectrogram(reader, &config, ProgressListener::new())
    }
    .with_context(|| format!("Failed to compute spectrogram of {}", cli.input.display()))?;

    log::info!(
        "{} rows x {} bins ({:.2} Hz per bin, {:.3} s per row, {} scale)",
        spectrogram.rows(),
        spectrogram.columns(),
        spectrogram.bin_frequency(1),
        spectrogram.row_time(1),
        spectrogram.scale(),
    );
    if let Some((min, max)) = spectrogram.min_max() {
        log::info!("min val: {min}");
        log::info!("max val: {max}");
    }

    // 4. Export
    if !cli.no_png {
        export::write_png(&spectrogram, &cli.output)?;
        log::info!("Saved PNG file {}", cli.output.display());
    }

    Ok(())
}
