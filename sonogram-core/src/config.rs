use std::fmt;
use std::str::FromStr;

use crate::{Result, SpectrogramError, DEFAULT_BLOCK_LENGTH};

/// Value scale written into the spectrogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MagnitudeScale {
    /// Raw, unnormalized magnitude.
    #[default]
    Linear,
    /// `log10(1 + magnitude)`.
    Log10,
}

impl fmt::Display for MagnitudeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MagnitudeScale::Linear => write!(f, "linear"),
            MagnitudeScale::Log10 => write!(f, "log10"),
        }
    }
}

impl FromStr for MagnitudeScale {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(MagnitudeScale::Linear),
            "log10" => Ok(MagnitudeScale::Log10),
            other => Err(format!("unknown scale '{other}', expected linear or log10")),
        }
    }
}

/// Parameters fixed for a whole pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpectrogramConfig {
    /// Frames per block; also the FFT length.
    pub block_length: usize,
    pub scale: MagnitudeScale,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            block_length: DEFAULT_BLOCK_LENGTH,
            scale: MagnitudeScale::Linear,
        }
    }
}

impl SpectrogramConfig {
    pub fn new(block_length: usize, scale: MagnitudeScale) -> Self {
        Self {
            block_length,
            scale,
        }
    }

    /// Picks the block length needed to resolve `lowest_hz` at `sample_rate`.
    ///
    /// A block must span at least one period of the lowest frequency, so half
    /// a block is `ceil(sample_rate / lowest_hz)` frames. 48 kHz and 20 Hz
    /// give the default of 4800.
    pub fn for_lowest_frequency(sample_rate: u32, lowest_hz: f64, scale: MagnitudeScale) -> Self {
        let half = if lowest_hz > 0.0 {
            (sample_rate as f64 / lowest_hz).ceil().max(1.0) as usize
        } else {
            DEFAULT_BLOCK_LENGTH / 2
        };
        Self::new(half * 2, scale)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_length < 2 || self.block_length % 2 != 0 {
            return Err(SpectrogramError::InvalidBlockLength(self.block_length));
        }
        Ok(())
    }

    /// Frequency bins kept per block.
    pub fn columns(&self) -> usize {
        self.block_length / 2
    }

    /// Rows needed to cover `total_frames`, counting a short trailing block.
    pub fn rows_for(&self, total_frames: u64) -> usize {
        total_frames.div_ceil(self.block_length as u64) as usize
    }
}
