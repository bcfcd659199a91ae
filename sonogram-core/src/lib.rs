//! Streaming block-wise STFT spectrograms.
//!
//! A [`BlockReader`] hands out fixed-size blocks of interleaved integer
//! samples. Each block is averaged down to mono, run through one forward FFT
//! and reduced to the magnitudes of the lower half of its spectrum, which
//! become one row of a [`Spectrogram`].

pub mod config;
pub mod dsp;
pub mod error;
pub mod listener;
pub mod reader;

pub use config::{MagnitudeScale, SpectrogramConfig};
pub use dsp::spectrogram::{compute_spectrogram, Spectrogram, SpectrogramAccumulator};
pub use error::{Result, SpectrogramError};
pub use listener::{BlockEvent, BlockListener, DebugListener, NoOpListener, RecordingListener};
pub use reader::{BlockReader, MemoryReader, SampleEncoding, StreamInfo};

/// Frames per block: 1/20 s at 48 kHz, times two.
///
/// 20 Hz is the bottom of human hearing; a block has to span a full period
/// of it, which at 48 kHz is 2400 frames. Only half of the FFT output is
/// kept, so the block itself is twice that.
pub const DEFAULT_BLOCK_LENGTH: usize = 4800;
