use thiserror::Error;

use crate::reader::SampleEncoding;

/// Top-level error type for the sonogram-core public API.
#[derive(Debug, Error)]
pub enum SpectrogramError {
    /// The input stream could not be opened.
    #[error("cannot open input {path}: {reason}")]
    UnopenableInput { path: String, reason: String },

    /// Floating-point input; only fixed-point PCM is accepted.
    #[error("unsupported sample encoding {0}: floating-point input cannot be processed")]
    UnsupportedEncoding(SampleEncoding),

    /// The stream reports zero channels.
    #[error("malformed channel count: {0}")]
    MalformedChannelCount(u16),

    /// Block length is odd or smaller than 2.
    #[error("invalid block length {0}: must be even and at least 2")]
    InvalidBlockLength(usize),

    /// The accumulator was handed more blocks than the matrix has rows.
    #[error("internal error: row {row} is past the end of a {rows}-row spectrogram")]
    InternalRowOverflow { row: usize, rows: usize },

    /// I/O or decode failure from a block reader.
    #[error("read error: {0}")]
    Read(String),

    /// FFT failure.
    #[error("DSP error: {0}")]
    Dsp(String),
}

impl From<std::io::Error> for SpectrogramError {
    fn from(e: std::io::Error) -> Self {
        SpectrogramError::Read(e.to_string())
    }
}

/// Convenience alias so callers can write `Result<T>` instead of `Result<T, SpectrogramError>`.
pub type Result<T> = std::result::Result<T, SpectrogramError>;
