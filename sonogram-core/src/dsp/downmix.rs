//! Channel averaging into a fixed-length mono frame.

use crate::{Result, SpectrogramError};

/// Averages the channels of an interleaved block into `frame`.
///
/// `frame.len()` is the block length. Frames past the end of `samples` (a
/// short final block) are written as silence so the transform always sees a
/// full-length input. Returns the number of frames taken from `samples`.
pub fn downmix_into(samples: &[i16], channels: u16, frame: &mut [f64]) -> Result<usize> {
    if channels == 0 {
        return Err(SpectrogramError::MalformedChannelCount(channels));
    }
    let ch = channels as usize;
    let n = (samples.len() / ch).min(frame.len());
    let divisor = ch as f64;

    for (out, chunk) in frame[..n].iter_mut().zip(samples.chunks_exact(ch)) {
        let sum: f64 = chunk.iter().map(|&s| s as f64).sum();
        *out = sum / divisor;
    }
    frame[n..].fill(0.0);

    Ok(n)
}
