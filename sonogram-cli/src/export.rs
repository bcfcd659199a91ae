use std::path::Path;

use anyhow::{bail, Context, Result};
use image::{GrayImage, ImageFormat};
use sonogram_core::Spectrogram;

/// Scale a spectrogram to 8-bit greyscale, one byte per cell, row-major.
///
/// Every value is multiplied by `255 / max`, so the loudest cell is white.
/// An all-zero (or empty) matrix stays black.
pub fn to_grayscale(spectrogram: &Spectrogram) -> Vec<u8> {
    let values = spectrogram.as_slice();
    let max = spectrogram.min_max().map(|(_, hi)| hi).unwrap_or(0.0);
    if max <= 0.0 {
        return vec![0; values.len()];
    }
    let factor = 255.0 / max;
    values
        .iter()
        .map(|&v| (v * factor).round().clamp(0.0, 255.0) as u8)
        .collect()
}

/// Write the spectrogram as a greyscale PNG: one pixel row per block, one
/// pixel column per frequency bin.
pub fn write_png(spectrogram: &Spectrogram, path: &Path) -> Result<()> {
    let width = spectrogram.columns() as u32;
    let height = spectrogram.rows() as u32;
    if width == 0 || height == 0 {
        bail!("spectrogram is empty ({height} x {width}), nothing to save");
    }

    let image = GrayImage::from_raw(width, height, to_grayscale(spectrogram))
        .context("pixel buffer does not match image dimensions")?;
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Failed to save PNG file: {}", path.display()))?;
    Ok(())
}
