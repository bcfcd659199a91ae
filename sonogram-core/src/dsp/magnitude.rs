//! Complex spectrum to a row of real magnitudes.

use realfft::num_complex::Complex;

use crate::config::MagnitudeScale;

/// Writes `|X[i]|` for the first `row.len()` bins of `spectrum` into `row`.
///
/// `row.len()` is half the block length, so the Nyquist bin and the
/// conjugate mirror above it are dropped. Any non-finite result (overflow to
/// infinity, or NaN) is clamped to 0.0 so min/max scaling downstream never
/// sees it. Returns the number of values that were clamped.
pub fn extract_magnitudes(spectrum: &[Complex<f64>], scale: MagnitudeScale, row: &mut [f32]) -> usize {
    let mut clamped = 0;
    for (out, c) in row.iter_mut().zip(spectrum.iter()) {
        let mag = (c.re * c.re + c.im * c.im).sqrt();
        let value = match scale {
            MagnitudeScale::Linear => mag,
            MagnitudeScale::Log10 => (1.0 + mag).log10(),
        } as f32;
        *out = if value.is_finite() {
            value
        } else {
            clamped += 1;
            0.0
        };
    }
    clamped
}
