//! End-to-end tests for the block loop: reader → downmix → FFT → magnitudes
//! → matrix, driven through the public API only.

use std::f64::consts::PI;

use sonogram_core::{
    compute_spectrogram, BlockEvent, MagnitudeScale, MemoryReader, NoOpListener, RecordingListener,
    SampleEncoding, SpectrogramConfig, SpectrogramError,
};

const SAMPLE_RATE: u32 = 8000;

/// Mono cosine at exactly bin `k` of an `n`-point block, `frames` long.
fn cosine_at_bin(k: usize, n: usize, frames: usize, amplitude: f64) -> Vec<i16> {
    (0..frames)
        .map(|i| (amplitude * (2.0 * PI * k as f64 * i as f64 / n as f64).cos()).round() as i16)
        .collect()
}

/// Deterministic full-range pseudo-noise.
fn noise(len: usize, seed: u32) -> Vec<i16> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 16) as i16
        })
        .collect()
}

/// Naive DFT magnitude of bin `k`.
fn dft_magnitude(frame: &[f64], k: usize) -> f64 {
    let n = frame.len() as f64;
    let (re, im) = frame.iter().enumerate().fold((0.0, 0.0), |(re, im), (i, &x)| {
        let phase = -2.0 * PI * k as f64 * i as f64 / n;
        (re + x * phase.cos(), im + x * phase.sin())
    });
    (re * re + im * im).sqrt()
}

fn linear(block_length: usize) -> SpectrogramConfig {
    SpectrogramConfig::new(block_length, MagnitudeScale::Linear)
}

#[test]
fn row_count_for_5000_frames_of_256() {
    let reader = MemoryReader::new(noise(5000, 1), 1, SAMPLE_RATE);
    let matrix = compute_spectrogram(reader, &linear(256), NoOpListener).unwrap();
    assert_eq!(matrix.rows(), 20);
    assert_eq!(matrix.rows_written(), 20);
    assert_eq!(matrix.columns(), 128);
    assert_eq!(matrix.as_slice().len(), 20 * 128);
}

#[test]
fn silence_gives_all_zero_rows() {
    let reader = MemoryReader::new(vec![0; 2 * 64 * 5], 2, SAMPLE_RATE);
    let matrix = compute_spectrogram(reader, &linear(64), NoOpListener).unwrap();
    assert_eq!(matrix.rows(), 5);
    assert!(matrix.as_slice().iter().all(|&v| v == 0.0));
}

#[test]
fn opposite_channels_cancel_in_downmix() {
    let left = cosine_at_bin(3, 64, 64, 8000.0);
    let interleaved: Vec<i16> = left.iter().flat_map(|&s| [s, -s]).collect();
    let reader = MemoryReader::new(interleaved, 2, SAMPLE_RATE);
    let matrix = compute_spectrogram(reader, &linear(64), NoOpListener).unwrap();
    assert!(matrix.as_slice().iter().all(|&v| v == 0.0));
}

#[test]
fn sinusoid_peaks_at_its_bin() {
    let n = 256;
    for k in [0, 1, 7, 32, 100, n / 2 - 1] {
        let reader = MemoryReader::new(cosine_at_bin(k, n, n, 10_000.0), 1, SAMPLE_RATE);
        let matrix = compute_spectrogram(reader, &linear(n), NoOpListener).unwrap();
        let row = matrix.row(0).unwrap();
        let (peak, _) = row
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert_eq!(peak, k, "expected peak at bin {k}, got {peak}");

        let expected = if k == 0 { 10_000.0 * n as f64 } else { 10_000.0 * n as f64 / 2.0 };
        let got = row[k] as f64;
        assert!(
            (got - expected).abs() / expected < 1e-3,
            "bin {k}: magnitude {got}, expected ~{expected}"
        );
    }
}

#[test]
fn stereo_sinusoid_peaks_at_its_bin() {
    let n = 128;
    let k = 9;
    let mono = cosine_at_bin(k, n, n * 2, 12_000.0);
    let interleaved: Vec<i16> = mono.iter().flat_map(|&s| [s, s, s]).collect();
    let reader = MemoryReader::new(interleaved, 3, SAMPLE_RATE);
    let matrix = compute_spectrogram(reader, &linear(n), NoOpListener).unwrap();
    assert_eq!(matrix.rows(), 2);
    for r in 0..2 {
        let row = matrix.row(r).unwrap();
        let peak = row
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        assert_eq!(peak, k);
    }
    assert!((matrix.bin_frequency(k) - 562.5).abs() < 1e-9);
}

#[test]
fn short_final_block_is_zero_padded() {
    let n = 64;
    let samples = noise(3 * n + 10, 7);
    let tail: Vec<f64> = samples[3 * n..]
        .iter()
        .map(|&s| s as f64)
        .chain(std::iter::repeat(0.0))
        .take(n)
        .collect();
    assert_eq!(tail.len(), n);

    let mut listener = RecordingListener::default();
    let reader = MemoryReader::new(samples, 1, SAMPLE_RATE);
    let matrix = compute_spectrogram(reader, &linear(n), &mut listener).unwrap();
    assert_eq!(matrix.rows(), 4);
    assert_eq!(matrix.rows_written(), 4);
    assert!(listener
        .events
        .contains(&BlockEvent::ShortBlock { frames: 10, full_blocks: 3 }));

    let row = matrix.row(3).unwrap();
    for (k, &got) in row.iter().enumerate() {
        let expected = dft_magnitude(&tail, k);
        assert!(
            (got as f64 - expected).abs() <= 1e-3 * expected.max(1.0),
            "bin {k}: {got} vs {expected}"
        );
    }
}

#[test]
fn runs_are_bit_identical() {
    let samples = noise(2 * 1000, 42);
    let config = SpectrogramConfig::new(96, MagnitudeScale::Log10);
    let a = compute_spectrogram(MemoryReader::new(samples.clone(), 2, SAMPLE_RATE), &config, NoOpListener)
        .unwrap();
    let b = compute_spectrogram(MemoryReader::new(samples, 2, SAMPLE_RATE), &config, NoOpListener)
        .unwrap();
    assert_eq!(a.rows(), 11);
    assert_eq!(a.as_slice(), b.as_slice());
}

#[test]
fn full_scale_input_stays_finite() {
    let n = 512;
    let mut samples = noise(n * 4, 3);
    samples.extend(std::iter::repeat(i16::MAX).take(n));
    samples.extend(std::iter::repeat(i16::MIN).take(n));
    for scale in [MagnitudeScale::Linear, MagnitudeScale::Log10] {
        let reader = MemoryReader::new(samples.clone(), 1, SAMPLE_RATE);
        let config = SpectrogramConfig::new(n, scale);
        let matrix = compute_spectrogram(reader, &config, NoOpListener).unwrap();
        assert!(matrix.as_slice().iter().all(|v| v.is_finite() && *v >= 0.0));
    }
}

#[test]
fn log_scale_is_log10_of_one_plus_linear() {
    let samples = noise(300, 11);
    let lin = compute_spectrogram(MemoryReader::new(samples.clone(), 1, SAMPLE_RATE), &linear(32), NoOpListener)
        .unwrap();
    let log = compute_spectrogram(
        MemoryReader::new(samples, 1, SAMPLE_RATE),
        &SpectrogramConfig::new(32, MagnitudeScale::Log10),
        NoOpListener,
    )
    .unwrap();
    assert_eq!(log.scale(), MagnitudeScale::Log10);
    for (&l, &g) in lin.as_slice().iter().zip(log.as_slice()) {
        let expected = (1.0 + l as f64).log10();
        assert!((g as f64 - expected).abs() < 1e-4, "{g} vs {expected}");
    }
}

#[test]
fn float_input_aborts_before_any_row() {
    for encoding in [SampleEncoding::Float32, SampleEncoding::Float64] {
        let reader = MemoryReader::new(noise(1024, 5), 1, SAMPLE_RATE).with_encoding(encoding);
        let mut listener = RecordingListener::default();
        let err = compute_spectrogram(reader, &linear(64), &mut listener).unwrap_err();
        assert!(matches!(err, SpectrogramError::UnsupportedEncoding(e) if e == encoding));
        assert!(listener.events.is_empty());
    }
}

#[test]
fn decoded_streams_are_accepted() {
    let n = 64;
    let reader = MemoryReader::new(cosine_at_bin(6, n, n * 2, 9000.0), 1, SAMPLE_RATE)
        .with_encoding(SampleEncoding::Decoded);
    let matrix = compute_spectrogram(reader, &linear(n), NoOpListener).unwrap();
    assert_eq!(matrix.rows_written(), 2);
    let row = matrix.row(1).unwrap();
    let peak = row
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .unwrap()
        .0;
    assert_eq!(peak, 6);
}

#[test]
fn odd_block_length_is_rejected() {
    let reader = MemoryReader::new(noise(100, 5), 1, SAMPLE_RATE);
    let err = compute_spectrogram(reader, &linear(63), NoOpListener).unwrap_err();
    assert!(matches!(err, SpectrogramError::InvalidBlockLength(63)));
}

#[test]
fn empty_stream_gives_empty_matrix() {
    let reader = MemoryReader::new(Vec::new(), 2, SAMPLE_RATE);
    let matrix = compute_spectrogram(reader, &linear(64), NoOpListener).unwrap();
    assert_eq!(matrix.rows(), 0);
    assert_eq!(matrix.columns(), 32);
    assert_eq!(matrix.min_max(), None);
}
