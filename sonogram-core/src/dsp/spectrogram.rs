//! Block-loop orchestration and the time × frequency matrix it fills.
//!
//! Each block of the stream becomes one row: downmix to mono, forward FFT,
//! magnitudes of the lower half of the spectrum. Rows are written in the
//! order blocks arrive. A short final block is zero-padded and still gets a
//! row; an empty read ends the loop without one.

use super::downmix::downmix_into;
use super::magnitude::extract_magnitudes;
use super::stft::BlockTransform;
use crate::config::{MagnitudeScale, SpectrogramConfig};
use crate::listener::{BlockEvent, BlockListener};
use crate::reader::BlockReader;
use crate::{Result, SpectrogramError};

/// Magnitude spectrogram, row-major `[block × bin]`.
///
/// Row `r`, column `c` holds the magnitude of bin `c` in block `r`. Values
/// are never NaN or infinite. With [`MagnitudeScale::Linear`] they are raw,
/// unnormalized FFT magnitudes of 16-bit-scale samples (so a full-scale sine
/// peaks near `32767 * block_length / 2`); with [`MagnitudeScale::Log10`]
/// they are `log10(1 + magnitude)`. Both are `>= 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    values: Vec<f32>,
    rows: usize,
    columns: usize,
    rows_written: usize,
    block_length: usize,
    sample_rate: u32,
    scale: MagnitudeScale,
}

impl Spectrogram {
    /// All-zero matrix with `block_length / 2` columns.
    pub fn zeros(rows: usize, config: &SpectrogramConfig, sample_rate: u32) -> Self {
        let columns = config.columns();
        Spectrogram {
            values: vec![0.0; rows * columns],
            rows,
            columns,
            rows_written: 0,
            block_length: config.block_length,
            sample_rate,
            scale: config.scale,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Rows actually produced from stream blocks. Can be below
    /// [`rows`](Self::rows) when the stream ended earlier than its declared
    /// length; the remaining rows stay zero.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn block_length(&self) -> usize {
        self.block_length
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn scale(&self) -> MagnitudeScale {
        self.scale
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f32> {
        if row < self.rows && column < self.columns {
            Some(self.values[row * self.columns + column])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> Option<&[f32]> {
        if row < self.rows {
            Some(&self.values[row * self.columns..(row + 1) * self.columns])
        } else {
            None
        }
    }

    /// Row-major view: `values[row * columns + column]`.
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Smallest and largest value, or `None` for an empty matrix.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut iter = self.values.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Centre frequency of a column in Hz.
    pub fn bin_frequency(&self, column: usize) -> f64 {
        column as f64 * self.sample_rate as f64 / self.block_length as f64
    }

    /// Start time of a row in seconds.
    pub fn row_time(&self, row: usize) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        row as f64 * self.block_length as f64 / self.sample_rate as f64
    }
}

/// Owns the matrix while rows are appended, one per block.
pub struct SpectrogramAccumulator {
    matrix: Spectrogram,
}

impl SpectrogramAccumulator {
    /// Allocates `rows_for(total_frames)` zeroed rows.
    pub fn new(total_frames: u64, config: &SpectrogramConfig, sample_rate: u32) -> Self {
        let rows = config.rows_for(total_frames);
        Self {
            matrix: Spectrogram::zeros(rows, config, sample_rate),
        }
    }

    pub fn rows(&self) -> usize {
        self.matrix.rows
    }

    pub fn rows_written(&self) -> usize {
        self.matrix.rows_written
    }

    /// Claims the next row for writing.
    ///
    /// Fails with [`SpectrogramError::InternalRowOverflow`] instead of
    /// growing the matrix once every row has been written.
    pub fn next_row(&mut self) -> Result<&mut [f32]> {
        let row = self.matrix.rows_written;
        if row >= self.matrix.rows {
            return Err(SpectrogramError::InternalRowOverflow {
                row,
                rows: self.matrix.rows,
            });
        }
        self.matrix.rows_written += 1;
        let columns = self.matrix.columns;
        Ok(&mut self.matrix.values[row * columns..(row + 1) * columns])
    }

    pub fn finish(self) -> Spectrogram {
        self.matrix
    }
}

/// Runs the whole block loop over `reader` and returns the finished matrix.
///
/// Validation happens before anything is allocated: block length, then
/// sample encoding (floating point is rejected), then channel count. The
/// FFT plan lives for the duration of the call only and is dropped on every
/// return path. Any reader error aborts the run.
pub fn compute_spectrogram<R, L>(
    mut reader: R,
    config: &SpectrogramConfig,
    mut listener: L,
) -> Result<Spectrogram>
where
    R: BlockReader,
    L: BlockListener,
{
    config.validate()?;
    let info = reader.info().clone();
    log::info!(
        "{} Hz, {} frames, {} channel(s), {}",
        info.sample_rate,
        info.total_frames,
        info.channels,
        info.encoding
    );

    if !info.encoding.is_fixed_point() {
        return Err(SpectrogramError::UnsupportedEncoding(info.encoding));
    }
    if info.channels == 0 {
        return Err(SpectrogramError::MalformedChannelCount(info.channels));
    }

    let block_length = config.block_length;
    let mut accumulator = SpectrogramAccumulator::new(info.total_frames, config, info.sample_rate);
    let mut transform = BlockTransform::new(block_length);
    let mut block = Vec::with_capacity(block_length * info.channels as usize);

    log::info!("processing audio in blocks of {block_length} frames");
    listener.on_event(BlockEvent::Started {
        rows: accumulator.rows(),
        columns: config.columns(),
        block_length,
    });

    let mut full_blocks = 0;
    loop {
        let frames = reader.read_block(block_length, &mut block)?;
        if frames == 0 {
            break;
        }

        let short = frames < block_length;
        if short {
            log::debug!("read {frames} frames after {full_blocks} full blocks, end of stream");
            listener.on_event(BlockEvent::ShortBlock { frames, full_blocks });
        }

        downmix_into(&block, info.channels, transform.input_mut())?;
        let spectrum = transform.process()?;
        let row = accumulator.next_row()?;
        let clamped = extract_magnitudes(spectrum, config.scale, row);
        if clamped > 0 {
            log::trace!("clamped {clamped} non-finite magnitude(s) to zero");
        }
        log::trace!(
            "row {}/{} written from {frames} frames",
            accumulator.rows_written(),
            accumulator.rows()
        );

        listener.on_event(BlockEvent::BlockDone {
            row: accumulator.rows_written() - 1,
            rows: accumulator.rows(),
            frames,
        });

        if short {
            break;
        }
        full_blocks += 1;
    }

    let spectrogram = accumulator.finish();
    if spectrogram.rows_written() < spectrogram.rows() {
        log::warn!(
            "stream ended early: {} of {} rows written",
            spectrogram.rows_written(),
            spectrogram.rows()
        );
    }
    listener.on_event(BlockEvent::Finished {
        rows_written: spectrogram.rows_written(),
    });
    Ok(spectrogram)
}
