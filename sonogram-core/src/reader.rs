//! Stream metadata and the block-reader seam.
//!
//! Decoding lives outside this crate. A decoder only has to hand out
//! interleaved 16-bit samples in blocks of at most `max_frames` frames and
//! report a short (or empty) block once the stream runs dry.

use std::fmt;

use crate::Result;

/// Sample encoding declared by the source stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    PcmS8,
    PcmS16,
    PcmS24,
    PcmS32,
    PcmU8,
    /// Compressed stream whose decoder picks the sample format (MP3,
    /// Vorbis, ...). Delivered as 16-bit samples like every other source.
    Decoded,
    Float32,
    Float64,
}

impl SampleEncoding {
    /// Integer encodings can be processed; floating-point ones cannot.
    pub fn is_fixed_point(self) -> bool {
        !matches!(self, SampleEncoding::Float32 | SampleEncoding::Float64)
    }

    pub fn bits(self) -> u16 {
        match self {
            SampleEncoding::PcmS8 | SampleEncoding::PcmU8 => 8,
            SampleEncoding::PcmS16 | SampleEncoding::Decoded => 16,
            SampleEncoding::PcmS24 => 24,
            SampleEncoding::PcmS32 | SampleEncoding::Float32 => 32,
            SampleEncoding::Float64 => 64,
        }
    }
}

impl fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleEncoding::PcmS8 => "signed 8-bit PCM",
            SampleEncoding::PcmS16 => "signed 16-bit PCM",
            SampleEncoding::PcmS24 => "signed 24-bit PCM",
            SampleEncoding::PcmS32 => "signed 32-bit PCM",
            SampleEncoding::PcmU8 => "unsigned 8-bit PCM",
            SampleEncoding::Decoded => "compressed (decoded to 16-bit)",
            SampleEncoding::Float32 => "32-bit float",
            SampleEncoding::Float64 => "64-bit float",
        };
        f.write_str(name)
    }
}

/// Metadata read once from the stream before any block is pulled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub sample_rate: u32,
    /// Frames per channel in the whole stream.
    pub total_frames: u64,
    pub channels: u16,
    pub encoding: SampleEncoding,
}

/// Source of fixed-size, interleaved sample blocks.
pub trait BlockReader {
    fn info(&self) -> &StreamInfo;

    /// Clears `buf` and fills it with up to `max_frames` interleaved frames
    /// at 16-bit full scale. Returns the number of frames read.
    ///
    /// A return value below `max_frames` means the stream ends after this
    /// block; zero means nothing was left.
    fn read_block(&mut self, max_frames: usize, buf: &mut Vec<i16>) -> Result<usize>;
}

impl<R: BlockReader + ?Sized> BlockReader for &mut R {
    fn info(&self) -> &StreamInfo {
        (**self).info()
    }

    fn read_block(&mut self, max_frames: usize, buf: &mut Vec<i16>) -> Result<usize> {
        (**self).read_block(max_frames, buf)
    }
}

impl<R: BlockReader + ?Sized> BlockReader for Box<R> {
    fn info(&self) -> &StreamInfo {
        (**self).info()
    }

    fn read_block(&mut self, max_frames: usize, buf: &mut Vec<i16>) -> Result<usize> {
        (**self).read_block(max_frames, buf)
    }
}

/// Block reader over samples that are already decoded into memory.
pub struct MemoryReader {
    info: StreamInfo,
    samples: Vec<i16>,
    position: usize,
}

impl MemoryReader {
    /// `samples` is interleaved; its length should be a multiple of
    /// `channels`. A trailing partial frame is ignored.
    pub fn new(samples: Vec<i16>, channels: u16, sample_rate: u32) -> Self {
        let total_frames = match channels {
            0 => 0,
            ch => (samples.len() / ch as usize) as u64,
        };
        Self {
            info: StreamInfo {
                sample_rate,
                total_frames,
                channels,
                encoding: SampleEncoding::PcmS16,
            },
            samples,
            position: 0,
        }
    }

    /// Overrides the declared encoding, e.g. to mimic a float source.
    pub fn with_encoding(mut self, encoding: SampleEncoding) -> Self {
        self.info.encoding = encoding;
        self
    }
}

impl BlockReader for MemoryReader {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn read_block(&mut self, max_frames: usize, buf: &mut Vec<i16>) -> Result<usize> {
        buf.clear();
        let channels = self.info.channels as usize;
        if channels == 0 {
            return Ok(0);
        }
        let whole = self.samples.len() - self.samples.len() % channels;
        let end = (self.position + max_frames * channels).min(whole);
        buf.extend_from_slice(&self.samples[self.position..end]);
        let frames = (end - self.position) / channels;
        self.position = end;
        Ok(frames)
    }
}
