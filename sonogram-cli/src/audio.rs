use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hound::{SampleFormat, WavReader};
use sonogram_core::Result as ReadResult;
use sonogram_core::{BlockReader, SampleEncoding, SpectrogramError, StreamInfo};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Open `path` as a block reader, picking the decoder by extension.
///
/// WAV goes through hound and is streamed block by block. Everything else
/// (FLAC, AIFF, MP3, OGG Vorbis) goes through Symphonia.
pub fn open_reader(path: &Path) -> ReadResult<Box<dyn BlockReader>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("wav") | Some("wave") => Ok(Box::new(WavBlockReader::open(path)?)),
        _ => Ok(Box::new(DecodedBlockReader::open(path)?)),
    }
}

fn unopenable(path: &Path, reason: impl ToString) -> SpectrogramError {
    SpectrogramError::UnopenableInput {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Rescale an integer sample of `bits` width to 16-bit full scale.
fn to_i16(sample: i32, bits: u16) -> i16 {
    if bits >= 16 {
        (sample >> (bits - 16)) as i16
    } else {
        (sample << (16 - bits)) as i16
    }
}

/// Streaming reader for WAV files.
pub struct WavBlockReader {
    reader: WavReader<BufReader<File>>,
    info: StreamInfo,
}

impl WavBlockReader {
    pub fn open(path: &Path) -> ReadResult<Self> {
        let reader = WavReader::open(path).map_err(|e| unopenable(path, e))?;
        let spec = reader.spec();
        let encoding = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 64) => SampleEncoding::Float64,
            (SampleFormat::Float, _) => SampleEncoding::Float32,
            // WAV stores 8-bit PCM unsigned; hound hands it back re-centred.
            (SampleFormat::Int, 8) => SampleEncoding::PcmU8,
            (SampleFormat::Int, 16) => SampleEncoding::PcmS16,
            (SampleFormat::Int, 24) => SampleEncoding::PcmS24,
            (SampleFormat::Int, 32) => SampleEncoding::PcmS32,
            (SampleFormat::Int, bits) => {
                return Err(unopenable(path, format!("unsupported bit depth {bits}")))
            }
        };
        let info = StreamInfo {
            sample_rate: spec.sample_rate,
            total_frames: reader.duration() as u64,
            channels: spec.channels,
            encoding,
        };
        Ok(Self { reader, info })
    }
}

impl BlockReader for WavBlockReader {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn read_block(&mut self, max_frames: usize, buf: &mut Vec<i16>) -> ReadResult<usize> {
        buf.clear();
        if !self.info.encoding.is_fixed_point() {
            return Err(SpectrogramError::UnsupportedEncoding(self.info.encoding));
        }
        let channels = self.info.channels as usize;
        if channels == 0 {
            return Ok(0);
        }
        let bits = self.info.encoding.bits();
        for sample in self.reader.samples::<i32>().take(max_frames * channels) {
            let sample = sample.map_err(|e| SpectrogramError::Read(e.to_string()))?;
            buf.push(to_i16(sample, bits));
        }
        // A truncated file can end mid-frame; drop the partial frame.
        buf.truncate(buf.len() - buf.len() % channels);
        Ok(buf.len() / channels)
    }
}

/// Map a codec's declared sample format onto the encodings we know.
///
/// Only an explicit `F32`/`F64` format counts as float. PCM containers may
/// declare just a bit depth. Compressed codecs (MP3, Vorbis) declare
/// neither and are read through the decoder as 16-bit.
fn encoding_of(params: &CodecParameters) -> SampleEncoding {
    use symphonia::core::sample::SampleFormat as Sf;
    match params.sample_format {
        Some(Sf::U8) => SampleEncoding::PcmU8,
        Some(Sf::S8) => SampleEncoding::PcmS8,
        Some(Sf::U16) | Some(Sf::S16) => SampleEncoding::PcmS16,
        Some(Sf::U24) | Some(Sf::S24) => SampleEncoding::PcmS24,
        Some(Sf::U32) | Some(Sf::S32) => SampleEncoding::PcmS32,
        Some(Sf::F32) => SampleEncoding::Float32,
        Some(Sf::F64) => SampleEncoding::Float64,
        None => match params.bits_per_sample {
            Some(8) => SampleEncoding::PcmS8,
            Some(16) => SampleEncoding::PcmS16,
            Some(24) => SampleEncoding::PcmS24,
            Some(32) => SampleEncoding::PcmS32,
            _ => SampleEncoding::Decoded,
        },
    }
}

/// Reader for containers decoded with Symphonia.
///
/// Packets are decoded on demand into a queue of interleaved 16-bit samples.
/// When the container does not declare its length or channel layout up
/// front, the whole stream is decoded on open so both are known before the
/// block loop sizes its matrix.
pub struct DecodedBlockReader {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    info: StreamInfo,
    pending: VecDeque<i16>,
    finished: bool,
}

impl DecodedBlockReader {
    pub fn open(path: &Path) -> ReadResult<Self> {
        let file = File::open(path).map_err(|e| unopenable(path, e))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| unopenable(path, format!("unsupported audio format: {e}")))?;
        let format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| unopenable(path, "no audio track found"))?
            .clone();
        let params = &track.codec_params;

        let sample_rate = params
            .sample_rate
            .ok_or_else(|| unopenable(path, "could not determine sample rate"))?;
        let decoder = symphonia::default::get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(|e| unopenable(path, format!("failed to create decoder: {e}")))?;

        let declared_channels = params.channels.map(|c| c.count() as u16);
        let mut reader = Self {
            format,
            decoder,
            track_id: track.id,
            info: StreamInfo {
                sample_rate,
                total_frames: params.n_frames.unwrap_or(0),
                channels: declared_channels.unwrap_or(0),
                encoding: encoding_of(params),
            },
            pending: VecDeque::new(),
            finished: false,
        };

        if reader.info.encoding.is_fixed_point()
            && (params.n_frames.is_none() || declared_channels.is_none())
        {
            log::debug!("stream length or layout not declared, decoding up front");
            reader.decode_remaining()?;
        }
        Ok(reader)
    }

    /// Decodes the rest of the stream into `pending` and recounts
    /// `total_frames` from it. Only meaningful before the first block is read.
    fn decode_remaining(&mut self) -> ReadResult<()> {
        while self.decode_next()? {}
        if self.info.channels > 0 {
            self.info.total_frames = (self.pending.len() / self.info.channels as usize) as u64;
        }
        log::debug!("decoded {} frames up front", self.info.total_frames);
        Ok(())
    }

    /// Decodes one more packet into `pending`. Returns `false` at end of stream.
    fn decode_next(&mut self) -> ReadResult<bool> {
        use symphonia::core::errors::Error;

        if self.finished {
            return Ok(false);
        }
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(Error::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    self.finished = true;
                    return Ok(false);
                }
                Err(Error::ResetRequired) => {
                    self.finished = true;
                    return Ok(false);
                }
                Err(e) => return Err(SpectrogramError::Read(format!("reading packet: {e}"))),
            };
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                Err(Error::DecodeError(msg)) => {
                    log::warn!("skipping undecodable packet: {msg}");
                    continue;
                }
                Err(e) => return Err(SpectrogramError::Read(format!("decoding: {e}"))),
            };

            let spec = *decoded.spec();
            if self.info.channels == 0 {
                self.info.channels = spec.channels.count() as u16;
            }
            let mut samples = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
            samples.copy_interleaved_ref(decoded);
            self.pending.extend(samples.samples().iter().copied());
            return Ok(true);
        }
    }
}

impl BlockReader for DecodedBlockReader {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn read_block(&mut self, max_frames: usize, buf: &mut Vec<i16>) -> ReadResult<usize> {
        buf.clear();
        if !self.info.encoding.is_fixed_point() {
            return Err(SpectrogramError::UnsupportedEncoding(self.info.encoding));
        }
        let channels = self.info.channels as usize;
        if channels == 0 {
            return Ok(0);
        }
        let wanted = max_frames * channels;
        while self.pending.len() < wanted && self.decode_next()? {}

        let available = self.pending.len().min(wanted);
        let take = available - available % channels;
        buf.extend(self.pending.drain(..take));
        Ok(take / channels)
    }
}
