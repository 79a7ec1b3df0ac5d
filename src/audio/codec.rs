//! Raw PCM → WAV container codec.
//!
//! The speech model returns headerless signed 16-bit little-endian PCM.  This
//! module turns that byte stream into a [`DecodedAudio`] (normalised `f32`
//! samples, one `Vec` per channel) and then into an [`EncodedAudio`], a
//! byte-exact RIFF/WAVE file that standard players and the download path
//! accept as-is.
//!
//! ```text
//! raw bytes ──decode──▶ DecodedAudio ──encode──▶ EncodedAudio (44-byte header + data)
//! ```
//!
//! Both steps are pure: no I/O, no global state.
//!
//! # Example
//!
//! ```rust
//! use tts_studio::audio::{decode, encode};
//!
//! // 1 s of mono silence at 24 kHz
//! let raw = vec![0u8; 48_000];
//! let decoded = decode(&raw, 24_000, 1).unwrap();
//! assert_eq!(decoded.duration_secs(), 1.0);
//!
//! let wav = encode(&decoded);
//! assert_eq!(wav.len(), 48_044);
//! assert_eq!(wav.header().unwrap().chunk_size, 48_036);
//! ```

use thiserror::Error;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Size of the canonical PCM WAV header written by [`encode`].
pub const WAV_HEADER_LEN: usize = 44;

/// Bytes per sample of the 16-bit PCM wire format.
const BYTES_PER_SAMPLE: usize = 2;

/// Scale between `i16` samples and normalised `f32` samples.
const I16_SCALE: f32 = 32_768.0;

/// `AudioFormat` value for uncompressed linear PCM.
const FORMAT_PCM: u16 = 1;

/// Bit depth written into every header.
const BITS_PER_SAMPLE: u16 = 16;

// ---------------------------------------------------------------------------
// MalformedAudioError
// ---------------------------------------------------------------------------

/// The raw PCM payload violates the decoder's input contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedAudioError {
    /// Channel count of zero can never describe a frame.
    #[error("malformed audio: channel count must be at least 1")]
    NoChannels,

    /// Sample rate must be a positive number of Hz.
    #[error("malformed audio: invalid sample rate {0} Hz")]
    InvalidSampleRate(u32),

    /// Byte length does not divide into whole frames.
    #[error("malformed audio: {len} bytes is not a multiple of the {frame_bytes}-byte frame size")]
    PartialFrame { len: usize, frame_bytes: usize },
}

// ---------------------------------------------------------------------------
// DecodedAudio
// ---------------------------------------------------------------------------

/// An in-memory audio buffer with de-interleaved, normalised samples.
///
/// Every channel holds the same number of samples, each in `[-1.0, 1.0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl DecodedAudio {
    /// Number of channels.
    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples of channel `index`, or `None` when out of range.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Number of samples in each channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Clip length: `frames / sample_rate`.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

// ---------------------------------------------------------------------------
// decode
// ---------------------------------------------------------------------------

/// Decode signed 16-bit little-endian interleaved PCM into [`DecodedAudio`].
///
/// Each sample `s` becomes `s / 32768.0`, so `i16::MIN` maps to exactly
/// `-1.0` and nothing exceeds `+1.0`.
///
/// # Errors
///
/// Returns [`MalformedAudioError`] when `channels == 0`, `sample_rate == 0`
/// or `raw.len()` is not a multiple of `2 * channels`.
pub fn decode(
    raw: &[u8],
    sample_rate: u32,
    channels: u16,
) -> Result<DecodedAudio, MalformedAudioError> {
    if channels == 0 {
        return Err(MalformedAudioError::NoChannels);
    }
    if sample_rate == 0 {
        return Err(MalformedAudioError::InvalidSampleRate(sample_rate));
    }

    let channel_count = usize::from(channels);
    let frame_bytes = BYTES_PER_SAMPLE * channel_count;
    if raw.len() % frame_bytes != 0 {
        return Err(MalformedAudioError::PartialFrame {
            len: raw.len(),
            frame_bytes,
        });
    }

    let frames = raw.len() / frame_bytes;
    let mut planar = vec![Vec::with_capacity(frames); channel_count];

    for frame in raw.chunks_exact(frame_bytes) {
        for (ch, bytes) in frame.chunks_exact(BYTES_PER_SAMPLE).enumerate() {
            let sample = i16::from_le_bytes([bytes[0], bytes[1]]);
            planar[ch].push(f32::from(sample) / I16_SCALE);
        }
    }

    Ok(DecodedAudio {
        sample_rate,
        channels: planar,
    })
}

// ---------------------------------------------------------------------------
// encode
// ---------------------------------------------------------------------------

/// Re-quantise a normalised sample to `i16`.
///
/// The scaled value is clamped to the `i16` range before truncation so a
/// float excursion past `±1.0` saturates instead of wrapping.
fn quantize(sample: f32) -> i16 {
    (sample * I16_SCALE).clamp(-32_768.0, 32_767.0) as i16
}

/// Encode [`DecodedAudio`] as a canonical 44-byte-header PCM WAV file.
///
/// `ChunkSize` is `36 + data_len` and `Subchunk2Size` is `data_len`, so both
/// size fields match the bytes actually written.
pub fn encode(audio: &DecodedAudio) -> EncodedAudio {
    let channels = audio.channel_count();
    let frames = audio.frames();
    let data_len = frames * usize::from(channels) * BYTES_PER_SAMPLE;

    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let byte_rate = audio.sample_rate * u32::from(block_align);

    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN + data_len);

    // RIFF chunk descriptor
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len as u32).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    // fmt sub-chunk
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&audio.sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data sub-chunk
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&(data_len as u32).to_le_bytes());

    for frame in 0..frames {
        for channel in &audio.channels {
            bytes.extend_from_slice(&quantize(channel[frame]).to_le_bytes());
        }
    }

    debug_assert_eq!(bytes.len(), WAV_HEADER_LEN + data_len);

    EncodedAudio {
        bytes,
        channels,
        sample_rate: audio.sample_rate,
        duration_secs: audio.duration_secs(),
    }
}

// ---------------------------------------------------------------------------
// WavHeader
// ---------------------------------------------------------------------------

/// Fields of a canonical 44-byte PCM WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// RIFF `ChunkSize` (file length minus 8).
    pub chunk_size: u32,
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// `Subchunk2Size`: length of the sample payload in bytes.
    pub data_size: u32,
}

impl WavHeader {
    /// Parse the canonical header layout written by [`encode`].
    ///
    /// Returns `None` when `bytes` is shorter than 44 bytes or any of the
    /// `RIFF` / `WAVE` / `fmt ` / `data` tags is missing.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < WAV_HEADER_LEN
            || &bytes[0..4] != b"RIFF"
            || &bytes[8..12] != b"WAVE"
            || &bytes[12..16] != b"fmt "
            || &bytes[36..40] != b"data"
        {
            return None;
        }

        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let u32_at = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };

        Some(Self {
            chunk_size: u32_at(4),
            audio_format: u16_at(20),
            channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data_size: u32_at(40),
        })
    }
}

// ---------------------------------------------------------------------------
// EncodedAudio
// ---------------------------------------------------------------------------

/// A self-contained WAV file held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedAudio {
    bytes: Vec<u8>,
    channels: u16,
    sample_rate: u32,
    duration_secs: f64,
}

impl EncodedAudio {
    /// The complete file, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total file length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` only for a zero-length file, which [`encode`] never produces.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Parsed header fields.
    pub fn header(&self) -> Option<WavHeader> {
        WavHeader::parse(&self.bytes)
    }

    /// The sample payload following the header.
    pub fn payload(&self) -> &[u8] {
        self.bytes.get(WAV_HEADER_LEN..).unwrap_or(&[])
    }

    /// Interleaved samples normalised back to `f32` for the output device.
    pub fn interleaved_samples(&self) -> Vec<f32> {
        self.payload()
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|b| f32::from(i16::from_le_bytes([b[0], b[1]])) / I16_SCALE)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
