//! Audio pipeline: raw PCM decode → WAV encode → revocable handle → speaker.
//!
//! # Pipeline
//!
//! ```text
//! model PCM bytes ──decode──▶ DecodedAudio ──encode──▶ EncodedAudio (WAV)
//!                                                        │
//!                                         BlobRegistry::register ──▶ AudioHandle
//!                                                        │
//!                      CpalEngine::load ◀── remix_channels + resample_interleaved
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use tts_studio::audio::{decode, encode, BlobRegistry};
//!
//! let pcm = vec![0u8; 48_000]; // 1 s of 24 kHz mono silence
//! let wav = encode(&decode(&pcm, 24_000, 1).unwrap());
//!
//! let mut blobs = BlobRegistry::new();
//! let handle = blobs.register(wav);
//! assert!(blobs.resolve(&handle).is_some());
//! blobs.revoke(&handle).unwrap();
//! assert!(blobs.resolve(&handle).is_none());
//! ```

pub mod codec;
pub mod handle;
pub mod output;
pub mod resample;

pub use codec::{decode, encode, DecodedAudio, EncodedAudio, MalformedAudioError, WavHeader};
pub use handle::{AudioHandle, BlobRegistry, DoubleReleaseFault};
pub use output::CpalEngine;
pub use resample::{remix_channels, resample_interleaved};
