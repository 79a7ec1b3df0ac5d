//! Speech request gateway.
//!
//! This module provides:
//! * [`SpeechGateway`]: async trait implemented by every synthesis backend.
//! * [`GeminiGateway`]: Gemini `generateContent` REST client.
//! * [`PromptBuilder`]: wraps user text with language and pronunciation
//!   instructions.
//! * [`VOICES`] / [`LANGUAGES`]: static option catalogs.
//! * [`GatewayError`]: failure taxonomy with user-facing messages.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use tts_studio::config::AppConfig;
//! use tts_studio::gateway::{GeminiGateway, SpeechGateway, SpeechRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let gateway = GeminiGateway::from_config(&config.gateway);
//!
//!     let speech = gateway
//!         .synthesize(&SpeechRequest {
//!             text: "Hello world".into(),
//!             voice_id: "Kore".into(),
//!             language: "English".into(),
//!         })
//!         .await
//!         .unwrap();
//!     println!("{} bytes @ {} Hz", speech.samples.len(), speech.sample_rate);
//! }
//! ```

pub mod catalog;
pub mod client;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use catalog::{find_language, find_voice, Gender, LanguageOption, VoiceOption, LANGUAGES, VOICES};
pub use client::{
    GatewayError, GeminiGateway, RawSpeech, SpeechGateway, SpeechRequest, DEFAULT_SAMPLE_RATE,
};
pub use prompt::{pronunciation_rules, PromptBuilder};

#[cfg(test)]
pub use client::MockGateway;
