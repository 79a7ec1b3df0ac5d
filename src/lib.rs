//! TTS studio: type text, pick a voice and language, and manage a session
//! history of clips synthesized by a remote speech model.
//!
//! ```text
//! app (egui) ──SessionCommand──▶ session ──▶ gateway ──▶ audio::codec
//!     ▲                             │
//!     └──────── SharedState ◀───────┼──▶ history  (owns audio handles)
//!                                   └──▶ playback ──▶ audio::output (cpal)
//! ```

pub mod app;
pub mod audio;
pub mod config;
pub mod gateway;
pub mod history;
pub mod playback;
pub mod session;
