//! Session orchestration for the TTS studio.
//!
//! This module wires gateway → codec → history → playback and exposes the
//! shared state that the UI reads every frame.
//!
//! # Architecture
//!
//! ```text
//! SessionCommand (mpsc) ───────┐
//! PlaybackEnded (mpsc, device) ┼─▶ SessionOrchestrator::run()  ← tokio task
//! Generated (internal) ────────┘          │
//!                                         ├─ HistoryStore        (owns handles)
//!                                         ├─ PlaybackController  (owns engine)
//!                                         └─ spawn: SpeechGateway + codec
//!
//! SharedState (Arc<Mutex<SessionState>>) ←─── read by egui update() each frame
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{SessionCommand, SessionError, SessionOrchestrator};
pub use state::{lock_state, new_shared_state, SessionState, SharedState};
