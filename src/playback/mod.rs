//! Playback of history records through one shared output engine.
//!
//! * [`PlaybackController`]: Idle / Playing(id) state machine, toggle
//!   semantics, end-of-clip handling.
//! * [`PlaybackEngine`]: trait implemented by the cpal output
//!   ([`crate::audio::CpalEngine`]) and by [`NullEngine`].
//! * [`PlaybackState`]: the state the UI renders.

pub mod controller;
pub mod engine;
pub mod state;

pub use controller::PlaybackController;
pub use engine::{EngineError, NullEngine, PlaybackEnded, PlaybackEngine};
pub use state::PlaybackState;

#[cfg(test)]
pub use engine::MockEngine;
