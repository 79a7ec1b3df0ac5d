//! Output engine trait and the non-device implementations.
//!
//! # Overview
//!
//! [`PlaybackEngine`] is the seam between the [`PlaybackController`] and the
//! audio hardware.  A session owns exactly one engine; it only ever holds one
//! source, so loading a new clip implicitly stops the previous one.
//!
//! Engines report natural end-of-clip asynchronously by sending a
//! [`PlaybackEnded`] carrying the token passed to [`PlaybackEngine::load`].
//! The controller compares tokens so that an end event belonging to a source
//! that has since been replaced is ignored.
//!
//! * [`crate::audio::CpalEngine`]: the production engine (default output device).
//! * [`NullEngine`]: used when no output device is available; every call
//!   succeeds and nothing is heard.
//! * `MockEngine` (`#[cfg(test)]`): records calls for controller tests.
//!
//! [`PlaybackController`]: crate::playback::PlaybackController

use std::sync::Arc;

use thiserror::Error;

use crate::audio::EncodedAudio;

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// Errors raised by an output engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// No default output device on this host.
    #[error("no output device found on the default audio host")]
    NoDevice,

    /// The device rejected or could not report a stream configuration.
    #[error("output stream configuration failed: {0}")]
    Config(String),

    /// The output stream could not be built or started.
    #[error("output stream failed: {0}")]
    Stream(String),

    /// The clip could not be prepared for the device.
    #[error("clip could not be loaded: {0}")]
    InvalidSource(String),
}

// ---------------------------------------------------------------------------
// PlaybackEnded
// ---------------------------------------------------------------------------

/// Emitted by an engine when the loaded clip plays to its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackEnded {
    /// Token supplied with the [`PlaybackEngine::load`] that started the clip.
    pub token: u64,
}

// ---------------------------------------------------------------------------
// PlaybackEngine trait
// ---------------------------------------------------------------------------

/// A single-source audio output.
///
/// Implementations must be `Send` so the controller can live inside the
/// session task.
pub trait PlaybackEngine: Send {
    /// Replace the current source with `source`, positioned at its start and
    /// paused.  `token` is echoed back in the matching [`PlaybackEnded`].
    fn load(&mut self, source: Arc<EncodedAudio>, token: u64) -> Result<(), EngineError>;

    /// Start (or resume) the loaded source.
    fn play(&mut self) -> Result<(), EngineError>;

    /// Pause output.  Never fails.
    fn pause(&mut self);

    /// `true` while a source is loaded and producing sound.
    fn is_sounding(&self) -> bool;
}

// Compile-time assertion: Box<dyn PlaybackEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn PlaybackEngine>) {}
};

// ---------------------------------------------------------------------------
// NullEngine
// ---------------------------------------------------------------------------

/// Silent engine for hosts without an output device.
///
/// It tracks the loaded/playing flags so the controller's state machine
/// behaves normally, but it never reaches a natural end.
#[derive(Debug, Default)]
pub struct NullEngine {
    loaded: bool,
    playing: bool,
}

impl NullEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlaybackEngine for NullEngine {
    fn load(&mut self, _source: Arc<EncodedAudio>, _token: u64) -> Result<(), EngineError> {
        self.loaded = true;
        self.playing = false;
        Ok(())
    }

    fn play(&mut self) -> Result<(), EngineError> {
        self.playing = self.loaded;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_sounding(&self) -> bool {
        self.playing
    }
}

// ---------------------------------------------------------------------------
// MockEngine  (test-only)
// ---------------------------------------------------------------------------

/// Everything a [`MockEngine`] has been asked to do.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockEngineLog {
    /// Token of every `load` call, in order.
    pub loads: Vec<u64>,
    /// Number of `pause` calls.
    pub pauses: usize,
    /// Whether the engine is currently sounding.
    pub sounding: bool,
    /// When set, `play` fails with [`EngineError::Stream`].
    pub fail_play: bool,
}

/// Test double whose log is shared with the test through a clone.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    log: Arc<std::sync::Mutex<MockEngineLog>>,
}

#[cfg(test)]
impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose `play` always fails.
    pub fn failing() -> Self {
        let engine = Self::default();
        engine.log.lock().unwrap().fail_play = true;
        engine
    }

    /// Lock the shared log for inspection.
    pub fn log(&self) -> std::sync::MutexGuard<'_, MockEngineLog> {
        self.log.lock().unwrap()
    }

    /// Simulate the clip reaching its end; returns the event the device
    /// callback would send.
    pub fn finish(&self) -> PlaybackEnded {
        let mut log = self.log.lock().unwrap();
        log.sounding = false;
        PlaybackEnded {
            token: log.loads.last().copied().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
impl PlaybackEngine for MockEngine {
    fn load(&mut self, _source: Arc<EncodedAudio>, token: u64) -> Result<(), EngineError> {
        let mut log = self.log.lock().unwrap();
        log.loads.push(token);
        log.sounding = false;
        Ok(())
    }

    fn play(&mut self) -> Result<(), EngineError> {
        let mut log = self.log.lock().unwrap();
        if log.fail_play {
            return Err(EngineError::Stream("mock device unplugged".into()));
        }
        log.sounding = true;
        Ok(())
    }

    fn pause(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.pauses += 1;
        log.sounding = false;
    }

    fn is_sounding(&self) -> bool {
        self.log.lock().unwrap().sounding
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{decode, encode};

    fn clip() -> Arc<EncodedAudio> {
        Arc::new(encode(&decode(&[0u8; 4], 24_000, 1).unwrap()))
    }

    #[test]
    fn null_engine_tracks_play_and_pause() {
        let mut engine = NullEngine::new();
        assert!(!engine.is_sounding());

        // play before load stays silent
        engine.play().unwrap();
        assert!(!engine.is_sounding());

        engine.load(clip(), 1).unwrap();
        engine.play().unwrap();
        assert!(engine.is_sounding());

        engine.pause();
        assert!(!engine.is_sounding());
    }

    #[test]
    fn mock_finish_reports_last_token() {
        let mut engine = MockEngine::new();
        engine.load(clip(), 3).unwrap();
        engine.load(clip(), 4).unwrap();
        engine.play().unwrap();

        assert_eq!(engine.finish(), PlaybackEnded { token: 4 });
        assert!(!engine.is_sounding());
    }

    #[test]
    fn engine_error_display() {
        assert!(EngineError::NoDevice.to_string().contains("no output device"));
        assert!(EngineError::Stream("x".into()).to_string().contains('x'));
    }
}
