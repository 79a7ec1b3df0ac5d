//! The playback controller: sole owner of the session's output engine.
//!
//! [`PlaybackController`] turns "play this record" requests into engine calls
//! according to the toggle semantics in [`super::state`].  Engine failures
//! are logged and leave the controller [`Idle`](PlaybackState::Idle); play,
//! pause and stop never fail observably.

use std::sync::Arc;

use crate::audio::EncodedAudio;
use crate::history::{GeneratedAudioRecord, RecordId};

use super::engine::{PlaybackEnded, PlaybackEngine};
use super::state::PlaybackState;

/// Drives the single [`PlaybackEngine`] of a session.
pub struct PlaybackController {
    engine: Box<dyn PlaybackEngine>,
    state: PlaybackState,
    /// Token of the most recent `load`; end events carrying any other token
    /// belong to a replaced source.
    token: u64,
}

impl PlaybackController {
    /// Take ownership of the session's engine.  Starts [`Idle`](PlaybackState::Idle).
    pub fn new(engine: Box<dyn PlaybackEngine>) -> Self {
        Self {
            engine,
            state: PlaybackState::Idle,
            token: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Play `record` from `source`, or pause it if it is already sounding.
    ///
    /// Returns the resulting state.
    pub fn play(&mut self, record: &GeneratedAudioRecord, source: Arc<EncodedAudio>) -> PlaybackState {
        if self.state.is_playing(record.id) && self.engine.is_sounding() {
            log::debug!("playback: toggle pause {}", record.id);
            self.engine.pause();
            self.state = PlaybackState::Idle;
            return self.state;
        }

        self.token += 1;
        let started = self
            .engine
            .load(source, self.token)
            .and_then(|()| self.engine.play());

        match started {
            Ok(()) => {
                log::debug!("playback: {} → Playing({})", self.state.label(), record.id);
                self.state = PlaybackState::Playing(record.id);
            }
            Err(e) => {
                log::warn!("playback: could not start {}: {e}", record.id);
                self.engine.pause();
                self.state = PlaybackState::Idle;
            }
        }
        self.state
    }

    /// Handle the engine reaching the end of a clip.
    ///
    /// Ignored unless it belongs to the currently loaded source.
    pub fn on_ended(&mut self, event: PlaybackEnded) {
        if event.token != self.token {
            log::debug!("playback: stale end event (token {})", event.token);
            return;
        }
        if let PlaybackState::Playing(id) = self.state {
            log::debug!("playback: {id} finished");
            self.state = PlaybackState::Idle;
        }
    }

    /// Silence playback if `id` is the active record.  Returns whether it was.
    pub fn stop_if_active(&mut self, id: RecordId) -> bool {
        if !self.state.is_playing(id) {
            return false;
        }
        self.engine.pause();
        self.state = PlaybackState::Idle;
        log::debug!("playback: stopped {id}");
        true
    }

    /// Silence whatever is playing.
    pub fn stop(&mut self) {
        if let Some(id) = self.state.active_id() {
            self.stop_if_active(id);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
