//! Playback state machine.
//!
//! ```text
//! Idle ──play(r)──────────────────────▶ Playing(r.id)
//! Playing(x) ──play(r), r.id == x ────▶ Idle          (toggle pause)
//! Playing(x) ──play(r), r.id != x ────▶ Playing(r.id) (previous source replaced)
//! Playing(x) ──natural end ───────────▶ Idle
//! Playing(x) ──stop_if_active(x) ─────▶ Idle
//! ```
//!
//! There is no terminal state; the machine lives for the whole session.

use serde::Serialize;

use crate::history::RecordId;

/// Which record, if any, is feeding the output engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PlaybackState {
    /// Nothing is playing.
    #[default]
    Idle,
    /// The record with this id is playing.
    Playing(RecordId),
}

impl PlaybackState {
    /// Id of the active record.
    ///
    /// ```
    /// use tts_studio::history::RecordId;
    /// use tts_studio::playback::PlaybackState;
    ///
    /// assert_eq!(PlaybackState::Idle.active_id(), None);
    /// assert_eq!(PlaybackState::Playing(RecordId(7)).active_id(), Some(RecordId(7)));
    /// ```
    pub fn active_id(&self) -> Option<RecordId> {
        match self {
            PlaybackState::Idle => None,
            PlaybackState::Playing(id) => Some(*id),
        }
    }

    /// `true` when record `id` is the one playing.
    pub fn is_playing(&self, id: RecordId) -> bool {
        self.active_id() == Some(id)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Playing(_) => "Playing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        assert_eq!(PlaybackState::default(), PlaybackState::Idle);
    }

    #[test]
    fn is_playing_matches_only_active_id() {
        let state = PlaybackState::Playing(RecordId(3));
        assert!(state.is_playing(RecordId(3)));
        assert!(!state.is_playing(RecordId(4)));
        assert!(!PlaybackState::Idle.is_playing(RecordId(3)));
    }

    #[test]
    fn labels() {
        assert_eq!(PlaybackState::Idle.label(), "Idle");
        assert_eq!(PlaybackState::Playing(RecordId(1)).label(), "Playing");
    }
}
