//! Shared session state.
//!
//! [`SessionState`] is the single source of truth for everything the UI
//! needs: the history snapshot, which record is playing, whether a
//! generation is in flight, and the last error or download.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<SessionState>>`.  The
//! orchestrator is the only writer; the egui update loop reads it each frame.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::AppConfig;
use crate::history::HistoryEntry;
use crate::playback::PlaybackState;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Everything the UI renders.
#[derive(Debug)]
pub struct SessionState {
    /// History, newest first.
    pub history: Vec<HistoryEntry>,

    /// Which record is playing.
    pub playback: PlaybackState,

    /// A speech request is in flight; the Generate button is disabled.
    pub generating: bool,

    /// User-facing message from the last failed operation.
    ///
    /// Cleared when a new generation is accepted.
    pub error_message: Option<String>,

    /// Path of the most recent successful download.
    pub last_download: Option<PathBuf>,

    /// Configuration snapshot (initial selections, text limit).
    pub config: AppConfig,
}

impl SessionState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            history: Vec::new(),
            playback: PlaybackState::Idle,
            generating: false,
            error_message: None,
            last_download: None,
            config,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`SessionState`].
///
/// Cheap to clone (`Arc` clone).  Keep critical sections short and never
/// hold the lock across `.await` points.
pub type SharedState = Arc<Mutex<SessionState>>;

/// Construct a new [`SharedState`] wrapping a fresh [`SessionState`].
pub fn new_shared_state(config: AppConfig) -> SharedState {
    Arc::new(Mutex::new(SessionState::new(config)))
}

/// Lock `state`, recovering the data if a previous holder panicked.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::RecordId;

    #[test]
    fn new_state_is_idle_and_empty() {
        let state = SessionState::default();
        assert!(state.history.is_empty());
        assert_eq!(state.playback, PlaybackState::Idle);
        assert!(!state.generating);
        assert!(state.error_message.is_none());
        assert!(state.last_download.is_none());
    }

    #[test]
    fn shared_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedState>();
    }

    #[test]
    fn shared_state_can_be_cloned_and_mutated() {
        let state = new_shared_state(AppConfig::default());
        let state2 = Arc::clone(&state);

        lock_state(&state).playback = PlaybackState::Playing(RecordId(5));
        assert_eq!(lock_state(&state2).playback.active_id(), Some(RecordId(5)));
    }

    #[test]
    fn lock_survives_poisoning() {
        let state = new_shared_state(AppConfig::default());
        let poisoner = Arc::clone(&state);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(state.is_poisoned());
        lock_state(&state).generating = true;
        assert!(lock_state(&state).generating);
    }
}
