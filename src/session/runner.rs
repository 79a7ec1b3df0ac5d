//! Session orchestrator: drives generate → decode → store → play.
//!
//! [`SessionOrchestrator`] owns the [`HistoryStore`] and the
//! [`PlaybackController`] and is the only writer of [`SharedState`].  It
//! responds to [`SessionCommand`]s from the UI over a `tokio::sync::mpsc`
//! channel.
//!
//! # Flow
//!
//! ```text
//! SessionCommand::Generate
//!   └─▶ validate (trim, catalogs, one in flight)      [generating = true]
//!         └─▶ spawn: gateway.synthesize
//!                     └─▶ spawn_blocking(decode → encode)
//!                           └─▶ Generated event back to the loop
//!               ├─ Ok  → register handle → append → auto-play
//!               └─ Err → error_message, no record      [generating = false]
//!
//! SessionCommand::Play(id)     └─▶ controller.play (toggle semantics)
//! SessionCommand::Delete(id)   └─▶ stop_if_active(id) → store.remove(id)
//! SessionCommand::Download(id) └─▶ store.download → last_download
//! SessionCommand::ClearHistory └─▶ stop → store.clear → epoch += 1
//! PlaybackEnded                └─▶ controller.on_ended
//! ```
//!
//! The loop handles each event to completion.  The speech request is the
//! only suspension point and never runs on the loop itself, so play, delete
//! and download stay responsive while a clip is being generated.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::audio::{decode, encode, EncodedAudio, MalformedAudioError};
use crate::config::AppConfig;
use crate::gateway::{find_language, find_voice, GatewayError, SpeechGateway, SpeechRequest};
use crate::history::{GeneratedAudioRecord, HistoryError, HistoryStore, RecordId};
use crate::playback::{PlaybackController, PlaybackEnded, PlaybackEngine};

use super::state::{lock_state, SharedState};

// ---------------------------------------------------------------------------
// SessionCommand
// ---------------------------------------------------------------------------

/// User intents sent from the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Synthesize `text` with `voice_id` in `language` (English name).
    Generate {
        text: String,
        voice_id: String,
        language: String,
    },
    /// Play record `id`, or pause it if it is the one sounding.
    Play(RecordId),
    /// Remove record `id` and release its audio.
    Delete(RecordId),
    /// Save record `id` as a `.wav` file.
    Download(RecordId),
    /// Remove every record.
    ClearHistory,
}

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Failures surfaced to the user.  `Display` is the message shown.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please enter some text to read.")]
    EmptyText,

    #[error("Unknown voice \"{0}\".")]
    UnknownVoice(String),

    #[error("Unknown language \"{0}\".")]
    UnknownLanguage(String),

    #[error("A clip is already being generated.")]
    Busy,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("The model returned unreadable audio: {0}")]
    Audio(#[from] MalformedAudioError),

    #[error("Download failed: {0}")]
    Download(#[from] HistoryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// Generated
// ---------------------------------------------------------------------------

/// Result of one spawned generation, delivered back to the loop.
#[derive(Debug)]
struct Generated {
    /// Value of the orchestrator's epoch when the request was accepted.
    epoch: u64,
    request: SpeechRequest,
    outcome: Result<EncodedAudio, SessionError>,
}

// ---------------------------------------------------------------------------
// SessionOrchestrator
// ---------------------------------------------------------------------------

/// Drives one UI session.
///
/// Create with [`SessionOrchestrator::new`], then call [`run`](Self::run)
/// inside a tokio task.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
/// use tts_studio::config::AppConfig;
/// use tts_studio::gateway::GeminiGateway;
/// use tts_studio::playback::NullEngine;
/// use tts_studio::session::{new_shared_state, SessionCommand, SessionOrchestrator};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let state = new_shared_state(config.clone());
/// let gateway = Arc::new(GeminiGateway::from_config(&config.gateway));
///
/// let (_ended_tx, ended_rx) = mpsc::unbounded_channel();
/// let (cmd_tx, cmd_rx) = mpsc::channel(32);
/// let orchestrator = SessionOrchestrator::new(
///     state,
///     &config,
///     gateway,
///     Box::new(NullEngine::new()),
/// );
/// tokio::spawn(orchestrator.run(cmd_rx, ended_rx));
///
/// cmd_tx
///     .send(SessionCommand::Generate {
///         text: "Hello world".into(),
///         voice_id: "Kore".into(),
///         language: "English".into(),
///     })
///     .await
///     .unwrap();
/// # }
/// ```
pub struct SessionOrchestrator {
    state: SharedState,
    gateway: Arc<dyn SpeechGateway>,
    store: HistoryStore,
    playback: PlaybackController,
    /// Interleaved channel count of the model's PCM.
    channels: u16,
    auto_play: bool,
    download_dir: PathBuf,
    download_prefix: String,
    /// Bumped by `ClearHistory`; results from an older epoch are dropped.
    epoch: u64,
    in_flight: bool,
}

impl SessionOrchestrator {
    /// Create a new orchestrator.
    ///
    /// # Arguments
    ///
    /// * `state`: shared state (also read by the UI).
    /// * `config`: audio and history settings are taken from here.
    /// * `gateway`: speech backend (e.g. `GeminiGateway`).
    /// * `engine`: the session's single output engine.
    pub fn new(
        state: SharedState,
        config: &AppConfig,
        gateway: Arc<dyn SpeechGateway>,
        engine: Box<dyn PlaybackEngine>,
    ) -> Self {
        Self {
            state,
            gateway,
            store: HistoryStore::new(),
            playback: PlaybackController::new(engine),
            channels: config.audio.channels,
            auto_play: config.audio.auto_play,
            download_dir: config.history.resolve_download_dir(),
            download_prefix: config.history.download_prefix.clone(),
            epoch: 0,
            in_flight: false,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until `commands` is closed.
    ///
    /// `ended` carries natural end-of-clip events from the output engine.
    /// Returning drops the store (releasing every remaining handle) and the
    /// engine.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut ended: mpsc::UnboundedReceiver<PlaybackEnded>,
    ) {
        let (results_tx, mut results) = mpsc::unbounded_channel::<Generated>();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command, &results_tx),
                    None => break,
                },
                Some(event) = ended.recv() => {
                    self.playback.on_ended(event);
                    self.publish();
                }
                Some(done) = results.recv() => self.handle_generated(done),
            }
        }

        log::info!("session: command channel closed, orchestrator shutting down");
    }

    // -----------------------------------------------------------------------
    // Command handlers
    // -----------------------------------------------------------------------

    fn handle_command(&mut self, command: SessionCommand, results: &mpsc::UnboundedSender<Generated>) {
        log::debug!("session: {command:?}");
        match command {
            SessionCommand::Generate {
                text,
                voice_id,
                language,
            } => match self.start_generation(&text, &voice_id, &language, results) {
                Ok(()) => {}
                Err(SessionError::Busy) => {
                    log::warn!("session: generate rejected, a request is already in flight");
                }
                Err(e) => self.set_error(e),
            },
            SessionCommand::Play(id) => self.handle_play(id),
            SessionCommand::Delete(id) => self.handle_delete(id),
            SessionCommand::Download(id) => self.handle_download(id),
            SessionCommand::ClearHistory => self.handle_clear(),
        }
    }

    /// Validate and spawn a generation.
    fn start_generation(
        &mut self,
        text: &str,
        voice_id: &str,
        language: &str,
        results: &mpsc::UnboundedSender<Generated>,
    ) -> Result<(), SessionError> {
        if self.in_flight {
            return Err(SessionError::Busy);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyText);
        }
        let voice = find_voice(voice_id).ok_or_else(|| SessionError::UnknownVoice(voice_id.into()))?;
        let lang =
            find_language(language).ok_or_else(|| SessionError::UnknownLanguage(language.into()))?;

        let request = SpeechRequest {
            text: text.to_string(),
            voice_id: voice.id.to_string(),
            language: lang.name.to_string(),
        };

        self.in_flight = true;
        {
            let mut st = lock_state(&self.state);
            st.generating = true;
            st.error_message = None;
        }

        log::info!(
            "session: generating {} chars ({}, {})",
            request.text.chars().count(),
            request.voice_id,
            request.language
        );

        let gateway = Arc::clone(&self.gateway);
        let channels = self.channels;
        let epoch = self.epoch;
        let results = results.clone();

        tokio::spawn(async move {
            let outcome = synthesize_clip(gateway.as_ref(), &request, channels).await;
            // The loop is gone when the UI has closed; nothing to deliver to.
            let _ = results.send(Generated {
                epoch,
                request,
                outcome,
            });
        });

        Ok(())
    }

    fn handle_generated(&mut self, done: Generated) {
        self.in_flight = false;

        if done.epoch != self.epoch {
            log::debug!("session: discarding result from before the history was cleared");
            self.publish();
            return;
        }

        match done.outcome {
            Ok(encoded) => {
                let duration_secs = encoded.duration_secs();
                let created_at = chrono::Utc::now().timestamp_millis();
                let audio_handle = self.store.register(encoded);
                let id = self.store.next_id(created_at);

                self.store.append(GeneratedAudioRecord {
                    id,
                    text: done.request.text,
                    language: done.request.language,
                    voice_name: done.request.voice_id,
                    audio_handle,
                    created_at,
                    duration_secs,
                });
                log::info!("session: clip {id} ready ({duration_secs:.2}s)");

                if self.auto_play {
                    self.handle_play(id);
                } else {
                    self.publish();
                }
            }
            Err(e) => self.set_error(e),
        }
    }

    fn handle_play(&mut self, id: RecordId) {
        let (Some(record), Some(source)) = (self.store.get(id), self.store.resolve(id)) else {
            log::debug!("session: play ignored, no record {id}");
            return;
        };
        self.playback.play(record, source);
        self.publish();
    }

    fn handle_delete(&mut self, id: RecordId) {
        // Silence before release.
        self.playback.stop_if_active(id);
        if !self.store.remove(id) {
            log::debug!("session: delete ignored, no record {id}");
        }
        self.publish();
    }

    fn handle_download(&mut self, id: RecordId) {
        match self.store.download(id, &self.download_dir, &self.download_prefix) {
            Ok(path) => {
                lock_state(&self.state).last_download = Some(path);
            }
            Err(e) => self.set_error(e.into()),
        }
    }

    fn handle_clear(&mut self) {
        self.playback.stop();
        let removed = self.store.clear();
        self.epoch += 1;
        log::info!("session: cleared {removed} record(s)");
        self.publish();
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Copy store and controller state into the shared state.
    fn publish(&self) {
        let history = self.store.snapshot();
        let mut st = lock_state(&self.state);
        st.history = history;
        st.playback = self.playback.state();
        st.generating = self.in_flight;
    }

    fn set_error(&self, error: SessionError) {
        let message = error.to_string();
        log::error!("session error: {message}");
        let mut st = lock_state(&self.state);
        st.error_message = Some(message);
        st.generating = self.in_flight;
    }
}

/// Request speech and wrap it in a WAV container.
async fn synthesize_clip(
    gateway: &dyn SpeechGateway,
    request: &SpeechRequest,
    channels: u16,
) -> Result<EncodedAudio, SessionError> {
    let raw = gateway.synthesize(request).await?;

    tokio::task::spawn_blocking(move || {
        decode(&raw.samples, raw.sample_rate, channels).map(|decoded| encode(&decoded))
    })
    .await
    .map_err(|e| SessionError::Internal(e.to_string()))?
    .map_err(SessionError::from)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
