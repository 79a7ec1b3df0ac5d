//! Speaker output via `cpal`.
//!
//! [`CpalEngine`] is the production [`PlaybackEngine`].  `cpal::Stream` is
//! not `Send` on every platform, so the stream lives on a dedicated
//! `audio-output` thread for the engine's whole lifetime; the engine itself
//! only holds the shared [`OutputState`] the device callback reads from.
//! Dropping the engine closes the shutdown channel, which ends the thread and
//! drops the stream.
//!
//! On each load the clip is converted once to the device layout
//! ([`remix_channels`] + [`resample_interleaved`]) so the callback only
//! copies samples.

use std::sync::{mpsc as std_mpsc, Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::mpsc;

use crate::playback::{EngineError, PlaybackEnded, PlaybackEngine};

use super::codec::EncodedAudio;
use super::resample::{remix_channels, resample_interleaved};

// ---------------------------------------------------------------------------
// OutputState
// ---------------------------------------------------------------------------

/// A clip prepared for the device: interleaved at the device's rate and
/// channel count.
#[derive(Debug)]
struct Track {
    samples: Vec<f32>,
    pos: usize,
    token: u64,
}

/// State shared between the engine and the device callback.
#[derive(Debug, Default)]
pub struct OutputState {
    track: Option<Track>,
    playing: bool,
}

impl OutputState {
    /// Fill `out` from the loaded track, padding with silence.
    ///
    /// Returns the track token when this call consumed the last sample.
    fn render(&mut self, out: &mut [f32]) -> Option<u64> {
        if !self.playing {
            out.fill(0.0);
            return None;
        }
        let Some(track) = self.track.as_mut() else {
            out.fill(0.0);
            return None;
        };

        let remaining = track.samples.len() - track.pos;
        let n = remaining.min(out.len());
        out[..n].copy_from_slice(&track.samples[track.pos..track.pos + n]);
        out[n..].fill(0.0);
        track.pos += n;

        if track.pos >= track.samples.len() {
            self.playing = false;
            Some(track.token)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// CpalEngine
// ---------------------------------------------------------------------------

/// Output engine bound to the system default output device.
pub struct CpalEngine {
    state: Arc<Mutex<OutputState>>,
    device_rate: u32,
    device_channels: u16,
    /// Dropped with the engine; the output thread exits when it closes.
    _shutdown: std_mpsc::Sender<()>,
}

impl CpalEngine {
    /// Open the default output device and start a (silent) output stream.
    ///
    /// Natural end-of-clip events are sent on `ended_tx`.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoDevice`] when the host has no output device,
    /// [`EngineError::Config`] / [`EngineError::Stream`] when the device
    /// rejects the stream.
    pub fn new(ended_tx: mpsc::UnboundedSender<PlaybackEnded>) -> Result<Self, EngineError> {
        let state = Arc::new(Mutex::new(OutputState::default()));
        let (shutdown_tx, shutdown_rx) = std_mpsc::channel::<()>();
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(u32, u16), EngineError>>();

        let callback_state = Arc::clone(&state);
        std::thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || {
                let stream = match open_stream(callback_state, ended_tx) {
                    Ok((stream, rate, channels)) => {
                        let _ = ready_tx.send(Ok((rate, channels)));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                // Park until the engine is dropped.
                let _ = shutdown_rx.recv();
                drop(stream);
                log::debug!("audio-output: stream closed");
            })
            .map_err(|e| EngineError::Stream(format!("failed to spawn audio-output thread: {e}")))?;

        let (device_rate, device_channels) = ready_rx
            .recv()
            .map_err(|_| EngineError::Stream("audio-output thread exited during setup".into()))??;

        log::info!("Audio output ready ({device_rate} Hz, {device_channels} ch)");

        Ok(Self {
            state,
            device_rate,
            device_channels,
            _shutdown: shutdown_tx,
        })
    }

    /// Native sample rate of the output stream in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.device_rate
    }

    /// Number of interleaved channels the device expects.
    pub fn channels(&self) -> u16 {
        self.device_channels
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut OutputState) -> R) -> R {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }
}

/// Build and start the output stream.  Runs on the `audio-output` thread.
fn open_stream(
    state: Arc<Mutex<OutputState>>,
    ended_tx: mpsc::UnboundedSender<PlaybackEnded>,
) -> Result<(cpal::Stream, u32, u16), EngineError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(EngineError::NoDevice)?;

    let supported = device
        .default_output_config()
        .map_err(|e| EngineError::Config(e.to_string()))?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(EngineError::Config(format!(
            "unsupported sample format {:?}",
            supported.sample_format()
        )));
    }

    let channels = supported.channels();
    let sample_rate = supported.sample_rate().0;
    let config: cpal::StreamConfig = supported.into();

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let ended = match state.lock() {
                    Ok(mut st) => st.render(data),
                    Err(_) => {
                        data.fill(0.0);
                        None
                    }
                };
                if let Some(token) = ended {
                    // Receiver gone means the session is shutting down.
                    let _ = ended_tx.send(PlaybackEnded { token });
                }
            },
            |err: cpal::StreamError| {
                log::error!("cpal output stream error: {err}");
            },
            None,
        )
        .map_err(|e| EngineError::Stream(e.to_string()))?;

    stream.play().map_err(|e| EngineError::Stream(e.to_string()))?;
    Ok((stream, sample_rate, channels))
}

impl PlaybackEngine for CpalEngine {
    fn load(&mut self, source: Arc<EncodedAudio>, token: u64) -> Result<(), EngineError> {
        if source.header().is_none() {
            return Err(EngineError::InvalidSource("missing WAV header".into()));
        }

        let remixed = remix_channels(
            &source.interleaved_samples(),
            source.channels(),
            self.device_channels,
        );
        let samples = resample_interleaved(
            &remixed,
            self.device_channels,
            source.sample_rate(),
            self.device_rate,
        );

        self.with_state(|st| {
            st.track = Some(Track {
                samples,
                pos: 0,
                token,
            });
            st.playing = false;
        });
        Ok(())
    }

    fn play(&mut self) -> Result<(), EngineError> {
        self.with_state(|st| st.playing = st.track.is_some());
        Ok(())
    }

    fn pause(&mut self) {
        self.with_state(|st| st.playing = false);
    }

    fn is_sounding(&self) -> bool {
        self.with_state(|st| {
            st.playing && st.track.as_ref().is_some_and(|t| t.pos < t.samples.len())
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(samples: Vec<f32>, token: u64) -> OutputState {
        OutputState {
            track: Some(Track {
                samples,
                pos: 0,
                token,
            }),
            playing: true,
        }
    }

    #[test]
    fn render_without_track_is_silent() {
        let mut st = OutputState::default();
        let mut out = [1.0_f32; 4];
        assert_eq!(st.render(&mut out), None);
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn render_while_paused_is_silent_and_keeps_position() {
        let mut st = loaded(vec![0.5; 8], 1);
        st.playing = false;
        let mut out = [1.0_f32; 4];
        st.render(&mut out);
        assert_eq!(out, [0.0; 4]);
        assert_eq!(st.track.as_ref().unwrap().pos, 0);
    }

    #[test]
    fn render_copies_then_reports_end() {
        let mut st = loaded(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 9);

        let mut out = [0.0_f32; 4];
        assert_eq!(st.render(&mut out), None);
        assert_eq!(out, [0.1, 0.2, 0.3, 0.4]);

        let mut out = [1.0_f32; 4];
        assert_eq!(st.render(&mut out), Some(9));
        assert_eq!(out, [0.5, 0.6, 0.0, 0.0]);
        assert!(!st.playing);

        // Nothing more after the end.
        let mut out = [1.0_f32; 2];
        assert_eq!(st.render(&mut out), None);
        assert_eq!(out, [0.0; 2]);
    }

    #[test]
    fn render_exact_buffer_boundary_reports_end_once() {
        let mut st = loaded(vec![0.25; 4], 2);
        let mut out = [0.0_f32; 4];
        assert_eq!(st.render(&mut out), Some(2));
        assert_eq!(st.render(&mut out), None);
    }

    #[test]
    fn empty_track_ends_immediately() {
        let mut st = loaded(Vec::new(), 5);
        let mut out = [1.0_f32; 2];
        assert_eq!(st.render(&mut out), Some(5));
        assert_eq!(out, [0.0; 2]);
    }
}
