//! TTS studio window: egui/eframe application.
//!
//! # Architecture
//!
//! [`StudioApp`] is the top-level [`eframe::App`].  It owns only form state
//! (text, selected voice and language) and two links to the session:
//!
//! * `command_tx`: sends [`SessionCommand`]s to the orchestrator.
//! * `state`: [`SharedState`] written by the orchestrator and read
//!   here once per frame.
//!
//! # Layout
//!
//! | Section | Contents |
//! |---------|----------|
//! | Input   | multi-line text box, voice and language combo boxes |
//! | Action  | Generate button (disabled while generating), spinner |
//! | Status  | error message (orange), last download path (gray) |
//! | History | newest first; play/pause, download and delete per clip |

use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::gateway::{find_language, find_voice, LANGUAGES, VOICES};
use crate::history::HistoryEntry;
use crate::playback::PlaybackState;
use crate::session::{lock_state, SessionCommand, SharedState};

/// Characters of a clip's text shown in the history list.
const PREVIEW_CHARS: usize = 80;

const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 136, 68);
const MUTED_COLOR: egui::Color32 = egui::Color32::from_rgb(140, 140, 140);
const PLAYING_COLOR: egui::Color32 = egui::Color32::from_rgb(80, 200, 120);

// ---------------------------------------------------------------------------
// StudioApp
// ---------------------------------------------------------------------------

/// The application window.
pub struct StudioApp {
    // ── Form ─────────────────────────────────────────────────────────────
    text: String,
    voice_id: String,
    language: String,
    max_text_chars: usize,

    // ── Session link ─────────────────────────────────────────────────────
    state: SharedState,
    command_tx: mpsc::Sender<SessionCommand>,
}

impl StudioApp {
    /// Create the window state.
    ///
    /// Initial selections come from `[ui]`; names missing from the catalogs
    /// fall back to the first entry.
    pub fn new(state: SharedState, command_tx: mpsc::Sender<SessionCommand>, config: &AppConfig) -> Self {
        let voice_id = find_voice(&config.ui.default_voice)
            .or(VOICES.first())
            .map(|v| v.id.to_string())
            .unwrap_or_default();
        let language = find_language(&config.ui.default_language)
            .or(LANGUAGES.first())
            .map(|l| l.name.to_string())
            .unwrap_or_default();

        Self {
            text: String::new(),
            voice_id,
            language,
            max_text_chars: config.ui.max_text_chars,
            state,
            command_tx,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────────

    fn send(&self, command: SessionCommand) {
        // Full or closed channel: the session is busy or gone, drop the click.
        if let Err(e) = self.command_tx.try_send(command) {
            log::warn!("ui: command not delivered: {e}");
        }
    }

    /// Generate is offered only for non-blank text while nothing is in flight.
    fn can_generate(&self, generating: bool) -> bool {
        !generating && !self.text.trim().is_empty()
    }

    fn generate_command(&self) -> SessionCommand {
        SessionCommand::Generate {
            text: self.text.clone(),
            voice_id: self.voice_id.clone(),
            language: self.language.clone(),
        }
    }

    // ── Sections ─────────────────────────────────────────────────────────

    fn draw_input(&mut self, ui: &mut egui::Ui) {
        ui.add(
            egui::TextEdit::multiline(&mut self.text)
                .hint_text("Type the text to read aloud…")
                .char_limit(self.max_text_chars)
                .desired_rows(5)
                .desired_width(f32::INFINITY),
        );
        ui.label(
            egui::RichText::new(format!(
                "{} / {}",
                self.text.chars().count(),
                self.max_text_chars
            ))
            .size(11.0)
            .color(MUTED_COLOR),
        );

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.label("Voice");
            let selected = find_voice(&self.voice_id)
                .map(|v| v.display_label())
                .unwrap_or_else(|| self.voice_id.clone());
            egui::ComboBox::from_id_salt("voice")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for voice in VOICES {
                        ui.selectable_value(
                            &mut self.voice_id,
                            voice.id.to_string(),
                            voice.display_label(),
                        );
                    }
                });

            ui.add_space(8.0);
            ui.label("Language");
            let selected = find_language(&self.language)
                .map(|l| l.display_label())
                .unwrap_or_else(|| self.language.clone());
            egui::ComboBox::from_id_salt("language")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for lang in LANGUAGES {
                        ui.selectable_value(
                            &mut self.language,
                            lang.name.to_string(),
                            lang.display_label(),
                        );
                    }
                });
        });
    }

    fn draw_actions(&self, ui: &mut egui::Ui, generating: bool) {
        ui.horizontal(|ui| {
            let button = egui::Button::new(if generating { "Generating…" } else { "Generate speech" });
            if ui.add_enabled(self.can_generate(generating), button).clicked() {
                self.send(self.generate_command());
            }
            if generating {
                ui.spinner();
            }
        });
    }

    fn draw_status(&self, ui: &mut egui::Ui, error: Option<&str>, download: Option<&std::path::Path>) {
        if let Some(message) = error {
            ui.label(egui::RichText::new(message).color(ERROR_COLOR));
        }
        if let Some(path) = download {
            ui.label(
                egui::RichText::new(format!("Saved {}", path.display()))
                    .size(11.0)
                    .color(MUTED_COLOR),
            );
        }
    }

    fn draw_history(&self, ui: &mut egui::Ui, history: &[HistoryEntry], playback: PlaybackState) {
        ui.horizontal(|ui| {
            ui.heading("History");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add_enabled(!history.is_empty(), egui::Button::new("Clear all"))
                    .clicked()
                {
                    self.send(SessionCommand::ClearHistory);
                }
            });
        });

        if history.is_empty() {
            ui.label(egui::RichText::new("No clips yet.").color(MUTED_COLOR));
            return;
        }

        egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            for entry in history {
                if let Some(command) = draw_entry(ui, entry, playback.is_playing(entry.id)) {
                    self.send(command);
                }
                ui.add_space(4.0);
            }
        });
    }
}

/// One history row.  Returns the command the user clicked, if any.
fn draw_entry(ui: &mut egui::Ui, entry: &HistoryEntry, playing: bool) -> Option<SessionCommand> {
    let mut command = None;
    ui.group(|ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            let (icon, color) = if playing {
                ("⏸", PLAYING_COLOR)
            } else {
                ("▶", egui::Color32::from_rgb(200, 200, 200))
            };
            if ui
                .button(egui::RichText::new(icon).color(color))
                .on_hover_text(if playing { "Pause" } else { "Play" })
                .clicked()
            {
                command = Some(SessionCommand::Play(entry.id));
            }

            ui.vertical(|ui| {
                ui.label(preview(&entry.text, PREVIEW_CHARS));
                ui.label(
                    egui::RichText::new(meta_line(entry))
                        .size(11.0)
                        .color(MUTED_COLOR),
                );
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("🗑").on_hover_text("Delete").clicked() {
                    command = Some(SessionCommand::Delete(entry.id));
                }
                if ui.button("⬇").on_hover_text("Download .wav").clicked() {
                    command = Some(SessionCommand::Download(entry.id));
                }
            });
        });
    });
    command
}

/// `text` cut to `max` characters with an ellipsis.
fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push('…');
    cut
}

/// `"Kore · English · 0:01 · 14:03:22"`
fn meta_line(entry: &HistoryEntry) -> String {
    format!(
        "{} · {} · {} · {}",
        entry.voice_name,
        entry.language,
        entry.duration_label(),
        entry.created_label()
    )
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for StudioApp {
    /// Called every frame by eframe.  Snapshots the shared state, then
    /// renders; commands are sent as widgets are clicked.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let (history, playback, generating, error, download) = {
            let st = lock_state(&self.state);
            (
                st.history.clone(),
                st.playback,
                st.generating,
                st.error_message.clone(),
                st.last_download.clone(),
            )
        };

        // The session updates state from other threads; poll faster while
        // something is changing.
        let repaint = if generating || playback != PlaybackState::Idle {
            Duration::from_millis(100)
        } else {
            Duration::from_millis(500)
        };
        ctx.request_repaint_after(repaint);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Gemini TTS Studio");
            ui.add_space(6.0);

            self.draw_input(ui);
            ui.add_space(6.0);
            self.draw_actions(ui, generating);
            self.draw_status(ui, error.as_deref(), download.as_deref());

            ui.separator();
            self.draw_history(ui, &history, playback);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("TTS studio window closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
