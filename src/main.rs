//! Application entry point: TTS studio.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the speech gateway ([`GeminiGateway`]) from config.
//! 5. Open the audio output (falls back to a silent engine without a device).
//! 6. Spawn the session orchestrator on the tokio runtime.
//! 7. Run [`eframe::run_native`]: blocks the main thread until the window
//!    is closed.  Closing drops the command sender, which ends the session.

use std::sync::Arc;

use eframe::egui;
use tokio::sync::mpsc;
use tts_studio::{
    app::StudioApp,
    audio::CpalEngine,
    config::AppConfig,
    gateway::{GeminiGateway, SpeechGateway},
    playback::{NullEngine, PlaybackEngine},
    session::{new_shared_state, SessionCommand, SessionOrchestrator},
};

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let vp = egui::ViewportBuilder::default()
        .with_title("Gemini TTS Studio")
        .with_inner_size([width, height])
        .with_min_inner_size([380.0, 420.0]);

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("TTS studio starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (2 worker threads: session loop + speech requests)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Speech gateway
    let gateway: Arc<dyn SpeechGateway> = Arc::new(GeminiGateway::from_config(&config.gateway));

    // 5. Audio output (may fail on headless hosts; degrade gracefully)
    let (ended_tx, ended_rx) = mpsc::unbounded_channel();
    let engine: Box<dyn PlaybackEngine> = match CpalEngine::new(ended_tx) {
        Ok(engine) => Box::new(engine),
        Err(e) => {
            log::warn!("Audio output unavailable ({e}); clips will be generated but not heard");
            Box::new(NullEngine::new())
        }
    };

    // 6. Session orchestrator
    let state = new_shared_state(config.clone());
    let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(32);
    let orchestrator = SessionOrchestrator::new(Arc::clone(&state), &config, gateway, engine);
    rt.spawn(orchestrator.run(command_rx, ended_rx));

    // 7. Build the egui app and run it (blocks until the window is closed)
    let app = StudioApp::new(state, command_tx, &config);
    let options = native_options(&config);

    eframe::run_native(
        "Gemini TTS Studio",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
