//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every section is `#[serde(default)]`, so a hand-edited file only needs the
//! keys it wants to change.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// GatewayConfig
// ---------------------------------------------------------------------------

/// Settings for the remote speech-generation API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the Gemini API.
    pub base_url: String,
    /// Model identifier used for speech generation.
    pub model: String,
    /// API key.  When `None` (or empty) the key is read from the
    /// environment variable named by `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: String,
    /// Sample rate assumed for returned PCM when the response does not say.
    pub sample_rate: u32,
    /// Maximum seconds to wait for a response before timing out.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            model: "gemini-2.5-flash-preview-tts".into(),
            api_key: None,
            api_key_env: "API_KEY".into(),
            sample_rate: 24_000,
            timeout_secs: 60,
        }
    }
}

impl GatewayConfig {
    /// The configured key, falling back to the environment.  Empty strings
    /// count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for decoding model output and for playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Interleaved channel count of the model's PCM stream.
    pub channels: u16,
    /// Start playing a clip as soon as it has been generated.
    pub auto_play: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            channels: 1,
            auto_play: true,
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryConfig
// ---------------------------------------------------------------------------

/// Settings for history downloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// File name prefix: downloads are saved as `<prefix>-<id>.wav`.
    pub download_prefix: String,
    /// Target directory.  `None` means the platform download directory.
    pub download_dir: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            download_prefix: "gemini-tts".into(),
            download_dir: None,
        }
    }
}

impl HistoryConfig {
    /// Where downloads go.
    pub fn resolve_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().downloads_dir)
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window appearance and initial selections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Voice id preselected on startup.
    pub default_voice: String,
    /// Language name preselected on startup.
    pub default_language: String,
    /// Initial window size `(width, height)` in points.
    pub window_size: (f32, f32),
    /// Maximum characters accepted in the text box.
    pub max_text_chars: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_voice: "Kore".into(),
            default_language: "English".into(),
            window_size: (520.0, 640.0),
            max_text_chars: 5_000,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use tts_studio::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote speech API settings.
    pub gateway: GatewayConfig,
    /// Decoding / playback settings.
    pub audio: AudioConfig,
    /// Download settings.
    pub history: HistoryConfig,
    /// UI settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.gateway.base_url, loaded.gateway.base_url);
        assert_eq!(original.gateway.model, loaded.gateway.model);
        assert_eq!(original.gateway.api_key, loaded.gateway.api_key);
        assert_eq!(original.gateway.sample_rate, loaded.gateway.sample_rate);
        assert_eq!(original.audio.channels, loaded.audio.channels);
        assert_eq!(original.audio.auto_play, loaded.audio.auto_play);
        assert_eq!(
            original.history.download_prefix,
            loaded.history.download_prefix
        );
        assert_eq!(original.ui.default_voice, loaded.ui.default_voice);
        assert_eq!(original.ui.window_size, loaded.ui.window_size);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.gateway.model, GatewayConfig::default().model);
        assert_eq!(config.audio.channels, 1);
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.gateway.model, "gemini-2.5-flash-preview-tts");
        assert_eq!(cfg.gateway.sample_rate, 24_000);
        assert_eq!(cfg.gateway.api_key_env, "API_KEY");
        assert!(cfg.gateway.api_key.is_none());
        assert_eq!(cfg.audio.channels, 1);
        assert!(cfg.audio.auto_play);
        assert_eq!(cfg.history.download_prefix, "gemini-tts");
        assert!(cfg.history.download_dir.is_none());
        assert_eq!(cfg.ui.default_voice, "Kore");
        assert_eq!(cfg.ui.default_language, "English");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[audio]\nchannels = 2\n").unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.audio.channels, 2);
        assert!(cfg.audio.auto_play);
        assert_eq!(cfg.gateway.sample_rate, 24_000);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.gateway.api_key = Some("test-key".into());
        cfg.gateway.timeout_secs = 5;
        cfg.history.download_dir = Some(PathBuf::from("/tmp/clips"));
        cfg.ui.default_language = "Italian".into();

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.gateway.api_key.as_deref(), Some("test-key"));
        assert_eq!(loaded.gateway.timeout_secs, 5);
        assert_eq!(loaded.history.download_dir, Some(PathBuf::from("/tmp/clips")));
        assert_eq!(loaded.ui.default_language, "Italian");
    }

    #[test]
    fn configured_key_wins_over_environment() {
        let cfg = GatewayConfig {
            api_key: Some("from-config".into()),
            api_key_env: "TTS_STUDIO_TEST_UNSET_VAR".into(),
            ..GatewayConfig::default()
        };
        assert_eq!(cfg.resolve_api_key().as_deref(), Some("from-config"));
    }

    #[test]
    fn blank_key_and_missing_env_resolve_to_none() {
        let cfg = GatewayConfig {
            api_key: Some("   ".into()),
            api_key_env: "TTS_STUDIO_TEST_UNSET_VAR".into(),
            ..GatewayConfig::default()
        };
        assert!(cfg.resolve_api_key().is_none());
    }

    #[test]
    fn explicit_download_dir_is_used() {
        let cfg = HistoryConfig {
            download_dir: Some(PathBuf::from("/tmp/out")),
            ..HistoryConfig::default()
        };
        assert_eq!(cfg.resolve_download_dir(), PathBuf::from("/tmp/out"));
    }
}
