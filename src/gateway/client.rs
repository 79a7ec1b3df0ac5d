//! Core `SpeechGateway` trait and the Gemini implementation.
//!
//! `GeminiGateway` calls the `generateContent` endpoint of the Gemini API
//! with an audio response modality and a prebuilt voice.  The model answers
//! with base64 PCM (16-bit LE, mono) as inline data; the gateway returns the
//! decoded bytes and the sample rate and leaves container work to
//! [`crate::audio::codec`].

use async_trait::async_trait;
use base64::Engine as _;
use thiserror::Error;

use crate::config::GatewayConfig;

use super::prompt::PromptBuilder;

/// Sample rate of Gemini TTS output when the response does not state one.
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// One speech request.  `text` is already trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    /// API voice id (e.g. `"Kore"`).
    pub voice_id: String,
    /// English language name (e.g. `"Italian"`).
    pub language: String,
}

/// Raw PCM returned by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSpeech {
    /// Signed 16-bit little-endian interleaved samples.
    pub samples: Vec<u8>,
    pub sample_rate: u32,
}

// ---------------------------------------------------------------------------
// GatewayError
// ---------------------------------------------------------------------------

/// Why a speech request produced no audio.
///
/// `Display` is the message shown to the user.  None of these are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No API key configured.  Detected before any network activity.
    #[error("API Key is missing. Please set the API_KEY environment variable.")]
    MissingCredentials,

    /// HTTP 429 or a `RESOURCE_EXHAUSTED` status from the API.
    #[error("API Quota Exceeded. You have reached the limit for the free tier or your billing plan. Please check your Google Cloud Console.")]
    QuotaExceeded,

    /// The response carried no inline audio.
    #[error("No audio data returned from the model.")]
    EmptyResponse,

    /// Transport failure, timeout, non-success status or unparseable body.
    #[error("{0}")]
    Transient(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Transient("Speech request timed out.".into())
        } else {
            GatewayError::Transient(format!("Speech request failed: {e}"))
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechGateway trait
// ---------------------------------------------------------------------------

/// Async trait for remote speech synthesis.
///
/// Implementors must be `Send + Sync` so the session can hold an
/// `Arc<dyn SpeechGateway>` and call it from spawned tasks.
#[async_trait]
pub trait SpeechGateway: Send + Sync {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<RawSpeech, GatewayError>;
}

// ---------------------------------------------------------------------------
// GeminiGateway
// ---------------------------------------------------------------------------

/// Calls `POST {base_url}/v1beta/models/{model}:generateContent`.
///
/// All connection details come from the [`GatewayConfig`] passed to
/// [`GeminiGateway::from_config`].
pub struct GeminiGateway {
    client: reqwest::Client,
    config: GatewayConfig,
    api_key: Option<String>,
}

impl GeminiGateway {
    /// Build a gateway from application config.
    ///
    /// The API key is resolved once here (config value, then the environment
    /// variable named by `api_key_env`).  A missing key is not an error yet;
    /// every request fails with [`GatewayError::MissingCredentials`] instead.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            log::warn!(
                "No API key configured (set [gateway] api_key or ${})",
                config.api_key_env
            );
        }

        Self {
            client,
            config: config.clone(),
            api_key,
        }
    }

    /// Whether requests can be attempted at all.
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl SpeechGateway for GeminiGateway {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<RawSpeech, GatewayError> {
        let key = self.api_key.as_deref().ok_or(GatewayError::MissingCredentials)?;

        let prompt = PromptBuilder::new(&request.language).build(&request.text);
        let body = request_body(&prompt, &request.voice_id);

        log::debug!(
            "gateway: requesting {} chars in {} with voice {}",
            request.text.chars().count(),
            request.language,
            request.voice_id
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;

        let speech = parse_response(status, &text, self.config.sample_rate)?;
        log::info!(
            "gateway: received {} bytes of PCM @ {} Hz",
            speech.samples.len(),
            speech.sample_rate
        );
        Ok(speech)
    }
}

// ---------------------------------------------------------------------------
// Wire format helpers
// ---------------------------------------------------------------------------

/// JSON body for a single-voice audio request.
pub fn request_body(prompt: &str, voice_id: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [
            { "parts": [ { "text": prompt } ] }
        ],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": {
                    "prebuiltVoiceConfig": { "voiceName": voice_id }
                }
            }
        }
    })
}

/// Interpret an HTTP status and body.
///
/// Quota exhaustion is checked before anything else so it is reported even
/// when the body is not JSON.
pub fn parse_response(
    status: u16,
    body: &str,
    default_rate: u32,
) -> Result<RawSpeech, GatewayError> {
    if status == 429 || body.contains("RESOURCE_EXHAUSTED") {
        log::warn!("gateway: quota exhausted (HTTP {status})");
        return Err(GatewayError::QuotaExceeded);
    }

    let json: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        if (200..300).contains(&status) {
            GatewayError::Transient(format!("Failed to parse speech response: {e}"))
        } else {
            GatewayError::Transient(format!("Speech request failed with HTTP {status}."))
        }
    })?;

    if !(200..300).contains(&status) {
        let detail = json["error"]["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(GatewayError::Transient(format!(
            "Speech request failed: {detail}"
        )));
    }

    let inline = json["candidates"][0]["content"]["parts"]
        .as_array()
        .and_then(|parts| parts.iter().find(|p| p["inlineData"]["data"].is_string()))
        .map(|p| &p["inlineData"]);

    let Some(inline) = inline else {
        return Err(GatewayError::EmptyResponse);
    };

    let data = inline["data"].as_str().unwrap_or_default();
    if data.is_empty() {
        return Err(GatewayError::EmptyResponse);
    }

    let samples = base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| GatewayError::Transient(format!("Invalid audio payload: {e}")))?;
    if samples.is_empty() {
        return Err(GatewayError::EmptyResponse);
    }

    let sample_rate = inline["mimeType"]
        .as_str()
        .and_then(rate_from_mime)
        .unwrap_or(default_rate);

    Ok(RawSpeech {
        samples,
        sample_rate,
    })
}

/// Extract `rate=<n>` from a mime type such as `audio/L16;codec=pcm;rate=24000`.
fn rate_from_mime(mime: &str) -> Option<u32> {
    mime.split(';')
        .filter_map(|part| part.trim().strip_prefix("rate="))
        .find_map(|v| v.trim().parse::<u32>().ok())
        .filter(|&r| r > 0)
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------

/// Scripted gateway for tests.
///
/// Returns a fixed result for every call and records each request.  When
/// built with [`gated`](MockGateway::gated) every call waits for
/// [`release`](MockGateway::release) first, which keeps a generation "in
/// flight" for as long as a test needs.
#[cfg(test)]
pub struct MockGateway {
    result: Result<RawSpeech, GatewayError>,
    requests: std::sync::Mutex<Vec<SpeechRequest>>,
    gate: Option<tokio::sync::Semaphore>,
}

#[cfg(test)]
impl MockGateway {
    pub fn returning(result: Result<RawSpeech, GatewayError>) -> Self {
        Self {
            result,
            requests: std::sync::Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// `bytes` of silence at 24 kHz.
    pub fn silence(bytes: usize) -> Self {
        Self::returning(Ok(RawSpeech {
            samples: vec![0u8; bytes],
            sample_rate: DEFAULT_SAMPLE_RATE,
        }))
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(tokio::sync::Semaphore::new(0));
        self
    }

    /// Let one gated call through.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn requests(&self) -> Vec<SpeechRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl SpeechGateway for MockGateway {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<RawSpeech, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.result.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config_without_key() -> GatewayConfig {
        GatewayConfig {
            api_key: None,
            api_key_env: "TTS_STUDIO_TEST_NO_SUCH_KEY".into(),
            // Unroutable; the test must fail before any connection is tried.
            base_url: "http://127.0.0.1:9".into(),
            ..GatewayConfig::default()
        }
    }

    fn audio_body(data: &str, mime: &str) -> String {
        serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{ "inlineData": { "mimeType": mime, "data": data } }]
                }
            }]
        })
        .to_string()
    }

    fn request() -> SpeechRequest {
        SpeechRequest {
            text: "Hello world".into(),
            voice_id: "Kore".into(),
            language: "English".into(),
        }
    }

    #[tokio::test]
    async fn missing_key_fails_before_network() {
        let gateway = GeminiGateway::from_config(&config_without_key());
        assert!(!gateway.has_credentials());

        let err = gateway.synthesize(&request()).await.unwrap_err();
        assert_eq!(err, GatewayError::MissingCredentials);
        assert_eq!(
            err.to_string(),
            "API Key is missing. Please set the API_KEY environment variable."
        );
    }

    #[test]
    fn configured_key_counts_as_credentials() {
        let config = GatewayConfig {
            api_key: Some("k".into()),
            ..config_without_key()
        };
        assert!(GeminiGateway::from_config(&config).has_credentials());
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        let config = GatewayConfig {
            base_url: "https://example.test/".into(),
            model: "m-tts".into(),
            ..config_without_key()
        };
        let gateway = GeminiGateway::from_config(&config);
        assert_eq!(
            gateway.endpoint(),
            "https://example.test/v1beta/models/m-tts:generateContent"
        );
    }

    #[test]
    fn request_body_carries_prompt_and_voice() {
        let body = request_body("say it", "Puck");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "say it");
        assert_eq!(body["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            body["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
                ["voiceName"],
            "Puck"
        );
    }

    #[test]
    fn parses_inline_audio() {
        // "AAEC/w==" is [0x00, 0x01, 0x02, 0xff].
        let body = audio_body("AAEC/w==", "audio/L16;codec=pcm;rate=24000");
        let speech = parse_response(200, &body, DEFAULT_SAMPLE_RATE).unwrap();
        assert_eq!(speech.samples, vec![0x00, 0x01, 0x02, 0xff]);
        assert_eq!(speech.sample_rate, 24_000);
    }

    #[test]
    fn mime_rate_overrides_default() {
        let body = audio_body("AAAAAA==", "audio/L16; rate=16000");
        let speech = parse_response(200, &body, DEFAULT_SAMPLE_RATE).unwrap();
        assert_eq!(speech.sample_rate, 16_000);
    }

    #[test]
    fn missing_or_bad_mime_rate_uses_default() {
        for mime in ["audio/L16", "audio/L16;rate=abc", "audio/L16;rate=0"] {
            let body = audio_body("AAAA", mime);
            let speech = parse_response(200, &body, 22_050).unwrap();
            assert_eq!(speech.sample_rate, 22_050, "mime {mime}");
        }
    }

    #[test]
    fn status_429_is_quota() {
        let err = parse_response(429, "Too Many Requests", DEFAULT_SAMPLE_RATE).unwrap_err();
        assert_eq!(err, GatewayError::QuotaExceeded);
        assert!(err.to_string().starts_with("API Quota Exceeded."));
    }

    #[test]
    fn resource_exhausted_body_is_quota() {
        let body = r#"{"error":{"code":400,"status":"RESOURCE_EXHAUSTED","message":"quota"}}"#;
        assert_eq!(
            parse_response(400, body, DEFAULT_SAMPLE_RATE).unwrap_err(),
            GatewayError::QuotaExceeded
        );
    }

    #[test]
    fn no_candidates_is_empty_response() {
        let err = parse_response(200, r#"{"candidates":[]}"#, DEFAULT_SAMPLE_RATE).unwrap_err();
        assert_eq!(err, GatewayError::EmptyResponse);
        assert_eq!(err.to_string(), "No audio data returned from the model.");
    }

    #[test]
    fn text_only_part_is_empty_response() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Here is the text"}]}}]}"#;
        assert_eq!(
            parse_response(200, body, DEFAULT_SAMPLE_RATE).unwrap_err(),
            GatewayError::EmptyResponse
        );
    }

    #[test]
    fn empty_data_is_empty_response() {
        let body = audio_body("", "audio/L16;rate=24000");
        assert_eq!(
            parse_response(200, &body, DEFAULT_SAMPLE_RATE).unwrap_err(),
            GatewayError::EmptyResponse
        );
    }

    #[test]
    fn invalid_base64_is_transient() {
        let body = audio_body("not base64!!", "audio/L16;rate=24000");
        assert!(matches!(
            parse_response(200, &body, DEFAULT_SAMPLE_RATE),
            Err(GatewayError::Transient(_))
        ));
    }

    #[test]
    fn server_error_is_transient_with_detail() {
        let body = r#"{"error":{"code":500,"message":"backend unavailable"}}"#;
        let err = parse_response(500, body, DEFAULT_SAMPLE_RATE).unwrap_err();
        assert_eq!(
            err,
            GatewayError::Transient("Speech request failed: backend unavailable".into())
        );
    }

    #[test]
    fn non_json_error_body_is_transient() {
        let err = parse_response(502, "<html>bad gateway</html>", DEFAULT_SAMPLE_RATE).unwrap_err();
        assert!(matches!(err, GatewayError::Transient(msg) if msg.contains("502")));
    }

    #[test]
    fn gateway_is_object_safe() {
        let gateway: Box<dyn SpeechGateway> =
            Box::new(GeminiGateway::from_config(&config_without_key()));
        drop(gateway);
    }
}
