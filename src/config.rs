use anyhow::Result;
use serde::Deserialize;

/// Top-level service configuration.
///
/// Values are layered: serde defaults, then an optional TOML file, then
/// `SCRIBE__`-prefixed environment variables (e.g. `SCRIBE__LLM__API_KEY`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub auth: AuthConfig,
    pub stt: SttConfig,
    pub llm: LlmConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for identity tokens. Override in any real deployment.
    pub token_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// WebSocket endpoint for realtime transcription.
    pub realtime_url: String,
    /// HTTP endpoint for batch transcription with diarization.
    pub batch_url: String,
    pub api_key: String,
    /// Realtime recognition model.
    pub model_id: String,
    /// Batch recognition model used at finalization.
    pub batch_model_id: String,
    /// PCM sample rate for both directions (16kHz mono, 16-bit).
    pub sample_rate: u32,
    /// Seconds of silence before the backend commits a segment.
    pub vad_silence_secs: f32,
    /// Voice-activity activation threshold (0.0 - 1.0).
    pub vad_threshold: f32,
    /// Language used when a session does not specify one.
    pub default_language: String,
    /// Upper bound on the batch transcription call.
    pub batch_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL (the `/chat/completions` suffix is appended).
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Upper bound on each correction/summary/title call.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// S3-compatible endpoint for recording uploads.
    pub endpoint: String,
    pub bucket: String,
    /// Base URL recordings are publicly served from.
    pub public_base_url: String,
    pub api_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            auth: AuthConfig::default(),
            stt: SttConfig::default(),
            llm: LlmConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: "change-me-in-production".to_string(),
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            realtime_url: "wss://api.elevenlabs.io/v1/speech-to-text/realtime".to_string(),
            batch_url: "https://api.elevenlabs.io/v1/speech-to-text".to_string(),
            api_key: String::new(),
            model_id: "scribe_v2_realtime".to_string(),
            batch_model_id: "scribe_v1".to_string(),
            sample_rate: 16000,
            vad_silence_secs: 1.0,
            vad_threshold: 0.3,
            default_language: "en".to_string(),
            batch_timeout_secs: 60,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 8,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            bucket: "scribe-recordings".to_string(),
            public_base_url: String::new(),
            api_key: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder =
                builder.add_source(config::File::with_name("config/scribe-live").required(false));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix("SCRIBE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
