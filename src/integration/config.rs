//! Application configuration
//!
//! Loaded from a TOML file; every field has a default so a missing file or a
//! partial file both work. The API key may also come from `GEMINI_API_KEY`.

use crate::{Result, YukkiError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable holding the hosted API credential
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Hosted API root shared by chat and TTS
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Complete application configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Credential for the hosted endpoints (None disables the tutor)
    pub api_key: Option<String>,
    pub chat: ChatConfig,
    pub tts: TtsConfig,
    pub retry: RetrySettings,
    pub http: HttpSettings,
    pub avatar: AvatarConfig,
    pub speech: SpeechConfig,
}

/// Chat completion settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Replaces the built-in tutoring instruction when set
    pub system_prompt: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.2,
            system_prompt: None,
        }
    }
}

/// Speech synthesis settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TtsConfig {
    /// Speak assistant replies aloud
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub voice: String,
    /// Used when the response MIME type carries no rate
    pub default_sample_rate: u32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Kore".to_string(),
            default_sample_rate: 24000,
        }
    }
}

/// Backoff policy for throttled requests
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1000,
            max_delay_ms: 16000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

/// Where to find the avatar images
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AvatarConfig {
    pub directory: PathBuf,
    /// File stem of the resting image
    pub idle_name: String,
    /// File stem of the mouth-open image used while speaking
    pub talking_name: String,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            idle_name: "yukki-static".to_string(),
            talking_name: "yukki-talk".to_string(),
        }
    }
}

/// Local speech recognition settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    pub model_path: PathBuf,
    /// Recognition language (None for auto-detection)
    pub language: Option<String>,
    pub n_threads: i32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.bin"),
            language: Some("ja".to_string()),
            n_threads: 4,
        }
    }
}

impl AppConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| YukkiError::Config(format!("Invalid config: {}", e)))
    }

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            YukkiError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Default config file location (`<config dir>/yukki/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("yukki").join("config.toml"))
    }

    /// Resolve the configuration the application runs with.
    ///
    /// An explicit path must exist; the default location is optional. The
    /// environment key, when set and non-empty, overrides the file.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(path)?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_key(std::env::var(API_KEY_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply an API key taken from the environment
    pub fn apply_env_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key.trim().to_string());
        }
    }

    /// The configured key, ignoring blank values
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Point both hosted clients at another root (used against mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.chat.base_url = base_url.clone();
        self.tts.base_url = base_url;
        self
    }

    /// Text-only mode
    pub fn without_speech(mut self) -> Self {
        self.tts.enabled = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(YukkiError::Config(format!(
                "chat.temperature must be within 0.0..=2.0, got {}",
                self.chat.temperature
            )));
        }
        if self.chat.model.trim().is_empty() {
            return Err(YukkiError::Config("chat.model must not be empty".into()));
        }
        if self.tts.model.trim().is_empty() || self.tts.voice.trim().is_empty() {
            return Err(YukkiError::Config(
                "tts.model and tts.voice must not be empty".into(),
            ));
        }
        if self.tts.default_sample_rate == 0 {
            return Err(YukkiError::Config(
                "tts.default_sample_rate must be greater than 0".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(YukkiError::Config(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
