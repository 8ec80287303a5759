//! Speech-to-text with Whisper for voice input

use crate::audio::resampler::RECOGNIZER_SAMPLE_RATE;
use crate::integration::config::SpeechConfig;
use crate::{Result, YukkiError};
use std::path::PathBuf;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Configuration for the Whisper speech-to-text engine
#[derive(Clone, Debug)]
pub struct WhisperConfig {
    /// Path to the Whisper model file
    pub model_path: PathBuf,

    /// Language to transcribe (None for auto-detection)
    pub language: Option<String>,

    /// Number of threads to use for transcription
    pub n_threads: i32,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self::from(&SpeechConfig::default())
    }
}

impl From<&SpeechConfig> for WhisperConfig {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            model_path: config.model_path.clone(),
            language: config.language.clone(),
            n_threads: config.n_threads.max(1),
        }
    }
}

/// Whisper speech-to-text engine
pub struct WhisperEngine {
    config: WhisperConfig,
    context: WhisperContext,
}

impl WhisperEngine {
    /// Load the model named in `config`
    pub fn new(config: WhisperConfig) -> Result<Self> {
        info!("Loading Whisper model from: {:?}", config.model_path);

        if !config.model_path.exists() {
            return Err(YukkiError::ModelLoad(format!(
                "Model file not found: {:?}",
                config.model_path
            )));
        }

        let ctx = WhisperContext::new_with_params(
            config
                .model_path
                .to_str()
                .ok_or_else(|| YukkiError::ModelLoad("Invalid model path".to_string()))?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| YukkiError::ModelLoad(format!("Failed to load Whisper model: {:?}", e)))?;

        info!("Whisper model loaded successfully");

        Ok(Self {
            config,
            context: ctx,
        })
    }

    /// Transcribe mono f32 samples at 16 kHz
    pub fn transcribe(&self, samples: &[f32]) -> Result<String> {
        if samples.is_empty() {
            return Err(YukkiError::Transcription("Empty audio segment".to_string()));
        }

        debug!(
            "Transcribing {} samples ({:.2}s)",
            samples.len(),
            samples.len() as f64 / RECOGNIZER_SAMPLE_RATE as f64
        );

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.config.n_threads);
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        if let Some(ref lang) = self.config.language {
            params.set_language(Some(lang));
        }

        let mut state = self
            .context
            .create_state()
            .map_err(|e| YukkiError::Transcription(format!("Failed to create state: {:?}", e)))?;

        state
            .full(params, samples)
            .map_err(|e| YukkiError::Transcription(format!("Transcription failed: {:?}", e)))?;

        let num_segments = state
            .full_n_segments()
            .map_err(|e| YukkiError::Transcription(format!("Failed to get segments: {:?}", e)))?;

        let mut text = String::new();
        for i in 0..num_segments {
            let segment_text = state.full_get_segment_text(i).map_err(|e| {
                YukkiError::Transcription(format!("Failed to get segment text: {:?}", e))
            })?;
            text.push_str(&segment_text);
        }

        let text = text.trim().to_string();
        debug!("Transcription result: '{}'", text);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings() {
        let config = WhisperConfig::default();
        assert_eq!(config.language.as_deref(), Some("ja"));
        assert_eq!(config.n_threads, 4);
    }

    #[test]
    fn test_missing_model() {
        let config = WhisperConfig {
            model_path: PathBuf::from("/nonexistent/ggml.bin"),
            ..WhisperConfig::default()
        };
        assert!(matches!(
            WhisperEngine::new(config),
            Err(YukkiError::ModelLoad(_))
        ));
    }
}
