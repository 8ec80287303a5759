//! Text-to-speech through the hosted speech model
//!
//! The endpoint returns base64 little-endian 16-bit mono PCM together with a
//! MIME type such as `audio/L16;codec=pcm;rate=24000`.

use crate::api::{Content, GeminiHttp, GenerateResponse, RetryConfig};
use crate::audio::mime::{is_linear16, sample_rate_from_mime};
use crate::audio::wav::{pcm_samples, pcm_to_wav};
use crate::integration::config::AppConfig;
use crate::{Result, YukkiError};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechRequest<'a> {
    contents: Vec<Content>,
    generation_config: SpeechGenerationConfig<'a>,
    model: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechGenerationConfig<'a> {
    response_modalities: [&'a str; 1],
    speech_config: SpeechConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig<'a> {
    voice_name: &'a str,
}

/// Synthesized speech: raw PCM plus its sample rate
#[derive(Clone, Debug, PartialEq)]
pub struct TtsAudio {
    /// Little-endian 16-bit mono samples
    pub pcm: Vec<u8>,
    pub sample_rate: u32,
}

impl TtsAudio {
    pub fn new(pcm: Vec<u8>, sample_rate: u32) -> Self {
        Self { pcm, sample_rate }
    }

    /// Frame the PCM as a playable WAV file
    pub fn to_wav(&self) -> Result<Vec<u8>> {
        pcm_to_wav(&self.pcm, self.sample_rate)
    }

    pub fn samples(&self) -> Result<Vec<i16>> {
        pcm_samples(&self.pcm)
    }

    /// Playback length
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = (self.pcm.len() / 2) as f64;
        Duration::from_secs_f64(frames / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }
}

/// Client for the hosted speech synthesis model
#[derive(Debug, Clone)]
pub struct TtsClient {
    http: GeminiHttp,
    model: String,
    voice: String,
    default_sample_rate: u32,
}

impl TtsClient {
    pub fn new(
        http: GeminiHttp,
        model: impl Into<String>,
        voice: impl Into<String>,
        default_sample_rate: u32,
    ) -> Self {
        Self {
            http,
            model: model.into(),
            voice: voice.into(),
            default_sample_rate,
        }
    }

    /// Build a client from the application config; requires an API key
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config.api_key().ok_or(YukkiError::MissingApiKey)?;
        let http = GeminiHttp::new(
            &config.tts.base_url,
            api_key,
            Duration::from_secs(config.http.timeout_secs),
            RetryConfig::from(&config.retry),
        )?;
        Ok(Self::new(
            http,
            &config.tts.model,
            &config.tts.voice,
            config.tts.default_sample_rate,
        ))
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    fn build_request<'a>(&'a self, text: &str) -> SpeechRequest<'a> {
        SpeechRequest {
            contents: vec![Content::from_text(text)],
            generation_config: SpeechGenerationConfig {
                response_modalities: ["AUDIO"],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: &self.voice,
                        },
                    },
                },
            },
            model: &self.model,
        }
    }

    /// Synthesize `text` into PCM audio
    pub async fn synthesize(&self, text: &str) -> Result<TtsAudio> {
        if text.trim().is_empty() {
            return Err(YukkiError::AudioProcessing(
                "Cannot synthesize empty text".into(),
            ));
        }

        let start = Instant::now();
        debug!(
            "TTS request: model={}, voice={}, {} chars",
            self.model,
            self.voice,
            text.chars().count()
        );

        let value = self
            .http
            .post_json(&self.http.generate_url(&self.model), &self.build_request(text), "tts")
            .await?;
        let response = GenerateResponse::from_value(value)?;
        let inline = response.inline_data()?;
        if !is_linear16(&inline.mime_type) {
            return Err(YukkiError::InvalidResponse(format!(
                "Expected audio/L16, got '{}'",
                inline.mime_type
            )));
        }
        let pcm = inline.decode()?;

        if pcm.len() % 2 != 0 {
            return Err(YukkiError::InvalidResponse(format!(
                "Audio payload has odd length {}",
                pcm.len()
            )));
        }

        let sample_rate = match sample_rate_from_mime(&inline.mime_type) {
            Some(rate) => rate,
            None => {
                warn!(
                    "No sample rate in MIME type '{}', assuming {} Hz",
                    inline.mime_type, self.default_sample_rate
                );
                self.default_sample_rate
            }
        };

        let audio = TtsAudio::new(pcm, sample_rate);
        info!(
            "Synthesized {:.2}s of audio at {} Hz in {:.2}s",
            audio.duration().as_secs_f64(),
            sample_rate,
            start.elapsed().as_secs_f64()
        );
        Ok(audio)
    }
}
