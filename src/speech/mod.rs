//! Speech processing
//!
//! - **tts**: hosted speech synthesis returning 16-bit PCM
//! - **stt**: local Whisper transcription for voice input (feature `voice-input`)

#[cfg(feature = "voice-input")]
pub mod stt;
pub mod tts;

#[cfg(feature = "voice-input")]
pub use stt::{WhisperConfig, WhisperEngine};
pub use tts::{TtsAudio, TtsClient};
