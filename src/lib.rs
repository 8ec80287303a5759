pub mod api;
pub mod audio;
pub mod cli;
pub mod integration;
pub mod llm;
pub mod messages;
pub mod speech;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum YukkiError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Rate limited by the remote service")]
    RateLimited,

    #[error("Remote service unavailable")]
    Unavailable,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No API key configured")]
    MissingApiKey,

    #[error("Nothing to send")]
    EmptyInput,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio processing error: {0}")]
    AudioProcessing(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Channel error: {0}")]
    Channel(String),
}

impl From<std::io::Error> for YukkiError {
    fn from(e: std::io::Error) -> Self {
        YukkiError::Io(e.to_string())
    }
}

impl From<reqwest::Error> for YukkiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            YukkiError::InvalidResponse(e.to_string())
        } else {
            YukkiError::Network(e.to_string())
        }
    }
}

impl YukkiError {
    /// Whether the operation may be retried as-is
    pub fn is_retryable(&self) -> bool {
        matches!(self, YukkiError::RateLimited | YukkiError::Unavailable)
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            YukkiError::Http { .. } => true,
            YukkiError::RateLimited => true,
            YukkiError::Unavailable => true,
            YukkiError::Network(_) => true,
            YukkiError::InvalidResponse(_) => true,
            // Needs a config change before anything will work
            YukkiError::MissingApiKey => false,
            YukkiError::EmptyInput => true,
            YukkiError::Config(_) => false,
            YukkiError::Io(_) => false,
            YukkiError::AudioDevice(_) => false,
            YukkiError::AudioProcessing(_) => true,
            YukkiError::Transcription(_) => true,
            YukkiError::ModelLoad(_) => false,
            YukkiError::Channel(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            YukkiError::Http { status, .. } => {
                format!("The tutor service returned an error ({status}). Please try again.")
            }
            YukkiError::RateLimited => {
                "The tutor is busy right now. Please wait a moment and try again.".to_string()
            }
            YukkiError::Unavailable => {
                "The tutor service is temporarily unavailable. Please try again.".to_string()
            }
            YukkiError::Network(_) => {
                "Could not reach the tutor service. Check your connection.".to_string()
            }
            YukkiError::InvalidResponse(_) => {
                "The tutor sent an answer I couldn't read. Please try again.".to_string()
            }
            YukkiError::MissingApiKey => {
                "No API key is configured. Set GEMINI_API_KEY to enable the tutor.".to_string()
            }
            YukkiError::EmptyInput => {
                "Type a question or attach an image first.".to_string()
            }
            YukkiError::Config(_) => "Configuration error. Please check settings.".to_string(),
            YukkiError::Io(_) => "File system error occurred.".to_string(),
            YukkiError::AudioDevice(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            YukkiError::AudioProcessing(_) => {
                "Audio processing failed. Response will be shown as text.".to_string()
            }
            YukkiError::Transcription(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            YukkiError::ModelLoad(_) => {
                "Failed to load the speech model. Please verify the model file.".to_string()
            }
            YukkiError::Channel(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, YukkiError>;
