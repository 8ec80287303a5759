//! Hosted chat completion client

use crate::api::{Content, GeminiHttp, GenerateResponse, RetryConfig};
use crate::integration::config::AppConfig;
use crate::llm::context::ConversationContext;
use crate::{Result, YukkiError};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

/// Sends the conversation to the chat model and returns its reply
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: GeminiHttp,
    model: String,
    temperature: f32,
}

impl ChatClient {
    pub fn new(http: GeminiHttp, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            http,
            model: model.into(),
            temperature,
        }
    }

    /// Build a client from the application config; requires an API key
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config.api_key().ok_or(YukkiError::MissingApiKey)?;
        let http = GeminiHttp::new(
            &config.chat.base_url,
            api_key,
            Duration::from_secs(config.http.timeout_secs),
            RetryConfig::from(&config.retry),
        )?;
        Ok(Self::new(http, &config.chat.model, config.chat.temperature))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, context: &ConversationContext) -> ChatRequest {
        let system_prompt = context.system_prompt();
        ChatRequest {
            system_instruction: (!system_prompt.trim().is_empty())
                .then(|| Content::from_text(system_prompt)),
            contents: context.contents(),
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }

    /// Ask the model for the next assistant turn.
    ///
    /// The context is expected to end with the pending user turn.
    pub async fn send(&self, context: &ConversationContext) -> Result<String> {
        if context.message_count() == 0 {
            return Err(YukkiError::EmptyInput);
        }

        let start = Instant::now();
        let request = self.build_request(context);
        debug!(
            "Chat request: model={}, {} messages",
            self.model,
            request.contents.len()
        );

        let value = self
            .http
            .post_json(&self.http.generate_url(&self.model), &request, "chat")
            .await?;
        let reply = GenerateResponse::from_value(value)?.text()?;

        info!(
            "Chat reply: {} chars in {:.2}s",
            reply.chars().count(),
            start.elapsed().as_secs_f64()
        );
        Ok(reply)
    }
}
