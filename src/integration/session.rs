//! One tutoring turn: chat reply plus optional spoken audio

use crate::integration::config::AppConfig;
use crate::llm::context::{Attachment, ConversationContext};
use crate::llm::prompts::{SYSTEM_PROMPT, UNAVAILABLE_MESSAGE};
use crate::llm::ChatClient;
use crate::speech::tts::{TtsAudio, TtsClient};
use crate::{Result, YukkiError};
use tracing::{debug, info, warn};

/// What the learner sent
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserTurn {
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl UserTurn {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.attachment.is_none()
    }
}

/// The tutor's answer to a turn
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    pub reply: String,
    /// Spoken reply, when speech is enabled and synthesis succeeded
    pub audio: Option<TtsAudio>,
}

/// Conversation state plus the hosted clients
pub struct TutorSession {
    context: ConversationContext,
    chat: Option<ChatClient>,
    tts: Option<TtsClient>,
}

impl TutorSession {
    /// Build a session. Without an API key the session only answers with
    /// the unavailable message.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let system_prompt = config
            .chat
            .system_prompt
            .clone()
            .unwrap_or_else(|| SYSTEM_PROMPT.to_string());

        let (chat, tts) = if config.api_key().is_some() {
            let chat = ChatClient::from_config(config)?;
            let tts = if config.tts.enabled {
                Some(TtsClient::from_config(config)?)
            } else {
                None
            };
            info!(
                "Tutor session ready (model {}, speech {})",
                chat.model(),
                if tts.is_some() { "on" } else { "off" }
            );
            (Some(chat), tts)
        } else {
            warn!("No API key configured; the tutor is unavailable");
            (None, None)
        };

        Ok(Self {
            context: ConversationContext::new(system_prompt),
            chat,
            tts,
        })
    }

    /// Whether a chat client is configured
    pub fn is_available(&self) -> bool {
        self.chat.is_some()
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    /// Send a turn and collect the reply.
    ///
    /// A failed chat call leaves the history as it was before the turn.
    pub async fn handle_turn(&mut self, turn: UserTurn) -> Result<TurnOutcome> {
        if turn.is_empty() {
            return Err(YukkiError::EmptyInput);
        }

        let Some(chat) = &self.chat else {
            debug!("Turn answered with the unavailable message");
            return Ok(TurnOutcome {
                reply: UNAVAILABLE_MESSAGE.to_string(),
                audio: None,
            });
        };

        self.context
            .add_user_turn(turn.text.trim(), turn.attachment);

        let reply = match chat.send(&self.context).await {
            Ok(reply) => reply,
            Err(e) => {
                self.context.discard_pending_user_turn();
                return Err(e);
            }
        };
        self.context.add_assistant_message(reply.clone());

        let audio = match &self.tts {
            Some(tts) => match tts.synthesize(&reply).await {
                Ok(audio) => Some(audio),
                Err(e) => {
                    warn!("Speech synthesis failed, showing text only: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(TurnOutcome { reply, audio })
    }

    /// Forget the conversation
    pub fn reset(&mut self) {
        self.context.clear();
        debug!("Conversation history cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CHAT_PATH: &str = "/models/gemini-2.5-flash:generateContent";
    const TTS_PATH: &str = "/models/gemini-2.5-flash-preview-tts:generateContent";

    fn config(server: &MockServer) -> AppConfig {
        let mut config = AppConfig::default()
            .with_api_key("test-key")
            .with_base_url(server.uri());
        config.retry.base_delay_ms = 1;
        config.retry.max_attempts = 2;
        config
    }

    async fn mount_chat(server: &MockServer, text: &str) {
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
            })))
            .mount(server)
            .await;
    }

    async fn mount_tts(server: &MockServer, pcm: &[u8]) {
        Mock::given(method("POST"))
            .and(path(TTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"inlineData": {
                    "mimeType": "audio/L16;codec=pcm;rate=24000",
                    "data": STANDARD.encode(pcm)
                }}]}}]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_unavailable_without_key() {
        let mut session = TutorSession::new(&AppConfig::default()).unwrap();
        assert!(!session.is_available());

        let outcome = session.handle_turn(UserTurn::text("hello")).await.unwrap();
        assert_eq!(outcome.reply, UNAVAILABLE_MESSAGE);
        assert!(outcome.audio.is_none());
        assert_eq!(session.context().message_count(), 0);
    }

    #[tokio::test]
    async fn test_reply_with_audio() {
        let server = MockServer::start().await;
        mount_chat(&server, "Think about what 2 groups of 3 look like.").await;
        mount_tts(&server, &[0, 0, 1, 0]).await;

        let mut session = TutorSession::new(&config(&server)).unwrap();
        let outcome = session.handle_turn(UserTurn::text("What is 2x3?")).await.unwrap();

        assert_eq!(outcome.reply, "Think about what 2 groups of 3 look like.");
        let audio = outcome.audio.unwrap();
        assert_eq!(audio.sample_rate, 24000);
        assert_eq!(audio.pcm, vec![0, 0, 1, 0]);
        assert_eq!(session.context().message_count(), 2);
    }

    #[tokio::test]
    async fn test_tts_failure_keeps_reply() {
        let server = MockServer::start().await;
        mount_chat(&server, "A verb is an action word.").await;
        Mock::given(method("POST"))
            .and(path(TTS_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut session = TutorSession::new(&config(&server)).unwrap();
        let outcome = session.handle_turn(UserTurn::text("What is a verb?")).await.unwrap();

        assert_eq!(outcome.reply, "A verb is an action word.");
        assert!(outcome.audio.is_none());
    }

    #[tokio::test]
    async fn test_speech_disabled_skips_tts() {
        let server = MockServer::start().await;
        mount_chat(&server, "Hi!").await;
        Mock::given(method("POST"))
            .and(path(TTS_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut session = TutorSession::new(&config(&server).without_speech()).unwrap();
        let outcome = session.handle_turn(UserTurn::text("Hello")).await.unwrap();
        assert!(outcome.audio.is_none());
    }

    #[tokio::test]
    async fn test_chat_failure_rolls_back_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let mut session = TutorSession::new(&config(&server)).unwrap();
        let err = session.handle_turn(UserTurn::text("Hello")).await.unwrap_err();

        assert_eq!(err, YukkiError::RateLimited);
        assert_eq!(session.context().message_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_turn_is_rejected() {
        let mut session = TutorSession::new(&AppConfig::default()).unwrap();
        let err = session.handle_turn(UserTurn::text("   ")).await.unwrap_err();
        assert_eq!(err, YukkiError::EmptyInput);
    }

    #[tokio::test]
    async fn test_image_turn_and_reset() {
        let server = MockServer::start().await;
        mount_chat(&server, "That's a triangle!").await;

        let mut session = TutorSession::new(&config(&server).without_speech()).unwrap();
        let turn = UserTurn::text("").with_attachment(Attachment::new("image/png", vec![1, 2]));
        session.handle_turn(turn).await.unwrap();

        let first = &session.context().history()[0];
        assert_eq!(first.attachment.as_ref().unwrap().mime_type, "image/png");

        session.reset();
        assert_eq!(session.context().message_count(), 0);
    }

    #[test]
    fn test_custom_system_prompt() {
        let mut config = AppConfig::default();
        config.chat.system_prompt = Some("Only math.".into());
        let session = TutorSession::new(&config).unwrap();
        assert_eq!(session.context().system_prompt(), "Only math.");
    }
}
