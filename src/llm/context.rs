//! Conversation context for the chat endpoint
//!
//! Holds the system instruction and the ordered history of turns. History
//! only grows; `clear` starts a fresh session.

use crate::api::types::{Content, Part};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in the conversation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Role name on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "model",
        }
    }
}

/// Binary attachment sent inline with a user turn
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// A single message in the conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachment: None,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn with_attachment(mut self, attachment: Option<Attachment>) -> Self {
        self.attachment = attachment;
        self
    }

    /// Wire form: text part (when non-empty) followed by the attachment
    pub fn to_content(&self) -> Content {
        let mut parts = Vec::with_capacity(2);
        if !self.content.is_empty() {
            parts.push(Part::text(self.content.clone()));
        }
        if let Some(attachment) = &self.attachment {
            parts.push(Part::inline(attachment.mime_type.clone(), &attachment.data));
        }

        Content {
            role: Some(self.role.as_str().to_string()),
            parts,
        }
    }
}

/// The system instruction plus conversation history
#[derive(Clone, Debug)]
pub struct ConversationContext {
    system_prompt: String,
    messages: Vec<ConversationMessage>,
}

impl ConversationContext {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: Vec::new(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Append a user turn, optionally with an inline attachment
    pub fn add_user_turn(&mut self, text: impl Into<String>, attachment: Option<Attachment>) {
        self.messages
            .push(ConversationMessage::user(text).with_attachment(attachment));
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.messages.push(ConversationMessage::assistant(content));
    }

    /// Drop the newest message if it is an unanswered user turn
    pub(crate) fn discard_pending_user_turn(&mut self) -> Option<ConversationMessage> {
        match self.messages.last() {
            Some(m) if m.role == MessageRole::User => self.messages.pop(),
            _ => None,
        }
    }

    pub fn history(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// History in wire form
    pub fn contents(&self) -> Vec<Content> {
        self.messages.iter().map(ConversationMessage::to_content).collect()
    }

    pub fn last_user_message(&self) -> Option<&ConversationMessage> {
        self.messages.iter().rev().find(|m| m.role == MessageRole::User)
    }

    pub fn last_assistant_message(&self) -> Option<&ConversationMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Start over with an empty history
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Export conversation to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.messages)
    }

    /// Replace the history with messages exported by `to_json`
    pub fn from_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        self.messages = serde_json::from_str(json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(MessageRole::User.as_str(), "user");
        assert_eq!(MessageRole::Assistant.as_str(), "model");
    }

    #[test]
    fn test_add_messages_in_order() {
        let mut ctx = ConversationContext::new("System prompt");
        ctx.add_user_turn("Hello", None);
        ctx.add_assistant_message("Hi there!");
        ctx.add_user_turn("What is a prime?", None);

        assert_eq!(ctx.message_count(), 3);
        let contents = ctx.contents();
        assert_eq!(contents[0].role.as_deref(), Some("user"));
        assert_eq!(contents[1].role.as_deref(), Some("model"));
        assert_eq!(contents[2].parts[0].text.as_deref(), Some("What is a prime?"));
    }

    #[test]
    fn test_attachment_becomes_inline_part() {
        let msg = ConversationMessage::user("What is this?")
            .with_attachment(Some(Attachment::new("image/png", vec![0x89, 0x50])));
        let content = msg.to_content();

        assert_eq!(content.parts.len(), 2);
        let inline = content.parts[1].inline_data.as_ref().unwrap();
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.decode().unwrap(), vec![0x89, 0x50]);
    }

    #[test]
    fn test_image_only_turn_has_no_empty_text() {
        let msg = ConversationMessage::user("")
            .with_attachment(Some(Attachment::new("image/jpeg", vec![1])));
        let content = msg.to_content();
        assert_eq!(content.parts.len(), 1);
        assert!(content.parts[0].text.is_none());
    }

    #[test]
    fn test_discard_pending_user_turn() {
        let mut ctx = ConversationContext::new("System");
        ctx.add_user_turn("Q1", None);
        ctx.add_assistant_message("A1");
        assert!(ctx.discard_pending_user_turn().is_none());

        ctx.add_user_turn("Q2", None);
        let dropped = ctx.discard_pending_user_turn().unwrap();
        assert_eq!(dropped.content, "Q2");
        assert_eq!(ctx.message_count(), 2);
    }

    #[test]
    fn test_last_messages() {
        let mut ctx = ConversationContext::new("System");
        ctx.add_user_turn("User 1", None);
        ctx.add_assistant_message("Assistant 1");
        ctx.add_user_turn("User 2", None);

        assert_eq!(ctx.last_user_message().unwrap().content, "User 2");
        assert_eq!(ctx.last_assistant_message().unwrap().content, "Assistant 1");
    }

    #[test]
    fn test_clear() {
        let mut ctx = ConversationContext::new("System");
        ctx.add_user_turn("Hello", None);
        ctx.clear();
        assert_eq!(ctx.message_count(), 0);
        assert_eq!(ctx.system_prompt(), "System");
    }

    #[test]
    fn test_json_export_import() {
        let mut ctx = ConversationContext::new("System");
        ctx.add_user_turn("Hello", Some(Attachment::new("image/png", vec![7])));
        ctx.add_assistant_message("Hi there!");

        let json = ctx.to_json().unwrap();

        let mut ctx2 = ConversationContext::new("System");
        ctx2.from_json(&json).unwrap();
        assert_eq!(ctx2.message_count(), 2);
        assert_eq!(ctx2.history()[0].attachment.as_ref().unwrap().data, vec![7]);
    }
}
