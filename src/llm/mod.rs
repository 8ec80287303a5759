//! Chat model access
//!
//! - **chat**: client for the hosted chat completion endpoint
//! - **context**: system instruction plus conversation history
//! - **prompts**: the tutoring instruction and fixed replies

pub mod chat;
pub mod context;
pub mod prompts;

pub use chat::ChatClient;
pub use context::{Attachment, ConversationContext, ConversationMessage, MessageRole};
pub use prompts::{build_system_prompt, SYSTEM_PROMPT, UNAVAILABLE_MESSAGE};
