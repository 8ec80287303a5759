use super::types::{Message, Sender};
use parking_lot::RwLock;
use std::sync::Arc;

/// Display transcript shared between the UI and its helpers
#[derive(Debug, Clone)]
pub struct MessageStorage {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl MessageStorage {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn add(&self, message: Message) {
        self.messages.write().push(message);
    }

    pub fn get_all(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    /// Text of the newest message from `sender`
    pub fn last_text_from(&self, sender: Sender) -> Option<String> {
        self.messages
            .read()
            .iter()
            .rev()
            .filter(|m| m.sender == sender)
            .find_map(|m| m.as_text().map(str::to_string))
    }

    pub fn clear(&self) {
        self.messages.write().clear();
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl Default for MessageStorage {
    fn default() -> Self {
        Self::new()
    }
}
