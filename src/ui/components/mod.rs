//! UI components for the tutor window

mod input_bar;
mod message_list;
mod sidebar;

pub use input_bar::InputBar;
pub use message_list::{message_label, MessageList};
pub use sidebar::Sidebar;
