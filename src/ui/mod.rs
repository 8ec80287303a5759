//! GUI implementation with egui/eframe
//!
//! A sidebar with the animated avatar, the transcript, and an input bar.

mod app;
pub mod avatar;
mod components;
mod state;
mod theme;

use crate::integration::config::AppConfig;

pub use app::YukkiApp;
pub use avatar::{find_avatar, AvatarFrame, LipSync};
pub use components::{message_label, InputBar, MessageList, Sidebar};
pub use state::{AppState, RecordingState};
pub use theme::Theme;

/// Open the tutor window
pub fn run(config: AppConfig) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 720.0])
            .with_min_inner_size([700.0, 480.0])
            .with_drag_and_drop(true)
            .with_title("Yukki"),
        ..Default::default()
    };

    eframe::run_native(
        "Yukki",
        options,
        Box::new(move |cc| Ok(Box::new(YukkiApp::new(cc, config)))),
    )
}
