//! Main application struct and eframe integration

use crate::integration::config::AppConfig;
use crate::integration::orchestrator::{join_worker, Orchestrator, OrchestratorCommand};
use crate::ui::avatar::AvatarImages;
use crate::ui::components::{InputBar, MessageList, Sidebar};
use crate::ui::state::{AppState, RecordingState};
use crate::ui::theme::Theme;
use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// How long closing the window waits for the worker
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Main Yukki application
pub struct YukkiApp {
    state: AppState,
    theme: Theme,
    config: AppConfig,
    avatar: Option<AvatarImages>,
    worker: Option<std::thread::JoinHandle<()>>,
}

impl YukkiApp {
    /// Create the application and start the worker
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let theme = Theme::light();
        theme.apply(&cc.egui_ctx);

        let (orchestrator, handle) = Orchestrator::new(config.clone());
        let mut state = AppState::new();
        let worker = match orchestrator.start() {
            Ok(worker) => {
                state = state.with_orchestrator(handle);
                Some(worker)
            }
            Err(e) => {
                error!("Failed to start worker: {}", e);
                state.last_error = Some(e.user_message());
                None
            }
        };

        #[cfg(feature = "audio-io")]
        {
            match crate::audio::AudioPlayer::new() {
                Ok(player) => state.player = Some(player),
                Err(e) => warn!("Speech output disabled: {}", e),
            }
        }

        let avatar = AvatarImages::load(&cc.egui_ctx, &config.avatar);

        info!("Yukki UI initialized");

        Self {
            state,
            theme,
            config,
            avatar: Some(avatar),
            worker,
        }
    }

    /// Attach files dropped onto the window
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        for file in dropped {
            if let Some(path) = &file.path {
                self.state.attach_image_file(path);
            } else if let Some(bytes) = &file.bytes {
                self.state.attach_image_bytes(&file.name, bytes.to_vec());
            }
        }
    }

    fn show_error_banner(&mut self, ctx: &egui::Context) {
        let Some(message) = self.state.last_error.clone() else {
            return;
        };

        TopBottomPanel::top("error_banner")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.error.gamma_multiply(0.15))
                    .inner_margin(self.theme.spacing_sm),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let label = ui.label(RichText::new(&message).color(self.theme.error));
                    label.widget_info(|| {
                        egui::WidgetInfo::labeled(
                            egui::WidgetType::Label,
                            true,
                            format!("Error: {}", message),
                        )
                    });
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("Dismiss").clicked() {
                            self.state.last_error = None;
                        }
                    });
                });
            });
    }

    fn show_sidebar(&mut self, ctx: &egui::Context) {
        SidePanel::left("avatar_panel")
            .resizable(false)
            .exact_width(260.0)
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_secondary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                Sidebar::new(
                    &self.state,
                    &self.theme,
                    self.avatar.as_ref(),
                    &self.config.avatar.idle_name,
                )
                .show(ui);
            });
    }

    fn show_input_area(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("input_area")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                InputBar::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_content(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                MessageList::new(&mut self.state, &self.theme).show(ui);
            });
    }
}

impl eframe::App for YukkiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_events();
        self.handle_dropped_files(ctx);

        self.show_error_banner(ctx);
        self.show_sidebar(ctx);
        self.show_input_area(ctx);
        self.show_content(ctx);

        // Keep polling the worker and advancing the mouth animation
        if let Some(next) = self.state.lip_sync.next_change(Instant::now()) {
            ctx.request_repaint_after(next);
        } else if self.state.is_thinking || self.state.recording_state != RecordingState::Idle {
            ctx.request_repaint_after(Duration::from_millis(50));
        } else {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(handle) = &self.state.orchestrator {
            let _ = handle.send_command(OrchestratorCommand::Shutdown);
        }
        // A turn still in flight finishes on its own; the window closes anyway
        if let Some(worker) = self.worker.take() {
            join_worker(worker, SHUTDOWN_GRACE);
        }
        info!("Yukki shutting down");
    }
}
