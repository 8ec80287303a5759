//! Input bar component
//!
//! Text input, send button, attachment chip, clear button and (with voice
//! input) the microphone toggle.

use crate::ui::state::{AppState, RecordingState};
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2};

/// Input bar component for text and voice input
pub struct InputBar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    if self.state.pending_image.is_some() {
                        self.show_attachment_chip(ui);
                    }

                    ui.horizontal(|ui| {
                        if cfg!(feature = "voice-input") {
                            self.show_record_button(ui);
                        }
                        self.show_text_input(ui);
                        self.show_send_button(ui);
                        self.show_clear_button(ui);
                    });
                });
            });
    }

    fn show_attachment_chip(&mut self, ui: &mut egui::Ui) {
        let Some(image) = &self.state.pending_image else {
            return;
        };
        let description = format!(
            "Attached image: {} ({} KB)",
            image.mime_type,
            image.data.len().div_ceil(1024)
        );

        let mut remove = false;
        ui.horizontal(|ui| {
            let label = ui.label(RichText::new(&description).color(self.theme.text_secondary));
            label.widget_info(|| {
                egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &description)
            });

            let button = ui
                .small_button("✕")
                .on_hover_text("Remove attachment");
            button.widget_info(|| {
                egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Remove attachment")
            });
            remove = button.clicked();
        });

        if remove {
            self.state.remove_attachment();
        }
    }

    fn show_record_button(&mut self, ui: &mut egui::Ui) {
        let state = self.state.recording_state;
        let busy = state == RecordingState::Processing || self.state.is_thinking;

        let (icon, label, color) = match state {
            RecordingState::Idle => ("🎤", "Record voice", self.theme.text_secondary),
            RecordingState::Recording => ("⏹", "Stop recording", self.theme.recording),
            RecordingState::Processing => ("⏳", "Transcribing", self.theme.warning),
        };

        let mut button = egui::Button::new(RichText::new(icon).size(18.0).color(color))
            .min_size(Vec2::splat(40.0))
            .rounding(self.theme.button_rounding);
        if state == RecordingState::Recording {
            button = button.fill(self.theme.recording.gamma_multiply(0.2));
        }

        let enabled = !busy || state == RecordingState::Recording;
        let response = ui.add_enabled(enabled, button);
        response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, label));

        if response.clicked() {
            match state {
                RecordingState::Idle => self.state.start_recording(),
                RecordingState::Recording => self.state.stop_recording(),
                RecordingState::Processing => {}
            }
        }
        if response.secondary_clicked() && state == RecordingState::Recording {
            self.state.cancel_recording();
        }

        let response = response.on_hover_text("Click to talk, right-click to cancel");
        if state == RecordingState::Recording {
            let t = ui.ctx().input(|i| i.time);
            let pulse = ((t * 3.0).sin() * 0.5 + 0.5) as f32;
            ui.painter().circle_stroke(
                response.rect.center(),
                response.rect.width() / 2.0 + 2.0 + pulse * 3.0,
                egui::Stroke::new(2.0, self.theme.recording.gamma_multiply(1.0 - pulse * 0.5)),
            );
            ui.ctx().request_repaint();
        }
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        let enabled = !self.state.is_thinking && self.state.recording_state == RecordingState::Idle;

        // Leave room for the send and clear buttons
        let width = (ui.available_width() - 110.0).max(80.0);
        let text_edit = egui::TextEdit::singleline(&mut self.state.input_text)
            .hint_text("Ask Yukki a question...")
            .desired_width(width)
            .id(egui::Id::new("message_input"))
            .margin(egui::Margin::symmetric(10.0, 8.0));

        let response = ui.add_enabled(enabled, text_edit);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, enabled, "Message input")
        });

        if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) && self.state.can_send() {
            self.state.send_message();
            response.request_focus();
        }
    }

    fn show_send_button(&mut self, ui: &mut egui::Ui) {
        let can_send = self.state.can_send();
        let fill = if can_send {
            self.theme.primary
        } else {
            self.theme.text_muted
        };

        let button = egui::Button::new(RichText::new("➤").size(16.0).color(egui::Color32::WHITE))
            .min_size(Vec2::splat(40.0))
            .rounding(self.theme.button_rounding)
            .fill(fill);

        let response = ui.add_enabled(can_send, button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, can_send, "Send message")
        });

        if response.clicked() {
            self.state.send_message();
        }
        response.on_hover_text("Send (Enter)");
    }

    fn show_clear_button(&mut self, ui: &mut egui::Ui) {
        let button = egui::Button::new(RichText::new("🗑").size(16.0))
            .min_size(Vec2::splat(40.0))
            .rounding(self.theme.button_rounding);

        let enabled = self.state.can_clear();
        let response = ui.add_enabled(enabled, button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, "Clear chat")
        });

        if response.clicked() {
            self.state.clear_messages();
        }
        response.on_hover_text("Start a new conversation");
    }
}
