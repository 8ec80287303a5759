//! Message list component
//!
//! Displays the transcript: text bubbles and image previews.

use crate::messages::{ImageData, Message, MessageContent, Sender};
use crate::ui::avatar::decode_color_image;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Align, Color32, RichText};
use uuid::Uuid;

/// Largest side of an image preview
const PREVIEW_SIZE: f32 = 220.0;

/// Accessibility label for a transcript entry
pub fn message_label(message: &Message) -> String {
    let who = match message.sender {
        Sender::User => "User message",
        Sender::Assistant => "Tutor reply",
    };
    match &message.content {
        MessageContent::Text(text) => format!("{}: {}", who, text),
        MessageContent::Image(image) => format!("{}: image ({})", who, image.mime_type),
    }
}

/// Message list component
pub struct MessageList<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        let messages = self.state.messages.get_all();

        egui::ScrollArea::vertical()
            .id_salt("messages")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.add_space(self.theme.spacing);

                if messages.is_empty() && !self.state.is_thinking {
                    self.show_empty_state(ui);
                } else {
                    for message in &messages {
                        self.show_message(ui, message);
                        ui.add_space(self.theme.spacing_sm);
                    }

                    if self.state.is_thinking {
                        self.show_thinking(ui);
                    }
                }

                ui.add_space(self.theme.spacing);
            });
    }

    fn show_empty_state(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.label(
                RichText::new("Ask Yukki anything")
                    .size(22.0)
                    .color(self.theme.text_primary),
            );
            ui.add_space(self.theme.spacing_sm);
            ui.label(
                RichText::new(
                    "Facts get answers. Problems get hints, one step at a time. \
                     Drop an image on the window to ask about it.",
                )
                .color(self.theme.text_muted),
            );
        });
    }

    fn show_message(&mut self, ui: &mut egui::Ui, message: &Message) {
        let is_user = message.sender == Sender::User;
        let (bubble_color, text_color) = if is_user {
            (self.theme.user_bubble, Color32::WHITE)
        } else {
            (self.theme.assistant_bubble, self.theme.text_primary)
        };
        let align = if is_user { Align::RIGHT } else { Align::LEFT };
        let label = message_label(message);

        ui.with_layout(egui::Layout::top_down(align), |ui| {
            let sender = match (message.sender, message.metadata.from_voice) {
                (Sender::User, true) => "You (voice)",
                (Sender::User, false) => "You",
                (Sender::Assistant, _) => "Yukki",
            };
            ui.label(RichText::new(sender).size(12.0).color(self.theme.text_muted));

            let max_width = ui.available_width() * 0.75;
            egui::Frame::none()
                .fill(bubble_color)
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_max_width(max_width);
                    match &message.content {
                        MessageContent::Text(text) => {
                            let response = ui.label(RichText::new(text).color(text_color));
                            response.widget_info(|| {
                                egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &label)
                            });
                        }
                        MessageContent::Image(image) => {
                            self.show_image(ui, message.id, image, text_color, &label);
                        }
                    }
                });

            ui.label(
                RichText::new(message.timestamp.format("%H:%M").to_string())
                    .size(10.0)
                    .color(self.theme.text_muted),
            );
        });
    }

    fn show_image(
        &mut self,
        ui: &mut egui::Ui,
        id: Uuid,
        image: &ImageData,
        text_color: Color32,
        label: &str,
    ) {
        let texture = self
            .state
            .image_textures
            .entry(id)
            .or_insert_with(|| {
                decode_color_image(&image.data)
                    .ok()
                    .map(|color| ui.ctx().load_texture(id.to_string(), color, Default::default()))
            })
            .clone();

        let response = match texture {
            Some(texture) => {
                let size = texture.size_vec2();
                let scale = (PREVIEW_SIZE / size.x.max(size.y)).min(1.0);
                ui.add(egui::Image::new((texture.id(), size * scale)))
            }
            None => ui.label(RichText::new("[image]").color(text_color)),
        };
        response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Other, true, label));
    }

    fn show_thinking(&self, ui: &mut egui::Ui) {
        ui.with_layout(egui::Layout::top_down(Align::LEFT), |ui| {
            ui.label(RichText::new("Yukki").size(12.0).color(self.theme.text_muted));

            egui::Frame::none()
                .fill(self.theme.assistant_bubble)
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    let response = ui
                        .horizontal(|ui| {
                            let t = ui.ctx().input(|i| i.time);
                            for i in 0..3 {
                                let alpha = ((t * 3.0 + i as f64 * 0.5).sin() * 0.5 + 0.5) as f32;
                                ui.label(
                                    RichText::new("●")
                                        .size(10.0)
                                        .color(self.theme.text_muted.gamma_multiply(alpha)),
                                );
                            }
                        })
                        .response;
                    response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Label, true, "Yukki is thinking")
                    });
                });
        });

        ui.ctx().request_repaint();
    }
}
