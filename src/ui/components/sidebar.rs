//! Sidebar with the avatar and tutor status

use crate::ui::avatar::{expected_names, AvatarFrame, AvatarImages};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Align2, FontId, RichText, Sense, Vec2};
use std::time::Instant;

/// Side length of the avatar square
const AVATAR_SIZE: f32 = 220.0;

pub struct Sidebar<'a> {
    state: &'a AppState,
    theme: &'a Theme,
    avatar: Option<&'a AvatarImages>,
    idle_name: &'a str,
}

impl<'a> Sidebar<'a> {
    pub fn new(
        state: &'a AppState,
        theme: &'a Theme,
        avatar: Option<&'a AvatarImages>,
        idle_name: &'a str,
    ) -> Self {
        Self {
            state,
            theme,
            avatar,
            idle_name,
        }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(self.theme.spacing);
            ui.label(
                RichText::new("Yukki")
                    .size(26.0)
                    .strong()
                    .color(self.theme.primary),
            );
            ui.label(
                RichText::new("Study tutor")
                    .size(13.0)
                    .color(self.theme.text_muted),
            );
            ui.add_space(self.theme.spacing);

            let frame = self.state.lip_sync.frame_at(Instant::now());
            match self.avatar.and_then(|images| images.texture(frame)) {
                Some(texture) => {
                    let response = ui.add(
                        egui::Image::new((texture.id(), Vec2::splat(AVATAR_SIZE)))
                            .rounding(self.theme.card_rounding),
                    );
                    let label = match frame {
                        AvatarFrame::Idle => "Yukki avatar",
                        AvatarFrame::MouthOpen | AvatarFrame::MouthClosed => "Yukki avatar speaking",
                    };
                    response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Other, true, label)
                    });
                }
                None => self.show_placeholder(ui),
            }

            ui.add_space(self.theme.spacing);
            let status = self.state.status_text();
            let response = ui.label(RichText::new(status).color(self.theme.text_secondary));
            response.widget_info(|| {
                egui::WidgetInfo::labeled(egui::WidgetType::Label, true, format!("Status: {}", status))
            });
        });
    }

    fn show_placeholder(&self, ui: &mut egui::Ui) {
        let names = expected_names(self.idle_name);
        let warning = format!("Avatar image not found ({})", names);
        let response = ui.colored_label(self.theme.warning, RichText::new(&warning).size(12.0));
        response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &warning));

        let (rect, _) = ui.allocate_exact_size(Vec2::splat(AVATAR_SIZE), Sense::hover());
        let painter = ui.painter();
        painter.rect_filled(rect, self.theme.card_rounding, self.theme.placeholder);
        painter.text(
            rect.center() - Vec2::new(0.0, 14.0),
            Align2::CENTER_CENTER,
            "No image",
            FontId::proportional(26.0),
            self.theme.error,
        );
        painter.text(
            rect.center() + Vec2::new(0.0, 18.0),
            Align2::CENTER_CENTER,
            names,
            FontId::proportional(14.0),
            self.theme.error,
        );
    }
}
