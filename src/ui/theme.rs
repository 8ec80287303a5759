//! Colors, spacing and text styles for the tutor window

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Vec2, Visuals};

/// Application theme configuration
#[derive(Clone, Debug)]
pub struct Theme {
    /// Primary accent color
    pub primary: Color32,
    /// Warning color (missing avatar, busy states)
    pub warning: Color32,
    /// Error color (banner)
    pub error: Color32,

    /// Background colors
    pub bg_primary: Color32,
    pub bg_secondary: Color32,
    pub bg_tertiary: Color32,

    /// Text colors
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,

    /// Recording indicator color
    pub recording: Color32,

    /// Chat bubbles
    pub user_bubble: Color32,
    pub assistant_bubble: Color32,

    /// Fill of the avatar placeholder
    pub placeholder: Color32,

    pub button_rounding: Rounding,
    pub card_rounding: Rounding,
    pub bubble_rounding: Rounding,

    /// Standard spacing
    pub spacing: f32,
    /// Large spacing
    pub spacing_lg: f32,
    /// Small spacing
    pub spacing_sm: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    /// Soft pastel theme
    pub fn light() -> Self {
        Self {
            primary: Color32::from_rgb(219, 39, 119), // Pink
            warning: Color32::from_rgb(202, 138, 4),
            error: Color32::from_rgb(220, 38, 38),

            bg_primary: Color32::from_rgb(255, 251, 254),
            bg_secondary: Color32::from_rgb(253, 242, 248),
            bg_tertiary: Color32::from_rgb(251, 207, 232),

            text_primary: Color32::from_rgb(31, 41, 55),
            text_secondary: Color32::from_rgb(75, 85, 99),
            text_muted: Color32::from_rgb(107, 114, 128),

            recording: Color32::from_rgb(220, 38, 38),

            user_bubble: Color32::from_rgb(219, 39, 119),
            assistant_bubble: Color32::from_rgb(243, 232, 255),

            placeholder: Color32::from_rgb(248, 231, 255),

            button_rounding: Rounding::same(8.0),
            card_rounding: Rounding::same(12.0),
            bubble_rounding: Rounding::same(14.0),

            spacing: 16.0,
            spacing_lg: 24.0,
            spacing_sm: 8.0,
        }
    }

    /// Dark variant
    pub fn dark() -> Self {
        Self {
            primary: Color32::from_rgb(244, 114, 182),
            warning: Color32::from_rgb(234, 179, 8),
            error: Color32::from_rgb(239, 68, 68),

            bg_primary: Color32::from_rgb(24, 24, 37),
            bg_secondary: Color32::from_rgb(39, 39, 56),
            bg_tertiary: Color32::from_rgb(63, 63, 84),

            text_primary: Color32::from_rgb(249, 250, 251),
            text_secondary: Color32::from_rgb(209, 213, 219),
            text_muted: Color32::from_rgb(156, 163, 175),

            recording: Color32::from_rgb(239, 68, 68),

            user_bubble: Color32::from_rgb(190, 24, 93),
            assistant_bubble: Color32::from_rgb(55, 48, 77),

            placeholder: Color32::from_rgb(63, 48, 77),

            button_rounding: Rounding::same(8.0),
            card_rounding: Rounding::same(12.0),
            bubble_rounding: Rounding::same(14.0),

            spacing: 16.0,
            spacing_lg: 24.0,
            spacing_sm: 8.0,
        }
    }

    /// Apply this theme to egui
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = if self.bg_primary.r() > 128 {
            Visuals::light()
        } else {
            Visuals::dark()
        };

        visuals.panel_fill = self.bg_primary;
        visuals.window_fill = self.bg_secondary;
        visuals.extreme_bg_color = self.bg_secondary;

        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text_primary);
        visuals.widgets.inactive.bg_fill = self.bg_tertiary;
        visuals.widgets.hovered.bg_fill = self.primary.gamma_multiply(0.8);
        visuals.widgets.active.bg_fill = self.primary;

        visuals.selection.bg_fill = self.primary.gamma_multiply(0.3);
        visuals.selection.stroke = Stroke::new(1.0, self.primary);
        visuals.hyperlink_color = self.primary;
        visuals.window_rounding = self.card_rounding;

        ctx.set_visuals(visuals);

        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = Vec2::splat(self.spacing_sm);
        style.spacing.button_padding = Vec2::new(self.spacing, self.spacing_sm);

        style.text_styles.insert(
            egui::TextStyle::Heading,
            FontId::new(24.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Body,
            FontId::new(15.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Button,
            FontId::new(14.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Small,
            FontId::new(12.0, FontFamily::Proportional),
        );

        ctx.set_style(style);
    }
}
