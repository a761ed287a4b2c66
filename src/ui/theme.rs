//! Colors, spacing and text styles

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Vec2, Visuals};

#[derive(Clone, Debug)]
pub struct Theme {
    /// Accent used for the send button, links and selection
    pub primary: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub error: Color32,

    pub bg_primary: Color32,
    pub bg_secondary: Color32,
    pub bg_tertiary: Color32,

    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,

    pub user_bubble: Color32,
    pub user_text: Color32,
    pub assistant_bubble: Color32,

    /// Microphone while listening
    pub listening: Color32,

    pub button_rounding: Rounding,
    pub card_rounding: Rounding,
    pub bubble_rounding: Rounding,

    pub spacing: f32,
    pub spacing_lg: f32,
    pub spacing_sm: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    pub fn light() -> Self {
        Self {
            primary: Color32::from_rgb(13, 148, 136),
            success: Color32::from_rgb(22, 163, 74),
            warning: Color32::from_rgb(217, 119, 6),
            error: Color32::from_rgb(220, 38, 38),

            bg_primary: Color32::from_rgb(248, 250, 252),
            bg_secondary: Color32::WHITE,
            bg_tertiary: Color32::from_rgb(226, 232, 240),

            text_primary: Color32::from_rgb(15, 23, 42),
            text_secondary: Color32::from_rgb(51, 65, 85),
            text_muted: Color32::from_rgb(100, 116, 139),

            user_bubble: Color32::from_rgb(13, 148, 136),
            user_text: Color32::WHITE,
            assistant_bubble: Color32::from_rgb(241, 245, 249),

            listening: Color32::from_rgb(220, 38, 38),

            button_rounding: Rounding::same(8.0),
            card_rounding: Rounding::same(12.0),
            bubble_rounding: Rounding::same(14.0),

            spacing: 14.0,
            spacing_lg: 24.0,
            spacing_sm: 6.0,
        }
    }

    pub fn dark() -> Self {
        Self {
            primary: Color32::from_rgb(45, 212, 191),
            bg_primary: Color32::from_rgb(15, 23, 42),
            bg_secondary: Color32::from_rgb(30, 41, 59),
            bg_tertiary: Color32::from_rgb(51, 65, 85),

            text_primary: Color32::from_rgb(241, 245, 249),
            text_secondary: Color32::from_rgb(203, 213, 225),
            text_muted: Color32::from_rgb(148, 163, 184),

            user_bubble: Color32::from_rgb(15, 118, 110),
            assistant_bubble: Color32::from_rgb(30, 41, 59),
            ..Self::light()
        }
    }

    fn is_dark(&self) -> bool {
        self.bg_primary.r() < 128
    }

    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = if self.is_dark() {
            Visuals::dark()
        } else {
            Visuals::light()
        };

        visuals.panel_fill = self.bg_primary;
        visuals.window_fill = self.bg_secondary;
        visuals.extreme_bg_color = self.bg_secondary;

        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text_primary);
        visuals.widgets.inactive.bg_fill = self.bg_tertiary;
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.text_secondary);
        visuals.widgets.hovered.bg_fill = self.primary.gamma_multiply(0.25);
        visuals.widgets.active.bg_fill = self.primary.gamma_multiply(0.4);

        visuals.selection.bg_fill = self.primary.gamma_multiply(0.3);
        visuals.selection.stroke = Stroke::new(1.0, self.primary);
        visuals.hyperlink_color = self.primary;

        visuals.window_rounding = self.card_rounding;
        visuals.window_stroke = Stroke::new(1.0, self.bg_tertiary);

        ctx.set_visuals(visuals);

        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = Vec2::splat(self.spacing_sm);
        style.spacing.window_margin = egui::Margin::same(self.spacing);
        style.spacing.button_padding = Vec2::new(self.spacing_sm * 2.0, self.spacing_sm);

        for (text_style, size, family) in [
            (egui::TextStyle::Heading, 22.0, FontFamily::Proportional),
            (egui::TextStyle::Body, 15.0, FontFamily::Proportional),
            (egui::TextStyle::Button, 14.0, FontFamily::Proportional),
            (egui::TextStyle::Small, 11.0, FontFamily::Proportional),
            (egui::TextStyle::Monospace, 13.0, FontFamily::Monospace),
        ] {
            style.text_styles.insert(text_style, FontId::new(size, family));
        }

        ctx.set_style(style);
    }
}
