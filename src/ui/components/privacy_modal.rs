//! Privacy notice

use crate::ui::state::{AppState, Dialog};
use crate::ui::theme::Theme;
use egui::{self, RichText};

const NOTICE: [&str; 4] = [
    "Your messages and attached images are sent to the AI service only to \
     generate a reply. Nothing is stored by this application after you close it.",
    "Voice input and voice output use your device's speech services.",
    "Feedback you submit stays on this device for the current session.",
    "Nyaya provides general legal information, not legal advice. For advice on \
     your situation, consult a qualified lawyer.",
];

pub struct PrivacyModal<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> PrivacyModal<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ctx: &egui::Context) {
        if self.state.dialog != Some(Dialog::Privacy) {
            return;
        }

        let mut close = false;
        egui::Window::new("Privacy & info")
            .collapsible(false)
            .resizable(false)
            .default_width(380.0)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                for paragraph in NOTICE {
                    ui.label(RichText::new(paragraph).color(self.theme.text_secondary));
                    ui.add_space(self.theme.spacing_sm);
                }

                let response = ui.button("Close");
                response.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Close privacy notice")
                });
                close = response.clicked();
            });

        if close {
            self.state.close_dialog();
        }
    }
}
