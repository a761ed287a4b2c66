//! Dismissible banner showing the error slot

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct ErrorToast<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> ErrorToast<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let Some(message) = self.state.controller.error().map(str::to_owned) else {
            return;
        };

        let mut dismissed = false;
        egui::Frame::none()
            .fill(self.theme.error.gamma_multiply(0.12))
            .stroke(egui::Stroke::new(1.0, self.theme.error))
            .rounding(self.theme.button_rounding)
            .inner_margin(egui::Margin::symmetric(12.0, 8.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let label = format!("Error: {}", message);
                    let response = ui.label(RichText::new(&message).color(self.theme.error));
                    response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &label)
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let response = ui.small_button("✖");
                        response.widget_info(|| {
                            egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Dismiss error")
                        });
                        dismissed = response.clicked();
                    });
                });
            });
        ui.add_space(self.theme.spacing_sm);

        if dismissed {
            self.state.controller.dismiss_error();
        }
    }
}
