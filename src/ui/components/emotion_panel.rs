//! Simulated emotion picker

use crate::emotion::Emotion;
use crate::ui::state::{AppState, Dialog};
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct EmotionPanel<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> EmotionPanel<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ctx: &egui::Context) {
        if self.state.dialog != Some(Dialog::Emotion) {
            return;
        }

        let current = self.state.controller.emotion();
        let mut choice = None;
        let mut close = false;

        egui::Window::new("Emotion")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(
                    RichText::new("Pick how you feel. Nyaya adapts the tone of its next answers.")
                        .color(self.theme.text_secondary),
                );
                ui.add_space(self.theme.spacing_sm);

                ui.horizontal(|ui| {
                    for emotion in Emotion::ALL {
                        let selected = current == Some(emotion);
                        let label = emotion.label();
                        let response = ui.selectable_label(selected, RichText::new(&label).size(16.0));
                        response.widget_info(|| {
                            egui::WidgetInfo::selected(
                                egui::WidgetType::SelectableLabel,
                                true,
                                selected,
                                &label,
                            )
                        });
                        if response.clicked() {
                            choice = Some(Some(emotion));
                        }
                    }
                });

                ui.add_space(self.theme.spacing_sm);
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(current.is_some(), egui::Button::new("Clear"))
                        .clicked()
                    {
                        choice = Some(None);
                    }
                    if ui.button("Close").clicked() {
                        close = true;
                    }
                });
            });

        if let Some(emotion) = choice {
            self.state.set_emotion(emotion);
        } else if close {
            self.state.close_dialog();
        }
    }
}
