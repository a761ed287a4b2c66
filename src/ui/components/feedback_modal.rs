//! Response feedback dialog

use crate::feedback::Rating;
use crate::ui::state::{AppState, Dialog};
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct FeedbackModal<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> FeedbackModal<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ctx: &egui::Context) {
        if self.state.dialog != Some(Dialog::Feedback) {
            return;
        }

        let mut submit = false;
        let mut cancel = false;

        egui::Window::new("Feedback")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(
                    RichText::new("How helpful were the answers?").color(self.theme.text_secondary),
                );
                ui.add_space(self.theme.spacing_sm);

                let draft = &mut self.state.feedback_draft;
                ui.horizontal(|ui| {
                    for (rating, text, label) in [
                        (Rating::Good, "👍 Good", "Good response"),
                        (Rating::Bad, "👎 Bad", "Bad response"),
                    ] {
                        let selected = draft.rating == Some(rating);
                        let response = ui.selectable_label(selected, text);
                        response.widget_info(|| {
                            egui::WidgetInfo::selected(
                                egui::WidgetType::SelectableLabel,
                                true,
                                selected,
                                label,
                            )
                        });
                        if response.clicked() {
                            draft.rating = Some(rating);
                        }
                    }
                });

                ui.add_space(self.theme.spacing_sm);
                let response = ui.add(
                    egui::TextEdit::multiline(&mut draft.comments)
                        .hint_text("Comments (optional)")
                        .desired_rows(3),
                );
                response.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, true, "Feedback comments")
                });

                ui.add_space(self.theme.spacing_sm);
                ui.horizontal(|ui| {
                    let can_submit = draft.can_submit();
                    let response = ui.add_enabled(can_submit, egui::Button::new("Submit"));
                    response.widget_info(|| {
                        egui::WidgetInfo::labeled(
                            egui::WidgetType::Button,
                            can_submit,
                            "Submit feedback",
                        )
                    });
                    submit = response.clicked();

                    let response = ui.button("Cancel");
                    response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Cancel feedback")
                    });
                    cancel = response.clicked();
                });
            });

        if submit {
            self.state.submit_feedback();
        } else if cancel {
            self.state.close_dialog();
        }
    }
}
