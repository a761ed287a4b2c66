//! Session statistics

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct AnalyticsView<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> AnalyticsView<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let stats = self.state.stats();

        ui.add_space(self.theme.spacing);
        ui.heading("Session analytics");
        ui.add_space(self.theme.spacing);

        let satisfaction = stats
            .satisfaction()
            .map(|s| format!("{:.0}%", s * 100.0))
            .unwrap_or_else(|| "No ratings yet".to_string());
        let last_response = self
            .state
            .last_response_ms
            .map(|ms| format!("{:.1}s", ms as f64 / 1000.0))
            .unwrap_or_else(|| "-".to_string());

        let rows = [
            ("Questions asked", stats.user_turns.to_string()),
            ("Responses", stats.model_turns.to_string()),
            ("Images attached", stats.attachments.to_string()),
            (
                "Average response length",
                format!("{:.0} characters", stats.average_response_chars()),
            ),
            ("Last response time", last_response),
            (
                "Feedback",
                format!("{} good, {} bad", stats.good_feedback, stats.bad_feedback),
            ),
            ("Satisfaction", satisfaction),
        ];

        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                egui::Grid::new("session_stats")
                    .num_columns(2)
                    .spacing([self.theme.spacing_lg, self.theme.spacing_sm])
                    .show(ui, |ui| {
                        for (name, value) in rows {
                            ui.label(RichText::new(name).color(self.theme.text_muted));
                            let response = ui.label(RichText::new(&value).strong());
                            let label = format!("{}: {}", name, value);
                            response.widget_info(|| {
                                egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &label)
                            });
                            ui.end_row();
                        }
                    });
            });
    }
}
