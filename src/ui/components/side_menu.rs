//! Navigation drawer

use crate::ui::state::{AppState, Dialog, View};
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct SideMenu<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> SideMenu<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        ui.label(
            RichText::new("Menu")
                .size(16.0)
                .strong()
                .color(self.theme.text_primary),
        );
        ui.add_space(self.theme.spacing_sm);

        let can_reset = !self.state.controller.is_in_flight();
        if menu_item(ui, can_reset, "➕ New chat", "New chat") {
            self.state.new_chat();
        }

        ui.separator();

        if menu_item(ui, true, "💬 Chat", "Chat view") {
            self.state.view = View::Chat;
            self.state.show_side_menu = false;
        }
        if menu_item(ui, true, "📊 Analytics", "Analytics view") {
            self.state.view = View::Analytics;
            self.state.show_side_menu = false;
        }

        ui.separator();

        if menu_item(ui, true, "🙂 Emotion", "Emotion") {
            self.state.open_dialog(Dialog::Emotion);
        }
        if menu_item(ui, true, "⭐ Feedback", "Feedback") {
            self.state.open_dialog(Dialog::Feedback);
        }
        if menu_item(ui, true, "🔒 Privacy & info", "Privacy & info") {
            self.state.open_dialog(Dialog::Privacy);
        }
    }
}

fn menu_item(ui: &mut egui::Ui, enabled: bool, text: &str, label: &str) -> bool {
    let response = ui.add_enabled(
        enabled,
        egui::Button::new(text)
            .frame(false)
            .min_size(egui::vec2(ui.available_width(), 28.0)),
    );
    response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, label));
    response.clicked()
}
