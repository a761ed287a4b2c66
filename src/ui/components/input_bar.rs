//! Input bar component
//!
//! Text entry, image attachment, voice input, reply style and send controls.

use crate::llm::StyleDirective;
use crate::ui::components::message_list::fit_size;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2};

pub struct InputBar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm * 1.5)
            .show(ui, |ui| {
                if self.state.pending_attachment.is_some() {
                    self.show_attachment_preview(ui);
                    ui.add_space(self.theme.spacing_sm);
                }

                ui.horizontal(|ui| {
                    self.show_attach_button(ui);
                    if self.state.recognition_available() {
                        self.show_mic_button(ui);
                    }
                    self.show_text_input(ui);
                    self.show_style_menu(ui);
                    self.show_send_button(ui);
                });
            });
    }

    fn show_attachment_preview(&mut self, ui: &mut egui::Ui) {
        let Some(data) = self.state.pending_attachment.as_ref() else {
            return;
        };
        let texture = self.state.images.preview(ui.ctx(), data);

        let mut remove = false;
        ui.horizontal(|ui| {
            match texture {
                Some(texture) => {
                    let size = fit_size(texture.size_vec2(), 64.0);
                    ui.add(egui::Image::new((texture.id(), size)).rounding(self.theme.button_rounding));
                }
                None => {
                    ui.label(
                        RichText::new(format!("🖼 {}", data.mime_type)).color(self.theme.text_secondary),
                    );
                }
            }

            let response = ui
                .add(egui::Button::new("✖").rounding(self.theme.button_rounding))
                .on_hover_text("Remove attachment");
            response.widget_info(|| {
                egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Remove attachment")
            });
            remove = response.clicked();
        });

        if remove {
            self.state.remove_attachment();
        }
    }

    fn show_attach_button(&mut self, ui: &mut egui::Ui) {
        let enabled = !self.state.controller.is_in_flight();
        let response = ui
            .add_enabled(
                enabled,
                egui::Button::new(RichText::new("📎").size(18.0))
                    .min_size(Vec2::splat(36.0))
                    .rounding(self.theme.button_rounding),
            )
            .on_hover_text("Attach an image");
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, "Attach image")
        });

        if response.clicked() {
            self.state.pick_attachment();
        }
    }

    fn show_mic_button(&mut self, ui: &mut egui::Ui) {
        let listening = self.state.listening;
        let (icon, label, color) = if listening {
            ("⏹", "Stop voice input", self.theme.listening)
        } else {
            ("🎤", "Start voice input", self.theme.text_secondary)
        };

        let mut button = egui::Button::new(RichText::new(icon).size(18.0).color(color))
            .min_size(Vec2::splat(36.0))
            .rounding(self.theme.button_rounding);
        if listening {
            button = button.fill(self.theme.listening.gamma_multiply(0.15));
        }

        let response = ui.add(button).on_hover_text(label);
        response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Button, true, label));

        if response.clicked() {
            self.state.toggle_listening();
        }
        if listening {
            ui.ctx().request_repaint();
        }
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        // Room for the style menu and send button
        let width = (ui.available_width() - 170.0).max(120.0);
        let hint = if self.state.listening {
            "Listening..."
        } else {
            "Ask a legal question..."
        };

        let response = ui.add(
            egui::TextEdit::singleline(&mut self.state.input_text)
                .id(egui::Id::new("message_input"))
                .hint_text(hint)
                .desired_width(width)
                .margin(egui::Margin::symmetric(10.0, 8.0)),
        );
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, true, "Message input")
        });

        if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
            self.state.send_message();
            response.request_focus();
        }
    }

    fn show_style_menu(&mut self, ui: &mut egui::Ui) {
        let mut style = self.state.controller.style();
        egui::ComboBox::from_id_salt("reply_style")
            .selected_text(style.name())
            .width(90.0)
            .show_ui(ui, |ui| {
                for option in StyleDirective::ALL {
                    ui.selectable_value(&mut style, option, option.name());
                }
            })
            .response
            .on_hover_text("Reply style");

        if style != self.state.controller.style() {
            self.state.set_style(style);
        }
    }

    fn show_send_button(&mut self, ui: &mut egui::Ui) {
        let can_send = self.state.can_send();
        let fill = if can_send {
            self.theme.primary
        } else {
            self.theme.text_muted.gamma_multiply(0.5)
        };

        let response = ui
            .add_enabled(
                can_send,
                egui::Button::new(RichText::new("➤").size(16.0).color(egui::Color32::WHITE))
                    .min_size(Vec2::splat(36.0))
                    .rounding(self.theme.button_rounding)
                    .fill(fill),
            )
            .on_hover_text("Send message (Enter)");
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, can_send, "Send message")
        });

        if response.clicked() {
            self.state.send_message();
        }
    }
}
