//! Main application struct and eframe integration

use crate::ui::components::{
    AnalyticsView, EmotionPanel, ErrorToast, FeedbackModal, InputBar, MessageList, PrivacyModal,
    SideMenu,
};
use crate::ui::state::{AppState, Dialog, View};
use crate::ui::theme::Theme;
use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};
use std::time::Duration;
use tracing::info;

/// How often to look for speech events while nothing else is animating
const SPEECH_POLL_INTERVAL: Duration = Duration::from_millis(200);

pub struct NyayaApp {
    state: AppState,
    theme: Theme,
}

impl NyayaApp {
    pub fn new(cc: &eframe::CreationContext<'_>, state: AppState, theme: Theme) -> Self {
        theme.apply(&cc.egui_ctx);
        Self { state, theme }
    }

    /// Build without an eframe context, for headless rendering.
    pub fn with_state(state: AppState, theme: Theme) -> Self {
        Self { state, theme }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_secondary)
                    .inner_margin(egui::Margin::symmetric(self.theme.spacing, 10.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let response = ui.button("☰");
                    response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Menu")
                    });
                    if response.clicked() {
                        self.state.show_side_menu = !self.state.show_side_menu;
                    }

                    ui.label(
                        RichText::new("⚖ Nyaya Legal AI")
                            .size(20.0)
                            .strong()
                            .color(self.theme.primary),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if let Some(emotion) = self.state.controller.emotion() {
                            ui.label(
                                RichText::new(emotion.label())
                                    .size(13.0)
                                    .color(self.theme.text_muted),
                            );
                        }
                        if self.state.controller.speaking().is_some() {
                            ui.label(
                                RichText::new("🔊 Speaking")
                                    .size(13.0)
                                    .color(self.theme.text_muted),
                            );
                        }
                    });
                });
            });
    }

    fn show_side_menu(&mut self, ctx: &egui::Context) {
        if !self.state.show_side_menu {
            return;
        }

        SidePanel::left("side_menu")
            .resizable(false)
            .exact_width(200.0)
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_secondary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                SideMenu::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_input_area(&mut self, ctx: &egui::Context) {
        if self.state.view != View::Chat {
            return;
        }

        TopBottomPanel::bottom("input_area")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                InputBar::new(&mut self.state, &self.theme).show(ui);
            });
    }

    /// Shown in every view, above the input area when there is one.
    fn show_error(&mut self, ctx: &egui::Context) {
        if self.state.controller.error().is_none() {
            return;
        }

        TopBottomPanel::bottom("error_area")
            .show_separator_line(false)
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(
                egui::Margin {
                    left: self.theme.spacing,
                    right: self.theme.spacing,
                    top: self.theme.spacing_sm,
                    bottom: 0.0,
                },
            ))
            .show(ctx, |ui| {
                ErrorToast::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_content(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(egui::Margin::symmetric(self.theme.spacing, 0.0)),
            )
            .show(ctx, |ui| match self.state.view {
                View::Chat => MessageList::new(&mut self.state, &self.theme).show(ui),
                View::Analytics => AnalyticsView::new(&self.state, &self.theme).show(ui),
            });
    }

    fn show_dialogs(&mut self, ctx: &egui::Context) {
        match self.state.dialog {
            Some(Dialog::Feedback) => FeedbackModal::new(&mut self.state, &self.theme).show(ctx),
            Some(Dialog::Privacy) => PrivacyModal::new(&mut self.state, &self.theme).show(ctx),
            Some(Dialog::Emotion) => EmotionPanel::new(&mut self.state, &self.theme).show(ctx),
            None => {}
        }
    }

    /// Render one frame.
    pub fn ui(&mut self, ctx: &egui::Context) {
        self.state.poll_events();

        self.show_header(ctx);
        self.show_side_menu(ctx);
        self.show_input_area(ctx);
        self.show_error(ctx);
        self.show_content(ctx);
        self.show_dialogs(ctx);

        if self.state.controller.is_in_flight() || self.state.listening {
            ctx.request_repaint();
        } else if self.state.controller.speaking().is_some() {
            ctx.request_repaint_after(SPEECH_POLL_INTERVAL);
        }
    }
}

impl eframe::App for NyayaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Nyaya shutting down");
        self.state.shutdown();
    }
}
