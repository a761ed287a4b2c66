//! Message list component
//!
//! Renders the transcript: user and model bubbles with markdown text, inline
//! images, the typing indicator for the pending response and a read-aloud
//! toggle per response.

use crate::messages::{InlineData, Part, Turn};
use crate::ui::components::markdown;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Align, Color32, RichText, TextureHandle, Vec2};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// Longest edge of a decoded image texture
const MAX_IMAGE_EDGE: u32 = 512;

/// Decoded image textures keyed by turn and part index, plus the preview of
/// the attachment waiting to be sent. A failed decode is cached as `None` so
/// it is not retried every frame.
#[derive(Default)]
pub struct ImageCache {
    textures: HashMap<(Uuid, usize), Option<TextureHandle>>,
    preview: Option<Option<TextureHandle>>,
}

impl ImageCache {
    pub fn texture(
        &mut self,
        ctx: &egui::Context,
        turn_id: Uuid,
        index: usize,
        data: &InlineData,
    ) -> Option<TextureHandle> {
        self.textures
            .entry((turn_id, index))
            .or_insert_with(|| match decode_image(data) {
                Ok(image) => Some(ctx.load_texture(
                    format!("attachment-{}-{}", turn_id, index),
                    image,
                    egui::TextureOptions::LINEAR,
                )),
                Err(e) => {
                    warn!("Cannot display {} attachment: {}", data.mime_type, e);
                    None
                }
            })
            .clone()
    }

    /// Texture for the pending attachment, decoded on first use.
    pub fn preview(&mut self, ctx: &egui::Context, data: &InlineData) -> Option<TextureHandle> {
        self.preview
            .get_or_insert_with(|| match decode_image(data) {
                Ok(image) => Some(ctx.load_texture(
                    "pending-attachment",
                    image,
                    egui::TextureOptions::LINEAR,
                )),
                Err(e) => {
                    warn!("Cannot preview {} attachment: {}", data.mime_type, e);
                    None
                }
            })
            .clone()
    }

    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }

    /// Drop the preview; the next call to [`ImageCache::preview`] decodes again.
    pub fn clear_preview(&mut self) {
        self.preview = None;
    }

    /// Drop the transcript textures. The attachment preview is kept.
    pub fn clear(&mut self) {
        self.textures.clear();
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// Decode an attachment into pixels, shrunk to fit [`MAX_IMAGE_EDGE`].
pub fn decode_image(data: &InlineData) -> crate::Result<egui::ColorImage> {
    let bytes = data.decode()?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| crate::NyayaError::AttachmentError(e.to_string()))?;
    let image = if image.width() > MAX_IMAGE_EDGE || image.height() > MAX_IMAGE_EDGE {
        image.thumbnail(MAX_IMAGE_EDGE, MAX_IMAGE_EDGE)
    } else {
        image
    };

    let rgba = image.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

pub struct MessageList<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let Self { state, theme } = self;
        let mut speak_request = None;
        let pending = state.controller.pending_turn();
        let speaking = state.controller.speaking();
        let speech_available = state.speech_available();

        egui::ScrollArea::vertical()
            .id_salt("messages")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.add_space(theme.spacing);

                let conversation = state.controller.conversation();
                if conversation.is_empty() {
                    show_empty_state(ui, theme);
                }

                for turn in conversation.iter() {
                    if Some(turn.id) == pending && turn.text().is_empty() {
                        show_typing_indicator(ui, theme);
                    } else {
                        let bubble = TurnBubble {
                            turn,
                            theme,
                            speaking: speaking == Some(turn.id),
                            can_speak: speech_available && Some(turn.id) != pending,
                        };
                        if bubble.show(ui, &mut state.images) {
                            speak_request = Some(turn.id);
                        }
                    }
                    ui.add_space(theme.spacing_sm);
                }

                ui.add_space(theme.spacing);
            });

        if let Some(turn_id) = speak_request {
            state.speak(turn_id);
        }
    }
}

fn show_empty_state(ui: &mut egui::Ui, theme: &Theme) {
    ui.vertical_centered(|ui| {
        ui.add_space(80.0);
        ui.label(
            RichText::new("Welcome to Nyaya Legal AI")
                .size(24.0)
                .color(theme.text_primary),
        );
        ui.add_space(theme.spacing_sm);
        ui.label(
            RichText::new(
                "Ask about a law, a legal procedure or a document. \
                 You can also attach a photo of a notice or agreement.",
            )
            .color(theme.text_muted),
        );
        ui.add_space(theme.spacing_sm);
        ui.label(
            RichText::new("Nyaya provides general legal information, not legal advice.")
                .size(12.0)
                .italics()
                .color(theme.text_muted),
        );
    });
}

fn show_typing_indicator(ui: &mut egui::Ui, theme: &Theme) {
    ui.with_layout(egui::Layout::top_down(Align::LEFT), |ui| {
        egui::Frame::none()
            .fill(theme.assistant_bubble)
            .rounding(theme.bubble_rounding)
            .inner_margin(egui::Margin::symmetric(14.0, 10.0))
            .show(ui, |ui| {
                let response = ui
                    .horizontal(|ui| {
                        let t = ui.ctx().input(|i| i.time);
                        for dot in 0..3 {
                            let alpha = ((t * 3.0 + dot as f64 * 0.6).sin() * 0.5 + 0.5) as f32;
                            ui.label(
                                RichText::new("●")
                                    .size(10.0)
                                    .color(theme.text_muted.gamma_multiply(0.3 + alpha * 0.7)),
                            );
                        }
                    })
                    .response;
                response.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Label, true, "Nyaya is typing")
                });
            });
    });
    ui.ctx().request_repaint();
}

struct TurnBubble<'a> {
    turn: &'a Turn,
    theme: &'a Theme,
    speaking: bool,
    can_speak: bool,
}

impl TurnBubble<'_> {
    /// Returns `true` when the read-aloud toggle was clicked.
    fn show(self, ui: &mut egui::Ui, images: &mut ImageCache) -> bool {
        let is_user = self.turn.is_user();
        let (fill, text_color, align) = if is_user {
            (self.theme.user_bubble, self.theme.user_text, Align::RIGHT)
        } else {
            (self.theme.assistant_bubble, self.theme.text_primary, Align::LEFT)
        };
        let mut speak_clicked = false;

        ui.with_layout(egui::Layout::top_down(align), |ui| {
            ui.label(
                RichText::new(if is_user { "You" } else { "Nyaya" })
                    .size(12.0)
                    .color(self.theme.text_muted),
            );

            let max_width = ui.available_width() * 0.75;
            egui::Frame::none()
                .fill(fill)
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_max_width(max_width);
                    for (index, part) in self.turn.parts.iter().enumerate() {
                        match part {
                            Part::Text(text) if text.is_empty() => {}
                            Part::Text(text) => {
                                let blocks = markdown::parse(text);
                                let plain = markdown::plain_text(&blocks);
                                let label = if is_user {
                                    format!("User message: {}", plain)
                                } else {
                                    format!("Assistant response: {}", plain)
                                };
                                let response = ui
                                    .vertical(|ui| {
                                        markdown::show(ui, &blocks, text_color, self.theme)
                                    })
                                    .response;
                                response.widget_info(|| {
                                    egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &label)
                                });
                            }
                            Part::InlineData(data) => {
                                self.show_attachment(ui, images, index, data, text_color);
                            }
                        }
                    }
                });

            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(self.turn.created_at.format("%H:%M").to_string())
                        .size(10.0)
                        .color(self.theme.text_muted),
                );

                if !is_user && self.can_speak {
                    let (icon, label) = if self.speaking {
                        ("⏹", "Stop reading")
                    } else {
                        ("🔊", "Read aloud")
                    };
                    let response = ui
                        .add(egui::Button::new(RichText::new(icon).size(12.0)).frame(false))
                        .on_hover_text(label);
                    response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Button, true, label)
                    });
                    speak_clicked = response.clicked();
                }
            });
        });

        speak_clicked
    }

    fn show_attachment(
        &self,
        ui: &mut egui::Ui,
        images: &mut ImageCache,
        index: usize,
        data: &InlineData,
        text_color: Color32,
    ) {
        match images.texture(ui.ctx(), self.turn.id, index, data) {
            Some(texture) => {
                let size = fit_size(texture.size_vec2(), 240.0);
                ui.add(egui::Image::new((texture.id(), size)).rounding(self.theme.button_rounding));
            }
            None => {
                ui.label(
                    RichText::new(format!("🖼 {} attachment", data.mime_type)).color(text_color),
                );
            }
        }
    }
}

/// Scale `size` down so its longest edge is at most `max_edge`.
pub fn fit_size(size: Vec2, max_edge: f32) -> Vec2 {
    let longest = size.x.max(size.y);
    if longest <= max_edge || longest <= 0.0 {
        size
    } else {
        size * (max_edge / longest)
    }
}
