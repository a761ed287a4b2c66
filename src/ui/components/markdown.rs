//! Markdown rendering for chat turns
//!
//! Text is parsed with pulldown-cmark into a flat list of [`Block`]s which
//! are then laid out as egui text jobs. Only what answers actually use is
//! kept: headings, paragraphs, (nested) lists, quotes, code and rules.

use crate::ui::theme::Theme;
use egui::text::{LayoutJob, TextFormat};
use egui::{Color32, FontId, RichText, Stroke};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Indent per list nesting level, in points
const LIST_INDENT: f32 = 14.0;

const BODY_SIZE: f32 = 14.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub strong: bool,
    pub emphasis: bool,
    pub code: bool,
    pub strikethrough: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    /// `marker` is `•` or `N.`; empty for a continuation paragraph
    ListItem {
        depth: usize,
        marker: String,
        spans: Vec<Span>,
    },
    Quote(Vec<Span>),
    CodeBlock(String),
    Rule,
}

impl Block {
    /// The block as it reads without markup.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Heading { spans, .. } | Block::Paragraph(spans) | Block::Quote(spans) => {
                join(spans)
            }
            Block::ListItem { marker, spans, .. } if marker.is_empty() => join(spans),
            Block::ListItem { marker, spans, .. } => format!("{} {}", marker, join(spans)),
            Block::CodeBlock(code) => code.trim_end().to_string(),
            Block::Rule => String::new(),
        }
    }
}

fn join(spans: &[Span]) -> String {
    spans.iter().map(|span| span.text.as_str()).collect()
}

/// Text of all blocks without markup, one block per line.
pub fn plain_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(Block::plain_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    spans: Vec<Span>,
    strong: usize,
    emphasis: usize,
    strikethrough: usize,
    heading: Option<u8>,
    /// Next number of each open list; `None` for bullet lists
    lists: Vec<Option<u64>>,
    /// Marker of the current item until its first block is emitted
    item_marker: Option<String>,
    quotes: usize,
    code: Option<String>,
}

impl BlockBuilder {
    fn style(&self) -> SpanStyle {
        SpanStyle {
            strong: self.strong > 0,
            emphasis: self.emphasis > 0,
            code: false,
            strikethrough: self.strikethrough > 0,
        }
    }

    fn push_text(&mut self, text: &str, style: SpanStyle) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.spans.push(Span {
                text: text.to_string(),
                style,
            }),
        }
    }

    fn flush(&mut self) {
        if self.spans.iter().all(|span| span.text.trim().is_empty()) {
            self.spans.clear();
            return;
        }

        let mut spans = std::mem::take(&mut self.spans);
        if let Some(first) = spans.first_mut() {
            first.text = first.text.trim_start().to_string();
        }
        if let Some(last) = spans.last_mut() {
            last.text = last.text.trim_end().to_string();
        }

        let block = if let Some(level) = self.heading {
            Block::Heading { level, spans }
        } else if !self.lists.is_empty() {
            Block::ListItem {
                depth: self.lists.len() - 1,
                marker: self.item_marker.take().unwrap_or_default(),
                spans,
            }
        } else if self.quotes > 0 {
            Block::Quote(spans)
        } else {
            Block::Paragraph(spans)
        };
        self.blocks.push(block);
    }

    fn start_item(&mut self) {
        self.flush();
        let marker = match self.lists.last_mut() {
            Some(Some(number)) => {
                let marker = format!("{}.", number);
                *number += 1;
                marker
            }
            _ => "•".to_string(),
        };
        self.item_marker = Some(marker);
    }

    fn event(&mut self, event: Event<'_>) {
        if let Some(code) = self.code.as_mut() {
            match event {
                Event::Text(text) => code.push_str(&text),
                Event::End(TagEnd::CodeBlock) => {
                    let code = self.code.take().unwrap_or_default();
                    self.blocks.push(Block::CodeBlock(code));
                }
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush();
                self.heading = Some(heading_level(level));
            }
            Event::End(TagEnd::Heading(_)) => {
                self.flush();
                self.heading = None;
            }
            Event::End(TagEnd::Paragraph) => self.flush(),
            Event::Start(Tag::List(start)) => {
                self.flush();
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.flush();
                self.lists.pop();
            }
            Event::Start(Tag::Item) => self.start_item(),
            Event::End(TagEnd::Item) => self.flush(),
            Event::Start(Tag::BlockQuote { .. }) => {
                self.flush();
                self.quotes += 1;
            }
            Event::End(TagEnd::BlockQuote { .. }) => {
                self.flush();
                self.quotes = self.quotes.saturating_sub(1);
            }
            Event::Start(Tag::CodeBlock(_)) => {
                self.flush();
                self.code = Some(String::new());
            }
            Event::Start(Tag::Strong) => self.strong += 1,
            Event::End(TagEnd::Strong) => self.strong = self.strong.saturating_sub(1),
            Event::Start(Tag::Emphasis) => self.emphasis += 1,
            Event::End(TagEnd::Emphasis) => self.emphasis = self.emphasis.saturating_sub(1),
            Event::Start(Tag::Strikethrough) => self.strikethrough += 1,
            Event::End(TagEnd::Strikethrough) => {
                self.strikethrough = self.strikethrough.saturating_sub(1)
            }
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                let style = self.style();
                self.push_text(&text, style);
            }
            Event::Code(text) => {
                let style = SpanStyle {
                    code: true,
                    ..self.style()
                };
                self.push_text(&text, style);
            }
            Event::SoftBreak => {
                let style = self.style();
                self.push_text(" ", style);
            }
            Event::HardBreak => {
                let style = self.style();
                self.push_text("\n", style);
            }
            Event::TaskListMarker(done) => {
                let style = self.style();
                self.push_text(if done { "☑ " } else { "☐ " }, style);
            }
            Event::Rule => {
                self.flush();
                self.blocks.push(Block::Rule);
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Block> {
        if let Some(code) = self.code.take() {
            // Unterminated fence while the answer is still streaming
            self.blocks.push(Block::CodeBlock(code));
        }
        self.flush();
        self.blocks
    }
}

/// Parse markdown into displayable blocks.
pub fn parse(markdown: &str) -> Vec<Block> {
    let mut builder = BlockBuilder::default();
    for event in Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS)
    {
        builder.event(event);
    }
    builder.finish()
}

fn heading_size(level: u8) -> f32 {
    match level {
        1 => 20.0,
        2 => 18.0,
        3 => 16.0,
        _ => 15.0,
    }
}

struct Palette {
    text: Color32,
    strong: Color32,
    code_bg: Color32,
}

fn append_spans(job: &mut LayoutJob, spans: &[Span], size: f32, all_strong: bool, palette: &Palette) {
    for span in spans {
        let font_id = if span.style.code {
            FontId::monospace(size - 1.0)
        } else {
            FontId::proportional(size)
        };
        let color = if span.style.strong || all_strong {
            palette.strong
        } else {
            palette.text
        };
        let mut format = TextFormat {
            font_id,
            color,
            italics: span.style.emphasis,
            ..Default::default()
        };
        if span.style.code {
            format.background = palette.code_bg;
        }
        if span.style.strikethrough {
            format.strikethrough = Stroke::new(1.0, color);
        }
        job.append(&span.text, 0.0, format);
    }
}

/// Lay out `blocks` in `ui` using `color` for body text.
pub fn show(ui: &mut egui::Ui, blocks: &[Block], color: Color32, theme: &Theme) {
    let palette = Palette {
        text: color,
        strong: if color == theme.text_primary {
            ui.visuals().strong_text_color()
        } else {
            color
        },
        code_bg: ui.visuals().code_bg_color,
    };

    for block in blocks {
        match block {
            Block::Heading { level, spans } => {
                let mut job = LayoutJob::default();
                append_spans(&mut job, spans, heading_size(*level), true, &palette);
                ui.label(job);
            }
            Block::Paragraph(spans) => {
                let mut job = LayoutJob::default();
                append_spans(&mut job, spans, BODY_SIZE, false, &palette);
                ui.label(job);
            }
            Block::ListItem {
                depth,
                marker,
                spans,
            } => {
                let mut job = LayoutJob::default();
                let indent = LIST_INDENT * (*depth as f32 + 1.0);
                let marker_format = TextFormat {
                    font_id: FontId::proportional(BODY_SIZE),
                    color,
                    ..Default::default()
                };
                if marker.is_empty() {
                    job.append("", indent, marker_format);
                } else {
                    job.append(&format!("{} ", marker), indent - LIST_INDENT * 0.8, marker_format);
                }
                append_spans(&mut job, spans, BODY_SIZE, false, &palette);
                ui.label(job);
            }
            Block::Quote(spans) => {
                egui::Frame::none()
                    .stroke(Stroke::new(2.0, theme.text_muted))
                    .inner_margin(egui::Margin::symmetric(8.0, 2.0))
                    .show(ui, |ui| {
                        let mut job = LayoutJob::default();
                        let quoted = Palette {
                            text: theme.text_muted,
                            ..palette
                        };
                        append_spans(&mut job, spans, BODY_SIZE, false, &quoted);
                        ui.label(job);
                    });
            }
            Block::CodeBlock(code) => {
                egui::Frame::none()
                    .fill(palette.code_bg)
                    .rounding(theme.button_rounding)
                    .inner_margin(egui::Margin::same(8.0))
                    .show(ui, |ui| {
                        ui.label(RichText::new(code.trim_end()).monospace().color(color));
                    });
            }
            Block::Rule => {
                ui.separator();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Span {
        Span {
            text: text.to_string(),
            style: SpanStyle::default(),
        }
    }

    #[test]
    fn test_strong_and_emphasis() {
        let blocks = parse("The **notice** is _valid_.");
        let Block::Paragraph(spans) = &blocks[0] else {
            panic!("expected a paragraph: {:?}", blocks);
        };
        assert_eq!(spans.len(), 5);
        assert!(spans[1].style.strong);
        assert_eq!(spans[1].text, "notice");
        assert!(spans[3].style.emphasis);
        assert_eq!(plain_text(&blocks), "The notice is valid.");
    }

    #[test]
    fn test_heading_then_bullets() {
        let blocks = parse("### Your rights\n\n- Notice\n- A *fair* hearing\n");
        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 3,
                spans: vec![plain("Your rights")]
            }
        );
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].plain_text(), "• Notice");
        assert_eq!(blocks[2].plain_text(), "• A fair hearing");
    }

    #[test]
    fn test_ordered_and_nested_lists() {
        let blocks = parse("3. File\n   - Form 7\n4. Wait\n");
        let summary: Vec<(usize, String)> = blocks
            .iter()
            .map(|block| match block {
                Block::ListItem { depth, .. } => (*depth, block.plain_text()),
                other => panic!("unexpected block {:?}", other),
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                (0, "3. File".to_string()),
                (1, "• Form 7".to_string()),
                (0, "4. Wait".to_string()),
            ]
        );
    }

    #[test]
    fn test_inline_and_fenced_code() {
        let blocks = parse("Run `cargo`.\n\n```\nsection 420\n```\n");
        let Block::Paragraph(spans) = &blocks[0] else {
            panic!("expected a paragraph");
        };
        assert!(spans[1].style.code);
        assert_eq!(blocks[1], Block::CodeBlock("section 420\n".to_string()));
    }

    #[test]
    fn test_unterminated_fence_while_streaming() {
        let blocks = parse("Steps:\n\n```\nline one");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].plain_text(), "line one");
    }

    #[test]
    fn test_soft_breaks_join_lines() {
        let blocks = parse("first line\nsecond line");
        assert_eq!(plain_text(&blocks), "first line second line");
    }

    #[test]
    fn test_quote_and_rule() {
        let blocks = parse("> Not legal advice.\n\n---\n\nDone");
        assert_eq!(blocks[0], Block::Quote(vec![plain("Not legal advice.")]));
        assert_eq!(blocks[1], Block::Rule);
        assert_eq!(plain_text(&blocks), "Not legal advice.\nDone");
    }

    #[test]
    fn test_empty_text_has_no_blocks() {
        assert!(parse("").is_empty());
        assert!(parse("   \n\n").is_empty());
    }
}
