//! Application state management
//!
//! Everything the window shows lives here. The conversation itself is owned
//! by the [`ConversationController`]; this struct wires it to the chat
//! worker and the speech engines and holds purely presentational state.

use crate::analytics::SessionStats;
use crate::conversation::{ChatCommand, ChatEvent, ChatPipeline, ConversationController};
use crate::emotion::Emotion;
use crate::feedback::{FeedbackDraft, FeedbackLog};
use crate::llm::StyleDirective;
use crate::messages::InlineData;
use crate::speech::{
    RecognitionEvent, SpeechEvent, SpeechRecognizer, SpeechSynthesizer, TranscriptAssembler,
    UnavailableRecognizer, UnavailableSynthesizer,
};
use crate::ui::components::message_list::ImageCache;
use crate::{NyayaError, Result};
use crossbeam_channel::{Receiver, Sender};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Extensions offered by the attachment dialog
pub const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "webp", "heic", "heif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Chat,
    Analytics,
}

/// Which dialog is open, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialog {
    Feedback,
    Privacy,
    Emotion,
}

pub struct AppState {
    pub controller: ConversationController,

    /// Current text input
    pub input_text: String,

    /// Image waiting to be sent with the next message
    pub pending_attachment: Option<InlineData>,

    pub view: View,
    pub dialog: Option<Dialog>,
    pub show_side_menu: bool,

    pub feedback_draft: FeedbackDraft,
    pub feedback_log: FeedbackLog,

    /// Whether speech recognition is running
    pub listening: bool,

    /// Duration of the most recent completed response
    pub last_response_ms: Option<u64>,

    pub images: ImageCache,

    chat_tx: Option<Sender<ChatCommand>>,
    chat_rx: Option<Receiver<ChatEvent>>,

    synthesizer: Box<dyn SpeechSynthesizer>,
    speech_rx: Receiver<SpeechEvent>,

    recognizer: Box<dyn SpeechRecognizer>,
    recognition_rx: Receiver<RecognitionEvent>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// State with no model connection and no speech engines.
    pub fn new() -> Self {
        let synthesizer: Box<dyn SpeechSynthesizer> = Box::new(UnavailableSynthesizer::new());
        let recognizer: Box<dyn SpeechRecognizer> = Box::new(UnavailableRecognizer::new());
        let speech_rx = synthesizer.events();
        let recognition_rx = recognizer.events();

        Self {
            controller: ConversationController::new(),
            input_text: String::new(),
            pending_attachment: None,
            view: View::Chat,
            dialog: None,
            show_side_menu: false,
            feedback_draft: FeedbackDraft::default(),
            feedback_log: FeedbackLog::new(),
            listening: false,
            last_response_ms: None,
            images: ImageCache::default(),
            chat_tx: None,
            chat_rx: None,
            synthesizer,
            speech_rx,
            recognizer,
            recognition_rx,
        }
    }

    pub fn with_style(mut self, style: StyleDirective) -> Self {
        self.controller.set_style(style);
        self
    }

    /// Attach channels of an already running chat worker.
    pub fn with_channels(mut self, tx: Sender<ChatCommand>, rx: Receiver<ChatEvent>) -> Self {
        self.chat_tx = Some(tx);
        self.chat_rx = Some(rx);
        self
    }

    /// Start `pipeline` and route requests through it.
    pub fn with_pipeline(self, pipeline: ChatPipeline) -> Result<Self> {
        let tx = pipeline.command_sender();
        let rx = pipeline.event_receiver();
        pipeline.start_worker()?;
        Ok(self.with_channels(tx, rx))
    }

    pub fn with_synthesizer(mut self, synthesizer: Box<dyn SpeechSynthesizer>) -> Self {
        self.speech_rx = synthesizer.events();
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn SpeechRecognizer>) -> Self {
        self.recognition_rx = recognizer.events();
        self.recognizer = recognizer;
        self
    }

    pub fn speech_available(&self) -> bool {
        self.synthesizer.is_available()
    }

    pub fn recognition_available(&self) -> bool {
        self.recognizer.is_available()
    }

    pub fn can_send(&self) -> bool {
        !self.controller.is_in_flight()
            && (!self.input_text.trim().is_empty() || self.pending_attachment.is_some())
    }

    /// Submit the input text and pending attachment.
    pub fn send_message(&mut self) {
        let attachment = self.pending_attachment.clone();
        let Some(request) = self.controller.submit(&self.input_text, attachment) else {
            return;
        };

        self.input_text.clear();
        self.pending_attachment = None;
        self.images.clear_preview();

        let request_id = request.request_id;
        let dispatched = match &self.chat_tx {
            Some(tx) => tx
                .send(ChatCommand::Generate(request))
                .map_err(|e| NyayaError::ChannelError(format!("Chat worker unavailable: {}", e))),
            None => Err(NyayaError::ChannelError(
                "No language model is connected".to_string(),
            )),
        };

        if let Err(e) = dispatched {
            warn!("Could not dispatch request {}: {}", request_id, e);
            self.controller.fail(request_id, e.display_message());
        }
    }

    /// Apply everything the workers and speech engines reported since the
    /// last frame.
    pub fn poll_events(&mut self) {
        if let Some(rx) = &self.chat_rx {
            while let Ok(event) = rx.try_recv() {
                if let ChatEvent::Complete { elapsed_ms, .. } = &event {
                    self.last_response_ms = Some(*elapsed_ms);
                }
                if !event.apply(&mut self.controller) {
                    info!("Chat pipeline shut down");
                }
            }
        }

        while let Ok(SpeechEvent::Finished { turn_id, utterance }) = self.speech_rx.try_recv() {
            debug!("Finished reading {}", turn_id);
            self.controller.speech_finished(utterance);
        }

        while let Ok(event) = self.recognition_rx.try_recv() {
            self.handle_recognition(event);
        }
    }

    fn handle_recognition(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Result {
                result_index,
                results,
            } => {
                self.input_text = TranscriptAssembler::assemble(result_index, &results);
            }
            RecognitionEvent::Ended => {
                debug!("Speech recognition ended");
                self.listening = false;
            }
            RecognitionEvent::Error(e) => {
                self.controller
                    .report_error(format!("Speech recognition error: {}", e));
                self.listening = false;
            }
        }
    }

    pub fn toggle_listening(&mut self) {
        if self.listening {
            self.recognizer.stop();
            self.listening = false;
            return;
        }

        if !self.recognizer.is_available() {
            return;
        }

        match self.recognizer.start() {
            Ok(()) => self.listening = true,
            Err(e) => self
                .controller
                .report_error(format!("Speech recognition error: {}", e)),
        }
    }

    /// Read a turn aloud, or stop it if it is already being read.
    pub fn speak(&mut self, turn_id: Uuid) {
        self.controller.speak(turn_id, self.synthesizer.as_mut());
    }

    pub fn attach_file(&mut self, path: &Path) {
        match InlineData::from_path(path) {
            Ok(data) => {
                info!(
                    "Attached {} ({}, {} bytes)",
                    path.display(),
                    data.mime_type,
                    data.decoded_len()
                );
                self.pending_attachment = Some(data);
                self.images.clear_preview();
            }
            Err(e) => self.controller.report_error(e.to_string()),
        }
    }

    /// Ask the user for an image with the native file dialog.
    pub fn pick_attachment(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Attach an image")
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .pick_file();

        if let Some(path) = picked {
            self.attach_file(&path);
        }
    }

    pub fn remove_attachment(&mut self) {
        self.pending_attachment = None;
        self.images.clear_preview();
    }

    pub fn set_style(&mut self, style: StyleDirective) {
        self.controller.set_style(style);
    }

    pub fn set_emotion(&mut self, emotion: Option<Emotion>) {
        self.controller.set_emotion(emotion);
        self.dialog = None;
    }

    pub fn new_chat(&mut self) {
        if self.controller.new_chat(self.synthesizer.as_mut()) {
            self.images.clear();
            self.view = View::Chat;
            self.show_side_menu = false;
        }
    }

    pub fn open_dialog(&mut self, dialog: Dialog) {
        self.dialog = Some(dialog);
        self.show_side_menu = false;
    }

    pub fn close_dialog(&mut self) {
        if self.dialog == Some(Dialog::Feedback) {
            self.feedback_draft = FeedbackDraft::default();
        }
        self.dialog = None;
    }

    pub fn submit_feedback(&mut self) {
        if let Some(feedback) = self.feedback_draft.take() {
            self.feedback_log.record(feedback);
            self.dialog = None;
        }
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats::collect(self.controller.conversation(), &self.feedback_log)
    }

    /// Stop background work before the window closes.
    pub fn shutdown(&mut self) {
        self.synthesizer.cancel();
        if self.listening {
            self.recognizer.stop();
            self.listening = false;
        }
        if let Some(tx) = self.chat_tx.take() {
            let _ = tx.send(ChatCommand::Shutdown);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Rating;
    use crate::speech::RecognitionResult;
    use crossbeam_channel::unbounded;

    struct ScriptedRecognizer {
        tx: Sender<RecognitionEvent>,
        rx: Receiver<RecognitionEvent>,
    }

    impl ScriptedRecognizer {
        fn new() -> Self {
            let (tx, rx) = unbounded();
            Self { tx, rx }
        }
    }

    impl SpeechRecognizer for ScriptedRecognizer {
        fn is_available(&self) -> bool {
            true
        }

        fn start(&mut self) -> Result<()> {
            self.tx
                .send(RecognitionEvent::Result {
                    result_index: 0,
                    results: vec![
                        RecognitionResult::final_("What is"),
                        RecognitionResult::interim(" a lease"),
                    ],
                })
                .ok();
            self.tx.send(RecognitionEvent::Ended).ok();
            Ok(())
        }

        fn stop(&mut self) {}

        fn events(&self) -> Receiver<RecognitionEvent> {
            self.rx.clone()
        }
    }

    #[test]
    fn test_send_without_backend_rolls_back() {
        let mut state = AppState::new();
        state.input_text = "Hello".to_string();

        state.send_message();

        assert!(state.input_text.is_empty());
        assert_eq!(state.controller.conversation().len(), 1);
        assert!(!state.controller.is_in_flight());
        assert!(state
            .controller
            .error()
            .unwrap()
            .starts_with("Failed to get response from AI:"));
    }

    #[test]
    fn test_send_dispatches_and_applies_events() {
        let (cmd_tx, cmd_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let mut state = AppState::new().with_channels(cmd_tx, event_rx);
        state.input_text = "Hello".to_string();

        state.send_message();
        assert!(!state.can_send());

        let ChatCommand::Generate(request) = cmd_rx.try_recv().unwrap() else {
            panic!("expected a generate command");
        };
        event_tx
            .send(ChatEvent::Fragment {
                request_id: request.request_id,
                text: "Hi".to_string(),
            })
            .unwrap();
        event_tx
            .send(ChatEvent::Complete {
                request_id: request.request_id,
                fragments: 1,
                elapsed_ms: 42,
            })
            .unwrap();

        state.poll_events();

        assert!(!state.controller.is_in_flight());
        assert_eq!(state.controller.conversation().last().unwrap().text(), "Hi");
        assert_eq!(state.last_response_ms, Some(42));
    }

    #[test]
    fn test_rejected_send_keeps_input() {
        let (cmd_tx, _cmd_rx) = unbounded();
        let (_event_tx, event_rx) = unbounded();
        let mut state = AppState::new().with_channels(cmd_tx, event_rx);
        state.input_text = "first".to_string();
        state.send_message();

        state.input_text = "second".to_string();
        state.send_message();

        assert_eq!(state.input_text, "second");
        assert_eq!(state.controller.conversation().len(), 2);
    }

    #[test]
    fn test_recognition_fills_input() {
        let mut state = AppState::new().with_recognizer(Box::new(ScriptedRecognizer::new()));

        state.toggle_listening();
        assert!(state.listening);

        state.poll_events();
        assert_eq!(state.input_text, "What is a lease");
        assert!(!state.listening);
    }

    #[test]
    fn test_recognition_error_reported() {
        let mut state = AppState::new();
        state.handle_recognition(RecognitionEvent::Error("not-allowed".to_string()));
        assert_eq!(
            state.controller.error(),
            Some("Speech recognition error: not-allowed")
        );
    }

    #[test]
    fn test_unavailable_recognizer_is_silent() {
        let mut state = AppState::new();
        state.toggle_listening();
        assert!(!state.listening);
        assert!(state.controller.error().is_none());
    }

    #[test]
    fn test_attach_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notice.png");
        std::fs::write(&path, b"png-bytes").unwrap();

        let mut state = AppState::new();
        state.attach_file(&path);
        assert!(state.pending_attachment.is_some());
        assert!(state.can_send());

        state.remove_attachment();
        assert!(state.pending_attachment.is_none());
        assert!(!state.can_send());
    }

    #[test]
    fn test_attachment_preview_cached_until_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notice.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 128, 128, 255]))
            .save(&path)
            .unwrap();
        let ctx = egui::Context::default();

        let mut state = AppState::new();
        state.attach_file(&path);
        let data = state.pending_attachment.clone().unwrap();
        let first = state.images.preview(&ctx, &data).unwrap();
        let again = state.images.preview(&ctx, &data).unwrap();
        assert_eq!(first.id(), again.id());

        state.remove_attachment();
        assert!(!state.images.has_preview());

        state.attach_file(&path);
        state.images.preview(&ctx, &data);
        state.input_text = "What does this notice mean?".to_string();
        state.send_message();
        assert!(!state.images.has_preview());
    }

    #[test]
    fn test_attach_non_image_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hi").unwrap();

        let mut state = AppState::new();
        state.attach_file(&path);
        assert!(state.pending_attachment.is_none());
        assert!(state.controller.error().is_some());
    }

    #[test]
    fn test_feedback_flow() {
        let mut state = AppState::new();
        state.open_dialog(Dialog::Feedback);

        state.submit_feedback();
        assert_eq!(state.dialog, Some(Dialog::Feedback));
        assert!(state.feedback_log.is_empty());

        state.feedback_draft.rating = Some(Rating::Good);
        state.feedback_draft.comments = " clear answer ".to_string();
        state.submit_feedback();

        assert_eq!(state.dialog, None);
        assert_eq!(state.feedback_log.entries()[0].comments, "clear answer");
        assert_eq!(state.stats().good_feedback, 1);
    }

    #[test]
    fn test_new_chat_returns_to_chat_view() {
        let mut state = AppState::new();
        state.view = View::Analytics;
        state.show_side_menu = true;

        state.new_chat();

        assert_eq!(state.view, View::Chat);
        assert!(!state.show_side_menu);
    }
}
