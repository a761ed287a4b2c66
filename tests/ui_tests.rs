//! UI automation tests using egui_kittest and AccessKit
//!
//! These drive the real application frame through the accessibility tree:
//! widgets are found by their labels, clicked and typed into, and the
//! resulting state is checked.

use crossbeam_channel::{unbounded, Receiver, Sender};
use egui_kittest::kittest::Queryable;
use egui_kittest::Harness;
use nyaya::conversation::{ChatCommand, ChatEvent};
use nyaya::speech::{SpeechEvent, SpeechSynthesizer};
use nyaya::ui::{AppState, Dialog, NyayaApp, Theme, View};
use nyaya::Result;
use uuid::Uuid;

fn harness(state: AppState) -> Harness<'static, NyayaApp> {
    Harness::builder()
        .with_size(egui::Vec2::new(800.0, 600.0))
        .build_state(
            |ctx, app: &mut NyayaApp| app.ui(ctx),
            NyayaApp::with_state(state, Theme::default()),
        )
}

/// State wired to channels the test plays the worker for.
fn connected() -> (AppState, Receiver<ChatCommand>, Sender<ChatEvent>) {
    let (cmd_tx, cmd_rx) = unbounded();
    let (event_tx, event_rx) = unbounded();
    (AppState::new().with_channels(cmd_tx, event_rx), cmd_rx, event_tx)
}

struct SilentSynth {
    rx: Receiver<SpeechEvent>,
    _tx: Sender<SpeechEvent>,
}

impl SilentSynth {
    fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { rx, _tx: tx }
    }
}

impl SpeechSynthesizer for SilentSynth {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&mut self, _turn_id: Uuid, _text: &str) -> Result<u64> {
        Ok(1)
    }

    fn cancel(&mut self) {}

    fn events(&self) -> Receiver<SpeechEvent> {
        self.rx.clone()
    }
}

fn answered(state: &mut AppState, question: &str, answer: &str) {
    let request = state.controller.submit(question, None).unwrap();
    state.controller.apply_fragment(request.request_id, answer);
    state.controller.complete(request.request_id);
}

#[test]
fn test_input_and_send_button_exist() {
    let mut harness = harness(AppState::new());
    harness.run();

    let _input = harness.get_by_label("Message input");
    let _send = harness.get_by_label("Send message");
    let _attach = harness.get_by_label("Attach image");
}

#[test]
fn test_type_text_into_input() {
    let mut harness = harness(AppState::new());
    harness.run();

    harness.get_by_label("Message input").focus();
    harness.run();
    harness.get_by_label("Message input").type_text("Is a verbal contract valid?");
    harness.run();

    assert_eq!(
        harness.state().state().input_text,
        "Is a verbal contract valid?"
    );
}

#[test]
fn test_cannot_send_empty_message() {
    let mut harness = harness(AppState::new());
    harness.run();

    harness.get_by_label("Send message").click();
    harness.run();

    assert!(harness.state().state().controller.conversation().is_empty());
}

#[test]
fn test_send_streams_response_into_transcript() {
    let (state, commands, events) = connected();
    let mut harness = harness(state);
    harness.run();

    harness.get_by_label("Message input").focus();
    harness.run();
    harness.get_by_label("Message input").type_text("What is a lease?");
    harness.run();
    harness.get_by_label("Send message").click();
    harness.step();

    let ChatCommand::Generate(request) = commands.try_recv().unwrap() else {
        panic!("expected a generate command");
    };
    harness.step();
    let _user = harness.get_by_label("User message: What is a lease?");
    let _typing = harness.get_by_label("Nyaya is typing");
    assert!(harness.state().state().input_text.is_empty());

    for text in ["A lease is ", "a rental agreement."] {
        events
            .send(ChatEvent::Fragment {
                request_id: request.request_id,
                text: text.to_string(),
            })
            .unwrap();
    }
    events
        .send(ChatEvent::Complete {
            request_id: request.request_id,
            fragments: 2,
            elapsed_ms: 5,
        })
        .unwrap();
    harness.run();

    let _answer = harness.get_by_label("Assistant response: A lease is a rental agreement.");
    assert!(harness.query_by_label("Nyaya is typing").is_none());
}

#[test]
fn test_error_toast_shows_and_dismisses() {
    let mut harness = harness(AppState::new());
    harness.run();

    harness.get_by_label("Message input").focus();
    harness.run();
    harness.get_by_label("Message input").type_text("Hello");
    harness.run();
    harness.get_by_label("Send message").click();
    harness.run();

    let _error = harness.get_by_label(
        "Error: Failed to get response from AI: No language model is connected",
    );
    assert_eq!(harness.state().state().controller.conversation().len(), 1);

    harness.get_by_label("Dismiss error").click();
    harness.run();

    assert!(harness.state().state().controller.error().is_none());
    assert_eq!(harness.state().state().controller.conversation().len(), 1);
}

#[test]
fn test_answer_renders_markdown() {
    let mut state = AppState::new();
    answered(
        &mut state,
        "Is my notice valid?",
        "### Short answer\n\nThe **notice** is _valid_.\n\n- Keep a copy\n- Reply in `30` days",
    );
    let mut harness = harness(state);
    harness.run();

    let _heading = harness.get_by_label("Short answer");
    let _paragraph = harness.get_by_label("The notice is valid.");
    let _first = harness.get_by_label("• Keep a copy");
    let _second = harness.get_by_label("• Reply in 30 days");
    let _answer = harness.get_by_label(
        "Assistant response: Short answer\nThe notice is valid.\n• Keep a copy\n• Reply in 30 days",
    );
    assert!(harness.query_by_label("The **notice** is _valid_.").is_none());
    assert!(harness.query_by_label("### Short answer").is_none());
}

#[test]
fn test_error_visible_in_analytics_view() {
    let mut state = AppState::new();
    state.view = View::Analytics;
    state
        .controller
        .report_error("Speech recognition error: audio-capture");
    let mut harness = harness(state);
    harness.run();

    let _error = harness.get_by_label("Error: Speech recognition error: audio-capture");
    harness.get_by_label("Dismiss error").click();
    harness.run();

    assert!(harness.state().state().controller.error().is_none());
    assert_eq!(harness.state().state().view, View::Analytics);
}

#[test]
fn test_read_aloud_hidden_without_speech_engine() {
    let mut state = AppState::new();
    answered(&mut state, "Hi", "Hello");
    let mut harness = harness(state);
    harness.run();

    let _answer = harness.get_by_label("Assistant response: Hello");
    assert!(harness.query_by_label("Read aloud").is_none());
}

#[test]
fn test_read_aloud_toggles() {
    let mut state = AppState::new().with_synthesizer(Box::new(SilentSynth::new()));
    answered(&mut state, "Hi", "Hello");
    let mut harness = harness(state);
    harness.run();

    harness.get_by_label("Read aloud").click();
    harness.run();
    assert!(harness.state().state().controller.speaking().is_some());

    harness.get_by_label("Stop reading").click();
    harness.run();
    assert!(harness.state().state().controller.speaking().is_none());
}

#[test]
fn test_menu_switches_to_analytics() {
    let mut state = AppState::new();
    answered(&mut state, "One", "First answer");
    let mut harness = harness(state);
    harness.run();

    harness.get_by_label("Menu").click();
    harness.run();
    harness.get_by_label("Analytics view").click();
    harness.run();

    assert_eq!(harness.state().state().view, View::Analytics);
    let _questions = harness.get_by_label("Questions asked: 1");
    let _responses = harness.get_by_label("Responses: 1");
}

#[test]
fn test_new_chat_clears_transcript() {
    let mut state = AppState::new();
    answered(&mut state, "One", "First answer");
    let mut harness = harness(state);
    harness.run();

    harness.get_by_label("Menu").click();
    harness.run();
    harness.get_by_label("New chat").click();
    harness.run();

    assert!(harness.state().state().controller.conversation().is_empty());
}

#[test]
fn test_feedback_requires_rating() {
    let mut harness = harness(AppState::new());
    harness.run();

    harness.get_by_label("Menu").click();
    harness.run();
    harness.get_by_label("Feedback").click();
    harness.run();
    assert_eq!(harness.state().state().dialog, Some(Dialog::Feedback));

    harness.get_by_label("Submit feedback").click();
    harness.run();
    assert!(harness.state().state().feedback_log.is_empty());

    harness.get_by_label("Good response").click();
    harness.run();
    harness.get_by_label("Submit feedback").click();
    harness.run();

    assert_eq!(harness.state().state().feedback_log.len(), 1);
    assert_eq!(harness.state().state().dialog, None);
}

#[test]
fn test_privacy_dialog_closes() {
    let mut state = AppState::new();
    state.open_dialog(Dialog::Privacy);
    let mut harness = harness(state);
    harness.run();

    harness.get_by_label("Close privacy notice").click();
    harness.run();

    assert_eq!(harness.state().state().dialog, None);
}

#[test]
fn test_emotion_selection_affects_next_request() {
    let (mut state, commands, _events) = connected();
    state.open_dialog(Dialog::Emotion);
    let mut harness = harness(state);
    harness.run();

    harness.get_by_label("🤔 Confused").click();
    harness.run();
    assert_eq!(
        harness.state().state().controller.emotion(),
        Some(nyaya::emotion::Emotion::Confused)
    );

    harness.state_mut().state_mut().input_text = "Explain probate".to_string();
    harness.state_mut().state_mut().send_message();

    let ChatCommand::Generate(request) = commands.try_recv().unwrap() else {
        panic!("expected a generate command");
    };
    assert!(request
        .system_instruction
        .ends_with(nyaya::emotion::Emotion::Confused.tone_hint()));
}
