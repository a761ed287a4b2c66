//! The streaming conversation state machine
//!
//! All transitions are synchronous handlers called from one thread: the
//! user submits, fragments arrive, the stream completes or fails, speech
//! playback ends. The controller never talks to the network itself; it hands
//! out a [`ChatRequest`] and is fed the resulting events.

use crate::emotion::Emotion;
use crate::llm::{LanguageModelClient, StyleDirective};
use crate::messages::{Conversation, InlineData, Part, Turn};
use crate::speech::{speakable_text, SpeechSynthesizer};
use futures::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything the language-model client needs for one response.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub request_id: Uuid,
    /// Model turn that receives the streamed text
    pub placeholder_id: Uuid,
    /// Conversation before the new user turn
    pub history: Vec<Turn>,
    /// Parts of the new user turn
    pub parts: Vec<Part>,
    pub system_instruction: String,
}

#[derive(Debug)]
struct InFlight {
    request_id: Uuid,
    placeholder_id: Uuid,
    accumulated: String,
}

/// Turn being read aloud and the synthesizer's number for that utterance
#[derive(Debug, Clone, Copy)]
struct Speaking {
    turn_id: Uuid,
    utterance: u64,
}

#[derive(Debug, Default)]
pub struct ConversationController {
    conversation: Conversation,
    in_flight: Option<InFlight>,
    error: Option<String>,
    style: StyleDirective,
    emotion: Option<Emotion>,
    speaking: Option<Speaking>,
}

impl ConversationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: StyleDirective) -> Self {
        self.style = style;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn current_request(&self) -> Option<Uuid> {
        self.in_flight.as_ref().map(|f| f.request_id)
    }

    /// Model turn still waiting for its response
    pub fn pending_turn(&self) -> Option<Uuid> {
        self.in_flight.as_ref().map(|f| f.placeholder_id)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn style(&self) -> StyleDirective {
        self.style
    }

    pub fn set_style(&mut self, style: StyleDirective) {
        if self.style != style {
            debug!("Reply style: {} -> {}", self.style, style);
            self.style = style;
        }
    }

    pub fn emotion(&self) -> Option<Emotion> {
        self.emotion
    }

    pub fn set_emotion(&mut self, emotion: Option<Emotion>) {
        self.emotion = emotion;
    }

    /// Turn currently being read aloud
    pub fn speaking(&self) -> Option<Uuid> {
        self.speaking.map(|speaking| speaking.turn_id)
    }

    /// Append a user turn and an empty model turn, and open a request.
    ///
    /// Returns `None` without touching any state when a request is already
    /// in flight, or when there is neither text nor an attachment.
    pub fn submit(&mut self, text: &str, attachment: Option<InlineData>) -> Option<ChatRequest> {
        if self.in_flight.is_some() {
            debug!("Submit ignored: a request is already in flight");
            return None;
        }

        let text = text.trim();
        if text.is_empty() && attachment.is_none() {
            return None;
        }

        let mut parts = Vec::with_capacity(2);
        if !text.is_empty() {
            parts.push(Part::text(text));
        }
        if let Some(data) = attachment {
            parts.push(Part::InlineData(data));
        }

        let history = self.conversation.turns().to_vec();
        let user_turn = Turn::user(parts.clone());
        let placeholder = Turn::placeholder();
        let placeholder_id = placeholder.id;

        self.conversation.push(user_turn);
        self.conversation.push(placeholder);
        self.error = None;

        let request_id = Uuid::new_v4();
        self.in_flight = Some(InFlight {
            request_id,
            placeholder_id,
            accumulated: String::new(),
        });

        info!(
            "Submitted request {} ({} parts, style {})",
            request_id,
            parts.len(),
            self.style
        );

        Some(ChatRequest {
            request_id,
            placeholder_id,
            history,
            parts,
            system_instruction: self.system_instruction(),
        })
    }

    fn system_instruction(&self) -> String {
        let prompt = self.style.prompt();
        match self.emotion {
            Some(emotion) => format!("{}\n\n{}", prompt, emotion.tone_hint()),
            None => prompt,
        }
    }

    /// Grow the placeholder turn by one fragment.
    pub fn apply_fragment(&mut self, request_id: Uuid, fragment: &str) {
        let Some(flight) = self.in_flight.as_mut() else {
            return;
        };
        if flight.request_id != request_id {
            return;
        }

        flight.accumulated.push_str(fragment);
        self.conversation
            .replace_text(flight.placeholder_id, flight.accumulated.clone());
    }

    pub fn complete(&mut self, request_id: Uuid) {
        if self.current_request() != Some(request_id) {
            return;
        }
        if let Some(flight) = self.in_flight.take() {
            debug!(
                "Request {} complete: {} chars",
                request_id,
                flight.accumulated.len()
            );
        }
    }

    /// Drop the placeholder turn and surface `message`.
    pub fn fail(&mut self, request_id: Uuid, message: impl Into<String>) {
        if self.current_request() != Some(request_id) {
            return;
        }
        let Some(flight) = self.in_flight.take() else {
            return;
        };

        let message = message.into();
        warn!("Request {} failed: {}", request_id, message);
        self.conversation.remove(flight.placeholder_id);
        self.error = Some(message);
    }

    /// Stream a response from `client` and feed it to the handlers above.
    pub async fn respond(&mut self, client: &dyn LanguageModelClient, request: &ChatRequest) {
        let mut stream = client.stream(
            &request.history,
            &request.parts,
            &request.system_instruction,
        );

        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => self.apply_fragment(request.request_id, &fragment),
                Err(e) => {
                    self.fail(request.request_id, e.display_message());
                    return;
                }
            }
        }

        self.complete(request.request_id);
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Surface a failure from a platform service.
    pub fn report_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Start reading `turn_id` aloud, or stop it if it is already speaking.
    pub fn speak(&mut self, turn_id: Uuid, synthesizer: &mut dyn SpeechSynthesizer) {
        if self.speaking() == Some(turn_id) {
            synthesizer.cancel();
            self.speaking = None;
            return;
        }

        if !synthesizer.is_available() {
            return;
        }
        let Some(turn) = self.conversation.get(turn_id) else {
            return;
        };
        let text = speakable_text(&turn.parts);
        if text.trim().is_empty() {
            return;
        }

        if self.speaking.take().is_some() {
            synthesizer.cancel();
        }

        match synthesizer.speak(turn_id, &text) {
            Ok(utterance) => self.speaking = Some(Speaking { turn_id, utterance }),
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Natural end of `utterance`. Ends from earlier utterances, even of
    /// the same turn, leave the current one marked.
    pub fn speech_finished(&mut self, utterance: u64) {
        if self.speaking.is_some_and(|speaking| speaking.utterance == utterance) {
            self.speaking = None;
        }
    }

    /// Clear the transcript. Refused while a request is in flight.
    pub fn new_chat(&mut self, synthesizer: &mut dyn SpeechSynthesizer) -> bool {
        if self.in_flight.is_some() {
            return false;
        }

        if self.speaking.take().is_some() {
            synthesizer.cancel();
        }
        self.conversation.clear();
        self.error = None;
        info!("Started a new chat");
        true
    }
}
