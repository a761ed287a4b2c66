//! Worker thread that consumes response streams off the UI thread
//!
//! The UI sends [`ChatCommand`]s and polls [`ChatEvent`]s once per frame.
//! Commands are handled one at a time, so at most one stream is consumed.

use crate::conversation::controller::{ChatRequest, ConversationController};
use crate::llm::LanguageModelClient;
use crate::{NyayaError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{debug, error, info};
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

/// Commands that can be sent to the chat pipeline
#[derive(Debug, Clone)]
pub enum ChatCommand {
    /// Stream a response for this request
    Generate(ChatRequest),

    /// Stop the worker
    Shutdown,
}

/// Events emitted by the chat pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// One more piece of the response
    Fragment { request_id: Uuid, text: String },

    /// The stream ended normally
    Complete {
        request_id: Uuid,
        fragments: usize,
        elapsed_ms: u64,
    },

    /// The stream failed; `message` is ready for display
    Error { request_id: Uuid, message: String },

    /// The worker has stopped
    Shutdown,
}

impl ChatEvent {
    /// Feed this event to the controller. Returns `false` for `Shutdown`.
    pub fn apply(self, controller: &mut ConversationController) -> bool {
        match self {
            ChatEvent::Fragment { request_id, text } => {
                controller.apply_fragment(request_id, &text)
            }
            ChatEvent::Complete { request_id, .. } => controller.complete(request_id),
            ChatEvent::Error {
                request_id,
                message,
            } => controller.fail(request_id, message),
            ChatEvent::Shutdown => return false,
        }
        true
    }
}

pub struct ChatPipeline {
    client: Arc<dyn LanguageModelClient>,
    command_tx: Sender<ChatCommand>,
    command_rx: Receiver<ChatCommand>,
    event_tx: Sender<ChatEvent>,
    event_rx: Receiver<ChatEvent>,
}

impl ChatPipeline {
    pub fn new(client: Arc<dyn LanguageModelClient>) -> Self {
        let (command_tx, command_rx) = bounded(CHANNEL_CAPACITY);
        let (event_tx, event_rx) = bounded(CHANNEL_CAPACITY);

        Self {
            client,
            command_tx,
            command_rx,
            event_tx,
            event_rx,
        }
    }

    pub fn command_sender(&self) -> Sender<ChatCommand> {
        self.command_tx.clone()
    }

    pub fn event_receiver(&self) -> Receiver<ChatEvent> {
        self.event_rx.clone()
    }

    /// Spawn the worker thread. The pipeline runs until `Shutdown` or until
    /// every command sender is dropped.
    pub fn start_worker(self) -> Result<()> {
        let client = self.client;
        let command_rx = self.command_rx;
        let event_tx = self.event_tx;

        std::thread::Builder::new()
            .name("chat-pipeline".to_string())
            .spawn(move || {
                info!("Chat pipeline worker starting ({})", client.name());

                let runtime = match Runtime::new() {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!("Failed to create tokio runtime: {}", e);
                        let _ = event_tx.send(ChatEvent::Shutdown);
                        return;
                    }
                };

                loop {
                    match command_rx.recv() {
                        Ok(ChatCommand::Generate(request)) => {
                            runtime.block_on(stream_response(client.as_ref(), &request, &event_tx));
                        }
                        Ok(ChatCommand::Shutdown) => {
                            info!("Chat pipeline worker shutting down");
                            let _ = event_tx.send(ChatEvent::Shutdown);
                            break;
                        }
                        Err(_) => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }

                info!("Chat pipeline worker stopped");
            })
            .map_err(|e| NyayaError::ChannelError(format!("Failed to spawn worker: {}", e)))?;

        Ok(())
    }
}

async fn stream_response(
    client: &dyn LanguageModelClient,
    request: &ChatRequest,
    event_tx: &Sender<ChatEvent>,
) {
    let request_id = request.request_id;
    let start_time = Instant::now();
    let mut fragments = 0;

    debug!("Processing generate request: {}", request_id);

    let mut stream = client.stream(
        &request.history,
        &request.parts,
        &request.system_instruction,
    );

    while let Some(item) = stream.next().await {
        let event = match item {
            Ok(text) => {
                fragments += 1;
                ChatEvent::Fragment { request_id, text }
            }
            Err(e) => {
                error!("Generation failed: {}", e);
                let _ = event_tx.send(ChatEvent::Error {
                    request_id,
                    message: e.display_message(),
                });
                return;
            }
        };

        if event_tx.send(event).is_err() {
            debug!("Event receiver gone; abandoning request {}", request_id);
            return;
        }
    }

    let elapsed_ms = start_time.elapsed().as_millis() as u64;
    debug!(
        "Generation complete: {} fragments in {}ms",
        fragments, elapsed_ms
    );

    let _ = event_tx.send(ChatEvent::Complete {
        request_id,
        fragments,
        elapsed_ms,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FragmentStream;
    use crate::messages::{Part, Turn};
    use std::time::Duration;

    struct EchoClient;

    impl LanguageModelClient for EchoClient {
        fn name(&self) -> &str {
            "echo"
        }

        fn stream(&self, _history: &[Turn], new_parts: &[Part], _system: &str) -> FragmentStream {
            let words: Vec<Result<String>> = new_parts
                .iter()
                .filter_map(Part::as_text)
                .flat_map(|text| text.split(' ').map(|w| Ok(w.to_string())).collect::<Vec<_>>())
                .collect();
            Box::pin(futures::stream::iter(words))
        }
    }

    struct FailingClient;

    impl LanguageModelClient for FailingClient {
        fn name(&self) -> &str {
            "failing"
        }

        fn stream(&self, _history: &[Turn], _parts: &[Part], _system: &str) -> FragmentStream {
            Box::pin(futures::stream::iter(vec![Err(NyayaError::RequestError(
                "connection refused".to_string(),
            ))]))
        }
    }

    fn recv(rx: &Receiver<ChatEvent>) -> ChatEvent {
        rx.recv_timeout(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_pipeline_streams_fragments() {
        let pipeline = ChatPipeline::new(Arc::new(EchoClient));
        let commands = pipeline.command_sender();
        let events = pipeline.event_receiver();
        pipeline.start_worker().unwrap();

        let mut controller = ConversationController::new();
        let request = controller.submit("Hello there", None).unwrap();
        let request_id = request.request_id;
        commands.send(ChatCommand::Generate(request)).unwrap();

        assert_eq!(
            recv(&events),
            ChatEvent::Fragment {
                request_id,
                text: "Hello".to_string()
            }
        );
        assert_eq!(
            recv(&events),
            ChatEvent::Fragment {
                request_id,
                text: "there".to_string()
            }
        );
        match recv(&events) {
            ChatEvent::Complete {
                request_id: id,
                fragments,
                ..
            } => {
                assert_eq!(id, request_id);
                assert_eq!(fragments, 2);
            }
            other => panic!("Unexpected event: {:?}", other),
        }

        commands.send(ChatCommand::Shutdown).unwrap();
        assert_eq!(recv(&events), ChatEvent::Shutdown);
    }

    #[test]
    fn test_pipeline_reports_display_message() {
        let pipeline = ChatPipeline::new(Arc::new(FailingClient));
        let commands = pipeline.command_sender();
        let events = pipeline.event_receiver();
        pipeline.start_worker().unwrap();

        let mut controller = ConversationController::new();
        let request = controller.submit("hi", None).unwrap();
        commands.send(ChatCommand::Generate(request)).unwrap();

        let event = recv(&events);
        assert_eq!(
            event,
            ChatEvent::Error {
                request_id: controller.current_request().unwrap(),
                message: "Failed to get response from AI: connection refused".to_string()
            }
        );

        assert!(event.apply(&mut controller));
        assert_eq!(controller.conversation().len(), 1);
        assert!(controller.error().is_some());
    }

    #[test]
    fn test_shutdown_event_stops_apply() {
        let mut controller = ConversationController::new();
        assert!(!ChatEvent::Shutdown.apply(&mut controller));
    }
}
