//! Conversation state and the worker that feeds it
//!
//! - **controller**: the transcript, in-flight request and error slot
//! - **pipeline**: background consumption of response streams

pub mod controller;
pub mod pipeline;

pub use controller::{ChatRequest, ConversationController};
pub use pipeline::{ChatCommand, ChatEvent, ChatPipeline};
