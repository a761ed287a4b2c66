//! The seam between the conversation controller and a remote model

use crate::messages::{Part, Turn};
use crate::Result;
use futures::Stream;
use std::pin::Pin;

/// Lazily produced text fragments of one model response.
///
/// The stream ends when the transport completes. An `Err` item is terminal:
/// nothing follows it.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

pub trait LanguageModelClient: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Start a streamed response to `new_parts`, given the prior `history`.
    ///
    /// No network activity happens until the returned stream is polled.
    fn stream(&self, history: &[Turn], new_parts: &[Part], system_instruction: &str)
        -> FragmentStream;
}
