//! Remote language-model integration
//!
//! - **client**: the `LanguageModelClient` trait and its fragment stream type
//! - **config**: model name, endpoint and request limits
//! - **gemini**: the Gemini implementation over SSE
//! - **styles**: the fixed set of reply-style system prompts

pub mod client;
pub mod config;
pub mod gemini;
pub mod styles;

pub use client::{FragmentStream, LanguageModelClient};
pub use config::LlmConfig;
pub use gemini::GeminiClient;
pub use styles::StyleDirective;
