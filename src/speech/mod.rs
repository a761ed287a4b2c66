//! Voice input and output
//!
//! - Speech-to-text through a platform [`SpeechRecognizer`] (Whisper with the
//!   `voice-input` feature)
//! - Text-to-speech through a platform [`SpeechSynthesizer`]

pub mod stt;
pub mod tts;
#[cfg(feature = "voice-input")]
pub mod whisper;

pub use stt::{
    default_recognizer, transcript_event, Dictation, RecognitionConfig, RecognitionEvent,
    RecognitionResult, SpeechRecognizer, TranscriptAssembler, UnavailableRecognizer,
};
pub use tts::{
    default_synthesizer, speakable_text, CommandSynthesizer, SpeechConfig, SpeechEvent,
    SpeechSynthesizer, UnavailableSynthesizer,
};
#[cfg(feature = "voice-input")]
pub use whisper::WhisperRecognizer;
