//! Speech-to-text input
//!
//! Recognition engines deliver results incrementally. Each result is either
//! final or interim; [`TranscriptAssembler`] turns the current result list
//! into the text that replaces the message input.
//!
//! With the `voice-input` feature a Whisper engine listens on the default
//! microphone; otherwise, or when no model or device is present,
//! [`UnavailableRecognizer`] hides the feature.

use crate::{NyayaError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Shortest recording worth transcribing
const MIN_AUDIO_SECS: f32 = 0.3;

pub const DEFAULT_MODEL_FILE: &str = "ggml-base.en.bin";

/// Configuration for voice input
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Whether voice input is offered at all
    pub enabled: bool,

    /// Whisper model file; `<data_dir>/nyaya/models/ggml-base.en.bin` when unset
    pub model_path: Option<PathBuf>,

    /// Language to transcribe (None for auto-detection)
    pub language: Option<String>,

    /// Threads used for transcription
    pub n_threads: i32,

    /// Seconds of new audio between interim transcripts
    pub interim_interval_secs: f32,

    /// Listening stops by itself after this long
    pub max_duration_secs: f32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_path: None,
            language: Some("en".to_string()),
            n_threads: 4,
            interim_interval_secs: 2.0,
            max_duration_secs: 30.0,
        }
    }
}

impl RecognitionConfig {
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The configured model, or the default location under the data directory.
    pub fn resolved_model_path(&self) -> Option<PathBuf> {
        self.model_path.clone().or_else(|| {
            dirs::data_dir().map(|dir| dir.join("nyaya").join("models").join(DEFAULT_MODEL_FILE))
        })
    }
}

/// One recognised segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub transcript: String,
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    pub fn final_(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

/// Events emitted by a recognizer while listening
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Results changed from `result_index` onward
    Result {
        result_index: usize,
        results: Vec<RecognitionResult>,
    },
    /// The engine stopped listening
    Ended,
    Error(String),
}

pub trait SpeechRecognizer: Send {
    fn is_available(&self) -> bool;

    /// Begin listening. Results arrive on the event channel.
    fn start(&mut self) -> Result<()>;

    fn stop(&mut self);

    fn events(&self) -> Receiver<RecognitionEvent>;
}

/// Stand-in used when the platform has no recognition engine
pub struct UnavailableRecognizer {
    event_rx: Receiver<RecognitionEvent>,
    _event_tx: Sender<RecognitionEvent>,
}

impl UnavailableRecognizer {
    pub fn new() -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            event_rx,
            _event_tx: event_tx,
        }
    }
}

impl Default for UnavailableRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechRecognizer for UnavailableRecognizer {
    fn is_available(&self) -> bool {
        false
    }

    fn start(&mut self) -> Result<()> {
        Err(NyayaError::SpeechError(
            "Speech recognition is not supported on this platform".to_string(),
        ))
    }

    fn stop(&mut self) {}

    fn events(&self) -> Receiver<RecognitionEvent> {
        self.event_rx.clone()
    }
}

/// Pick the engine for this build and machine, falling back to the
/// unavailable one.
pub fn default_recognizer(config: &RecognitionConfig) -> Box<dyn SpeechRecognizer> {
    if !config.enabled {
        debug!("Voice input disabled in configuration");
        return Box::new(UnavailableRecognizer::new());
    }

    #[cfg(feature = "voice-input")]
    {
        match super::whisper::WhisperRecognizer::new(config.clone()) {
            Ok(recognizer) => return Box::new(recognizer),
            Err(e) => warn!("Voice input unavailable: {}", e),
        }
    }

    #[cfg(not(feature = "voice-input"))]
    {
        warn!("Voice input needs the voice-input feature; microphone disabled");
    }

    Box::new(UnavailableRecognizer::new())
}

/// Audio collected while listening, and when the next interim transcript
/// is due.
#[derive(Debug)]
pub struct Dictation {
    samples: Vec<f32>,
    sample_rate: usize,
    transcribed_len: usize,
    interim_every: usize,
    max_len: usize,
}

impl Dictation {
    pub fn new(sample_rate: u32, config: &RecognitionConfig) -> Self {
        let rate = sample_rate as f32;
        Self {
            samples: Vec::new(),
            sample_rate: sample_rate as usize,
            transcribed_len: 0,
            interim_every: (config.interim_interval_secs.max(0.5) * rate) as usize,
            max_len: (config.max_duration_secs.max(1.0) * rate) as usize,
        }
    }

    /// Append mono samples; anything past the length limit is dropped.
    pub fn push(&mut self, samples: &[f32]) {
        let room = self.max_len.saturating_sub(self.samples.len());
        self.samples
            .extend_from_slice(&samples[..samples.len().min(room)]);
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate.max(1) as f32
    }

    /// Enough audio to be worth transcribing
    pub fn has_audio(&self) -> bool {
        self.duration_secs() >= MIN_AUDIO_SECS
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.max_len
    }

    pub fn interim_due(&self) -> bool {
        self.has_audio()
            && !self.is_full()
            && self.samples.len() >= self.transcribed_len + self.interim_every
    }

    pub fn mark_transcribed(&mut self) {
        self.transcribed_len = self.samples.len();
    }
}

/// Event carrying the transcript of everything heard so far.
pub fn transcript_event(transcript: &str, is_final: bool) -> RecognitionEvent {
    let result = if is_final {
        RecognitionResult::final_(transcript)
    } else {
        RecognitionResult::interim(transcript)
    };
    RecognitionEvent::Result {
        result_index: 0,
        results: vec![result],
    }
}

pub struct TranscriptAssembler;

impl TranscriptAssembler {
    /// Final transcripts followed by interim ones, starting at `result_index`.
    pub fn assemble(result_index: usize, results: &[RecognitionResult]) -> String {
        let tail = results.get(result_index..).unwrap_or_default();

        let mut finals = String::new();
        let mut interims = String::new();
        for result in tail {
            if result.is_final {
                finals.push_str(&result.transcript);
            } else {
                interims.push_str(&result.transcript);
            }
        }

        finals + &interims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_finals_before_interims() {
        let results = vec![
            RecognitionResult::interim(" pending"),
            RecognitionResult::final_("My landlord"),
            RecognitionResult::final_(" kept the deposit"),
        ];
        assert_eq!(
            TranscriptAssembler::assemble(0, &results),
            "My landlord kept the deposit pending"
        );
    }

    #[test]
    fn test_assemble_from_result_index() {
        let results = vec![
            RecognitionResult::final_("old"),
            RecognitionResult::final_("new"),
            RecognitionResult::interim(" words"),
        ];
        assert_eq!(TranscriptAssembler::assemble(1, &results), "new words");
    }

    #[test]
    fn test_assemble_out_of_range_is_empty() {
        let results = vec![RecognitionResult::final_("only")];
        assert_eq!(TranscriptAssembler::assemble(5, &results), "");
        assert_eq!(TranscriptAssembler::assemble(0, &[]), "");
    }

    fn dictation_config() -> RecognitionConfig {
        RecognitionConfig {
            interim_interval_secs: 1.0,
            max_duration_secs: 3.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_recognition_config_default() {
        let config = RecognitionConfig::default();
        assert!(config.enabled);
        assert_eq!(config.language.as_deref(), Some("en"));
        assert!(config
            .with_model_path("/models/tiny.bin")
            .resolved_model_path()
            .is_some_and(|p| p.ends_with("tiny.bin")));
    }

    #[test]
    fn test_dictation_interim_schedule() {
        let mut dictation = Dictation::new(100, &dictation_config());
        assert!(!dictation.has_audio());

        dictation.push(&[0.1; 50]);
        assert!(dictation.has_audio());
        assert!(!dictation.interim_due());

        dictation.push(&[0.1; 60]);
        assert!(dictation.interim_due());
        dictation.mark_transcribed();
        assert!(!dictation.interim_due());

        dictation.push(&[0.1; 100]);
        assert!(dictation.interim_due());
    }

    #[test]
    fn test_dictation_stops_at_limit() {
        let mut dictation = Dictation::new(100, &dictation_config());
        dictation.push(&[0.0; 250]);
        dictation.push(&[0.0; 250]);

        assert!(dictation.is_full());
        assert_eq!(dictation.samples().len(), 300);
        assert!(!dictation.interim_due());
        assert!((dictation.duration_secs() - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_transcript_event_replaces_input() {
        let event = transcript_event("my deposit", false);
        let RecognitionEvent::Result {
            result_index,
            results,
        } = event
        else {
            panic!("expected a result");
        };
        assert_eq!(TranscriptAssembler::assemble(result_index, &results), "my deposit");
        assert!(!results[0].is_final);

        assert_eq!(
            transcript_event("done", true),
            RecognitionEvent::Result {
                result_index: 0,
                results: vec![RecognitionResult::final_("done")],
            }
        );
    }

    #[test]
    fn test_disabled_config_gives_unavailable_recognizer() {
        let recognizer = default_recognizer(&RecognitionConfig::default().disabled());
        assert!(!recognizer.is_available());
    }

    #[test]
    fn test_unavailable_recognizer() {
        let mut recognizer = UnavailableRecognizer::new();
        assert!(!recognizer.is_available());
        assert!(matches!(recognizer.start(), Err(NyayaError::SpeechError(_))));
        recognizer.stop();
        assert!(recognizer.events().try_recv().is_err());
    }
}
