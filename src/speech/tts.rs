//! Text-to-speech output
//!
//! Voice output is a platform service. [`CommandSynthesizer`] drives a
//! system speech executable (`say` on macOS, `espeak-ng`/`espeak`
//! elsewhere) one utterance at a time; [`UnavailableSynthesizer`] stands in
//! when no engine exists so the feature simply disappears.

use crate::messages::Part;
use crate::{NyayaError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// How often the watcher checks whether the speech process has exited
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Configuration for voice output
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Whether voice output is offered at all
    pub enabled: bool,

    /// Speech executable; looked up on `PATH` when not absolute
    pub command: Option<String>,

    /// Speaking rate in words per minute
    pub rate_wpm: Option<u32>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: None,
            rate_wpm: None,
        }
    }
}

impl SpeechConfig {
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_rate(mut self, rate_wpm: u32) -> Self {
        self.rate_wpm = Some(rate_wpm);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Events emitted by a synthesizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// The utterance played to the end. Never sent for a cancelled
    /// utterance.
    Finished { turn_id: Uuid, utterance: u64 },
}

pub trait SpeechSynthesizer: Send {
    fn is_available(&self) -> bool;

    /// Start speaking `text` on behalf of `turn_id`. Returns a number that
    /// identifies this utterance in its [`SpeechEvent::Finished`] event;
    /// every call yields a new one.
    fn speak(&mut self, turn_id: Uuid, text: &str) -> Result<u64>;

    /// Stop the current utterance, if any.
    fn cancel(&mut self);

    fn events(&self) -> Receiver<SpeechEvent>;
}

/// Stand-in used when the platform has no speech engine
pub struct UnavailableSynthesizer {
    event_rx: Receiver<SpeechEvent>,
    // Held so the receiver never reports a disconnect.
    _event_tx: Sender<SpeechEvent>,
}

impl UnavailableSynthesizer {
    pub fn new() -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            event_rx,
            _event_tx: event_tx,
        }
    }
}

impl Default for UnavailableSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSynthesizer for UnavailableSynthesizer {
    fn is_available(&self) -> bool {
        false
    }

    fn speak(&mut self, _turn_id: Uuid, _text: &str) -> Result<u64> {
        Err(NyayaError::SpeechError(
            "No speech engine available".to_string(),
        ))
    }

    fn cancel(&mut self) {}

    fn events(&self) -> Receiver<SpeechEvent> {
        self.event_rx.clone()
    }
}

struct Utterance {
    child: Arc<Mutex<Child>>,
    cancelled: Arc<AtomicBool>,
}

/// Speaks through a system text-to-speech executable
pub struct CommandSynthesizer {
    program: PathBuf,
    rate_wpm: Option<u32>,
    current: Option<Utterance>,
    utterances: u64,
    event_tx: Sender<SpeechEvent>,
    event_rx: Receiver<SpeechEvent>,
}

impl CommandSynthesizer {
    /// Locate a speech executable. `None` when the platform has none.
    pub fn detect(config: &SpeechConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        let candidates: Vec<String> = match &config.command {
            Some(command) => vec![command.clone()],
            None if cfg!(target_os = "macos") => vec!["say".to_string()],
            None => vec!["espeak-ng".to_string(), "espeak".to_string()],
        };

        for candidate in candidates {
            match which::which(&candidate) {
                Ok(program) => {
                    info!("Using speech engine: {}", program.display());
                    return Some(Self::with_program(program, config.rate_wpm));
                }
                Err(e) => debug!("Speech engine {} not found: {}", candidate, e),
            }
        }

        warn!("No speech engine found; voice output disabled");
        None
    }

    pub fn with_program(program: impl Into<PathBuf>, rate_wpm: Option<u32>) -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            program: program.into(),
            rate_wpm,
            current: None,
            utterances: 0,
            event_tx,
            event_rx,
        }
    }

    fn build_command(&self, text: &str) -> Command {
        let mut command = Command::new(&self.program);
        if let Some(rate) = self.rate_wpm {
            let is_say = self
                .program
                .file_name()
                .is_some_and(|name| name == "say");
            command.arg(if is_say { "-r" } else { "-s" }).arg(rate.to_string());
        }
        command
            .arg("--")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&mut self, turn_id: Uuid, text: &str) -> Result<u64> {
        self.cancel();

        let child = self.build_command(text).spawn().map_err(|e| {
            NyayaError::SpeechError(format!(
                "Failed to start {}: {}",
                self.program.display(),
                e
            ))
        })?;

        self.utterances += 1;
        let utterance = self.utterances;
        let child = Arc::new(Mutex::new(child));
        let cancelled = Arc::new(AtomicBool::new(false));
        let event_tx = self.event_tx.clone();

        {
            let child = child.clone();
            let cancelled = cancelled.clone();
            thread::spawn(move || loop {
                let status = child.lock().try_wait();
                match status {
                    Ok(Some(status)) => {
                        if !cancelled.load(Ordering::SeqCst) {
                            debug!("Utterance {} for {} finished: {}", utterance, turn_id, status);
                            let _ = event_tx.send(SpeechEvent::Finished { turn_id, utterance });
                        }
                        break;
                    }
                    Ok(None) => thread::sleep(POLL_INTERVAL),
                    Err(e) => {
                        error!("Failed to wait on speech process: {}", e);
                        if !cancelled.load(Ordering::SeqCst) {
                            let _ = event_tx.send(SpeechEvent::Finished { turn_id, utterance });
                        }
                        break;
                    }
                }
            });
        }

        self.current = Some(Utterance { child, cancelled });
        Ok(utterance)
    }

    fn cancel(&mut self) {
        if let Some(utterance) = self.current.take() {
            utterance.cancelled.store(true, Ordering::SeqCst);
            let mut child = utterance.child.lock();
            if let Ok(None) = child.try_wait() {
                if let Err(e) = child.kill() {
                    warn!("Failed to stop speech process: {}", e);
                }
                let _ = child.wait();
            }
        }
    }

    fn events(&self) -> Receiver<SpeechEvent> {
        self.event_rx.clone()
    }
}

impl Drop for CommandSynthesizer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Pick the engine for this platform, falling back to the unavailable one.
pub fn default_synthesizer(config: &SpeechConfig) -> Box<dyn SpeechSynthesizer> {
    match CommandSynthesizer::detect(config) {
        Some(synth) => Box::new(synth),
        None => Box::new(UnavailableSynthesizer::new()),
    }
}

/// Text of a turn prepared for reading aloud.
///
/// Text parts are joined with spaces, markdown heading labels such as
/// `### Summary:` are dropped, and emphasis/code markers are removed.
pub fn speakable_text(parts: &[Part]) -> String {
    let joined = parts
        .iter()
        .filter_map(Part::as_text)
        .collect::<Vec<_>>()
        .join(" ");

    strip_heading_labels(&joined)
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '`'))
        .collect()
}

fn strip_heading_labels(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("###") {
        out.push_str(&rest[..start]);
        let after = &rest[start..];
        let line_end = after.find('\n').unwrap_or(after.len());

        match after[..line_end].find(':') {
            Some(colon) => {
                rest = after[colon + 1..].trim_start();
            }
            None => {
                out.push_str("###");
                rest = &after[3..];
            }
        }
    }

    out.push_str(rest);
    out
}
