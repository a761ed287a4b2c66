//! Whisper dictation from the default microphone
//!
//! Each listening session runs on its own thread, which owns the cpal input
//! stream (streams are not `Send` on every platform). Audio is mixed down to
//! mono, resampled to 16 kHz and transcribed with whisper.cpp: every few
//! seconds while listening for an interim transcript, then once more after
//! stop for the final one.

use crate::speech::stt::{
    transcript_event, Dictation, RecognitionConfig, RecognitionEvent, SpeechRecognizer,
};
use crate::{NyayaError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Sample rate Whisper expects
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Frames per resampler call
const RESAMPLER_CHUNK: usize = 1024;

/// Capture callbacks buffered while a transcript is being computed
const AUDIO_QUEUE: usize = 512;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

struct Transcriber {
    context: WhisperContext,
    language: Option<String>,
    n_threads: i32,
}

impl Transcriber {
    fn load(config: &RecognitionConfig) -> Result<Self> {
        let path = config
            .resolved_model_path()
            .ok_or_else(|| NyayaError::SpeechError("No Whisper model configured".to_string()))?;
        if !path.exists() {
            return Err(NyayaError::SpeechError(format!(
                "Whisper model not found: {}",
                path.display()
            )));
        }

        info!("Loading Whisper model from {}", path.display());
        let path_str = path
            .to_str()
            .ok_or_else(|| NyayaError::SpeechError("Invalid model path".to_string()))?;
        let context =
            WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
                .map_err(|e| {
                    NyayaError::SpeechError(format!("Failed to load Whisper model: {:?}", e))
                })?;

        Ok(Self {
            context,
            language: config.language.clone(),
            n_threads: config.n_threads,
        })
    }

    fn transcribe(&self, samples: &[f32]) -> Result<String> {
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.n_threads);
        params.set_translate(false);
        params.set_print_timestamps(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        if let Some(language) = self.language.as_deref() {
            params.set_language(Some(language));
        }

        let mut state = self.context.create_state().map_err(|e| {
            NyayaError::SpeechError(format!("Failed to create Whisper state: {:?}", e))
        })?;
        state
            .full(params, samples)
            .map_err(|e| NyayaError::SpeechError(format!("Transcription failed: {:?}", e)))?;

        let segments = state
            .full_n_segments()
            .map_err(|e| NyayaError::SpeechError(format!("Failed to get segments: {:?}", e)))?;
        let mut text = String::new();
        for i in 0..segments {
            let segment = state.full_get_segment_text(i).map_err(|e| {
                NyayaError::SpeechError(format!("Failed to get segment text: {:?}", e))
            })?;
            text.push_str(&segment);
        }

        debug!(
            "Transcribed {:.1}s of audio: '{}'",
            samples.len() as f32 / WHISPER_SAMPLE_RATE as f32,
            text.trim()
        );
        Ok(text.trim().to_string())
    }
}

/// Converts mono audio at the device rate to [`WHISPER_SAMPLE_RATE`].
pub struct MonoResampler {
    inner: Option<SincFixedIn<f32>>,
    pending: Vec<f32>,
}

impl MonoResampler {
    pub fn new(input_rate: u32) -> Result<Self> {
        if input_rate == 0 {
            return Err(NyayaError::SpeechError(
                "Sample rate must be greater than 0".to_string(),
            ));
        }
        if input_rate == WHISPER_SAMPLE_RATE {
            return Ok(Self {
                inner: None,
                pending: Vec::new(),
            });
        }

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };
        let resampler = SincFixedIn::<f32>::new(
            WHISPER_SAMPLE_RATE as f64 / input_rate as f64,
            1.1,
            params,
            RESAMPLER_CHUNK,
            1,
        )
        .map_err(|e| NyayaError::SpeechError(format!("Failed to create resampler: {}", e)))?;
        debug!("Resampling voice input {} Hz -> {} Hz", input_rate, WHISPER_SAMPLE_RATE);

        Ok(Self {
            inner: Some(resampler),
            pending: Vec::new(),
        })
    }

    /// Resample every complete chunk of `samples` into `out`.
    pub fn push(&mut self, samples: &[f32], out: &mut Vec<f32>) -> Result<()> {
        let Some(resampler) = self.inner.as_mut() else {
            out.extend_from_slice(samples);
            return Ok(());
        };

        self.pending.extend_from_slice(samples);
        while self.pending.len() >= RESAMPLER_CHUNK {
            let wave_in = vec![self.pending.drain(..RESAMPLER_CHUNK).collect::<Vec<f32>>()];
            let wave_out = resampler
                .process(&wave_in, None)
                .map_err(|e| NyayaError::SpeechError(format!("Resampling failed: {}", e)))?;
            out.extend_from_slice(&wave_out[0]);
        }
        Ok(())
    }

    /// Resample whatever is left of the last partial chunk.
    pub fn flush(&mut self, out: &mut Vec<f32>) -> Result<()> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(());
        };
        if self.pending.is_empty() {
            return Ok(());
        }

        let wave_in = vec![std::mem::take(&mut self.pending)];
        let wave_out = resampler
            .process_partial(Some(wave_in.as_slice()), None)
            .map_err(|e| NyayaError::SpeechError(format!("Resampling failed: {}", e)))?;
        out.extend_from_slice(&wave_out[0]);
        Ok(())
    }
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    audio_tx: Sender<Vec<f32>>,
    error_tx: Sender<String>,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = (config.channels as usize).max(1);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mono: Vec<f32> = data
                    .chunks(channels)
                    .map(|frame| {
                        frame.iter().map(|s| s.to_sample::<f32>()).sum::<f32>() / channels as f32
                    })
                    .collect();
                if let Err(e) = audio_tx.try_send(mono) {
                    debug!("Dropped voice input chunk: {}", e);
                }
            },
            move |err| {
                let _ = error_tx.try_send(err.to_string());
            },
            None,
        )
        .map_err(|e| NyayaError::SpeechError(format!("Failed to open microphone: {}", e)))
}

/// One listening session, from opening the microphone to the final transcript.
fn capture(
    config: &RecognitionConfig,
    transcriber: &Transcriber,
    stop_rx: &Receiver<()>,
    event_tx: &Sender<RecognitionEvent>,
) -> Result<()> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or_else(|| NyayaError::SpeechError("No microphone available".to_string()))?;
    let supported = device
        .default_input_config()
        .map_err(|e| NyayaError::SpeechError(format!("Failed to get input config: {}", e)))?;
    let stream_config: cpal::StreamConfig = supported.config();

    let (audio_tx, audio_rx) = bounded(AUDIO_QUEUE);
    let (error_tx, error_rx) = bounded(1);
    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => {
            build_input_stream::<f32>(&device, &stream_config, audio_tx, error_tx)?
        }
        cpal::SampleFormat::I16 => {
            build_input_stream::<i16>(&device, &stream_config, audio_tx, error_tx)?
        }
        cpal::SampleFormat::U16 => {
            build_input_stream::<u16>(&device, &stream_config, audio_tx, error_tx)?
        }
        other => {
            return Err(NyayaError::SpeechError(format!(
                "Unsupported microphone sample format: {:?}",
                other
            )))
        }
    };
    stream
        .play()
        .map_err(|e| NyayaError::SpeechError(format!("Failed to start microphone: {}", e)))?;
    info!(
        "Listening on {} at {} Hz",
        device.name().unwrap_or_else(|_| "unknown device".to_string()),
        stream_config.sample_rate.0
    );

    let mut resampler = MonoResampler::new(stream_config.sample_rate.0)?;
    let mut dictation = Dictation::new(WHISPER_SAMPLE_RATE, config);
    let mut resampled = Vec::new();

    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(error_rx) -> err => {
                if let Ok(err) = err {
                    return Err(NyayaError::SpeechError(err));
                }
            }
            recv(audio_rx) -> chunk => {
                let Ok(chunk) = chunk else { break };
                resampled.clear();
                resampler.push(&chunk, &mut resampled)?;
                dictation.push(&resampled);
            }
            default(POLL_INTERVAL) => {}
        }

        if dictation.is_full() {
            info!("Stopped listening after {:.0}s", dictation.duration_secs());
            break;
        }
        if dictation.interim_due() {
            let text = transcriber.transcribe(dictation.samples())?;
            dictation.mark_transcribed();
            let _ = event_tx.send(transcript_event(&text, false));
        }
    }

    drop(stream);
    while let Ok(chunk) = audio_rx.try_recv() {
        resampled.clear();
        resampler.push(&chunk, &mut resampled)?;
        dictation.push(&resampled);
    }
    resampled.clear();
    resampler.flush(&mut resampled)?;
    dictation.push(&resampled);

    if dictation.has_audio() {
        let text = transcriber.transcribe(dictation.samples())?;
        let _ = event_tx.send(transcript_event(&text, true));
    }
    Ok(())
}

/// Dictation through Whisper on the default input device
pub struct WhisperRecognizer {
    config: RecognitionConfig,
    transcriber: Arc<Transcriber>,
    stop_tx: Option<Sender<()>>,
    event_tx: Sender<RecognitionEvent>,
    event_rx: Receiver<RecognitionEvent>,
}

impl WhisperRecognizer {
    /// Load the model. Fails when there is no microphone or no model file.
    pub fn new(config: RecognitionConfig) -> Result<Self> {
        if cpal::default_host().default_input_device().is_none() {
            return Err(NyayaError::SpeechError(
                "No microphone available".to_string(),
            ));
        }
        let transcriber = Arc::new(Transcriber::load(&config)?);
        info!("Voice input ready");

        let (event_tx, event_rx) = unbounded();
        Ok(Self {
            config,
            transcriber,
            stop_tx: None,
            event_tx,
            event_rx,
        })
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&mut self) -> Result<()> {
        self.stop();

        let (stop_tx, stop_rx) = bounded(1);
        let config = self.config.clone();
        let transcriber = self.transcriber.clone();
        let event_tx = self.event_tx.clone();

        thread::Builder::new()
            .name("nyaya-voice-input".to_string())
            .spawn(move || {
                if let Err(e) = capture(&config, &transcriber, &stop_rx, &event_tx) {
                    error!("Voice input failed: {}", e);
                    let message = match e {
                        NyayaError::SpeechError(message) => message,
                        other => other.to_string(),
                    };
                    let _ = event_tx.send(RecognitionEvent::Error(message));
                }
                let _ = event_tx.send(RecognitionEvent::Ended);
            })
            .map_err(|e| NyayaError::SpeechError(format!("Failed to start voice input: {}", e)))?;

        self.stop_tx = Some(stop_tx);
        Ok(())
    }

    fn stop(&mut self) {
        // Dropping the sender also ends the session if the signal is lost.
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.try_send(());
        }
    }

    fn events(&self) -> Receiver<RecognitionEvent> {
        self.event_rx.clone()
    }
}

impl Drop for WhisperRecognizer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resampler_passthrough_at_whisper_rate() {
        let mut resampler = MonoResampler::new(WHISPER_SAMPLE_RATE).unwrap();
        let mut out = Vec::new();
        resampler.push(&[0.25; 300], &mut out).unwrap();
        resampler.flush(&mut out).unwrap();
        assert_eq!(out.len(), 300);
    }

    #[test]
    fn test_resampler_downsamples() {
        let mut resampler = MonoResampler::new(48_000).unwrap();
        let mut out = Vec::new();
        for _ in 0..10 {
            resampler.push(&[0.0; 4800], &mut out).unwrap();
        }
        resampler.flush(&mut out).unwrap();

        // One second of 48 kHz audio comes out near 16k samples.
        let expected = WHISPER_SAMPLE_RATE as f32;
        assert!((out.len() as f32 - expected).abs() < expected * 0.05, "{}", out.len());
    }

    #[test]
    fn test_resampler_rejects_zero_rate() {
        assert!(MonoResampler::new(0).is_err());
    }

    #[test]
    fn test_missing_model_is_speech_error() {
        let config = RecognitionConfig::default().with_model_path("/nonexistent/ggml-none.bin");
        assert!(matches!(
            Transcriber::load(&config),
            Err(NyayaError::SpeechError(ref m)) if m.contains("not found")
        ));
    }
}
