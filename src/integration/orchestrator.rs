//! Worker that runs tutoring turns off the UI thread
//!
//! The UI sends commands over a channel and polls for events. Turns are
//! handled strictly in order on a single worker thread that owns the
//! tokio runtime and the tutor session.

use crate::integration::config::AppConfig;
use crate::integration::session::{TutorSession, UserTurn};
use crate::llm::context::Attachment;
use crate::speech::tts::TtsAudio;
use crate::{Result, YukkiError};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Longest recording kept for transcription, in seconds
const MAX_RECORDING_SECS: usize = 60;

/// Commands that can be sent to the orchestrator
#[derive(Debug, Clone)]
pub enum OrchestratorCommand {
    /// Ask the tutor; text may be empty when an image is attached
    SendText {
        text: String,
        attachment: Option<Attachment>,
    },

    /// Start recording voice input
    StartRecording,

    /// Stop recording and transcribe the audio
    StopRecording,

    /// Cancel recording without transcribing
    CancelRecording,

    /// Clear conversation history
    ClearHistory,

    /// Shutdown the orchestrator
    Shutdown,
}

/// Events emitted by the orchestrator
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    /// A turn was accepted and the tutor is working on it
    ThinkingStarted,

    /// The tutor's text reply
    Reply { text: String },

    /// Spoken version of the last reply
    AudioReady(TtsAudio),

    /// Recording has started
    RecordingStarted,

    /// Recording has stopped, transcription follows
    RecordingStopped,

    /// Recording was cancelled
    RecordingCancelled,

    /// Transcribed voice input
    Transcription(String),

    /// A user-facing error description
    Error(String),

    /// Orchestrator has shut down
    Shutdown,
}

/// Handle for controlling the orchestrator from the UI
#[derive(Clone)]
pub struct OrchestratorHandle {
    command_tx: Sender<OrchestratorCommand>,
    event_rx: Receiver<OrchestratorEvent>,
    audio_tx: Sender<Vec<f32>>,
    is_recording: Arc<AtomicBool>,
    input_sample_rate: Arc<AtomicU32>,
}

impl OrchestratorHandle {
    /// Queue a command for the worker without blocking the caller
    pub fn send_command(&self, cmd: OrchestratorCommand) -> Result<()> {
        self.command_tx
            .try_send(cmd)
            .map_err(|e| YukkiError::Channel(format!("Failed to send command: {}", e)))
    }

    /// Try to receive an event from the orchestrator
    pub fn try_recv_event(&self) -> Option<OrchestratorEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<OrchestratorEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Get the audio sender for recording
    pub fn audio_sender(&self) -> Sender<Vec<f32>> {
        self.audio_tx.clone()
    }

    /// Check if recording is active
    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    /// Sample rate of the chunks sent through `audio_sender`
    pub fn set_input_sample_rate(&self, rate: u32) {
        self.input_sample_rate.store(rate, Ordering::SeqCst);
    }
}

/// Owns the worker side of the channels until `start`
pub struct Orchestrator {
    config: AppConfig,
    command_rx: Receiver<OrchestratorCommand>,
    event_tx: Sender<OrchestratorEvent>,
    audio_rx: Receiver<Vec<f32>>,
    is_recording: Arc<AtomicBool>,
    input_sample_rate: Arc<AtomicU32>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given configuration
    pub fn new(config: AppConfig) -> (Self, OrchestratorHandle) {
        let (command_tx, command_rx) = bounded(100);
        let (event_tx, event_rx) = bounded(100);
        let (audio_tx, audio_rx) = bounded(1000);

        let is_recording = Arc::new(AtomicBool::new(false));
        let input_sample_rate = Arc::new(AtomicU32::new(
            crate::audio::resampler::RECOGNIZER_SAMPLE_RATE,
        ));

        let handle = OrchestratorHandle {
            command_tx,
            event_rx,
            audio_tx,
            is_recording: Arc::clone(&is_recording),
            input_sample_rate: Arc::clone(&input_sample_rate),
        };

        let orchestrator = Self {
            config,
            command_rx,
            event_tx,
            audio_rx,
            is_recording,
            input_sample_rate,
        };

        (orchestrator, handle)
    }

    /// Spawn the worker thread.
    ///
    /// Fails if the session or its runtime cannot be built.
    pub fn start(self) -> Result<JoinHandle<()>> {
        let session = TutorSession::new(&self.config)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| YukkiError::Config(format!("Failed to create tokio runtime: {}", e)))?;

        let mut worker = Worker {
            session,
            runtime,
            event_tx: self.event_tx,
            audio_rx: self.audio_rx,
            is_recording: self.is_recording,
            input_sample_rate: self.input_sample_rate,
            recording: Vec::new(),
            #[cfg(feature = "voice-input")]
            speech: self.config.speech.clone(),
            #[cfg(feature = "voice-input")]
            whisper: None,
        };
        let command_rx = self.command_rx;

        let handle = thread::Builder::new()
            .name("yukki-worker".into())
            .spawn(move || {
                info!("Orchestrator started");
                worker.run(command_rx);
                info!("Orchestrator stopped");
            })
            .map_err(|e| YukkiError::Config(format!("Failed to spawn worker: {}", e)))?;

        Ok(handle)
    }
}

/// State owned by the worker thread
struct Worker {
    session: TutorSession,
    runtime: tokio::runtime::Runtime,
    event_tx: Sender<OrchestratorEvent>,
    audio_rx: Receiver<Vec<f32>>,
    is_recording: Arc<AtomicBool>,
    input_sample_rate: Arc<AtomicU32>,
    recording: Vec<f32>,
    #[cfg(feature = "voice-input")]
    speech: crate::integration::config::SpeechConfig,
    #[cfg(feature = "voice-input")]
    whisper: Option<crate::speech::stt::WhisperEngine>,
}

impl Worker {
    fn run(&mut self, command_rx: Receiver<OrchestratorCommand>) {
        loop {
            match command_rx.recv_timeout(Duration::from_millis(10)) {
                Ok(OrchestratorCommand::Shutdown) => {
                    info!("Orchestrator shutdown requested");
                    self.emit(OrchestratorEvent::Shutdown);
                    break;
                }
                Ok(command) => self.handle(command),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("Command channel disconnected");
                    break;
                }
            }

            self.collect_audio();
        }
    }

    fn emit(&self, event: OrchestratorEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Event queue full, dropping event"),
            Err(TrySendError::Disconnected(_)) => debug!("Event receiver dropped"),
        }
    }

    fn handle(&mut self, command: OrchestratorCommand) {
        match command {
            OrchestratorCommand::SendText { text, attachment } => {
                self.run_turn(UserTurn { text, attachment });
            }
            OrchestratorCommand::StartRecording => self.start_recording(),
            OrchestratorCommand::StopRecording => self.stop_recording(),
            OrchestratorCommand::CancelRecording => {
                self.is_recording.store(false, Ordering::SeqCst);
                self.recording.clear();
                self.drain_audio();
                self.emit(OrchestratorEvent::RecordingCancelled);
                debug!("Recording cancelled");
            }
            OrchestratorCommand::ClearHistory => self.session.reset(),
            OrchestratorCommand::Shutdown => {}
        }
    }

    fn run_turn(&mut self, turn: UserTurn) {
        self.emit(OrchestratorEvent::ThinkingStarted);

        let result = self.runtime.block_on(self.session.handle_turn(turn));
        match result {
            Ok(outcome) => {
                self.emit(OrchestratorEvent::Reply {
                    text: outcome.reply,
                });
                if let Some(audio) = outcome.audio {
                    self.emit(OrchestratorEvent::AudioReady(audio));
                }
            }
            Err(e) => {
                error!("Turn failed: {}", e);
                self.emit(OrchestratorEvent::Error(e.user_message()));
            }
        }
    }

    fn start_recording(&mut self) {
        if !cfg!(feature = "voice-input") {
            self.emit(OrchestratorEvent::Error(
                "Voice input is not available in this build.".to_string(),
            ));
            return;
        }

        self.drain_audio();
        self.recording.clear();
        self.is_recording.store(true, Ordering::SeqCst);
        self.emit(OrchestratorEvent::RecordingStarted);
        debug!("Recording started");
    }

    fn stop_recording(&mut self) {
        if !self.is_recording.swap(false, Ordering::SeqCst) {
            return;
        }

        // Chunks already queued belong to this recording
        while let Ok(samples) = self.audio_rx.try_recv() {
            self.recording.extend_from_slice(&samples);
        }
        let max_samples = self.max_recording_samples();
        cap_recording(&mut self.recording, max_samples);
        self.emit(OrchestratorEvent::RecordingStopped);
        debug!("Recording stopped, {} samples", self.recording.len());

        let samples = std::mem::take(&mut self.recording);
        match self.transcribe(&samples) {
            Ok(text) if text.is_empty() => {
                self.emit(OrchestratorEvent::Error(
                    "I didn't catch that. Please try again.".to_string(),
                ));
            }
            Ok(text) => self.emit(OrchestratorEvent::Transcription(text)),
            Err(e) => {
                warn!("Transcription failed: {}", e);
                self.emit(OrchestratorEvent::Error(e.user_message()));
            }
        }
    }

    #[cfg(feature = "voice-input")]
    fn transcribe(&mut self, samples: &[f32]) -> Result<String> {
        use crate::audio::resampler::{resample_audio, RECOGNIZER_SAMPLE_RATE};
        use crate::speech::stt::{WhisperConfig, WhisperEngine};

        if samples.is_empty() {
            return Err(YukkiError::Transcription("No audio recorded".into()));
        }

        let rate = self.input_sample_rate.load(Ordering::SeqCst);
        let samples = resample_audio(samples, rate, RECOGNIZER_SAMPLE_RATE, 1)?;

        if self.whisper.is_none() {
            self.whisper = Some(WhisperEngine::new(WhisperConfig::from(&self.speech))?);
        }
        match &self.whisper {
            Some(engine) => engine.transcribe(&samples),
            None => Err(YukkiError::ModelLoad("Speech model not loaded".into())),
        }
    }

    #[cfg(not(feature = "voice-input"))]
    fn transcribe(&mut self, _samples: &[f32]) -> Result<String> {
        Err(YukkiError::Transcription(
            "Voice input is not available in this build".into(),
        ))
    }

    fn collect_audio(&mut self) {
        if !self.is_recording.load(Ordering::SeqCst) {
            return;
        }

        while let Ok(samples) = self.audio_rx.try_recv() {
            self.recording.extend_from_slice(&samples);
        }
        let max_samples = self.max_recording_samples();
        cap_recording(&mut self.recording, max_samples);
    }

    fn max_recording_samples(&self) -> usize {
        self.input_sample_rate.load(Ordering::SeqCst) as usize * MAX_RECORDING_SECS
    }

    fn drain_audio(&self) {
        while self.audio_rx.try_recv().is_ok() {}
    }
}

/// Drop the oldest samples so at most `max_samples` remain
fn cap_recording(recording: &mut Vec<f32>, max_samples: usize) {
    if recording.len() > max_samples {
        let excess = recording.len() - max_samples;
        recording.drain(0..excess);
    }
}

/// Wait up to `timeout` for the worker to exit.
///
/// Returns `false` and leaves the thread detached if it is still busy, for
/// example in the middle of a slow turn.
pub fn join_worker(worker: JoinHandle<()>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !worker.is_finished() {
        if Instant::now() >= deadline {
            warn!("Worker still busy after {:?}, detaching", timeout);
            return false;
        }
        thread::sleep(Duration::from_millis(10));
    }
    if worker.join().is_err() {
        warn!("Worker thread panicked");
    }
    true
}
