//! Application state management
//!
//! Everything the window shows lives here, so the components stay plain
//! views and tests can drive the state directly.

#[cfg(feature = "audio-io")]
use crate::audio::AudioPlayer;
use crate::integration::orchestrator::{OrchestratorCommand, OrchestratorEvent, OrchestratorHandle};
use crate::llm::context::Attachment;
use crate::messages::{ImageData, Message, MessageContent, MessageMetadata, MessageStorage, Sender};
use crate::speech::tts::TtsAudio;
use crate::ui::avatar::LipSync;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Recording state for voice input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// Not recording
    Idle,
    /// Currently recording audio
    Recording,
    /// Waiting for the transcription
    Processing,
}

/// Central application state
pub struct AppState {
    /// Message storage (thread-safe)
    pub messages: MessageStorage,

    /// Current text input
    pub input_text: String,

    /// Image waiting to be sent with the next message
    pub pending_image: Option<ImageData>,

    /// A turn is in flight
    pub is_thinking: bool,

    /// Recording state
    pub recording_state: RecordingState,

    /// Last error message
    pub last_error: Option<String>,

    /// Mouth animation for the current spoken reply
    pub lip_sync: LipSync,

    /// Most recent spoken reply
    pub last_audio: Option<TtsAudio>,

    /// Channel to the worker
    pub orchestrator: Option<OrchestratorHandle>,

    /// Decoded image previews keyed by message id; `None` marks undecodable data
    pub image_textures: HashMap<Uuid, Option<egui::TextureHandle>>,

    #[cfg(feature = "audio-io")]
    pub player: Option<AudioPlayer>,

    #[cfg(feature = "voice-input")]
    pub microphone: Option<crate::audio::AudioInput>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Create a new application state
    pub fn new() -> Self {
        Self {
            messages: MessageStorage::new(),
            input_text: String::new(),
            pending_image: None,
            is_thinking: false,
            recording_state: RecordingState::Idle,
            last_error: None,
            lip_sync: LipSync::new(),
            last_audio: None,
            orchestrator: None,
            image_textures: HashMap::new(),
            #[cfg(feature = "audio-io")]
            player: None,
            #[cfg(feature = "voice-input")]
            microphone: None,
        }
    }

    pub fn with_orchestrator(mut self, handle: OrchestratorHandle) -> Self {
        self.orchestrator = Some(handle);
        self
    }

    /// Whether the send button should be enabled
    pub fn can_send(&self) -> bool {
        (!self.input_text.trim().is_empty() || self.pending_image.is_some())
            && !self.is_thinking
            && self.recording_state == RecordingState::Idle
    }

    /// Send the typed text (and pending image) to the tutor
    pub fn send_message(&mut self) {
        let text = self.input_text.trim().to_string();
        if text.is_empty() && self.pending_image.is_none() {
            return;
        }

        let image = self.pending_image.take();
        self.input_text.clear();
        self.send_turn(text, image, MessageMetadata::default());
    }

    fn send_turn(&mut self, text: String, image: Option<ImageData>, metadata: MessageMetadata) {
        if let Some(image) = &image {
            self.messages.add(
                Message::new(Sender::User, MessageContent::Image(image.clone()))
                    .with_metadata(metadata.clone()),
            );
        }
        if !text.is_empty() {
            self.messages
                .add(Message::text(Sender::User, text.clone()).with_metadata(metadata));
        }

        self.last_error = None;

        if let Some(handle) = &self.orchestrator {
            let command = OrchestratorCommand::SendText {
                text,
                attachment: image.map(Attachment::from),
            };
            match handle.send_command(command) {
                Ok(()) => self.is_thinking = true,
                Err(e) => self.last_error = Some(e.user_message()),
            }
        }
    }

    /// Attach an image file; only png, jpeg, webp and gif are accepted
    pub fn attach_image_file(&mut self, path: &Path) {
        let name = path.to_string_lossy();
        match std::fs::read(path) {
            Ok(bytes) => self.attach_image_bytes(&name, bytes),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                self.last_error = Some(format!("Could not open {}", path.display()));
            }
        }
    }

    /// Attach image bytes, picking the MIME type from the file name
    pub fn attach_image_bytes(&mut self, name: &str, bytes: Vec<u8>) {
        let mime = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageData::mime_for_extension);

        match mime {
            Some(mime) => {
                debug!("Attached {} ({} bytes)", name, bytes.len());
                self.pending_image = Some(ImageData::new(bytes, mime));
                self.last_error = None;
            }
            None => {
                self.last_error =
                    Some("Only PNG, JPEG, WebP and GIF images can be attached.".to_string());
            }
        }
    }

    pub fn remove_attachment(&mut self) {
        self.pending_image = None;
    }

    /// Start recording voice input
    pub fn start_recording(&mut self) {
        #[cfg(feature = "voice-input")]
        {
            if let Err(e) = self.open_microphone() {
                warn!("Microphone unavailable: {}", e);
                self.last_error = Some(e.user_message());
                return;
            }
        }

        self.send_command(OrchestratorCommand::StartRecording);
    }

    #[cfg(feature = "voice-input")]
    fn open_microphone(&mut self) -> crate::Result<()> {
        let Some(handle) = &self.orchestrator else {
            return Ok(());
        };
        if self.microphone.is_none() {
            self.microphone = Some(crate::audio::AudioInput::new()?);
        }
        if let Some(mic) = self.microphone.as_mut() {
            handle.set_input_sample_rate(mic.sample_rate());
            mic.start_recording(handle.audio_sender())?;
        }
        Ok(())
    }

    fn close_microphone(&mut self) {
        #[cfg(feature = "voice-input")]
        if let Some(mic) = self.microphone.as_mut() {
            mic.stop_recording();
        }
    }

    /// Stop recording and transcribe
    pub fn stop_recording(&mut self) {
        if self.recording_state != RecordingState::Recording {
            return;
        }
        self.close_microphone();
        self.recording_state = RecordingState::Processing;
        self.send_command(OrchestratorCommand::StopRecording);
    }

    /// Cancel recording without processing
    pub fn cancel_recording(&mut self) {
        self.close_microphone();
        self.recording_state = RecordingState::Idle;
        self.send_command(OrchestratorCommand::CancelRecording);
    }

    /// Whether the conversation can be cleared; never while a turn is in flight
    pub fn can_clear(&self) -> bool {
        !self.is_thinking
    }

    /// Start a new conversation
    pub fn clear_messages(&mut self) {
        if !self.can_clear() {
            debug!("Ignoring clear while a turn is in flight");
            return;
        }
        self.messages.clear();
        self.image_textures.clear();
        self.pending_image = None;
        self.last_error = None;
        self.stop_audio();
        self.send_command(OrchestratorCommand::ClearHistory);
    }

    fn send_command(&mut self, command: OrchestratorCommand) {
        if let Some(handle) = &self.orchestrator {
            if let Err(e) = handle.send_command(command) {
                self.last_error = Some(e.user_message());
            }
        }
    }

    /// Process incoming events from the worker
    pub fn poll_events(&mut self) {
        let events: Vec<OrchestratorEvent> = match &self.orchestrator {
            Some(handle) => std::iter::from_fn(|| handle.try_recv_event()).collect(),
            None => Vec::new(),
        };

        for event in events {
            self.apply_event(event);
        }
    }

    /// Apply one worker event
    pub fn apply_event(&mut self, event: OrchestratorEvent) {
        match event {
            OrchestratorEvent::ThinkingStarted => self.is_thinking = true,
            OrchestratorEvent::Reply { text } => {
                self.is_thinking = false;
                self.messages.add(Message::text(Sender::Assistant, text));
            }
            OrchestratorEvent::AudioReady(audio) => self.play_audio(audio),
            OrchestratorEvent::RecordingStarted => {
                self.recording_state = RecordingState::Recording
            }
            OrchestratorEvent::RecordingStopped => {
                self.recording_state = RecordingState::Processing
            }
            OrchestratorEvent::RecordingCancelled => self.recording_state = RecordingState::Idle,
            OrchestratorEvent::Transcription(text) => {
                self.recording_state = RecordingState::Idle;
                let text = text.trim().to_string();
                if !text.is_empty() {
                    // The pending attachment and typed text wait for the next typed send
                    self.send_turn(text, None, MessageMetadata { from_voice: true });
                }
            }
            OrchestratorEvent::Error(message) => {
                self.is_thinking = false;
                if self.recording_state != RecordingState::Idle {
                    self.close_microphone();
                    self.recording_state = RecordingState::Idle;
                }
                self.last_error = Some(message);
            }
            OrchestratorEvent::Shutdown => debug!("Worker shut down"),
        }
    }

    fn play_audio(&mut self, audio: TtsAudio) {
        #[cfg(feature = "audio-io")]
        if let Some(player) = self.player.as_mut() {
            let played = audio.to_wav().and_then(|wav| player.play_wav(&wav));
            match played {
                Ok(duration) => self.lip_sync.start(Instant::now(), duration),
                Err(e) => warn!("Playback failed: {}", e),
            }
        }

        self.last_audio = Some(audio);
    }

    fn stop_audio(&mut self) {
        #[cfg(feature = "audio-io")]
        if let Some(player) = self.player.as_mut() {
            player.stop();
        }
        self.lip_sync.stop();
    }

    /// Whether the avatar is currently speaking
    pub fn is_speaking(&self) -> bool {
        self.lip_sync.is_active(Instant::now())
    }

    /// One-line status for the sidebar
    pub fn status_text(&self) -> &'static str {
        match self.recording_state {
            RecordingState::Recording => return "Listening...",
            RecordingState::Processing => return "Transcribing...",
            RecordingState::Idle => {}
        }
        if self.is_thinking {
            "Thinking..."
        } else if self.is_speaking() {
            "Speaking..."
        } else {
            "Ready"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_worker_records_message() {
        let mut state = AppState::new();
        state.input_text = "  What is a fraction?  ".into();
        state.send_message();

        let messages = state.messages.get_all();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].as_text(), Some("What is a fraction?"));
        assert!(state.input_text.is_empty());
        assert!(!state.is_thinking);
    }

    #[test]
    fn test_empty_input_is_ignored() {
        let mut state = AppState::new();
        state.input_text = "   ".into();
        state.send_message();
        assert!(state.messages.is_empty());
        assert!(!state.can_send());
    }

    #[test]
    fn test_image_only_message() {
        let mut state = AppState::new();
        state.attach_image_bytes("shape.png", vec![1, 2, 3]);
        assert!(state.can_send());

        state.send_message();
        let messages = state.messages.get_all();
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0].content, MessageContent::Image(_)));
        assert!(state.pending_image.is_none());
    }

    #[test]
    fn test_rejects_unsupported_attachment() {
        let mut state = AppState::new();
        state.attach_image_bytes("notes.pdf", vec![1]);
        assert!(state.pending_image.is_none());
        assert!(state.last_error.is_some());

        state.attach_image_bytes("photo.JPG", vec![1]);
        assert_eq!(state.pending_image.as_ref().unwrap().mime_type, "image/jpeg");
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_events_update_state() {
        let mut state = AppState::new();
        state.apply_event(OrchestratorEvent::ThinkingStarted);
        assert_eq!(state.status_text(), "Thinking...");

        state.apply_event(OrchestratorEvent::Reply {
            text: "Let's look at the numerator first.".into(),
        });
        assert!(!state.is_thinking);
        assert_eq!(
            state.messages.last_text_from(Sender::Assistant).as_deref(),
            Some("Let's look at the numerator first.")
        );

        state.apply_event(OrchestratorEvent::Error("The tutor is busy".into()));
        assert_eq!(state.last_error.as_deref(), Some("The tutor is busy"));
        assert_eq!(state.status_text(), "Ready");
    }

    #[test]
    fn test_audio_event_is_kept_without_player() {
        let mut state = AppState::new();
        state.apply_event(OrchestratorEvent::AudioReady(TtsAudio::new(vec![0; 4], 24000)));
        assert_eq!(state.last_audio.as_ref().unwrap().pcm.len(), 4);
        assert!(!state.is_speaking());
    }

    #[test]
    fn test_transcription_is_sent_as_voice_message() {
        let mut state = AppState::new();
        state.apply_event(OrchestratorEvent::RecordingStarted);
        assert_eq!(state.status_text(), "Listening...");

        state.apply_event(OrchestratorEvent::Transcription("How do magnets work?".into()));
        let messages = state.messages.get_all();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].metadata.from_voice);
        assert_eq!(state.recording_state, RecordingState::Idle);
    }

    #[test]
    fn test_transcription_leaves_pending_image_and_draft() {
        let mut state = AppState::new();
        state.attach_image_bytes("graph.png", vec![1, 2]);
        state.input_text = "half-typed".into();

        state.apply_event(OrchestratorEvent::Transcription("What is a slope?".into()));

        let messages = state.messages.get_all();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].as_text(), Some("What is a slope?"));
        assert_eq!(state.pending_image.as_ref().unwrap().data, vec![1, 2]);
        assert_eq!(state.input_text, "half-typed");
    }

    #[test]
    fn test_clear_messages() {
        let mut state = AppState::new();
        state.messages.add(Message::text(Sender::User, "hi"));
        state.attach_image_bytes("a.gif", vec![0]);
        state.clear_messages();
        assert!(state.messages.is_empty());
        assert!(state.pending_image.is_none());
    }

    #[test]
    fn test_clear_is_ignored_while_thinking() {
        let mut state = AppState::new();
        state.messages.add(Message::text(Sender::User, "What is 3 squared?"));
        state.apply_event(OrchestratorEvent::ThinkingStarted);
        assert!(!state.can_clear());

        state.clear_messages();
        assert_eq!(state.messages.len(), 1);

        state.apply_event(OrchestratorEvent::Reply {
            text: "Multiply 3 by itself.".into(),
        });
        assert!(state.can_clear());
        state.clear_messages();
        assert!(state.messages.is_empty());
    }
}
