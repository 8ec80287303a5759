use crate::audio::wav::stereo_to_mono;
use crate::{Result, YukkiError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Microphone capture on the default input device
pub struct AudioInput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    is_recording: Arc<Mutex<bool>>,
}

impl AudioInput {
    /// Create a new audio input with the default input device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| YukkiError::AudioDevice("No input device available".into()))?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_input_config()
            .map_err(|e| YukkiError::AudioDevice(format!("Failed to get input config: {}", e)))?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
            is_recording: Arc::new(Mutex::new(false)),
        })
    }

    /// Get the sample rate of the input device
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Start recording; mono chunks are pushed to `audio_tx`
    pub fn start_recording(&mut self, audio_tx: Sender<Vec<f32>>) -> Result<()> {
        if *self.is_recording.lock() {
            warn!("Already recording");
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let is_recording = Arc::clone(&self.is_recording);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !*is_recording.lock() {
                        return;
                    }

                    if let Err(e) = audio_tx.try_send(stereo_to_mono(data, channels)) {
                        debug!("Dropped microphone chunk: {}", e);
                    }
                },
                |err| error!("Audio input stream error: {}", err),
                None,
            )
            .map_err(|e| YukkiError::AudioDevice(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| YukkiError::AudioDevice(format!("Failed to start input stream: {}", e)))?;

        *self.is_recording.lock() = true;
        self.stream = Some(stream);

        info!("Started audio recording at {} Hz", self.sample_rate());
        Ok(())
    }

    /// Stop recording audio
    pub fn stop_recording(&mut self) {
        *self.is_recording.lock() = false;

        if self.stream.take().is_some() {
            info!("Stopped audio recording");
        }
    }

    pub fn is_recording(&self) -> bool {
        *self.is_recording.lock()
    }
}

impl Drop for AudioInput {
    fn drop(&mut self) {
        self.stop_recording();
    }
}
