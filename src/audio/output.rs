use crate::audio::wav::{read_wav, CHANNELS};
use crate::{Result, YukkiError};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::time::Duration;
use tracing::{debug, info};

/// Plays framed WAV clips on the default output device.
///
/// Holds the rodio stream, which must stay on the thread that created it.
pub struct AudioPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
    volume: f32,
}

impl AudioPlayer {
    /// Open the default output device
    pub fn new() -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| YukkiError::AudioDevice(format!("No output device available: {}", e)))?;

        info!("Audio output opened");

        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
            volume: 1.0,
        })
    }

    /// Play a WAV clip, replacing anything still playing.
    ///
    /// Returns the clip duration.
    pub fn play_wav(&mut self, wav: &[u8]) -> Result<Duration> {
        let (samples, sample_rate) = read_wav(wav)?;
        let duration = Duration::from_secs_f64(samples.len() as f64 / sample_rate as f64);

        self.stop();

        let sink = Sink::try_new(&self.handle)
            .map_err(|e| YukkiError::AudioDevice(format!("Failed to create sink: {}", e)))?;
        sink.set_volume(self.volume);
        sink.append(SamplesBuffer::new(CHANNELS, sample_rate, samples));
        sink.play();

        debug!("Playing {:.2}s clip at {} Hz", duration.as_secs_f32(), sample_rate);
        self.sink = Some(sink);

        Ok(duration)
    }

    /// Stop playback immediately
    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    /// Check if a clip is still playing
    pub fn is_playing(&self) -> bool {
        self.sink.as_ref().map(|sink| !sink.empty()).unwrap_or(false)
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
