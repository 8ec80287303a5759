use crate::{Result, YukkiError};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Sample rate the speech recognizer expects
pub const RECOGNIZER_SAMPLE_RATE: u32 = 16000;

/// Sinc resampler for microphone audio
pub struct AudioResampler {
    resampler: SincFixedIn<f32>,
    input_rate: u32,
    output_rate: u32,
    channels: usize,
}

impl AudioResampler {
    /// Create a new audio resampler
    ///
    /// # Arguments
    /// * `input_rate` - Input sample rate
    /// * `output_rate` - Output sample rate
    /// * `channels` - Number of audio channels
    pub fn new(input_rate: u32, output_rate: u32, channels: u16) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 {
            return Err(YukkiError::Config(
                "Sample rates must be greater than 0".into(),
            ));
        }

        if channels == 0 {
            return Err(YukkiError::Config(
                "Number of channels must be greater than 0".into(),
            ));
        }

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        // Frames per channel per call
        let chunk_size = 1024;

        let resampler = SincFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            2.0,
            params,
            chunk_size,
            channels as usize,
        )
        .map_err(|e| YukkiError::AudioProcessing(format!("Failed to create resampler: {}", e)))?;

        debug!(
            "Created resampler: {} Hz -> {} Hz, {} channels",
            input_rate, output_rate, channels
        );

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
            channels: channels as usize,
        })
    }

    /// Resample interleaved audio
    pub fn resample(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_size = self.resampler.input_frames_max();
        let total_frames = input.len() / self.channels;
        let ratio = self.output_rate as f64 / self.input_rate as f64;

        let mut output =
            Vec::with_capacity((total_frames as f64 * ratio * 1.1) as usize * self.channels);

        let mut frame_offset = 0;
        while frame_offset < total_frames {
            let frames_to_read = (total_frames - frame_offset).min(chunk_size);

            // SincFixedIn wants exactly chunk_size frames; the tail is zero padded
            let mut input_planar = vec![vec![0.0f32; chunk_size]; self.channels];
            for frame_idx in 0..frames_to_read {
                let src_idx = (frame_offset + frame_idx) * self.channels;
                for (ch_idx, channel) in input_planar.iter_mut().enumerate() {
                    channel[frame_idx] = input[src_idx + ch_idx];
                }
            }

            let output_planar = self
                .resampler
                .process(&input_planar, None)
                .map_err(|e| YukkiError::AudioProcessing(format!("Resampling failed: {}", e)))?;

            let output_frames = output_planar[0].len();
            let frames_to_take = if frames_to_read < chunk_size {
                ((frames_to_read as f64) * ratio).ceil() as usize
            } else {
                output_frames
            };

            for frame_idx in 0..frames_to_take.min(output_frames) {
                for channel in &output_planar {
                    output.push(channel[frame_idx]);
                }
            }

            frame_offset += frames_to_read;
        }

        debug!(
            "Resampled {} frames -> {} frames",
            total_frames,
            output.len() / self.channels
        );

        Ok(output)
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }
}

/// Resample audio in one step; equal rates pass through untouched
pub fn resample_audio(
    input: &[f32],
    input_rate: u32,
    output_rate: u32,
    channels: u16,
) -> Result<Vec<f32>> {
    if input_rate == output_rate {
        return Ok(input.to_vec());
    }

    AudioResampler::new(input_rate, output_rate, channels)?.resample(input)
}
