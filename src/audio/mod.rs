#[cfg(feature = "audio-io")]
pub mod input;
pub mod mime;
#[cfg(feature = "audio-io")]
pub mod output;
pub mod resampler;
pub mod wav;

#[cfg(feature = "audio-io")]
pub use input::AudioInput;
pub use mime::sample_rate_from_mime;
#[cfg(feature = "audio-io")]
pub use output::AudioPlayer;
pub use resampler::{resample_audio, AudioResampler, RECOGNIZER_SAMPLE_RATE};
pub use wav::{pcm_samples, pcm_to_wav, read_wav, wav_header, write_wav_file, WAV_HEADER_LEN};
