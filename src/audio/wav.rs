//! PCM to WAV container framing
//!
//! The hosted TTS service returns bare 16-bit little-endian mono PCM. Players
//! need a RIFF/WAVE container, so we prepend the canonical 44-byte header.

use crate::{Result, YukkiError};
use hound::{SampleFormat, WavReader};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Size of the canonical PCM WAV header
pub const WAV_HEADER_LEN: usize = 44;

/// Channels in every clip we frame
pub const CHANNELS: u16 = 1;

/// Bits per sample in every clip we frame
pub const BITS_PER_SAMPLE: u16 = 16;

const BLOCK_ALIGN: u16 = CHANNELS * BITS_PER_SAMPLE / 8;

/// Build the 44-byte header for `data_len` bytes of 16-bit mono PCM.
pub fn wav_header(data_len: u32, sample_rate: u32) -> [u8; WAV_HEADER_LEN] {
    let byte_rate = sample_rate.wrapping_mul(BLOCK_ALIGN as u32);

    let mut header = [0u8; WAV_HEADER_LEN];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&data_len.wrapping_add(36).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&CHANNELS.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&BLOCK_ALIGN.to_le_bytes());
    header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_len.to_le_bytes());
    header
}

/// Frame raw PCM into a complete WAV file.
///
/// # Arguments
/// * `pcm` - Little-endian signed 16-bit mono samples
/// * `sample_rate` - Sample rate in Hz
///
/// # Errors
/// Rejects a partial trailing sample, a zero sample rate, and sizes that do
/// not fit the header's 32-bit fields.
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>> {
    if pcm.len() % BLOCK_ALIGN as usize != 0 {
        return Err(YukkiError::AudioProcessing(format!(
            "PCM length {} is not a whole number of 16-bit samples",
            pcm.len()
        )));
    }

    if sample_rate == 0 {
        return Err(YukkiError::AudioProcessing(
            "Sample rate must be greater than 0".into(),
        ));
    }

    if sample_rate.checked_mul(BLOCK_ALIGN as u32).is_none() {
        return Err(YukkiError::AudioProcessing(format!(
            "Sample rate {} is too large",
            sample_rate
        )));
    }

    let data_len = u32::try_from(pcm.len())
        .ok()
        .filter(|len| len.checked_add(36).is_some())
        .ok_or_else(|| {
            YukkiError::AudioProcessing(format!("PCM payload of {} bytes is too large", pcm.len()))
        })?;

    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    wav.extend_from_slice(&wav_header(data_len, sample_rate));
    wav.extend_from_slice(pcm);

    debug!(
        "Framed {} bytes of PCM at {} Hz into {} byte WAV",
        pcm.len(),
        sample_rate,
        wav.len()
    );

    Ok(wav)
}

/// Decode little-endian 16-bit PCM into samples.
pub fn pcm_samples(pcm: &[u8]) -> Result<Vec<i16>> {
    if pcm.len() % 2 != 0 {
        return Err(YukkiError::AudioProcessing(format!(
            "PCM length {} is not a whole number of 16-bit samples",
            pcm.len()
        )));
    }

    Ok(pcm
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Parse a 16-bit integer PCM WAV from memory.
///
/// # Returns
/// * Tuple of (interleaved samples, sample_rate)
pub fn read_wav(bytes: &[u8]) -> Result<(Vec<i16>, u32)> {
    let mut reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| YukkiError::AudioProcessing(format!("Failed to parse WAV: {}", e)))?;

    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(YukkiError::AudioProcessing(format!(
            "Unsupported WAV encoding: {:?} {} bits",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let samples = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| YukkiError::AudioProcessing(format!("Failed to read sample: {}", e)))?;

    debug!(
        "Read {} samples at {} Hz, {} channel(s)",
        samples.len(),
        spec.sample_rate,
        spec.channels
    );

    Ok((samples, spec.sample_rate))
}

/// Write an already framed WAV buffer to disk
pub fn write_wav_file<P: AsRef<Path>>(path: P, wav: &[u8]) -> Result<()> {
    std::fs::write(path.as_ref(), wav)?;
    info!("Wrote {} byte WAV file: {:?}", wav.len(), path.as_ref());
    Ok(())
}

/// Convert interleaved multi-channel audio to mono by averaging each frame
pub fn stereo_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn le_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn le_u16(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
    }

    #[test]
    fn test_header_layout() {
        let pcm = [0x01, 0x00, 0xff, 0x7f];
        let wav = pcm_to_wav(&pcm, 24000).unwrap();

        assert_eq!(wav.len(), 48);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(le_u32(&wav, 4), 40);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(le_u32(&wav, 16), 16);
        assert_eq!(le_u16(&wav, 20), 1);
        assert_eq!(le_u16(&wav, 22), 1);
        assert_eq!(le_u32(&wav, 24), 24000);
        assert_eq!(le_u32(&wav, 28), 48000);
        assert_eq!(le_u16(&wav, 32), 2);
        assert_eq!(le_u16(&wav, 34), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(le_u32(&wav, 40), 4);
        assert_eq!(&wav[44..], &pcm);
    }

    #[test]
    fn test_empty_pcm_is_bare_header() {
        let wav = pcm_to_wav(&[], 24000).unwrap();
        assert_eq!(wav.len(), WAV_HEADER_LEN);
        assert_eq!(le_u32(&wav, 4), 36);
        assert_eq!(le_u32(&wav, 40), 0);

        let (samples, rate) = read_wav(&wav).unwrap();
        assert!(samples.is_empty());
        assert_eq!(rate, 24000);
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(pcm_to_wav(&[0x00, 0x01, 0x02], 24000).is_err());
        assert!(pcm_to_wav(&[0x00, 0x01], 0).is_err());
        assert!(pcm_to_wav(&[0x00, 0x01], u32::MAX).is_err());
        assert!(pcm_samples(&[0x00]).is_err());
    }

    #[test]
    fn test_pcm_samples_little_endian() {
        let samples = pcm_samples(&[0x34, 0x12, 0x00, 0x80, 0xff, 0xff]).unwrap();
        assert_eq!(samples, vec![0x1234, i16::MIN, -1]);
    }

    #[test]
    fn test_read_rejects_garbage() {
        assert!(read_wav(b"definitely not a wav file").is_err());
    }

    #[test]
    fn test_write_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reply.wav");
        let wav = pcm_to_wav(&[0x10, 0x00], 16000).unwrap();

        write_wav_file(&path, &wav).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), wav);
    }

    #[test]
    fn test_stereo_to_mono() {
        let stereo = vec![0.5, 0.3, 0.7, 0.1];
        let mono = stereo_to_mono(&stereo, 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.4).abs() < 0.001);
        assert!((mono[1] - 0.4).abs() < 0.001);

        assert_eq!(stereo_to_mono(&[0.2, 0.4], 1), vec![0.2, 0.4]);
    }

    proptest! {
        #[test]
        fn prop_size_fields_track_payload(
            samples in proptest::collection::vec(any::<i16>(), 0..2048),
            rate in 1u32..=192_000,
        ) {
            let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
            let wav = pcm_to_wav(&pcm, rate).unwrap();

            prop_assert_eq!(wav.len(), WAV_HEADER_LEN + pcm.len());
            prop_assert_eq!(le_u32(&wav, 4), pcm.len() as u32 + 36);
            prop_assert_eq!(le_u32(&wav, 40), pcm.len() as u32);
            prop_assert_eq!(le_u32(&wav, 28), rate * 2);
        }

        #[test]
        fn prop_hound_reads_back_samples(
            samples in proptest::collection::vec(any::<i16>(), 0..2048),
            rate in 1u32..=192_000,
        ) {
            let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
            let wav = pcm_to_wav(&pcm, rate).unwrap();

            let (decoded, decoded_rate) = read_wav(&wav).unwrap();
            prop_assert_eq!(decoded_rate, rate);
            prop_assert_eq!(&decoded, &samples);
            prop_assert_eq!(pcm_samples(&pcm).unwrap(), samples);
        }

        #[test]
        fn prop_conversion_is_deterministic(
            pcm in proptest::collection::vec(any::<u8>(), 0..1024),
            rate in 1u32..=96_000,
        ) {
            let mut even = pcm;
            even.truncate(even.len() & !1);
            prop_assert_eq!(pcm_to_wav(&even, rate).unwrap(), pcm_to_wav(&even, rate).unwrap());
        }
    }
}
