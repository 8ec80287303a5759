//! Sample-rate extraction from audio MIME types such as `audio/L16;rate=24000`

/// Read the `rate` parameter of a MIME type, if present and positive.
pub fn sample_rate_from_mime(mime: &str) -> Option<u32> {
    mime.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("rate") {
            return None;
        }
        value
            .trim()
            .trim_matches('"')
            .parse::<u32>()
            .ok()
            .filter(|rate| *rate > 0)
    })
}

/// Whether the MIME type describes raw linear 16-bit PCM
pub fn is_linear16(mime: &str) -> bool {
    mime.split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case("audio/l16"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_parameter() {
        assert_eq!(sample_rate_from_mime("audio/L16;rate=24000"), Some(24000));
        assert_eq!(
            sample_rate_from_mime("audio/L16;codec=pcm;rate=16000"),
            Some(16000)
        );
        assert_eq!(sample_rate_from_mime("audio/L16; Rate = \"22050\""), Some(22050));
    }

    #[test]
    fn test_missing_or_bad_rate() {
        assert_eq!(sample_rate_from_mime("audio/L16"), None);
        assert_eq!(sample_rate_from_mime("audio/L16;rate=fast"), None);
        assert_eq!(sample_rate_from_mime("audio/L16;rate=0"), None);
        assert_eq!(sample_rate_from_mime("rate=24000"), None);
    }

    #[test]
    fn test_linear16() {
        assert!(is_linear16("audio/L16;rate=24000"));
        assert!(is_linear16("audio/l16"));
        assert!(!is_linear16("audio/wav"));
    }
}
