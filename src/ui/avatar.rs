//! Avatar images and mouth animation
//!
//! The avatar is a still image (`yukki-static.{jpg,jpeg,png}`) plus an
//! optional mouth-open frame (`yukki-talk.*`). While a reply is spoken the
//! two frames alternate every [`LIP_SYNC_INTERVAL`].

use crate::integration::config::AvatarConfig;
use crate::{Result, YukkiError};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Extensions probed for avatar images, in order
pub const AVATAR_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Time each mouth frame stays on screen
pub const LIP_SYNC_INTERVAL: Duration = Duration::from_millis(150);

/// Find `<dir>/<base>.<ext>` for the first extension that exists
pub fn find_avatar(dir: &Path, base: &str) -> Option<PathBuf> {
    AVATAR_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", base, ext)))
        .find(|path| path.is_file())
}

/// File names shown when no avatar is found
pub fn expected_names(base: &str) -> String {
    format!("{}.{}", base, AVATAR_EXTENSIONS.join("/"))
}

/// Decode an image file into an egui image
pub fn load_color_image(path: &Path) -> Result<egui::ColorImage> {
    let bytes = std::fs::read(path)?;
    decode_color_image(&bytes)
        .map_err(|e| YukkiError::Io(format!("Failed to decode {}: {}", path.display(), e)))
}

/// Decode in-memory image bytes (png, jpeg, webp, gif)
pub fn decode_color_image(bytes: &[u8]) -> std::result::Result<egui::ColorImage, image::ImageError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        size,
        rgba.as_flat_samples().as_slice(),
    ))
}

/// Which avatar frame to draw
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AvatarFrame {
    Idle,
    MouthOpen,
    MouthClosed,
}

/// Mouth animation clock for one spoken clip
#[derive(Clone, Debug, Default)]
pub struct LipSync {
    started: Option<Instant>,
    duration: Duration,
}

impl LipSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start animating a clip of `duration` beginning at `now`
    pub fn start(&mut self, now: Instant, duration: Duration) {
        self.started = Some(now);
        self.duration = duration;
    }

    pub fn stop(&mut self) {
        self.started = None;
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.started
            .map(|start| now.saturating_duration_since(start) < self.duration)
            .unwrap_or(false)
    }

    /// Frame to show at `now`; open first, then alternating
    pub fn frame_at(&self, now: Instant) -> AvatarFrame {
        let Some(start) = self.started else {
            return AvatarFrame::Idle;
        };

        let elapsed = now.saturating_duration_since(start);
        if elapsed >= self.duration {
            return AvatarFrame::Idle;
        }

        let step = elapsed.as_millis() / LIP_SYNC_INTERVAL.as_millis();
        if step % 2 == 0 {
            AvatarFrame::MouthOpen
        } else {
            AvatarFrame::MouthClosed
        }
    }

    /// Time until the frame changes, for repaint scheduling
    pub fn next_change(&self, now: Instant) -> Option<Duration> {
        let start = self.started?;
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= self.duration {
            return None;
        }
        let interval = LIP_SYNC_INTERVAL.as_millis();
        let into_frame = elapsed.as_millis() % interval;
        Some(Duration::from_millis((interval - into_frame) as u64))
    }
}

/// Loaded avatar textures
pub struct AvatarImages {
    idle: Option<egui::TextureHandle>,
    talking: Option<egui::TextureHandle>,
    idle_name: String,
}

impl AvatarImages {
    /// Probe the configured directory and upload whatever is found
    pub fn load(ctx: &egui::Context, config: &AvatarConfig) -> Self {
        let idle = Self::load_texture(ctx, &config.directory, &config.idle_name);
        if idle.is_none() {
            warn!(
                "Avatar image not found: {} in {}",
                expected_names(&config.idle_name),
                config.directory.display()
            );
        }
        let talking = Self::load_texture(ctx, &config.directory, &config.talking_name);

        Self {
            idle,
            talking,
            idle_name: config.idle_name.clone(),
        }
    }

    fn load_texture(ctx: &egui::Context, dir: &Path, base: &str) -> Option<egui::TextureHandle> {
        let path = find_avatar(dir, base)?;
        match load_color_image(&path) {
            Ok(image) => {
                debug!("Loaded avatar frame {}", path.display());
                Some(ctx.load_texture(base, image, egui::TextureOptions::LINEAR))
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    pub fn has_image(&self) -> bool {
        self.idle.is_some()
    }

    pub fn idle_name(&self) -> &str {
        &self.idle_name
    }

    /// Texture for a frame; the still image stands in for a missing talk frame
    pub fn texture(&self, frame: AvatarFrame) -> Option<&egui::TextureHandle> {
        match frame {
            AvatarFrame::MouthOpen => self.talking.as_ref().or(self.idle.as_ref()),
            AvatarFrame::Idle | AvatarFrame::MouthClosed => self.idle.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_avatar_extension_order() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_avatar(dir.path(), "yukki-static").is_none());

        fs::write(dir.path().join("yukki-static.png"), b"png").unwrap();
        assert_eq!(
            find_avatar(dir.path(), "yukki-static").unwrap(),
            dir.path().join("yukki-static.png")
        );

        fs::write(dir.path().join("yukki-static.jpeg"), b"jpeg").unwrap();
        assert_eq!(
            find_avatar(dir.path(), "yukki-static").unwrap(),
            dir.path().join("yukki-static.jpeg")
        );

        fs::write(dir.path().join("yukki-static.jpg"), b"jpg").unwrap();
        assert_eq!(
            find_avatar(dir.path(), "yukki-static").unwrap(),
            dir.path().join("yukki-static.jpg")
        );
    }

    #[test]
    fn test_expected_names() {
        assert_eq!(expected_names("yukki-static"), "yukki-static.jpg/jpeg/png");
    }

    #[test]
    fn test_decode_png() {
        let mut bytes = Vec::new();
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255]));
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let color = decode_color_image(&bytes).unwrap();
        assert_eq!(color.size, [3, 2]);
        assert_eq!(color.pixels[0], egui::Color32::RED);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_color_image(b"not an image").is_err());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        fs::write(&path, b"nope").unwrap();
        assert!(load_color_image(&path).is_err());
    }

    #[test]
    fn test_lip_sync_frames() {
        let start = Instant::now();
        let mut sync = LipSync::new();
        assert_eq!(sync.frame_at(start), AvatarFrame::Idle);

        sync.start(start, Duration::from_millis(500));
        assert!(sync.is_active(start));
        assert_eq!(sync.frame_at(start), AvatarFrame::MouthOpen);
        assert_eq!(
            sync.frame_at(start + Duration::from_millis(149)),
            AvatarFrame::MouthOpen
        );
        assert_eq!(
            sync.frame_at(start + Duration::from_millis(150)),
            AvatarFrame::MouthClosed
        );
        assert_eq!(
            sync.frame_at(start + Duration::from_millis(300)),
            AvatarFrame::MouthOpen
        );
        assert_eq!(
            sync.frame_at(start + Duration::from_millis(500)),
            AvatarFrame::Idle
        );
        assert!(!sync.is_active(start + Duration::from_millis(500)));
    }

    #[test]
    fn test_lip_sync_next_change_and_stop() {
        let start = Instant::now();
        let mut sync = LipSync::new();
        sync.start(start, Duration::from_secs(1));

        assert_eq!(
            sync.next_change(start + Duration::from_millis(100)),
            Some(Duration::from_millis(50))
        );
        assert_eq!(sync.next_change(start + Duration::from_secs(2)), None);

        sync.stop();
        assert_eq!(sync.frame_at(start), AvatarFrame::Idle);
        assert_eq!(sync.next_change(start), None);
    }
}
