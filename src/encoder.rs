//! Writing frame sequences as looping GIF animations
//!
//! The whole animation is encoded in memory first, written to a hidden
//! sibling of the destination and renamed into place, so a failed run never
//! leaves a truncated file behind.

use crate::enums::TimingConvention;
use crate::error::{Error, Result};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Anything that can serialise an ordered frame sequence to `path`
pub trait AnimationEncoder {
    fn encode(&self, path: &Path, frames: Vec<RgbaImage>, fps: u32) -> Result<()>;
}

/// GIF output through the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct GifWriter {
    timing: TimingConvention,
}

impl GifWriter {
    pub fn new(timing: TimingConvention) -> Self {
        Self { timing }
    }

    /// Writer using whichever timing convention an encoder of `version` expects
    pub fn for_encoder_version(version: (u32, u32)) -> Self {
        Self::new(TimingConvention::for_encoder_version(version))
    }

    pub fn timing(&self) -> TimingConvention {
        self.timing
    }

    /// Per-frame delay for a rate of `fps` under the configured convention
    pub fn frame_delay(&self, fps: u32) -> Result<Delay> {
        if fps == 0 {
            return Err(Error::InvalidFrameRate(0.0));
        }

        Ok(match self.timing {
            TimingConvention::FrameDuration => Delay::from_numer_denom_ms(1000 / fps, 1),
            TimingConvention::FramesPerSecond => Delay::from_numer_denom_ms(1000, fps),
        })
    }

    /// Encode `frames` into an in-memory GIF that loops forever
    pub fn encode_to_vec(&self, frames: Vec<RgbaImage>, fps: u32) -> Result<Vec<u8>> {
        let delay = self.frame_delay(fps)?;
        let count = frames.len();
        let mut buffer = Vec::new();

        {
            let mut encoder = GifEncoder::new(&mut buffer);
            encoder.set_repeat(Repeat::Infinite)?;
            encoder.encode_frames(
                frames
                    .into_iter()
                    .map(|image| Frame::from_parts(image, 0, 0, delay)),
            )?;
        }

        debug!("encoded {count} frames into {} bytes", buffer.len());
        Ok(buffer)
    }
}

impl AnimationEncoder for GifWriter {
    fn encode(&self, path: &Path, frames: Vec<RgbaImage>, fps: u32) -> Result<()> {
        let buffer = self.encode_to_vec(frames, fps)?;
        write_atomically(path, &buffer)?;
        info!("wrote {}", path.display());
        Ok(())
    }
}

/// Write `contents` next to `path` under a temporary name, then rename over `path`
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let temporary = temporary_sibling(path);

    if let Err(err) = fs::write(&temporary, contents).and_then(|_| fs::rename(&temporary, path)) {
        // best effort, the write error is the one to report
        let _ = fs::remove_file(&temporary);
        return Err(err.into());
    }
    Ok(())
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.partial"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use image::codecs::gif::GifDecoder;
    use image::AnimationDecoder;
    use std::io::Cursor;

    fn frames(count: usize) -> Vec<RgbaImage> {
        (0..count)
            .map(|i| RgbaImage::from_pixel(6, 2, Rgba([(i * 40) as u8, 0, 0, 255])))
            .collect()
    }

    #[test]
    fn delay_follows_convention() {
        let duration = GifWriter::new(TimingConvention::FrameDuration);
        assert_eq!(duration.frame_delay(18).unwrap(), Delay::from_numer_denom_ms(55, 1));

        let rate = GifWriter::new(TimingConvention::FramesPerSecond);
        assert_eq!(rate.frame_delay(18).unwrap(), Delay::from_numer_denom_ms(1000, 18));
    }

    #[test]
    fn zero_fps_is_rejected() {
        let err = GifWriter::default().frame_delay(0).unwrap_err();
        assert!(matches!(err, Error::InvalidFrameRate(_)));
    }

    #[test]
    fn version_probe_selects_convention() {
        assert_eq!(
            GifWriter::for_encoder_version((2, 9)).timing(),
            TimingConvention::FramesPerSecond
        );
        assert_eq!(
            GifWriter::for_encoder_version((2, 34)).timing(),
            TimingConvention::FrameDuration
        );
    }

    #[test]
    fn encoded_gif_decodes_to_same_frame_count() {
        let buffer = GifWriter::default().encode_to_vec(frames(4), 10).unwrap();
        assert_eq!(&buffer[..3], b"GIF");

        let decoder = GifDecoder::new(Cursor::new(buffer)).unwrap();
        let decoded = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded[0].buffer().dimensions(), (6, 2));
    }

    #[test]
    fn encode_writes_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.gif");

        GifWriter::default().encode(&path, frames(2), 18).unwrap();

        assert!(path.exists());
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn unwritable_destination_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.gif");

        let err = GifWriter::default().encode(&path, frames(2), 18).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!path.exists());
    }
}
