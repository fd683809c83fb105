//! Still image frame source.
//!
//! Decodes one local image (PNG or JPEG) into RGBA8 and replays it as every
//! frame. Useful for calibrating thresholds against a photo of the target.

use anyhow::{anyhow, Context, Result};
use image::GenericImageView;

use super::{FrameSource, SourceStats};
use crate::frame::RawFrame;

pub struct StillImageSource {
    path: String,
    pixels: Option<(Vec<u8>, u32, u32)>,
    frame_count: u64,
}

impl StillImageSource {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            pixels: None,
            frame_count: 0,
        }
    }
}

impl FrameSource for StillImageSource {
    fn connect(&mut self) -> Result<()> {
        let image = image::open(&self.path)
            .with_context(|| format!("decode still image {}", self.path))?;
        let (width, height) = image.dimensions();
        self.pixels = Some((image.into_rgba8().into_raw(), width, height));
        log::info!(
            "StillImageSource: loaded {} ({}x{})",
            self.path,
            width,
            height
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<RawFrame> {
        let (pixels, width, height) = self
            .pixels
            .as_ref()
            .ok_or_else(|| anyhow!("still image source not connected; call connect() first"))?;
        self.frame_count += 1;
        Ok(RawFrame::new(pixels.clone(), *width, *height))
    }

    fn is_healthy(&self) -> bool {
        self.pixels.is_some()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BlueDominant, CentroidExtractor};
    use image::{Rgba as ImageRgba, RgbaImage};

    #[test]
    fn replays_decoded_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.png");
        let mut img = RgbaImage::from_pixel(40, 40, ImageRgba([120, 120, 120, 255]));
        for y in 0..10 {
            for x in 0..40 {
                img.put_pixel(x, y, ImageRgba([10, 90, 220, 255]));
            }
        }
        img.save(&path).unwrap();

        let mut source = StillImageSource::new(path.to_str().unwrap());
        assert!(source.next_frame().is_err());
        source.connect().unwrap();
        let frame = source.next_frame().unwrap();
        let c = CentroidExtractor::new()
            .extract(&frame.view(), &BlueDominant)
            .unwrap();

        assert_eq!(c.mass, 400);
        // Rows 0..10 of 40 map to 20..11.
        assert_eq!(c.offset, 15);
        assert_eq!(source.stats().frames_captured, 1);
    }
}
