//! Synthetic frame source (`stub://`).
//!
//! Paints a noisy grey background and, depending on the pattern, a
//! full-width blue band. The band moves along the frame's vertical axis,
//! which the extractor reads as the vehicle's left/right axis.

use anyhow::Result;
use rand::Rng;

use super::{FrameSource, SourceStats};
use crate::frame::{RawFrame, Rgba};

const BACKGROUND: u8 = 120;
const NOISE: i16 = 8;
const TARGET: Rgba = Rgba::new(20, 110, 230, 255);

/// Where the synthetic target is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntheticPattern {
    /// Band sweeps top to bottom and back over `period` frames.
    Sweep { period: u64 },
    /// Band centered on a fixed row.
    Fixed { row: u32 },
    /// Background only.
    Empty,
}

#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub pattern: SyntheticPattern,
    /// Band thickness in rows. `0` means one eighth of the frame height.
    pub band_rows: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            url: "stub://blue_target".to_string(),
            width: 640,
            height: 480,
            pattern: SyntheticPattern::Sweep { period: 120 },
            band_rows: 0,
        }
    }
}

pub struct SyntheticSource {
    config: SyntheticConfig,
    frame_count: u64,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            frame_count: 0,
        }
    }

    /// Row the band is centered on for the current frame, if any.
    fn band_center(&self) -> Option<u32> {
        let height = self.config.height;
        match self.config.pattern {
            SyntheticPattern::Empty => None,
            SyntheticPattern::Fixed { row } => Some(row.min(height.saturating_sub(1))),
            SyntheticPattern::Sweep { period } => {
                let period = period.max(2);
                let phase = self.frame_count % period;
                let half = period / 2;
                // Triangle wave over [0, half], scaled into the middle 80% of the frame.
                let tri = if phase <= half { phase } else { period - phase };
                let span = (height as u64 * 8) / 10;
                let top = height as u64 / 10;
                Some((top + tri * span / half.max(1)) as u32)
            }
        }
    }

    fn generate(&self) -> RawFrame {
        let SyntheticConfig {
            width,
            height,
            band_rows,
            ..
        } = self.config;
        let band = if band_rows == 0 { (height / 8).max(1) } else { band_rows };
        let band_rows = self.band_center().map(|center| {
            let start = center.saturating_sub(band / 2);
            start..(start + band).min(height)
        });

        let mut rng = rand::thread_rng();
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for row in 0..height {
            let in_band = band_rows.as_ref().is_some_and(|rows| rows.contains(&row));
            for _ in 0..width {
                if in_band {
                    data.extend_from_slice(&[TARGET.r, TARGET.g, TARGET.b, TARGET.a]);
                } else {
                    let grey = (BACKGROUND as i16 + rng.gen_range(-NOISE..=NOISE)) as u8;
                    data.extend_from_slice(&[grey, grey, grey, 255]);
                }
            }
        }
        RawFrame::new(data, width, height)
    }
}

impl FrameSource for SyntheticSource {
    /// Synthetic sources are always "connected".
    fn connect(&mut self) -> Result<()> {
        log::info!("SyntheticSource: connected to {}", self.config.url);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<RawFrame> {
        let frame = self.generate();
        self.frame_count += 1;
        Ok(frame)
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.config.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BlueDominant, CentroidExtractor};

    fn source(pattern: SyntheticPattern) -> SyntheticSource {
        SyntheticSource::new(SyntheticConfig {
            width: 160,
            height: 120,
            pattern,
            ..SyntheticConfig::default()
        })
    }

    #[test]
    fn empty_pattern_has_no_target() {
        let mut src = source(SyntheticPattern::Empty);
        let frame = src.next_frame().unwrap();
        let c = CentroidExtractor::new()
            .extract(&frame.view(), &BlueDominant)
            .unwrap();

        assert_eq!(c.mass, 0);
        assert_eq!(src.stats().frames_captured, 1);
    }

    #[test]
    fn fixed_band_above_center_reads_positive() {
        let mut src = source(SyntheticPattern::Fixed { row: 15 });
        let frame = src.next_frame().unwrap();
        let c = CentroidExtractor::new()
            .extract(&frame.view(), &BlueDominant)
            .unwrap();

        // 15-row band centered near row 15 of 120: offset around +45.
        assert_eq!(c.mass, 15 * 160);
        assert!(c.offset > 40 && c.offset < 50, "offset {}", c.offset);
    }

    #[test]
    fn sweep_moves_across_frame() {
        let mut src = source(SyntheticPattern::Sweep { period: 20 });
        let extractor = CentroidExtractor::new();
        let mut offsets = Vec::new();
        for _ in 0..20 {
            let frame = src.next_frame().unwrap();
            offsets.push(extractor.extract(&frame.view(), &BlueDominant).unwrap().offset);
        }

        let max = *offsets.iter().max().unwrap();
        let min = *offsets.iter().min().unwrap();
        assert!(max > 30 && min < -30, "offsets {:?}", offsets);
    }
}
