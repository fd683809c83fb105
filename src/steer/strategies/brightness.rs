use anyhow::Result;

use crate::detect::measure_brightness;
use crate::frame::FrameView;
use crate::steer::strategy::{Evidence, Steering, SteeringStrategy};
use crate::Command;

pub const DEFAULT_MIN_MEAN_LUMA: u64 = 40;
pub const DEFAULT_BRIGHTNESS_MARGIN: f64 = 0.10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrightnessThresholds {
    /// Below this mean luma the scene is too dark to steer by.
    pub min_mean_luma: u64,
    /// Relative left/right difference treated as balanced.
    pub margin: f64,
}

impl Default for BrightnessThresholds {
    fn default() -> Self {
        Self {
            min_mean_luma: DEFAULT_MIN_MEAN_LUMA,
            margin: DEFAULT_BRIGHTNESS_MARGIN,
        }
    }
}

/// Brightness strategy: steer toward the brighter lateral half.
///
/// Stateless; `prev` is ignored.
#[derive(Clone, Debug)]
pub struct BrightnessComparison {
    downsample: u32,
    thresholds: BrightnessThresholds,
}

impl BrightnessComparison {
    pub fn new() -> Self {
        Self {
            downsample: 1,
            thresholds: BrightnessThresholds::default(),
        }
    }

    pub fn with_downsample(mut self, factor: u32) -> Self {
        self.downsample = factor.max(1);
        self
    }

    pub fn with_thresholds(mut self, thresholds: BrightnessThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

impl Default for BrightnessComparison {
    fn default() -> Self {
        Self::new()
    }
}

impl SteeringStrategy for BrightnessComparison {
    fn name(&self) -> &'static str {
        "brightness"
    }

    fn steer(&mut self, view: &FrameView<'_>, _prev: Command) -> Result<Steering> {
        let split = measure_brightness(view, self.downsample)?;
        let command = if split.mean_luma() < self.thresholds.min_mean_luma {
            Command::Stop
        } else if split.relative_difference() < self.thresholds.margin {
            Command::Forward
        } else if split.right > split.left {
            Command::Right
        } else {
            Command::Left
        };
        Ok(Steering {
            command,
            evidence: Evidence::Brightness(split),
        })
    }
}
