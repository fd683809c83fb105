use crate::frame::{FrameError, FrameView};

/// Summed luma of the two lateral halves of a frame.
///
/// Uses the same rotated-mount convention as the centroid extractor: rows
/// above mid-height are the right side, rows at or below it the left side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BrightnessSplit {
    pub left: u64,
    pub right: u64,
    /// Number of sampled pixels across both halves.
    pub samples: u64,
}

impl BrightnessSplit {
    /// Mean luma over all sampled pixels, 0 for an empty frame.
    pub fn mean_luma(&self) -> u64 {
        if self.samples == 0 {
            0
        } else {
            (self.left + self.right) / self.samples
        }
    }

    /// `|right - left| / max(right, left)`, 0.0 when both are dark.
    pub fn relative_difference(&self) -> f64 {
        let max = self.left.max(self.right);
        if max == 0 {
            return 0.0;
        }
        self.left.abs_diff(self.right) as f64 / max as f64
    }
}

pub fn measure_brightness(
    view: &FrameView<'_>,
    downsample: u32,
) -> Result<BrightnessSplit, FrameError> {
    let half = view.height() / 2;
    let mut split = BrightnessSplit::default();
    view.for_each_sampled(downsample, |row, _col, px| {
        let luma = px.luma() as u64;
        if row < half {
            split.right += luma;
        } else {
            split.left += luma;
        }
        split.samples += 1;
    })?;
    Ok(split)
}
