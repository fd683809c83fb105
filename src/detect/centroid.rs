use crate::detect::predicate::TargetPredicate;
use crate::frame::{FrameError, FrameView};

/// Offset reported when a frame holds no target pixels.
pub const NO_TARGET_OFFSET: i64 = -1;

/// Mass-weighted lateral position of the target in one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Centroid {
    /// Number of (sampled) target pixels.
    pub mass: u64,
    /// Mean lateral coordinate of the target, or `NO_TARGET_OFFSET`.
    pub offset: i64,
}

impl Centroid {
    pub fn empty() -> Self {
        Self {
            mass: 0,
            offset: NO_TARGET_OFFSET,
        }
    }

    pub fn has_target(&self) -> bool {
        self.mass > 0
    }
}

/// Scans a frame and reduces target pixels to a `Centroid`.
///
/// # Axis convention
///
/// The camera is mounted rotated by 90 degrees, so the frame's vertical axis
/// is the vehicle's left/right axis. The lateral coordinate of a pixel is
/// `-(row - height / 2)`: rows above mid-height are positive (right of
/// center), rows below are negative (left). Decision thresholds are
/// calibrated against this sign, so it must not be flipped.
#[derive(Clone, Copy, Debug)]
pub struct CentroidExtractor {
    downsample: u32,
}

impl CentroidExtractor {
    /// Full-resolution extractor.
    pub fn new() -> Self {
        Self { downsample: 1 }
    }

    /// Sample every `factor`-th row and column. Sums run over sampled pixels
    /// only; the centroid formula is unchanged. `0` is treated as `1`.
    pub fn with_downsample(factor: u32) -> Self {
        Self {
            downsample: factor.max(1),
        }
    }

    pub fn downsample(&self) -> u32 {
        self.downsample
    }

    pub fn extract<P>(
        &self,
        view: &FrameView<'_>,
        predicate: &P,
    ) -> Result<Centroid, FrameError>
    where
        P: TargetPredicate + ?Sized,
    {
        let half = (view.height() / 2) as i64;
        let mut mass: u64 = 0;
        let mut weighted_sum: i64 = 0;

        view.for_each_sampled(self.downsample, |row, _col, px| {
            if predicate.is_target(px) {
                mass += 1;
                weighted_sum += -(row as i64 - half);
            }
        })?;

        if mass == 0 {
            return Ok(Centroid::empty());
        }
        Ok(Centroid {
            mass,
            offset: weighted_sum / mass as i64,
        })
    }
}

impl Default for CentroidExtractor {
    fn default() -> Self {
        Self::new()
    }
}
