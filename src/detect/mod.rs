//! Per-frame measurements.
//!
//! Everything here is a pure function of one `FrameView`: nothing is retained
//! across calls and nothing touches controller state.

mod brightness;
mod centroid;
mod predicate;

pub use brightness::{measure_brightness, BrightnessSplit};
pub use centroid::{Centroid, CentroidExtractor, NO_TARGET_OFFSET};
pub use predicate::{BlueDominant, TargetPredicate};
