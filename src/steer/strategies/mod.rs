pub mod brightness;
pub mod centroid;

pub use brightness::{
    BrightnessComparison, BrightnessThresholds, DEFAULT_BRIGHTNESS_MARGIN, DEFAULT_MIN_MEAN_LUMA,
};
pub use centroid::CentroidHysteresis;
