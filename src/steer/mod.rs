//! Command decision: the hysteresis ladder and the strategies built on it.

mod hysteresis;
mod registry;
mod strategies;
mod strategy;

pub use hysteresis::{
    decide, decide_with, HysteresisThresholds, DEFAULT_DEADBAND, DEFAULT_HYSTERESIS_BAND,
    DEFAULT_MIN_MASS,
};
pub use registry::StrategyRegistry;
pub use strategies::{
    BrightnessComparison, BrightnessThresholds, CentroidHysteresis, DEFAULT_BRIGHTNESS_MARGIN,
    DEFAULT_MIN_MEAN_LUMA,
};
pub use strategy::{Evidence, Steering, SteeringStrategy};
