use anyhow::Result;

use crate::detect::{BlueDominant, CentroidExtractor, TargetPredicate};
use crate::frame::FrameView;
use crate::steer::hysteresis::{decide_with, HysteresisThresholds};
use crate::steer::strategy::{Evidence, Steering, SteeringStrategy};
use crate::Command;

/// Color-centroid strategy: extract the target centroid, then run the
/// hysteresis ladder on it.
pub struct CentroidHysteresis<P = BlueDominant> {
    extractor: CentroidExtractor,
    predicate: P,
    thresholds: HysteresisThresholds,
}

impl CentroidHysteresis<BlueDominant> {
    pub fn new() -> Self {
        Self::with_predicate(BlueDominant)
    }
}

impl Default for CentroidHysteresis<BlueDominant> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> CentroidHysteresis<P>
where
    P: TargetPredicate + Send,
{
    pub fn with_predicate(predicate: P) -> Self {
        Self {
            extractor: CentroidExtractor::new(),
            predicate,
            thresholds: HysteresisThresholds::default(),
        }
    }

    pub fn with_downsample(mut self, factor: u32) -> Self {
        self.extractor = CentroidExtractor::with_downsample(factor);
        self
    }

    pub fn with_thresholds(mut self, thresholds: HysteresisThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn thresholds(&self) -> &HysteresisThresholds {
        &self.thresholds
    }
}

impl<P> SteeringStrategy for CentroidHysteresis<P>
where
    P: TargetPredicate + Send,
{
    fn name(&self) -> &'static str {
        "centroid"
    }

    fn steer(&mut self, view: &FrameView<'_>, prev: Command) -> Result<Steering> {
        let centroid = self.extractor.extract(view, &self.predicate)?;
        let command = decide_with(
            &self.thresholds,
            prev,
            centroid.offset,
            centroid.mass,
            view.width(),
        );
        Ok(Steering {
            command,
            evidence: Evidence::Centroid(centroid),
        })
    }
}
