use anyhow::Result;

use crate::detect::{BrightnessSplit, Centroid};
use crate::frame::FrameView;
use crate::Command;

/// What a strategy measured to reach its command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Evidence {
    Centroid(Centroid),
    Brightness(BrightnessSplit),
}

/// Outcome of one steering decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Steering {
    pub command: Command,
    pub evidence: Evidence,
}

/// Steering strategy trait.
///
/// A strategy measures one frame and maps the measurement plus the previous
/// command to a new command. The only state it may consult about the vehicle
/// is `prev`; the current-command cell belongs to the controller.
///
/// Errors returned from `steer` are frame-level: the controller skips the
/// frame and keeps its current command.
pub trait SteeringStrategy: Send {
    /// Strategy identifier, used for configuration lookup.
    fn name(&self) -> &'static str;

    /// Measure `view` and decide the next command.
    ///
    /// The view must not be retained beyond this call.
    fn steer(&mut self, view: &FrameView<'_>, prev: Command) -> Result<Steering>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
