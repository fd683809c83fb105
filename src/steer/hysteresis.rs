use crate::Command;

/// Calibrated deadbands for the centroid ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HysteresisThresholds {
    /// Below this many target pixels the offset is not trusted.
    pub min_mass: u64,
    /// `|offset|` strictly below this is centered.
    pub deadband: i64,
    /// `|offset|` strictly below this brakes a moving vehicle.
    pub hysteresis_band: i64,
}

pub const DEFAULT_MIN_MASS: u64 = 500;
pub const DEFAULT_DEADBAND: i64 = 30;
pub const DEFAULT_HYSTERESIS_BAND: i64 = 110;

impl Default for HysteresisThresholds {
    fn default() -> Self {
        Self {
            min_mass: DEFAULT_MIN_MASS,
            deadband: DEFAULT_DEADBAND,
            hysteresis_band: DEFAULT_HYSTERESIS_BAND,
        }
    }
}

/// Decide with the default thresholds.
///
/// `frame_width` is part of the decision interface but the ladder is
/// expressed in absolute offsets and does not read it.
pub fn decide(prev: Command, offset: i64, mass: u64, frame_width: u32) -> Command {
    decide_with(&HysteresisThresholds::default(), prev, offset, mass, frame_width)
}

/// Hysteretic threshold ladder. First matching rung wins; the order is part
/// of the contract.
///
/// 1. `mass < min_mass` -> Stop
/// 2. `|offset| < deadband` -> Forward
/// 3. `|offset| < hysteresis_band` and `prev != Stop` -> Stop
/// 4. `offset < 0` -> Left
/// 5. `offset > 0` -> Right
/// 6. otherwise -> Stop
///
/// Rung 3 only brakes a vehicle that is already moving, so a stopped vehicle
/// inside the band keeps turning toward the target instead of flickering.
pub fn decide_with(
    thresholds: &HysteresisThresholds,
    prev: Command,
    offset: i64,
    mass: u64,
    _frame_width: u32,
) -> Command {
    let magnitude = offset.unsigned_abs();
    if mass < thresholds.min_mass {
        Command::Stop
    } else if magnitude < thresholds.deadband.unsigned_abs() {
        Command::Forward
    } else if magnitude < thresholds.hysteresis_band.unsigned_abs() && prev != Command::Stop {
        Command::Stop
    } else if offset < 0 {
        Command::Left
    } else if offset > 0 {
        Command::Right
    } else {
        Command::Stop
    }
}
