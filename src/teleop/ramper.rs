//! # Velocity Ramper Module
//!
//! Turns instantaneous joystick readings into bounded, direction-aware,
//! smoothly ramped velocity commands.
//!
//! ## Ramp
//!
//! Each axis keeps a ramp ratio (0.0 to 1.0). The output magnitude is
//! `ratio * max_speed`, and the ratio moves one step per sample:
//!
//! - Stick deflected: output in the stick direction, then `ratio += accel`.
//!   Reversing direction drops the ratio to 0 first, so the command never
//!   flips sign at speed.
//! - Stick centered: keep moving in the last direction (coasting), then
//!   `ratio -= decel`, floored at 0.
//!
//! The speed scale is taken *before* the step, so the first sample after a
//! standstill commands zero velocity.
//!
//! ## Buttons
//!
//! Applied after both axes, in this order:
//!
//! 1. Brake: zero output and both ratios. Independent of the speed buttons.
//! 2. At most one [`SpeedAction`], by precedence speed up > speed down > reset.
//!
//! ## Usage
//!
//! ```
//! use joy_teleop::teleop::mapper::JoystickState;
//! use joy_teleop::teleop::ramper::VelocityRamper;
//!
//! let mut ramper = VelocityRamper::new();
//! let forward = JoystickState { linear_axis: 1.0, ..Default::default() };
//!
//! ramper.step(&forward);
//! let cmd = ramper.step(&forward);
//! assert!((cmd.linear - 0.02).abs() < 1e-9);
//! ```

use serde::Serialize;
use tracing::{debug, info};

use super::mapper::JoystickState;

/// Default speed ceiling.
pub const DEFAULT_MAX_SPEED: f64 = 0.5;
/// Lowest speed ceiling reachable with the speed-down button.
pub const MIN_SPEED: f64 = 0.05;
/// Highest speed ceiling reachable with the speed-up button.
pub const MAX_SPEED_LIMIT: f64 = 1.0;
/// Speed ceiling change per speed-up/speed-down press.
pub const SPEED_STEP: f64 = 0.025;

/// Acceleration and deceleration step for one axis, as ratio per sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRamp {
    pub accel: f64,
    pub decel: f64,
}

impl AxisRamp {
    /// Symmetric forward/backward ramp.
    pub const LINEAR: AxisRamp = AxisRamp {
        accel: 0.04,
        decel: 0.04,
    };

    /// Turn ramp. Stops about twice as fast as it spins up.
    pub const ANGULAR: AxisRamp = AxisRamp {
        accel: 0.05,
        decel: 0.1,
    };

    /// Advances one axis by one sample and returns its command.
    ///
    /// A decel step larger than the remaining ratio snaps it to zero.
    fn advance(&self, axis: f64, ratio: &mut f64, last_sign: &mut i8, max_speed: f64) -> f64 {
        if axis != 0.0 {
            let sign: i8 = if axis > 0.0 { 1 } else { -1 };
            if *last_sign != 0 && *last_sign == -sign {
                *ratio = 0.0;
            }
            *last_sign = sign;
            let output = *ratio * max_speed * f64::from(sign);
            *ratio = (*ratio + self.accel).min(1.0);
            output
        } else {
            let output = *ratio * max_speed * f64::from(*last_sign);
            *ratio = (*ratio - self.decel).max(0.0);
            output
        }
    }
}

/// Tunable ramp and speed-limit parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampParams {
    pub linear: AxisRamp,
    pub angular: AxisRamp,
    pub speed_step: f64,
    pub min_speed: f64,
    pub max_speed_limit: f64,
    pub default_max_speed: f64,
}

impl Default for RampParams {
    fn default() -> Self {
        Self {
            linear: AxisRamp::LINEAR,
            angular: AxisRamp::ANGULAR,
            speed_step: SPEED_STEP,
            min_speed: MIN_SPEED,
            max_speed_limit: MAX_SPEED_LIMIT,
            default_max_speed: DEFAULT_MAX_SPEED,
        }
    }
}

/// Persistent ramp state, carried from one sample to the next.
///
/// Single writer: only [`step`] mutates it, and it takes `&mut`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RamperState {
    pub linear_ratio: f64,
    pub angular_ratio: f64,
    /// Last nonzero linear direction: -1, 1, or 0 if never moved.
    pub last_linear_sign: i8,
    /// Last nonzero angular direction: -1, 1, or 0 if never moved.
    pub last_angular_sign: i8,
    pub max_speed: f64,
}

impl Default for RamperState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SPEED)
    }
}

impl RamperState {
    /// Creates a state at rest with the given speed ceiling.
    #[must_use]
    pub fn new(max_speed: f64) -> Self {
        Self {
            linear_ratio: 0.0,
            angular_ratio: 0.0,
            last_linear_sign: 0,
            last_angular_sign: 0,
            max_speed,
        }
    }

    fn stop(&mut self) {
        self.linear_ratio = 0.0;
        self.angular_ratio = 0.0;
    }
}

/// Velocity command for the drive base.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct VelocityCommand {
    /// Forward velocity, positive forward.
    pub linear: f64,
    /// Turn rate, positive counter-clockwise.
    pub angular: f64,
}

impl VelocityCommand {
    /// The all-zero command.
    pub const STOP: VelocityCommand = VelocityCommand {
        linear: 0.0,
        angular: 0.0,
    };

    #[must_use]
    pub fn is_stop(&self) -> bool {
        self.linear == 0.0 && self.angular == 0.0
    }
}

/// Speed-ceiling button action for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedAction {
    Increase,
    Decrease,
    Reset,
}

impl SpeedAction {
    /// Resolves the pressed buttons to at most one action.
    ///
    /// Precedence is speed up, then speed down, then reset.
    #[must_use]
    pub fn from_state(js: &JoystickState) -> Option<Self> {
        if js.speed_up {
            Some(SpeedAction::Increase)
        } else if js.speed_down {
            Some(SpeedAction::Decrease)
        } else if js.reset {
            Some(SpeedAction::Reset)
        } else {
            None
        }
    }
}

/// Advances `state` by one sample and returns the command for it.
///
/// Never fails; `js` axes are expected within -1.0..=1.0.
pub fn step(params: &RampParams, js: &JoystickState, state: &mut RamperState) -> VelocityCommand {
    let mut cmd = VelocityCommand {
        linear: params.linear.advance(
            js.linear_axis,
            &mut state.linear_ratio,
            &mut state.last_linear_sign,
            state.max_speed,
        ),
        angular: params.angular.advance(
            js.angular_axis,
            &mut state.angular_ratio,
            &mut state.last_angular_sign,
            state.max_speed,
        ),
    };

    if js.brake {
        debug!("Brake pressed");
        cmd = VelocityCommand::STOP;
        state.stop();
    }

    match SpeedAction::from_state(js) {
        Some(SpeedAction::Increase) => {
            state.max_speed = (state.max_speed + params.speed_step).min(params.max_speed_limit);
            info!("Max speed raised to {:.3}", state.max_speed);
        }
        Some(SpeedAction::Decrease) => {
            state.max_speed = (state.max_speed - params.speed_step).max(params.min_speed);
            info!("Max speed lowered to {:.3}", state.max_speed);
        }
        Some(SpeedAction::Reset) => {
            cmd = VelocityCommand::STOP;
            state.stop();
            state.max_speed = params.default_max_speed;
            info!("Stopped, max speed reset to {:.3}", state.max_speed);
        }
        None => {}
    }

    cmd
}

/// Owns the ramp parameters and the persistent [`RamperState`].
#[derive(Debug, Clone)]
pub struct VelocityRamper {
    params: RampParams,
    state: RamperState,
}

impl Default for VelocityRamper {
    fn default() -> Self {
        Self::new()
    }
}

impl VelocityRamper {
    /// Creates a ramper with the default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(RampParams::default())
    }

    /// Creates a ramper at rest with custom parameters.
    #[must_use]
    pub fn with_params(params: RampParams) -> Self {
        Self {
            params,
            state: RamperState::new(params.default_max_speed),
        }
    }

    /// Returns the current ramp state.
    #[must_use]
    pub fn state(&self) -> &RamperState {
        &self.state
    }

    /// Returns the current speed ceiling.
    #[must_use]
    pub fn max_speed(&self) -> f64 {
        self.state.max_speed
    }

    /// Processes one sample. See [`step`].
    pub fn step(&mut self, js: &JoystickState) -> VelocityCommand {
        step(&self.params, js, &mut self.state)
    }
}
