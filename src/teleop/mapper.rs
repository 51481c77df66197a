//! # Joystick Frame Mapper Module
//!
//! Converts a raw positional joystick frame (ordered axis values, ordered
//! button flags) into a typed [`JoystickState`].
//!
//! ## Axis Layout
//!
//! | Index | Role | Description |
//! |-------|------|-------------|
//! | 0 | Angular | Left stick horizontal, left = positive |
//! | 1 | Linear | Left stick vertical, up = positive |
//!
//! ## Button Layout
//!
//! | Index | Role | Description |
//! |-------|------|-------------|
//! | 0 | Brake | Stop immediately, drop both ramps |
//! | 1 | Speed down | Lower the speed ceiling one step |
//! | 2 | Reset | Stop and restore the default speed ceiling |
//! | 3 | Speed up | Raise the speed ceiling one step |
//!
//! Roles are fixed by position, not by button label. Extra axes and buttons
//! are ignored.
//!
//! ## Usage
//!
//! ```
//! use joy_teleop::teleop::mapper::JoystickFrameMapper;
//!
//! let mapper = JoystickFrameMapper::new();
//! let state = mapper.map(&[0.0, 1.0], &[false, false, false, true])?;
//!
//! assert_eq!(state.linear_axis, 1.0);
//! assert!(state.speed_up);
//! # Ok::<(), joy_teleop::error::TeleopError>(())
//! ```

use serde::{Deserialize, Deserializer};

use super::calibration::Deadzone;
use crate::error::{Result, TeleopError};

/// Axis indices for semantic access.
pub mod axes {
    /// Angular velocity - left stick horizontal
    pub const ANGULAR: usize = 0;
    /// Linear velocity - left stick vertical
    pub const LINEAR: usize = 1;
    /// Minimum number of axes in a valid frame
    pub const REQUIRED: usize = 2;
}

/// Button indices for semantic access.
pub mod buttons {
    /// Brake
    pub const BRAKE: usize = 0;
    /// Decrease speed ceiling
    pub const SPEED_DOWN: usize = 1;
    /// Reset speed ceiling and stop
    pub const RESET: usize = 2;
    /// Increase speed ceiling
    pub const SPEED_UP: usize = 3;
    /// Minimum number of buttons in a valid frame
    pub const REQUIRED: usize = 4;
}

/// One raw sample as delivered by the transport.
///
/// Deserializes from `{"axes": [..], "buttons": [..]}`. Buttons may be JSON
/// booleans or integers; any nonzero integer counts as pressed.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RawFrame {
    pub axes: Vec<f64>,
    #[serde(deserialize_with = "deserialize_buttons")]
    pub buttons: Vec<bool>,
}

impl RawFrame {
    #[must_use]
    pub fn new(axes: Vec<f64>, buttons: Vec<bool>) -> Self {
        Self { axes, buttons }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ButtonValue {
    Flag(bool),
    Level(i64),
}

fn deserialize_buttons<'de, D>(deserializer: D) -> std::result::Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<ButtonValue>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(|value| match value {
            ButtonValue::Flag(pressed) => pressed,
            ButtonValue::Level(level) => level != 0,
        })
        .collect())
}

/// Typed view of one joystick sample.
///
/// Axes are always within -1.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JoystickState {
    /// Forward/backward deflection.
    pub linear_axis: f64,
    /// Turn deflection.
    pub angular_axis: f64,
    pub brake: bool,
    pub speed_up: bool,
    pub speed_down: bool,
    pub reset: bool,
}

impl JoystickState {
    /// Returns true if either axis is deflected.
    #[must_use]
    pub fn any_axis_moved(&self) -> bool {
        self.linear_axis != 0.0 || self.angular_axis != 0.0
    }
}

/// Maps raw positional frames to [`JoystickState`].
#[derive(Debug, Clone, Default)]
pub struct JoystickFrameMapper {
    deadzone: Deadzone,
}

impl JoystickFrameMapper {
    /// Creates a mapper that only clamps axis values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mapper that also snaps small deflections to zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use joy_teleop::teleop::calibration::Deadzone;
    /// use joy_teleop::teleop::mapper::JoystickFrameMapper;
    ///
    /// let mapper = JoystickFrameMapper::with_deadzone(Deadzone::new(0.1));
    /// let state = mapper.map(&[0.03, -0.02], &[false; 4])?;
    /// assert_eq!(state.linear_axis, 0.0);
    /// assert_eq!(state.angular_axis, 0.0);
    /// # Ok::<(), joy_teleop::error::TeleopError>(())
    /// ```
    #[must_use]
    pub fn with_deadzone(deadzone: Deadzone) -> Self {
        Self { deadzone }
    }

    /// Returns the deadzone in use.
    #[must_use]
    pub fn deadzone(&self) -> Deadzone {
        self.deadzone
    }

    /// Maps one raw sample.
    ///
    /// # Errors
    ///
    /// Returns [`TeleopError::MalformedFrame`] if `raw_axes` has fewer than 2
    /// entries or `raw_buttons` has fewer than 4.
    pub fn map(&self, raw_axes: &[f64], raw_buttons: &[bool]) -> Result<JoystickState> {
        if raw_axes.len() < axes::REQUIRED || raw_buttons.len() < buttons::REQUIRED {
            return Err(TeleopError::MalformedFrame {
                axes: raw_axes.len(),
                buttons: raw_buttons.len(),
            });
        }

        Ok(JoystickState {
            linear_axis: self.map_axis(raw_axes[axes::LINEAR]),
            angular_axis: self.map_axis(raw_axes[axes::ANGULAR]),
            brake: raw_buttons[buttons::BRAKE],
            speed_up: raw_buttons[buttons::SPEED_UP],
            speed_down: raw_buttons[buttons::SPEED_DOWN],
            reset: raw_buttons[buttons::RESET],
        })
    }

    /// Maps a [`RawFrame`].
    ///
    /// # Errors
    ///
    /// Same as [`JoystickFrameMapper::map`].
    pub fn map_frame(&self, frame: &RawFrame) -> Result<JoystickState> {
        self.map(&frame.axes, &frame.buttons)
    }

    fn map_axis(&self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        self.deadzone.apply(value.clamp(-1.0, 1.0))
    }
}
