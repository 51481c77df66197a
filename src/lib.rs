//! # joy-teleop
//!
//! Drive a mobile robot from a joystick.
//!
//! This library turns raw joystick frames into smoothly ramped velocity
//! commands: per-axis acceleration and deceleration, protection against
//! instant direction reversal, an adjustable speed ceiling, brake and reset.

pub mod config;
pub mod error;
pub mod sink;
pub mod source;
pub mod teleop;
